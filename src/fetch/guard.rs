// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Host validation for outbound fetches (SSRF defense)
//!
//! Runs before any network I/O, once for the initial URL and again for
//! every redirect target, so a redirect can never pivot off-allowlist or
//! into a private network. Private-range classification is by literal IP
//! parsing only, never DNS.

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

use super::types::FetchError;

/// Validate a URL against the scheme policy, the host allowlist, and
/// (unless `allow_private_hosts`) the private-host blocklist.
pub fn check_allowed(
    url: &Url,
    allow_hosts: &HashSet<String>,
    allow_private_hosts: bool,
) -> Result<(), FetchError> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(FetchError::ProtocolUnsupported {
            scheme: scheme.to_string(),
        });
    }

    // An empty allowlist refuses every fetch, independent of the
    // private-host policy
    if allow_hosts.is_empty() {
        return Err(FetchError::AllowlistRequired);
    }

    let host = match url.host() {
        Some(h) => h,
        None => {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                message: "missing host".to_string(),
            })
        }
    };

    let host_text = match &host {
        Host::Domain(d) => d.to_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };

    if !host_allowlisted(&host_text, allow_hosts) {
        return Err(FetchError::HostNotAllowlisted { host: host_text });
    }

    if !allow_private_hosts && is_private_host(&host, &host_text) {
        return Err(FetchError::PrivateHostBlocked { host: host_text });
    }

    Ok(())
}

/// Exact hostname match, or suffix match for `.`-prefixed entries.
/// `.example.com` matches `feeds.example.com` but not `example.com` itself.
fn host_allowlisted(host: &str, allow_hosts: &HashSet<String>) -> bool {
    allow_hosts.iter().any(|entry| {
        let entry = entry.to_lowercase();
        if entry.starts_with('.') {
            host.ends_with(&entry)
        } else {
            host == entry
        }
    })
}

fn is_private_host(host: &Host<&str>, host_text: &str) -> bool {
    match host {
        Host::Domain(_) => {
            host_text == "localhost"
                || host_text.ends_with(".localhost")
                || host_text.ends_with(".local")
        }
        Host::Ipv4(ip) => is_private_ipv4(*ip),
        Host::Ipv6(ip) => is_private_ipv6(*ip),
    }
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_private() // 10/8, 172.16/12, 192.168/16
        || ip.is_loopback() // 127/8
        || ip.is_link_local() // 169.254/16
        || octets[0] == 0 // 0/8 "this network"
        || (octets[0] == 100 && (64..=127).contains(&octets[1])) // 100.64/10 CGNAT
        || (octets[0] == 198 && (octets[1] == 18 || octets[1] == 19)) // 198.18/15 benchmarking
        || octets[0] >= 224 // multicast and reserved
}

fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    let segments = ip.segments();
    if segments[0] & 0xfe00 == 0xfc00 {
        return true; // unique-local fc00::/7
    }
    if segments[0] & 0xffc0 == 0xfe80 {
        return true; // link-local fe80::/10
    }
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_ipv4(v4);
    }
    false
}

//! Cache key builders for all Mediagate cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use std::net::IpAddr;

/// Prefix applied to all Mediagate cache keys.
const PREFIX: &str = "mediagate";

// ── Settings keys ──────────────────────────────────────────

/// Cache key for a runtime setting by name.
pub fn setting(name: &str) -> String {
    format!("{PREFIX}:setting:{name}")
}

// ── DNS keys ───────────────────────────────────────────────

/// Cache key for a reverse-DNS lookup result.
pub fn reverse_dns(ip: IpAddr) -> String {
    format!("{PREFIX}:rdns:{ip}")
}

/// Cache key for a forward-DNS lookup result.
pub fn forward_dns(hostname: &str) -> String {
    format!("{PREFIX}:fdns:{}", hostname.to_lowercase())
}

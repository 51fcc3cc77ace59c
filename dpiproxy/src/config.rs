//! Immutable proxy configuration.
//!
//! Built once from `cli::Cli` at startup and handed to the core by
//! reference. Nothing under `dns`, `http`, `tls`, `net`, `handler`, or
//! `proxy` touches `clap` directly — they only ever see this struct.

use std::net::IpAddr;

use regex::Regex;

/// Resolved, validated runtime configuration for the proxy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the proxy listens on.
    pub addr: IpAddr,
    /// Port the proxy listens on.
    pub port: u16,

    /// Upstream DNS server address (used by the general resolver, and as
    /// the DoH server host when `enable_doh` is set).
    pub dns_addr: IpAddr,
    /// Upstream DNS server port (general resolver only).
    pub dns_port: u16,
    /// When set, only A queries are issued; AAAA racing is skipped.
    pub dns_ipv4_only: bool,
    /// When set, domains that match `allowed_patterns` are resolved over
    /// DNS-over-HTTPS instead of the plain-UDP general resolver.
    pub enable_doh: bool,

    /// Per-read deadline on pipe tasks, in milliseconds. Zero disables the
    /// deadline.
    pub timeout_ms: u64,
    /// Bytes per ClientHello fragmentation chunk. `<= 0` selects the legacy
    /// 1/N split.
    pub window_size: i64,

    /// Compiled patterns naming domains DPI evasion applies to. An empty
    /// list means every domain matches.
    pub allowed_patterns: Vec<Regex>,

    pub debug: bool,
    pub silent: bool,

    /// Whether to attempt to register this proxy as the OS-wide HTTP/HTTPS
    /// proxy on supported platforms (macOS only; a no-op elsewhere).
    pub system_proxy: bool,
}

impl Config {
    /// Whether `domain` matches the configured allow-list.
    ///
    /// An empty pattern list matches everything, mirroring the façade's
    /// "all domains matched" default.
    pub fn domain_matches(&self, domain: &str) -> bool {
        if self.allowed_patterns.is_empty() {
            return true;
        }
        self.allowed_patterns.iter().any(|re| re.is_match(domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn config_with_patterns(patterns: &[&str]) -> Config {
        Config {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            dns_addr: IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
            dns_port: 53,
            dns_ipv4_only: false,
            enable_doh: false,
            timeout_ms: 0,
            window_size: 10,
            allowed_patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
            debug: false,
            silent: true,
            system_proxy: false,
        }
    }

    #[test]
    fn empty_pattern_list_matches_every_domain() {
        let config = config_with_patterns(&[]);
        assert!(config.domain_matches("anything.example"));
    }

    #[test]
    fn pattern_matches_only_named_suffix() {
        let config = config_with_patterns(&[r".*\.example\.com$"]);
        assert!(config.domain_matches("api.example.com"));
        assert!(!config.domain_matches("other.net"));
    }
}

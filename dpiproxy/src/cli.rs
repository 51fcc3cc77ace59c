//! Command-line argument definitions.
//!
//! A thin `clap` derive surface. `Cli::into_config` is the only place that
//! bridges raw CLI args into the immutable `Config` the core consumes; the
//! rest of the crate never imports `clap`.

use std::net::IpAddr;

use regex::Regex;

use crate::config::Config;

/// CLI entrypoint and argument definitions for the `dpiproxy` binary.
#[derive(Debug, clap::Parser)]
#[command(name = "dpiproxy", about = "Anti-censorship forward proxy")]
pub struct Cli {
    /// Print version information and exit.
    #[arg(short = 'V', long = "version", action = clap::ArgAction::SetTrue)]
    pub print_version: bool,

    /// Address the proxy listens on.
    #[arg(short = 'a', long, default_value = "127.0.0.1")]
    pub addr: IpAddr,

    /// Port the proxy listens on.
    #[arg(short = 'p', long, default_value_t = 8080)]
    pub port: u16,

    /// Upstream DNS server address.
    #[arg(long = "dns-addr", default_value = "8.8.8.8")]
    pub dns_addr: IpAddr,

    /// Upstream DNS server port.
    #[arg(long = "dns-port", default_value_t = 53)]
    pub dns_port: u16,

    /// Only issue A queries, skipping AAAA.
    #[arg(long = "dns-ipv4-only", default_value_t = false)]
    pub dns_ipv4_only: bool,

    /// Resolve DPI-evaded domains over DNS-over-HTTPS.
    #[arg(long = "enable-doh", default_value_t = false)]
    pub enable_doh: bool,

    /// Per-read deadline for pipe tasks, in milliseconds. 0 disables it.
    #[arg(short = 't', long, default_value_t = 0)]
    pub timeout: u64,

    /// Bytes per ClientHello fragmentation chunk. <= 0 selects the legacy
    /// 1/N split (first byte alone, then the rest).
    #[arg(short = 'w', long = "window-size", default_value_t = 10)]
    pub window_size: i64,

    /// Regex naming domains DPI evasion applies to. May be given multiple
    /// times; an empty list matches every domain.
    #[arg(long = "pattern")]
    pub patterns: Vec<String>,

    /// Enable verbose logging.
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Suppress all but error-level logging and the startup banner.
    #[arg(long, default_value_t = false)]
    pub silent: bool,

    /// Register this proxy as the OS-wide proxy (macOS only).
    #[arg(long = "system-proxy", default_value_t = false)]
    pub system_proxy: bool,
}

impl Cli {
    /// Validate and convert the parsed CLI arguments into an immutable
    /// `Config`. The only fallible step is compiling `patterns`.
    pub fn into_config(self) -> Result<Config, regex::Error> {
        let allowed_patterns = self
            .patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            addr: self.addr,
            port: self.port,
            dns_addr: self.dns_addr,
            dns_port: self.dns_port,
            dns_ipv4_only: self.dns_ipv4_only,
            enable_doh: self.enable_doh,
            timeout_ms: self.timeout,
            window_size: self.window_size,
            allowed_patterns,
            debug: self.debug,
            silent: self.silent,
            system_proxy: self.system_proxy,
        })
    }
}

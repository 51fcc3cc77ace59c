//! Startup banner.

use crate::config::Config;

/// Print the startup banner unless `silent` is set. Plain text; nothing in
/// this workspace's dependency stack supplies a TUI/ASCII-art crate, so
/// this matches the teacher's own preference for `println!` over an extra
/// dependency for something this small.
///
/// Field list and order mirror the original Go `PrintColoredBanner`: ADDR,
/// PORT, DNS, DEBUG, SILENT, SYSTEM, TIMEOUT, WINDOW, DOH, DNSPORT, DNSV4,
/// ALLOWED.
pub fn print(config: &Config) {
    if config.silent {
        return;
    }

    println!("dpiproxy {}", crate::version::VERSION);
    println!("ADDR    : {}", config.addr);
    println!("PORT    : {}", config.port);
    println!("DNS     : {}", config.dns_addr);
    println!("DEBUG   : {}", config.debug);
    println!("SILENT  : {}", config.silent);
    println!("SYSTEM  : {}", config.system_proxy);
    println!("TIMEOUT : {}", config.timeout_ms);
    println!("WINDOW  : {}", config.window_size);
    println!("DOH     : {}", config.enable_doh);
    println!("DNSPORT : {}", config.dns_port);
    println!("DNSV4   : {}", config.dns_ipv4_only);
    println!(
        "ALLOWED : [{}]",
        config
            .allowed_patterns
            .iter()
            .map(|re| re.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

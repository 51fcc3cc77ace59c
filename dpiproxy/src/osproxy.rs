//! OS-wide system proxy registration.
//!
//! Only macOS has a scriptable system-proxy setting (`networksetup`); every
//! other platform treats `--system-proxy` as a no-op rather than failing
//! the whole process over an optional convenience feature.

use log::warn;

#[cfg(target_os = "macos")]
const SERVICE: &str = "Wi-Fi";

/// Point the OS-wide HTTP and HTTPS proxy at `addr:port`.
#[cfg(target_os = "macos")]
pub fn enable(addr: std::net::IpAddr, port: u16) {
    for proto in ["webproxy", "securewebproxy"] {
        let status = std::process::Command::new("networksetup")
            .args(["-set".to_string() + proto, SERVICE.to_string(), addr.to_string(), port.to_string()])
            .status();
        if let Err(e) = status {
            warn!("failed to set system proxy ({}): {}", proto, e);
        }
    }
}

/// Clear the OS-wide HTTP and HTTPS proxy.
#[cfg(target_os = "macos")]
pub fn disable() {
    for proto in ["-setwebproxystate", "-setsecurewebproxystate"] {
        let status = std::process::Command::new("networksetup")
            .args([proto, SERVICE, "off"])
            .status();
        if let Err(e) = status {
            warn!("failed to clear system proxy ({}): {}", proto, e);
        }
    }
}

#[cfg(not(target_os = "macos"))]
pub fn enable(_addr: std::net::IpAddr, _port: u16) {
    warn!("--system-proxy is only supported on macOS; ignoring");
}

#[cfg(not(target_os = "macos"))]
pub fn disable() {}

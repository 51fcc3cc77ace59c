//! Build version string, reported by `--version` and in the startup banner.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print the three-line version banner (name, description, repo URL).
pub fn print() {
    println!("dpiproxy v{}", VERSION);
    println!("An anti-censorship forward proxy written in Rust.");
    println!("https://github.com/bariiss/SpoofDPI");
}

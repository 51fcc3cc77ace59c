//! `dpiproxy` binary entrypoint.
//!
//! Parses CLI arguments into a `Config`, prints the startup banner, brings
//! up the accept loop, and shuts it down cleanly on SIGINT/SIGTERM/SIGQUIT/
//! SIGHUP.

use clap::Parser;
use env_logger::Env;

use dpiproxy::cli::Cli;
use dpiproxy::proxy::Proxy;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    if cli.print_version {
        dpiproxy::version::print();
        return Ok(());
    }

    let config = cli
        .into_config()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let default_filter = if config.debug { "debug" } else { "info" };
    env_logger::init_from_env(Env::default().default_filter_or(default_filter));

    dpiproxy::banner::print(&config);

    if config.system_proxy {
        dpiproxy::osproxy::enable(config.addr, config.port);
    }

    let proxy = Proxy::new(config)?;
    let result = proxy.run(shutdown_signal()).await;

    if proxy.config().system_proxy {
        dpiproxy::osproxy::disable();
    }

    result
}

/// Resolves once SIGINT, or (on Unix) SIGTERM/SIGQUIT/SIGHUP, is received,
/// so the accept loop can stop cleanly instead of being killed mid-connection.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigquit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");
        let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
            _ = sigquit.recv() => {}
            _ = sighup.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

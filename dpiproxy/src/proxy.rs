//! Accept loop and per-connection dispatch.
//!
//! One task per accepted connection: parse the first request, reject
//! disallowed methods, resolve the target domain (system DNS for anything
//! outside the allow-list, DoH/plain-UDP racing for matched domains), guard
//! against the proxy dialing itself, then hand off to the HTTP or HTTPS
//! handler.

use std::net::IpAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use crate::config::Config;
use crate::context::{RequestContext, SCOPE_HTTP, SCOPE_HTTPS};
use crate::dns::addrselect::local_interface_addrs;
use crate::dns::DnsFacade;
use crate::error::{LoopError, ParseError, ProxyError};
use crate::handler::{http, https};
use crate::http::request::read_request;

pub struct Proxy {
    config: Arc<Config>,
    dns: Arc<DnsFacade>,
}

impl Proxy {
    pub fn new(config: Config) -> Result<Self, std::io::Error> {
        let dns = DnsFacade::new(
            config.dns_addr,
            config.dns_port,
            config.dns_ipv4_only,
            config.enable_doh,
        )?;
        Ok(Proxy {
            config: Arc::new(config),
            dns: Arc::new(dns),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accept connections until `shutdown` resolves.
    pub async fn run(
        &self,
        shutdown: impl std::future::Future<Output = ()>,
    ) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind((self.config.addr, self.config.port)).await?;
        info!("listening on {}:{}", self.config.addr, self.config.port);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down accept loop");
                    break;
                }
                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!("accept failed: {}", e);
                            continue;
                        }
                    };
                    let config = self.config.clone();
                    let dns = self.dns.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(config, dns, socket).await {
                            debug!("[{}] connection ended: {}", peer, e);
                        }
                    });
                }
            }
        }
        Ok(())
    }
}

async fn handle_connection(
    config: Arc<Config>,
    dns: Arc<DnsFacade>,
    mut client: TcpStream,
) -> Result<(), ProxyError> {
    let ctx = RequestContext::new();

    let request = read_request(&mut client).await?;

    if !request.is_valid_method() {
        warn!("{} rejected method {}", ctx.log_prefix(), request.method());
        return Err(ParseError::disallowed_method(request.method()).into());
    }

    let matched = config.domain_matches(request.domain());
    let use_system_dns = !matched;

    let scope = if request.is_connect() {
        SCOPE_HTTPS
    } else {
        SCOPE_HTTP
    };
    let ctx = ctx.with_scope(scope);

    let default_port = if request.is_connect() { 443 } else { 80 };
    let port_hint: u16 = request.port().parse().unwrap_or(default_port);

    let ip = match dns
        .resolve_host(&ctx, request.domain(), port_hint, use_system_dns)
        .await
    {
        Ok(ip) => ip,
        Err(e) => {
            warn!("{} dns resolution failed: {}", ctx.log_prefix(), e);
            let _ = client.write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n").await;
            return Err(e.into());
        }
    };

    if is_looped_request(&config, ip, port_hint) {
        warn!("{} refusing self-referential request", ctx.log_prefix());
        return Err(LoopError::new(ip, port_hint).into());
    }

    if request.is_connect() {
        https::handle(
            ctx,
            client,
            ip,
            request,
            config.window_size,
            matched,
            config.timeout_ms,
        )
        .await
    } else {
        http::handle(ctx, client, ip, request, config.timeout_ms).await
    }
}

/// Refuse requests whose resolved target is this proxy's own listening
/// address, which would otherwise dial the proxy into a loop with itself.
fn is_looped_request(config: &Config, ip: IpAddr, port: u16) -> bool {
    if port != config.port {
        return false;
    }
    if ip.is_loopback() {
        return true;
    }
    local_interface_addrs().contains(&ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn test_config(port: u16) -> Config {
        Config {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            dns_addr: IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
            dns_port: 53,
            dns_ipv4_only: false,
            enable_doh: false,
            timeout_ms: 0,
            window_size: 10,
            allowed_patterns: Vec::new(),
            debug: false,
            silent: true,
            system_proxy: false,
        }
    }

    #[test]
    fn loopback_ip_on_own_port_is_a_loop() {
        let config = test_config(8080);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(is_looped_request(&config, ip, 8080));
    }

    #[test]
    fn loopback_ip_on_different_port_is_not_a_loop() {
        let config = test_config(8080);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(!is_looped_request(&config, ip, 443));
    }

    #[test]
    fn remote_ip_on_own_port_is_not_a_loop() {
        let config = test_config(8080);
        let ip = IpAddr::from_str("93.184.216.34").unwrap();
        assert!(!is_looped_request(&config, ip, 8080));
    }
}

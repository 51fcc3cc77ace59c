//! HTTPS (CONNECT) handling.
//!
//! Establishes the tunnel, reads the client's ClientHello directly (rather
//! than through the generic byte pipe, since this is the one record this
//! proxy ever inspects), and writes it to the upstream either verbatim or
//! fragmented across several writes to split it across more than one TCP
//! segment. The upstream->client pipe is spawned before the ClientHello is
//! written upstream, so the first bytes of the server's reply are never
//! dropped while that write is in flight.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Notify;

use crate::context::RequestContext;
use crate::error::{DialError, ProxyError};
use crate::http::request::HttpRequest;
use crate::net::pipe::pipe_one_direction;
use crate::tls::{write_fragmented, TlsRecord};

const DEFAULT_PORT: u16 = 443;

/// Handle one accepted CONNECT tunnel, having already resolved `ip` for
/// the request's domain. `exploit` selects whether the ClientHello is
/// fragmented before being written upstream.
pub async fn handle(
    ctx: RequestContext,
    mut client: TcpStream,
    ip: IpAddr,
    request: HttpRequest,
    window_size: i64,
    exploit: bool,
    timeout_ms: u64,
) -> Result<(), ProxyError> {
    let port = request.port().parse::<u16>().unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::new(ip, port);

    let upstream = TcpStream::connect(addr)
        .await
        .map_err(|e| DialError::new(addr.to_string(), &e))?;

    let established = format!(
        "{} 200 Connection Established\r\n\r\n",
        request.version()
    );
    if let Err(e) = client.write_all(established.as_bytes()).await {
        warn!(
            "{} failed writing CONNECT response: {}",
            ctx.log_prefix(),
            e
        );
        return Ok(());
    }

    let (mut client_read, client_write) = client.into_split();
    let (upstream_read, mut upstream_write) = upstream.into_split();

    let hello = match TlsRecord::read_from(&mut client_read).await {
        Ok(rec) => rec,
        Err(e) => {
            warn!("{} failed reading ClientHello: {}", ctx.log_prefix(), e);
            return Ok(());
        }
    };

    if !hello.is_client_hello() {
        warn!(
            "{} first TLS record was not a ClientHello, closing",
            ctx.log_prefix()
        );
        return Ok(());
    }

    let teardown = Arc::new(Notify::new());
    let timeout = if timeout_ms > 0 {
        Some(Duration::from_millis(timeout_ms))
    } else {
        None
    };

    let u2c = tokio::spawn(pipe_one_direction(
        ctx.clone(),
        "upstream->client",
        upstream_read,
        client_write,
        timeout,
        teardown.clone(),
    ));

    let write_result = if exploit {
        write_fragmented(&mut upstream_write, hello.raw(), window_size).await
    } else {
        upstream_write
            .write_all(hello.raw())
            .await
            .map_err(|e| crate::error::RelayError::new("client->upstream", &e))
    };

    if let Err(e) = write_result {
        warn!(
            "{} failed writing ClientHello upstream: {}",
            ctx.log_prefix(),
            e
        );
        teardown.notify_waiters();
        let _ = u2c.await;
        return Ok(());
    }

    tokio::spawn(pipe_one_direction(
        ctx,
        "client->upstream",
        client_read,
        upstream_write,
        timeout,
        teardown,
    ));

    let _ = u2c.await;
    Ok(())
}

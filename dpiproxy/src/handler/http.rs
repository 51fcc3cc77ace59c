//! Plain HTTP handling.
//!
//! Dials the upstream and forwards the tidied request, then pipes the rest
//! of the connection. The upstream->client direction is a plain byte pipe;
//! client->upstream re-parses and re-tidies every subsequent request on the
//! same connection, since a client that pipelines several requests before
//! reading any response would otherwise have its later `Proxy-Connection`
//! headers forwarded unstripped.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use crate::context::RequestContext;
use crate::error::{DialError, ParseError, ProxyError};
use crate::http::request::{read_request, HttpRequest};
use crate::net::pipe::pipe_one_direction;

const DEFAULT_PORT: u16 = 80;

/// Handle one accepted plain-HTTP connection, having already resolved
/// `ip` for the request's domain. Takes ownership of `client` and the
/// first parsed request; everything past this point runs in background
/// tasks, so this returns once those tasks are spawned rather than once
/// the connection closes.
pub async fn handle(
    ctx: RequestContext,
    client: TcpStream,
    ip: IpAddr,
    mut request: HttpRequest,
    timeout_ms: u64,
) -> Result<(), ProxyError> {
    request.tidy();

    let port = request.port().parse::<u16>().unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::new(ip, port);

    let upstream = TcpStream::connect(addr)
        .await
        .map_err(|e| DialError::new(addr.to_string(), &e))?;

    let (client_read, client_write) = client.into_split();
    let (upstream_read, mut upstream_write) = upstream.into_split();

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

    if let Err(e) = upstream_write.write_all(request.raw()).await {
        warn!(
            "{} failed writing initial request upstream: {}",
            ctx.log_prefix(),
            e
        );
        teardown.notify_waiters();
        let _ = u2c.await;
        return Ok(());
    }

    tokio::spawn(pipelined_forward(
        ctx,
        client_read,
        upstream_write,
        timeout,
        teardown,
    ));

    let _ = u2c.await;
    Ok(())
}

/// Client->upstream direction, HTTP-aware: parses and tidies each
/// pipelined request independently rather than relaying raw bytes.
async fn pipelined_forward(
    ctx: RequestContext,
    mut client_read: OwnedReadHalf,
    mut upstream_write: OwnedWriteHalf,
    timeout: Option<Duration>,
    teardown: Arc<Notify>,
) {
    loop {
        let parsed = tokio::select! {
            biased;
            _ = teardown.notified() => {
                log::debug!("{} client->upstream tearing down on sibling signal", ctx.log_prefix());
                break;
            }
            result = read_request_with_deadline(&mut client_read, timeout) => result,
        };

        let mut request = match parsed {
            Ok(req) => req,
            Err(_) => break,
        };

        request.tidy();
        if let Err(e) = upstream_write.write_all(request.raw()).await {
            warn!(
                "{} failed forwarding pipelined request: {}",
                ctx.log_prefix(),
                e
            );
            break;
        }
    }

    teardown.notify_waiters();
    let _ = upstream_write.shutdown().await;
}

async fn read_request_with_deadline(
    reader: &mut OwnedReadHalf,
    timeout: Option<Duration>,
) -> Result<HttpRequest, ParseError> {
    match timeout {
        Some(d) => match tokio::time::timeout(d, read_request(reader)).await {
            Ok(r) => r,
            Err(_) => Err(ParseError::malformed(
                "timed out waiting for next pipelined request",
            )),
        },
        None => read_request(reader).await,
    }
}

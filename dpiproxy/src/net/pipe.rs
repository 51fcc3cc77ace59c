//! Bidirectional connection pipe.
//!
//! Spawns one task per direction. Each task reads up to 1024 bytes at a
//! time (with an optional read deadline) and writes the slice to the
//! opposite socket. The first task to see EOF, a read error, a deadline
//! elapsing, or a write error tears down — dropping its half of both
//! sockets and notifying its sibling, which tears down in turn on its next
//! read. Teardown is idempotent: notifying twice is a no-op, and each
//! task only ever drops its own halves once.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use crate::context::RequestContext;
use crate::error::RelayError;

const READ_BUF_SIZE: usize = 1024;

/// Split `client` and `upstream`, spawn the client->upstream and
/// upstream->client pipe tasks, and return their join handles.
///
/// `timeout_ms` is the per-read deadline in milliseconds; 0 disables it.
pub fn spawn_pipe_pair(
    ctx: RequestContext,
    client: TcpStream,
    upstream: TcpStream,
    timeout_ms: u64,
) -> (tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>) {
    let (client_read, client_write) = client.into_split();
    let (upstream_read, upstream_write) = upstream.into_split();

    let teardown = Arc::new(Notify::new());

    let timeout = if timeout_ms > 0 {
        Some(Duration::from_millis(timeout_ms))
    } else {
        None
    };

    let c2u_ctx = ctx.clone();
    let u2c_ctx = ctx;
    let c2u_teardown = teardown.clone();
    let u2c_teardown = teardown;

    let c2u = tokio::spawn(pipe_one_direction(
        c2u_ctx,
        "client->upstream",
        client_read,
        upstream_write,
        timeout,
        c2u_teardown,
    ));
    let u2c = tokio::spawn(pipe_one_direction(
        u2c_ctx,
        "upstream->client",
        upstream_read,
        client_write,
        timeout,
        u2c_teardown,
    ));

    (c2u, u2c)
}

pub(crate) async fn pipe_one_direction(
    ctx: RequestContext,
    direction: &'static str,
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    timeout: Option<Duration>,
    teardown: Arc<Notify>,
) {
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        let read_result = tokio::select! {
            biased;
            _ = teardown.notified() => {
                debug!("{} {} tearing down on sibling signal", ctx.log_prefix(), direction);
                break;
            }
            result = read_with_deadline(&mut reader, &mut buf, timeout) => result,
        };

        let n = match read_result {
            Ok(Some(n)) => n,
            Ok(None) => {
                debug!("{} {} saw EOF", ctx.log_prefix(), direction);
                break;
            }
            Err(RelayError { .. }) => {
                warn!("{} {} read error, tearing down", ctx.log_prefix(), direction);
                break;
            }
        };

        if n == 0 {
            break;
        }

        if let Err(e) = writer.write_all(&buf[..n]).await {
            warn!(
                "{} {} write error, tearing down: {}",
                ctx.log_prefix(),
                direction,
                e
            );
            break;
        }
    }

    teardown.notify_waiters();
    let _ = writer.shutdown().await;
}

pub(crate) async fn read_with_deadline(
    reader: &mut OwnedReadHalf,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> Result<Option<usize>, RelayError> {
    let read_fut = reader.read(buf);
    let result = match timeout {
        Some(d) => match tokio::time::timeout(d, read_fut).await {
            Ok(r) => r,
            Err(_) => return Ok(None), // deadline elapsed: treat as teardown, not a keep-alive probe
        },
        None => read_fut.await,
    };

    match result {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(RelayError::new("read", &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::{TcpListener, TcpStream};

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let (accept_result, connect_result) = tokio::join!(listener.accept(), connect);
        (connect_result.unwrap(), accept_result.unwrap().0)
    }

    #[tokio::test]
    async fn relays_bytes_until_eof() {
        let (client, client_peer) = connected_pair().await;
        let (upstream, upstream_peer) = connected_pair().await;

        let ctx = RequestContext::new();
        let (c2u, u2c) = spawn_pipe_pair(ctx, client, upstream, 0);

        let mut client_peer = client_peer;
        client_peer.write_all(b"hello").await.unwrap();
        drop(client_peer);

        let mut upstream_peer_read = upstream_peer;
        let mut received = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut upstream_peer_read, &mut received)
            .await
            .unwrap();
        assert_eq!(received, b"hello");

        let _ = tokio::join!(c2u, u2c);
    }
}

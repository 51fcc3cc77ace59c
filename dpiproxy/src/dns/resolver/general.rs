//! General resolver: one UDP DNS query per type, sent concurrently to a
//! configured nameserver.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use tokio::net::UdpSocket;

use crate::context::RequestContext;
use crate::dns::{race, QueryType};
use crate::error::ResolveError;

use super::Resolver;

const UDP_RECV_BUF: usize = 4096;

/// Bound on a single exchange's wait for a reply, so a black-holed or
/// unresponsive nameserver can't hang a query forever. Matches the outer
/// 3-second budget `DnsFacade` imposes on the whole lookup (spec §4.3,
/// §5); the original Go resolver gets this for free from `dns.Client`'s
/// default per-exchange read deadline.
const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub struct GeneralResolver {
    server: SocketAddr,
}

impl GeneralResolver {
    pub fn new(server: SocketAddr) -> Self {
        GeneralResolver { server }
    }

    async fn exchange(server: SocketAddr, host: String, qtype: RecordType) -> Result<Message, String> {
        let name = Name::from_str(&fqdn(&host)).map_err(|e| e.to_string())?;

        let mut msg = Message::new();
        msg.set_id(rand::random::<u16>())
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        msg.add_query(Query::query(name, qtype));

        let request_bytes = msg.to_bytes().map_err(|e| e.to_string())?;

        let local_bind: SocketAddr = match server {
            SocketAddr::V4(_) => "0.0.0.0:0".parse().unwrap(),
            SocketAddr::V6(_) => "[::]:0".parse().unwrap(),
        };
        let socket = UdpSocket::bind(local_bind).await.map_err(|e| e.to_string())?;
        socket.connect(server).await.map_err(|e| e.to_string())?;
        socket.send(&request_bytes).await.map_err(|e| e.to_string())?;

        let mut buf = [0u8; UDP_RECV_BUF];
        let n = match tokio::time::timeout(QUERY_TIMEOUT, socket.recv(&mut buf)).await {
            Ok(result) => result.map_err(|e| e.to_string())?,
            Err(_) => return Err(format!("timed out waiting for reply from {}", server)),
        };

        Message::from_bytes(&buf[..n]).map_err(|e| e.to_string())
    }
}

fn fqdn(host: &str) -> String {
    if host.ends_with('.') {
        host.to_string()
    } else {
        format!("{}.", host)
    }
}

impl std::fmt::Display for GeneralResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "general resolver({})", self.server)
    }
}

#[async_trait]
impl Resolver for GeneralResolver {
    async fn resolve(
        &self,
        ctx: &RequestContext,
        host: &str,
        port: u16,
        qtypes: &[QueryType],
    ) -> Result<Vec<IpAddr>, ResolveError> {
        let server = self.server;
        let host_owned = host.to_string();
        race::race(ctx, host, port, qtypes, move |qtype| {
            GeneralResolver::exchange(server, host_owned.clone(), qtype)
        })
        .await
    }
}

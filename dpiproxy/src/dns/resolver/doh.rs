//! DNS-over-HTTPS resolver (RFC 8484).
//!
//! Sends one HTTPS GET per query type, concurrently, with the packed query
//! message base64url-encoded (no padding) into the `dns` query parameter.

use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};

use crate::context::RequestContext;
use crate::dns::{race, QueryType};
use crate::error::ResolveError;

use super::Resolver;

const TOTAL_TIMEOUT: Duration = Duration::from_secs(5);
const DIAL_TIMEOUT: Duration = Duration::from_secs(3);
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const POOL_MAX_IDLE_PER_HOST: usize = 100;

pub struct DohResolver {
    upstream: String,
    client: reqwest::Client,
}

impl DohResolver {
    /// Build a DoH resolver targeting `host` (a bare hostname or IP, not a
    /// full URL — matching the upstream's normalization of its configured
    /// DNS address into a `/dns-query` endpoint).
    pub fn new(host: &str) -> Result<Self, reqwest::Error> {
        let host = host
            .trim_start_matches("https://")
            .trim_end_matches("/dns-query");
        let host = match Ipv6Addr::from_str(host) {
            Ok(v6) => format!("[{}]", v6),
            Err(_) => host.to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(TOTAL_TIMEOUT)
            .connect_timeout(DIAL_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(DohResolver {
            upstream: format!("https://{}/dns-query", host),
            client,
        })
    }

    async fn exchange(
        client: reqwest::Client,
        upstream: String,
        host: String,
        qtype: RecordType,
    ) -> Result<Message, String> {
        let name = Name::from_str(&fqdn(&host)).map_err(|e| e.to_string())?;

        let mut msg = Message::new();
        msg.set_id(rand::random::<u16>())
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        msg.add_query(Query::query(name, qtype));

        let packed = msg.to_bytes().map_err(|e| e.to_string())?;
        let encoded = URL_SAFE_NO_PAD.encode(&packed);
        let url = format!("{}?dns={}", upstream, encoded);

        let resp = client
            .get(&url)
            .header("Accept", "application/dns-message")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            return Err(format!("DoH query failed with status: {}", resp.status()));
        }

        let body = resp.bytes().await.map_err(|e| e.to_string())?;
        let result = Message::from_bytes(&body).map_err(|e| e.to_string())?;

        if result.response_code() != hickory_proto::op::ResponseCode::NoError {
            return Err("doh rcode wasn't successful".to_string());
        }

        Ok(result)
    }
}

fn fqdn(host: &str) -> String {
    if host.ends_with('.') {
        host.to_string()
    } else {
        format!("{}.", host)
    }
}

impl std::fmt::Display for DohResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doh resolver({})", self.upstream)
    }
}

#[async_trait]
impl Resolver for DohResolver {
    async fn resolve(
        &self,
        ctx: &RequestContext,
        host: &str,
        port: u16,
        qtypes: &[QueryType],
    ) -> Result<Vec<IpAddr>, ResolveError> {
        let client = self.client.clone();
        let upstream = self.upstream.clone();
        let host_owned = host.to_string();
        race::race(ctx, host, port, qtypes, move |qtype| {
            DohResolver::exchange(client.clone(), upstream.clone(), host_owned.clone(), qtype)
        })
        .await
    }
}

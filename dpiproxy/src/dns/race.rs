//! Shared query-race algorithm used by the general and DoH resolvers.
//!
//! Both resolvers issue one exchange per query type concurrently and feed
//! results into this shared collection/sort logic — only the exchange
//! function itself differs between them.

use std::future::Future;
use std::net::IpAddr;

use hickory_proto::op::Message;
use hickory_proto::rr::{RData, RecordType};
use tokio::sync::mpsc;

use crate::context::RequestContext;
use crate::error::resolve::QueryErrorStruct;
use crate::error::ResolveError;

use super::addrselect;
use super::QueryType;

enum RaceOutcome {
    Ok(Vec<IpAddr>),
    Err(QueryErrorStruct),
}

/// Run `exchange` once per entry in `qtypes`, concurrently, and combine the
/// results per the shared race algorithm: collect successes and failures
/// separately, bail out on context cancellation, join all errors if
/// nothing succeeded, otherwise RFC-6724-sort the successful addresses.
pub async fn race<F, Fut>(
    ctx: &RequestContext,
    host: &str,
    port: u16,
    qtypes: &[QueryType],
    exchange: F,
) -> Result<Vec<IpAddr>, ResolveError>
where
    F: Fn(RecordType) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<Message, String>> + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<RaceOutcome>(qtypes.len().max(1));

    for &qtype in qtypes {
        let tx = tx.clone();
        let exchange = exchange.clone();
        let host = host.to_string();
        let record_type = qtype.to_hickory();
        tokio::spawn(async move {
            let outcome = match exchange(record_type).await {
                Ok(msg) => RaceOutcome::Ok(parse_addrs(&msg)),
                Err(e) => RaceOutcome::Err(QueryErrorStruct {
                    host: host.clone(),
                    qtype: qtype.to_string(),
                    msg: e,
                }),
            };
            let _ = tx.send(outcome).await;
        });
    }
    drop(tx);

    let mut addrs = Vec::new();
    let mut errs = Vec::new();
    while let Some(outcome) = rx.recv().await {
        if ctx.is_done() {
            return Err(ResolveError::TimedOut);
        }
        match outcome {
            RaceOutcome::Ok(mut a) => addrs.append(&mut a),
            RaceOutcome::Err(e) => errs.push(e),
        }
    }

    if ctx.is_done() {
        return Err(ResolveError::TimedOut);
    }

    if addrs.is_empty() {
        return Err(ResolveError::AllQueriesFailed(errs));
    }

    addrselect::sort_addresses(&mut addrs, port);
    Ok(addrs)
}

fn parse_addrs(msg: &Message) -> Vec<IpAddr> {
    msg.answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect()
}

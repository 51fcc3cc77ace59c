//! DNS façade: picks a resolver strategy and imposes the outer 3-second
//! deadline on every lookup.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use log::debug;

use crate::context::{RequestContext, SCOPE_DNS};
use crate::error::ResolveError;

use super::resolver::{DohResolver, GeneralResolver, Resolver, SystemResolver};
use super::QueryType;

const RESOLVE_BUDGET: Duration = Duration::from_secs(3);

pub struct DnsFacade {
    system: SystemResolver,
    general: GeneralResolver,
    doh: Option<DohResolver>,
    qtypes: Vec<QueryType>,
}

impl DnsFacade {
    pub fn new(dns_addr: IpAddr, dns_port: u16, dns_ipv4_only: bool, enable_doh: bool) -> Result<Self, std::io::Error> {
        let qtypes = if dns_ipv4_only {
            vec![QueryType::A]
        } else {
            vec![QueryType::Aaaa, QueryType::A]
        };

        let doh = if enable_doh {
            DohResolver::new(&dns_addr.to_string())
                .map_err(|e| std::io::Error::other(e.to_string()))
                .ok()
        } else {
            None
        };

        Ok(DnsFacade {
            system: SystemResolver::new()?,
            general: GeneralResolver::new(SocketAddr::new(dns_addr, dns_port)),
            doh,
            qtypes,
        })
    }

    /// Resolve `host` to a single address, using the strategy selected by
    /// `use_system_dns`/`enable_doh`, clamped to a 3-second outer deadline.
    /// Returns the first RFC-6724-sorted address.
    pub async fn resolve_host(
        &self,
        ctx: &RequestContext,
        host: &str,
        port: u16,
        use_system_dns: bool,
    ) -> Result<IpAddr, ResolveError> {
        let ctx = ctx.with_scope(SCOPE_DNS);

        if let Ok(ip) = IpAddr::from_str(host) {
            return Ok(ip);
        }

        let deadline_ctx = ctx.with_deadline(RESOLVE_BUDGET);

        let resolver: &dyn Resolver = self.select(use_system_dns);
        debug!("{} resolving {} using {}", deadline_ctx.log_prefix(), host, resolver);

        let start = std::time::Instant::now();
        let addrs = match tokio::time::timeout(
            RESOLVE_BUDGET,
            resolver.resolve(&deadline_ctx, host, port, &self.qtypes),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(ResolveError::TimedOut),
        };

        let first = addrs
            .into_iter()
            .next()
            .ok_or(ResolveError::NoResolverAvailable)?;

        debug!(
            "{} resolved {} from {} in {} ms",
            deadline_ctx.log_prefix(),
            first,
            host,
            start.elapsed().as_millis()
        );

        Ok(first)
    }

    fn select(&self, use_system_dns: bool) -> &dyn Resolver {
        if use_system_dns {
            return &self.system;
        }
        if let Some(doh) = &self.doh {
            return doh;
        }
        &self.general
    }
}

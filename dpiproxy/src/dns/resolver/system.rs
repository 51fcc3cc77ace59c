//! System resolver: delegates to the platform's resolver stub via the
//! machine's configured nameservers (`/etc/resolv.conf` on Unix).

use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::Resolver as HickoryResolver;

use crate::context::RequestContext;
use crate::dns::QueryType;
use crate::error::resolve::QueryErrorStruct;
use crate::error::ResolveError;

use super::Resolver;

type TokioResolver = HickoryResolver<TokioConnectionProvider>;

pub struct SystemResolver {
    inner: TokioResolver,
}

impl SystemResolver {
    /// Build a resolver from the host's own DNS configuration.
    pub fn new() -> Result<Self, std::io::Error> {
        let (config, opts) = read_system_conf()?;
        let inner = HickoryResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();
        Ok(SystemResolver { inner })
    }
}

impl std::fmt::Display for SystemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "system resolver")
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    /// `qtypes` is ignored; the platform stub always resolves both
    /// families in one call.
    async fn resolve(
        &self,
        _ctx: &RequestContext,
        host: &str,
        _port: u16,
        _qtypes: &[QueryType],
    ) -> Result<Vec<IpAddr>, ResolveError> {
        let lookup = self.inner.lookup_ip(host).await.map_err(|e| {
            ResolveError::AllQueriesFailed(vec![QueryErrorStruct {
                host: host.to_string(),
                qtype: "A+AAAA".to_string(),
                msg: e.to_string(),
            }])
        })?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        if addrs.is_empty() {
            return Err(ResolveError::AllQueriesFailed(vec![QueryErrorStruct {
                host: host.to_string(),
                qtype: "A+AAAA".to_string(),
                msg: "no addresses returned".to_string(),
            }]));
        }
        Ok(addrs)
    }
}

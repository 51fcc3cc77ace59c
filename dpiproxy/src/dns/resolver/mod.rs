pub mod doh;
pub mod general;
pub mod system;

use std::net::IpAddr;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::ResolveError;

use super::QueryType;

pub use doh::DohResolver;
pub use general::GeneralResolver;
pub use system::SystemResolver;

/// Contract shared by all three resolver strategies. `qtypes` is ignored by
/// the system resolver, which always asks the platform stub for both
/// families at once.
#[async_trait]
pub trait Resolver: std::fmt::Display + Send + Sync {
    async fn resolve(
        &self,
        ctx: &RequestContext,
        host: &str,
        port: u16,
        qtypes: &[QueryType],
    ) -> Result<Vec<IpAddr>, ResolveError>;
}

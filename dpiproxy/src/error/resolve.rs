/// Struct carrying one failed query's host and query-type name.
#[derive(Debug)]
pub struct QueryErrorStruct {
    pub host: String,
    pub qtype: String,
    pub msg: String,
}

/// Errors raised while resolving a domain to an address list.
#[derive(Debug)]
pub enum ResolveError {
    /// Every query launched for this host failed; carries one entry per
    /// failure so the caller can log the full picture.
    AllQueriesFailed(Vec<QueryErrorStruct>),
    /// The resolution context's deadline elapsed before a usable answer
    /// arrived.
    TimedOut,
    /// The DNS façade has no resolver available for this request (e.g. DoH
    /// disabled and no general resolver configured).
    NoResolverAvailable,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::AllQueriesFailed(errs) => {
                write!(f, "dns resolution failed: ")?;
                for (i, e) in errs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} {}: {}", e.host, e.qtype, e.msg)?;
                }
                Ok(())
            }
            ResolveError::TimedOut => write!(f, "dns resolution timed out"),
            ResolveError::NoResolverAvailable => write!(f, "no dns resolver available"),
        }
    }
}

impl std::error::Error for ResolveError {}

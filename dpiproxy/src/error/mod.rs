//! Per-domain error types for the proxy data path.
//!
//! Each failure domain gets its own struct-per-kind payload and a small enum,
//! mirroring the shape used throughout the rest of this workspace: no
//! `anyhow`, no blanket `Box<dyn Error>` — every boundary converts into the
//! next layer's error type explicitly.

pub mod dial;
pub mod framing;
pub mod looped;
pub mod parse;
pub mod relay;
pub mod resolve;

pub use dial::DialError;
pub use framing::FramingError;
pub use looped::LoopError;
pub use parse::ParseError;
pub use relay::RelayError;
pub use resolve::ResolveError;

/// Top-level error covering everything that can end a connection attempt.
///
/// The acceptor only ever sees this type; every variant just gets logged
/// and the connection torn down. `ResolveError` is the one case the caller
/// writes a `502 Bad Gateway` for, and it does that inline at the call site
/// (see `proxy::handle_connection`) before converting into this type.
#[derive(Debug)]
pub enum ProxyError {
    Parse(ParseError),
    Framing(FramingError),
    Resolve(ResolveError),
    Dial(DialError),
    Relay(RelayError),
    Loop(LoopError),
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyError::Parse(e) => write!(f, "{}", e),
            ProxyError::Framing(e) => write!(f, "{}", e),
            ProxyError::Resolve(e) => write!(f, "{}", e),
            ProxyError::Dial(e) => write!(f, "{}", e),
            ProxyError::Relay(e) => write!(f, "{}", e),
            ProxyError::Loop(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProxyError {}

impl From<ParseError> for ProxyError {
    fn from(e: ParseError) -> Self {
        ProxyError::Parse(e)
    }
}

impl From<FramingError> for ProxyError {
    fn from(e: FramingError) -> Self {
        ProxyError::Framing(e)
    }
}

impl From<ResolveError> for ProxyError {
    fn from(e: ResolveError) -> Self {
        ProxyError::Resolve(e)
    }
}

impl From<DialError> for ProxyError {
    fn from(e: DialError) -> Self {
        ProxyError::Dial(e)
    }
}

impl From<RelayError> for ProxyError {
    fn from(e: RelayError) -> Self {
        ProxyError::Relay(e)
    }
}

impl From<LoopError> for ProxyError {
    fn from(e: LoopError) -> Self {
        ProxyError::Loop(e)
    }
}

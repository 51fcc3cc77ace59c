//! Request-scoped context.
//!
//! The original implementation threads scope and trace id through an
//! ambient `context.Context`. Rust has no equivalent ambient mechanism that
//! isn't a thread-local smell, so this is an explicit value passed down the
//! call chain: accept → parse → resolve → handle → pipe.

use std::time::{Duration, Instant};

use rand::Rng;

/// Short textual label naming the subsystem emitting a log line.
pub type Scope = &'static str;

pub const SCOPE_PROXY: Scope = "PROXY";
pub const SCOPE_HTTP: Scope = "HTTP";
pub const SCOPE_HTTPS: Scope = "HTTPS";
pub const SCOPE_DNS: Scope = "DNS";

/// Per-connection context: a scope tag, a trace id, and an optional
/// deadline used as the cancellation signal for DNS lookups.
#[derive(Debug, Clone)]
pub struct RequestContext {
    scope: Scope,
    trace_id: String,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Build a fresh context for a newly accepted connection, with a new
    /// random trace id and no scope set yet.
    pub fn new() -> Self {
        RequestContext {
            scope: SCOPE_PROXY,
            trace_id: generate_trace_id(),
            deadline: None,
        }
    }

    /// Return a copy of this context tagged with a different scope.
    pub fn with_scope(&self, scope: Scope) -> Self {
        RequestContext {
            scope,
            trace_id: self.trace_id.clone(),
            deadline: self.deadline,
        }
    }

    /// Return a copy of this context with a deadline `timeout` from now.
    pub fn with_deadline(&self, timeout: Duration) -> Self {
        RequestContext {
            scope: self.scope,
            trace_id: self.trace_id.clone(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Whether the deadline, if any, has elapsed.
    pub fn is_done(&self) -> bool {
        match self.deadline {
            Some(d) => Instant::now() >= d,
            None => false,
        }
    }

    /// Time remaining before the deadline, or `None` if there isn't one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Format the `[scope] [trace_id]` prefix used on every log line this
    /// context touches.
    pub fn log_prefix(&self) -> String {
        format!("[{}] [{}]", self.scope, self.trace_id)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a v4-UUID-shaped random string, e.g.
/// `f47ac10b-58cc-4372-a567-0e02b2c3d479`, without pulling in a dedicated
/// UUID crate — only the shape matters here, not RFC 4122 conformance.
fn generate_trace_id() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_has_uuid_shape() {
        let ctx = RequestContext::new();
        let parts: Vec<&str> = ctx.trace_id().split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
    }

    #[test]
    fn with_scope_preserves_trace_id() {
        let ctx = RequestContext::new();
        let scoped = ctx.with_scope(SCOPE_DNS);
        assert_eq!(ctx.trace_id(), scoped.trace_id());
        assert_eq!(scoped.scope(), SCOPE_DNS);
    }

    #[test]
    fn deadline_reports_done_after_elapsed() {
        let ctx = RequestContext::new().with_deadline(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(ctx.is_done());
    }

    #[test]
    fn no_deadline_never_done() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_done());
        assert!(ctx.remaining().is_none());
    }
}

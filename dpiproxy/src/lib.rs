//! Library for the `dpiproxy` anti-censorship forward proxy.
//!
//! `proxy` wires everything else together: `dns` resolves domains via one
//! of three strategies, `tls`/`http` handle the two protocols this proxy
//! speaks, `net::pipe` relays bytes once a connection is routed, and
//! `handler` sits between `proxy` and the lower-level pieces for each
//! protocol.

pub mod banner;
pub mod cli;
pub mod config;
pub mod context;
pub mod dns;
pub mod error;
pub mod handler;
pub mod http;
pub mod net;
pub mod osproxy;
pub mod proxy;
pub mod tls;
pub mod version;

//! HTTP/1.1 request parsing.
//!
//! Reads one request off a byte-oriented reader, extracts the fields the
//! proxy needs to route and forward it, and provides the `tidy()`
//! normalization pass that rewrites the request line and strips the
//! `Proxy-Connection` header before the bytes go upstream.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ParseError;

/// Fixed allow-list of the 33 method names the proxy will forward.
const ALLOWED_METHODS: &[&str] = &[
    "DELETE",
    "GET",
    "HEAD",
    "POST",
    "PUT",
    "CONNECT",
    "OPTIONS",
    "TRACE",
    "COPY",
    "LOCK",
    "MKCOL",
    "MOVE",
    "PROPFIND",
    "PROPPATCH",
    "SEARCH",
    "UNLOCK",
    "BIND",
    "REBIND",
    "UNBIND",
    "ACL",
    "REPORT",
    "MKACTIVITY",
    "CHECKOUT",
    "MERGE",
    "M-SEARCH",
    "NOTIFY",
    "SUBSCRIBE",
    "UNSUBSCRIBE",
    "PATCH",
    "PURGE",
    "MKCALENDAR",
    "LINK",
    "UNLINK",
];

/// Cap on how much we'll buffer looking for the end of headers, so a
/// client that never sends `CRLF CRLF` can't grow this unbounded.
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// One parsed HTTP/1.1 request, plus the raw bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    raw: Vec<u8>,
    method: String,
    domain: String,
    port: String,
    path: String,
    version: String,
}

impl HttpRequest {
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_valid_method(&self) -> bool {
        ALLOWED_METHODS.contains(&self.method.as_str())
    }

    pub fn is_connect(&self) -> bool {
        self.method == "CONNECT"
    }

    /// Rewrite the request line to `{method} {path} {version}` and drop any
    /// header whose name has the case-sensitive prefix `Proxy-Connection:`.
    /// A no-op if `raw` contains no `CRLF CRLF`.
    pub fn tidy(&mut self) {
        let Some(split_at) = find_double_crlf(&self.raw) else {
            return;
        };

        let (head, rest) = self.raw.split_at(split_at);
        let body = &rest[4..];

        let head_str = match std::str::from_utf8(head) {
            Ok(s) => s,
            Err(_) => return,
        };

        let mut lines: Vec<&str> = head_str.split("\r\n").collect();
        let request_line = format!("{} {} {}", self.method, self.path, self.version);

        let mut rebuilt = Vec::with_capacity(self.raw.len());
        rebuilt.extend_from_slice(request_line.as_bytes());
        rebuilt.extend_from_slice(b"\r\n");

        if !lines.is_empty() {
            lines.remove(0);
        }
        for line in lines {
            if line.starts_with("Proxy-Connection:") {
                continue;
            }
            rebuilt.extend_from_slice(line.as_bytes());
            rebuilt.extend_from_slice(b"\r\n");
        }
        rebuilt.extend_from_slice(b"\r\n");
        rebuilt.extend_from_slice(body);

        self.raw = rebuilt;
    }
}

/// Find the byte offset of a `\r\n\r\n` run in `buf`, returning the offset
/// of the first `\r` of that run.
fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Read one HTTP/1.1 request off `reader`.
///
/// Buffers until a `CRLF CRLF` boundary is found (or `MAX_HEADER_BYTES` is
/// exceeded), then parses the request line and headers. Any bytes already
/// read past the header boundary (a body that arrived in the same read as
/// the headers) are preserved verbatim in `raw`.
pub async fn read_request<R>(reader: &mut R) -> Result<HttpRequest, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = find_double_crlf(&buf) {
            break pos + 4;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err(ParseError::malformed("headers too large"));
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(ParseError::malformed("unexpected EOF before end of headers"));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end - 4])
        .map_err(|e| ParseError::malformed(format!("non-utf8 header block: {}", e)))?;
    let mut lines = head.split("\r\n");

    let request_line = lines
        .next()
        .ok_or_else(|| ParseError::malformed("missing request line"))?;
    let mut parts = request_line.split(' ');
    let method = parts
        .next()
        .ok_or_else(|| ParseError::malformed("missing method"))?
        .to_string();
    let request_target = parts
        .next()
        .ok_or_else(|| ParseError::malformed("missing request target"))?;
    let version = parts
        .next()
        .ok_or_else(|| ParseError::malformed("missing HTTP version"))?
        .to_string();

    let mut host_header: Option<&str> = None;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("Host:") {
            host_header = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("host:") {
            host_header = Some(rest.trim());
        }
    }

    let authority = if method == "CONNECT" {
        request_target
    } else {
        host_header.unwrap_or(request_target)
    };

    let (domain, port) = split_host_port(authority);

    let path = if method == "CONNECT" {
        String::new()
    } else {
        normalize_path(request_target)
    };

    Ok(HttpRequest {
        raw: buf,
        method,
        domain,
        port,
        path,
        version,
    })
}

/// Split `authority` into domain and port the way `net.SplitHostPort` does:
/// if it contains `:`, split there; otherwise the whole string is the
/// domain and the port is empty. IPv6 literals (`[::1]:8080`) are handled
/// by stripping brackets before the split.
fn split_host_port(authority: &str) -> (String, String) {
    if let Some(rest) = authority.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let domain = rest[..end].to_string();
            let after = &rest[end + 1..];
            let port = after.strip_prefix(':').unwrap_or("").to_string();
            return (domain, port);
        }
    }

    match authority.rsplit_once(':') {
        Some((domain, port)) => (domain.to_string(), port.to_string()),
        None => (authority.to_string(), String::new()),
    }
}

/// Normalize a request-target into the path the upstream should see:
/// path + optional query + optional fragment, defaulting empty to `/`.
fn normalize_path(request_target: &str) -> String {
    // Absolute-form request targets (`http://host/path`) collapse to just
    // the path+query+fragment the same way `url.URL.Path` would.
    let target = if let Some(idx) = request_target.find("://") {
        match request_target[idx + 3..].find('/') {
            Some(slash) => &request_target[idx + 3 + slash..],
            None => "",
        }
    } else {
        request_target
    };

    if target.is_empty() {
        "/".to_string()
    } else {
        target.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_plain_get() {
        let raw = b"GET /foo?x=1 HTTP/1.1\r\nHost: example.com\r\nProxy-Connection: keep-alive\r\n\r\n";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        let req = read_request(&mut cursor).await.unwrap();
        assert_eq!(req.method(), "GET");
        assert_eq!(req.domain(), "example.com");
        assert_eq!(req.port(), "");
        assert_eq!(req.path(), "/foo?x=1");
        assert_eq!(req.version(), "HTTP/1.1");
        assert!(req.is_valid_method());
    }

    #[tokio::test]
    async fn parses_connect_authority() {
        let raw = b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        let req = read_request(&mut cursor).await.unwrap();
        assert!(req.is_connect());
        assert_eq!(req.domain(), "example.com");
        assert_eq!(req.port(), "443");
    }

    #[tokio::test]
    async fn empty_path_normalizes_to_slash() {
        let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        let req = read_request(&mut cursor).await.unwrap();
        assert_eq!(req.path(), "/");
    }

    #[tokio::test]
    async fn rejects_unknown_method_as_invalid_but_parses() {
        let raw = b"FROB / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        let req = read_request(&mut cursor).await.unwrap();
        assert!(!req.is_valid_method());
    }

    #[tokio::test]
    async fn tidy_rewrites_request_line_and_strips_proxy_connection() {
        let raw = b"GET http://example.com/ HTTP/1.1\r\nHost: example.com\r\nProxy-Connection: keep-alive\r\n\r\n";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        let mut req = read_request(&mut cursor).await.unwrap();
        req.tidy();
        let tidied = String::from_utf8(req.raw().to_vec()).unwrap();
        assert!(tidied.starts_with("GET / HTTP/1.1\r\n"));
        assert!(!tidied.contains("Proxy-Connection"));
        assert!(tidied.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn tidy_is_noop_without_double_crlf() {
        let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        let mut req = read_request(&mut cursor).await.unwrap();
        let before = req.raw().to_vec();
        // Corrupt raw so there's no double CRLF, exercising the no-op path
        // directly against the tidy() function rather than the reader.
        req.raw = before[..before.len() - 2].to_vec();
        let snapshot = req.raw().to_vec();
        req.tidy();
        assert_eq!(req.raw(), snapshot.as_slice());
    }

    #[test]
    fn split_host_port_handles_plain_host() {
        assert_eq!(split_host_port("example.com"), ("example.com".to_string(), "".to_string()));
    }

    #[test]
    fn split_host_port_handles_host_and_port() {
        assert_eq!(
            split_host_port("example.com:8080"),
            ("example.com".to_string(), "8080".to_string())
        );
    }

    #[test]
    fn split_host_port_handles_ipv6_literal() {
        assert_eq!(
            split_host_port("[::1]:8080"),
            ("::1".to_string(), "8080".to_string())
        );
    }
}

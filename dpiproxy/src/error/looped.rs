/// Error raised when a request would connect the proxy back to itself.
#[derive(Debug)]
pub struct LoopError {
    target: String,
}

impl LoopError {
    pub fn new(ip: std::net::IpAddr, port: u16) -> Self {
        LoopError {
            target: format!("{}:{}", ip, port),
        }
    }
}

impl std::fmt::Display for LoopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "refusing self-referential request to {}", self.target)
    }
}

impl std::error::Error for LoopError {}

/// Error raised when the upstream TCP connection cannot be established.
#[derive(Debug)]
pub struct DialError {
    addr: String,
    msg: String,
}

impl DialError {
    pub fn new(addr: impl Into<String>, err: &std::io::Error) -> Self {
        DialError {
            addr: addr.into(),
            msg: err.to_string(),
        }
    }
}

impl std::fmt::Display for DialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not dial upstream {}: {}", self.addr, self.msg)
    }
}

impl std::error::Error for DialError {}

/// Error raised by a pipe task on a mid-stream read or write failure.
///
/// This is informational only: both pipe tasks always tear down on any
/// `RelayError`, so the caller never needs to distinguish read from write
/// failures, but the direction is kept for logging.
#[derive(Debug)]
pub struct RelayError {
    direction: &'static str,
    msg: String,
}

impl RelayError {
    pub fn new(direction: &'static str, err: &std::io::Error) -> Self {
        RelayError {
            direction,
            msg: err.to_string(),
        }
    }
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "relay error ({}): {}", self.direction, self.msg)
    }
}

impl std::error::Error for RelayError {}

/// Struct to represent a short read while framing a TLS record.
#[derive(Debug)]
pub struct ShortReadStruct {
    expected: usize,
    got: usize,
}

/// Struct to represent a payload length outside the allowed range.
#[derive(Debug)]
pub struct OversizePayloadStruct {
    len: usize,
}

/// Errors raised while reading a single TLS record off the wire.
#[derive(Debug)]
pub enum FramingError {
    ShortRead(ShortReadStruct),
    OversizePayload(OversizePayloadStruct),
    Io(std::io::Error),
}

impl FramingError {
    pub fn short_read(expected: usize, got: usize) -> Self {
        FramingError::ShortRead(ShortReadStruct { expected, got })
    }

    pub fn oversize_payload(len: usize) -> Self {
        FramingError::OversizePayload(OversizePayloadStruct { len })
    }
}

impl std::fmt::Display for FramingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FramingError::ShortRead(e) => {
                write!(f, "short read framing TLS record: expected {} got {}", e.expected, e.got)
            }
            FramingError::OversizePayload(e) => {
                write!(f, "TLS record payload too large: {} bytes (max 16384)", e.len)
            }
            FramingError::Io(e) => write!(f, "I/O error framing TLS record: {}", e),
        }
    }
}

impl std::error::Error for FramingError {}

impl From<std::io::Error> for FramingError {
    fn from(err: std::io::Error) -> Self {
        FramingError::Io(err)
    }
}

/// Struct to represent a malformed HTTP message.
#[derive(Debug)]
pub struct MalformedRequestStruct {
    msg: String,
}

/// Struct to represent a rejected method token.
#[derive(Debug)]
pub struct DisallowedMethodStruct {
    method: String,
}

/// Errors raised while parsing one HTTP/1.1 request from the client.
#[derive(Debug)]
pub enum ParseError {
    Malformed(MalformedRequestStruct),
    DisallowedMethod(DisallowedMethodStruct),
}

impl ParseError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        ParseError::Malformed(MalformedRequestStruct { msg: msg.into() })
    }

    pub fn disallowed_method(method: impl Into<String>) -> Self {
        ParseError::DisallowedMethod(DisallowedMethodStruct {
            method: method.into(),
        })
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Malformed(e) => write!(f, "malformed HTTP request: {}", e.msg),
            ParseError::DisallowedMethod(e) => {
                write!(f, "method not in allow-list: {}", e.method)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::malformed(err.to_string())
    }
}

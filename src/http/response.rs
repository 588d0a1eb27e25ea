//! Responses the proxy writes on its own behalf.
//!
//! Origin responses are relayed byte-for-byte and never pass through here.

/// Written when the request line is malformed or the target is not absolute.
pub const BAD_REQUEST: &[u8] = b"HTTP/1.0 400 BAD REQUEST\r\n\r\n";

/// Written when the method is anything other than `GET`.
pub const NOT_IMPLEMENTED: &[u8] = b"HTTP/1.0 501 Not Implemented\r\n\r\n";

/// A request the proxy refuses to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    BadRequest,
    NotImplemented,
}

impl Rejection {
    pub fn status_code(self) -> u16 {
        match self {
            Rejection::BadRequest => 400,
            Rejection::NotImplemented => 501,
        }
    }

    /// Complete status line plus terminating empty line.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Rejection::BadRequest => BAD_REQUEST,
            Rejection::NotImplemented => NOT_IMPLEMENTED,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::BadRequest => write!(f, "400 Bad Request"),
            Rejection::NotImplemented => write!(f, "501 Not Implemented"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_bytes_are_fixed_status_lines() {
        assert_eq!(
            Rejection::BadRequest.as_bytes(),
            b"HTTP/1.0 400 BAD REQUEST\r\n\r\n"
        );
        assert_eq!(
            Rejection::NotImplemented.as_bytes(),
            b"HTTP/1.0 501 Not Implemented\r\n\r\n"
        );
        assert_eq!(Rejection::BadRequest.status_code(), 400);
        assert_eq!(Rejection::NotImplemented.status_code(), 501);
    }
}

//! Request line validation.
//!
//! # Responsibilities
//! - Split the request line into method, target and version tokens
//! - Require an absolute `http://` target
//! - Accept only `GET`
//!
//! # Design Decisions
//! - Tokens are borrowed from the framed request; nothing is copied
//! - Scheme and method compare ASCII case-insensitively
//! - Target shape is checked before the method, so `POST /x HTTP/1.0` is a 400

use thiserror::Error;

use crate::http::cursor::Cursor;
use crate::http::response::Rejection;

/// Scheme prefix every request target must carry.
pub const HTTP_SCHEME: &[u8] = b"http://";

/// The only method the proxy forwards.
pub const SUPPORTED_METHOD: &[u8] = b"GET";

/// Reasons a request line is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request line has {0} of 3 required tokens")]
    MissingTokens(usize),

    #[error("request target is not an absolute http:// URI")]
    NotAbsolute,

    #[error("method {0:?} is not supported")]
    UnsupportedMethod(String),
}

impl RequestError {
    /// The response the client receives for this error.
    pub fn rejection(&self) -> Rejection {
        match self {
            RequestError::MissingTokens(_) | RequestError::NotAbsolute => Rejection::BadRequest,
            RequestError::UnsupportedMethod(_) => Rejection::NotImplemented,
        }
    }
}

/// A validated request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a [u8],
    pub target: &'a [u8],
    pub version: &'a [u8],
}

impl<'a> RequestLine<'a> {
    /// Parse and validate a request line.
    ///
    /// Tokens are separated by ASCII whitespace; anything after the third token
    /// is ignored.
    pub fn parse(line: &'a [u8]) -> Result<Self, RequestError> {
        let mut cursor = Cursor::new(line);
        let mut tokens: [&[u8]; 3] = [&[]; 3];
        let mut found = 0;
        while found < tokens.len() {
            cursor.skip_whitespace();
            if cursor.is_empty() {
                break;
            }
            tokens[found] = cursor.take_until(|b| b.is_ascii_whitespace());
            found += 1;
        }
        if found < tokens.len() {
            return Err(RequestError::MissingTokens(found));
        }

        let [method, target, version] = tokens;
        if !has_http_scheme(target) {
            return Err(RequestError::NotAbsolute);
        }
        if !method.eq_ignore_ascii_case(SUPPORTED_METHOD) {
            return Err(RequestError::UnsupportedMethod(
                String::from_utf8_lossy(method).into_owned(),
            ));
        }

        Ok(Self {
            method,
            target,
            version,
        })
    }
}

fn has_http_scheme(target: &[u8]) -> bool {
    Cursor::new(target).match_prefix_ignore_case(HTTP_SCHEME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_get() {
        let line = RequestLine::parse(b"GET http://example.com/index.html HTTP/1.1\r\n").unwrap();
        assert_eq!(line.method, b"GET");
        assert_eq!(line.target, b"http://example.com/index.html");
        assert_eq!(line.version, b"HTTP/1.1");
    }

    #[test]
    fn tolerates_extra_whitespace_and_tokens() {
        let line = RequestLine::parse(b"  GET \t http://a HTTP/1.0 trailing\r\n").unwrap();
        assert_eq!(line.target, b"http://a");
        assert_eq!(line.version, b"HTTP/1.0");
    }

    #[test]
    fn missing_tokens_is_bad_request() {
        let err = RequestLine::parse(b"FOO BAR\r\n").unwrap_err();
        assert_eq!(err, RequestError::MissingTokens(2));
        assert_eq!(err.rejection(), Rejection::BadRequest);

        assert_eq!(
            RequestLine::parse(b"\r\n").unwrap_err(),
            RequestError::MissingTokens(0)
        );
    }

    #[test]
    fn origin_form_target_is_bad_request() {
        let err = RequestLine::parse(b"GET /index.html HTTP/1.1\r\n").unwrap_err();
        assert_eq!(err, RequestError::NotAbsolute);
        assert_eq!(err.rejection(), Rejection::BadRequest);

        let err = RequestLine::parse(b"GET https://example.com/ HTTP/1.1\r\n").unwrap_err();
        assert_eq!(err, RequestError::NotAbsolute);
    }

    #[test]
    fn non_get_method_is_not_implemented() {
        let err = RequestLine::parse(b"POST http://example.com/ HTTP/1.0\r\n").unwrap_err();
        assert_eq!(err, RequestError::UnsupportedMethod("POST".into()));
        assert_eq!(err.rejection(), Rejection::NotImplemented);
    }

    #[test]
    fn target_is_checked_before_method() {
        let err = RequestLine::parse(b"POST /upload HTTP/1.0\r\n").unwrap_err();
        assert_eq!(err.rejection(), Rejection::BadRequest);
    }

    #[test]
    fn scheme_and_method_ignore_case() {
        let line = RequestLine::parse(b"get HTTP://Example.com HTTP/1.0\r\n").unwrap();
        assert_eq!(line.method, b"get");
        assert_eq!(line.target, b"HTTP://Example.com");
    }
}

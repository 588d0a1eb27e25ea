//! Rewrite an absolute-URI request into an origin-relative HTTP/1.0 request.
//!
//! # Output
//! ```text
//! METHOD SP PATH SP HTTP/1.0 CRLF
//! <client headers not in IGNORED_HEADERS, in arrival order>
//! Connection: close CRLF
//! Proxy-Connection: close CRLF
//! User-Agent: <fixed> CRLF
//! CRLF
//! ```
//!
//! # Design Decisions
//! - Header names are matched by case-sensitive byte prefix, so
//!   `Connection-Extra: x` is dropped along with `Connection: x`
//! - Copied headers are forwarded byte-for-byte, no folding or merging
//! - Every header line must end in CRLF; a bare `\n` line would let an origin
//!   end the head before the injected headers, so it is refused
//! - Injected headers are always appended; rewriting an already rewritten
//!   request drops the old copies and injects them once more

use std::fmt;
use thiserror::Error;

use crate::http::cursor::Cursor;
use crate::http::framer::CRLF;
use crate::http::request::HTTP_SCHEME;
use crate::http::response::Rejection;

/// Port used when the target names none.
pub const DEFAULT_PORT: u16 = 80;

/// Path used when the target has no path component.
pub const DEFAULT_PATH: &[u8] = b"/";

/// Protocol version sent to every origin.
pub const HTTP_VERSION: &[u8] = b"HTTP/1.0";

/// Client headers that are never forwarded.
pub const IGNORED_HEADERS: [&[u8]; 3] = [b"Connection", b"Proxy-Connection", b"User-Agent"];

/// Headers appended to every forwarded request.
pub const INJECTED_HEADERS: [&[u8]; 3] = [
    b"Connection: close\r\n",
    b"Proxy-Connection: close\r\n",
    b"User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36\r\n",
];

/// Smallest possible rewritten request: `GET / HTTP/1.0` with no client headers.
pub fn min_rewritten_len() -> usize {
    let request_line = b"GET ".len() + DEFAULT_PATH.len() + 1 + HTTP_VERSION.len() + CRLF.len();
    let injected: usize = INJECTED_HEADERS.iter().map(|h| h.len()).sum();
    request_line + injected + CRLF.len()
}

/// Errors while rewriting a framed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("request target is missing the http:// scheme")]
    MissingScheme,

    #[error("request target has an empty host")]
    EmptyHost,

    #[error("request target host {0:?} is not valid UTF-8")]
    InvalidHost(String),

    #[error("request target port {0:?} is not a valid port number")]
    InvalidPort(String),

    /// A header line not terminated by CRLF, such as a bare `\n`.
    #[error("header line {0:?} is not terminated by CRLF")]
    MalformedHeader(String),

    /// The rewritten request does not fit the working buffer.
    #[error("rewritten request needs {needed} bytes but the buffer holds {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
}

impl RewriteError {
    /// The response the client receives, or `None` when the connection is
    /// simply closed.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            RewriteError::BufferTooSmall { .. } => None,
            _ => Some(Rejection::BadRequest),
        }
    }
}

/// Where a rewritten request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Origin-relative path, for logging. The forwarded bytes are in
    /// [`RewrittenRequest::bytes`].
    pub path: String,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// An origin-bound request and its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenRequest {
    pub bytes: Vec<u8>,
    pub target: Target,
}

/// Rewrite a framed request head.
///
/// `raw` starts with the request line; header processing stops at the first
/// empty line or the end of input. Fails with
/// [`RewriteError::BufferTooSmall`] when the output would exceed `capacity`.
pub fn rewrite_request(raw: &[u8], capacity: usize) -> Result<RewrittenRequest, RewriteError> {
    let mut cursor = Cursor::new(raw);
    let mut out = Vec::with_capacity(raw.len() + min_rewritten_len());

    cursor.skip_whitespace();
    let method = cursor.take_until(|b| b.is_ascii_whitespace());
    out.extend_from_slice(method);
    out.push(b' ');

    cursor.skip_whitespace();
    if !cursor.match_prefix_ignore_case(HTTP_SCHEME) {
        return Err(RewriteError::MissingScheme);
    }

    let host = cursor.take_until(|b| b == b':' || b == b'/' || b.is_ascii_whitespace());
    if host.is_empty() {
        return Err(RewriteError::EmptyHost);
    }
    let host = std::str::from_utf8(host)
        .map_err(|_| RewriteError::InvalidHost(String::from_utf8_lossy(host).into_owned()))?;

    let port = if cursor.match_byte(b':') {
        let digits = cursor.take_until(|b| b == b'/' || b.is_ascii_whitespace());
        parse_port(digits)?
    } else {
        DEFAULT_PORT
    };

    let path = if cursor.peek() == Some(b'/') {
        cursor.take_until(|b| b.is_ascii_whitespace())
    } else {
        DEFAULT_PATH
    };
    out.extend_from_slice(path);
    out.push(b' ');
    out.extend_from_slice(HTTP_VERSION);
    out.extend_from_slice(CRLF);

    // The client's version token is not forwarded.
    cursor.take_line();

    while !cursor.is_empty() {
        let line = cursor.take_line();
        if line == CRLF {
            break;
        }
        if !line.ends_with(CRLF) {
            return Err(RewriteError::MalformedHeader(
                String::from_utf8_lossy(line).into_owned(),
            ));
        }
        if is_ignored(line) {
            continue;
        }
        out.extend_from_slice(line);
    }

    for header in INJECTED_HEADERS {
        out.extend_from_slice(header);
    }
    out.extend_from_slice(CRLF);

    if out.len() > capacity {
        return Err(RewriteError::BufferTooSmall {
            needed: out.len(),
            capacity,
        });
    }

    Ok(RewrittenRequest {
        bytes: out,
        target: Target {
            host: host.to_owned(),
            port,
            path: String::from_utf8_lossy(path).into_owned(),
        },
    })
}

fn is_ignored(line: &[u8]) -> bool {
    IGNORED_HEADERS.iter().any(|name| line.starts_with(name))
}

fn parse_port(digits: &[u8]) -> Result<u16, RewriteError> {
    let invalid = || RewriteError::InvalidPort(String::from_utf8_lossy(digits).into_owned());
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .filter(|&port| port != 0)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36\r\n";

    fn injected() -> String {
        format!("Connection: close\r\nProxy-Connection: close\r\n{UA}")
    }

    fn rewrite(raw: &str) -> RewrittenRequest {
        rewrite_request(raw.as_bytes(), 64_000).unwrap()
    }

    fn text(req: &RewrittenRequest) -> &str {
        std::str::from_utf8(&req.bytes).unwrap()
    }

    #[test]
    fn rewrites_absolute_request() {
        let req = rewrite(
            "GET http://example.com/index.html HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test\r\n\r\n",
        );
        assert_eq!(
            text(&req),
            format!("GET /index.html HTTP/1.0\r\nHost: example.com\r\n{}\r\n", injected())
        );
        assert_eq!(
            req.target,
            Target {
                host: "example.com".into(),
                port: 80,
                path: "/index.html".into(),
            }
        );
    }

    #[test]
    fn explicit_port_is_extracted() {
        let req = rewrite("GET http://localhost:8081/a/b?q=1 HTTP/1.0\r\n\r\n");
        assert_eq!(req.target.host, "localhost");
        assert_eq!(req.target.port, 8081);
        assert_eq!(req.target.path, "/a/b?q=1");
        assert!(text(&req).starts_with("GET /a/b?q=1 HTTP/1.0\r\n"));
    }

    #[test]
    fn missing_path_defaults_to_root() {
        let req = rewrite("GET http://example.com HTTP/1.0\r\n\r\n");
        assert_eq!(text(&req), format!("GET / HTTP/1.0\r\n{}\r\n", injected()));
        assert_eq!(req.target.port, DEFAULT_PORT);
        assert_eq!(req.target.path, "/");
    }

    #[test]
    fn port_without_path_defaults_to_root() {
        let req = rewrite("GET http://example.com:8080 HTTP/1.0\r\n\r\n");
        assert_eq!(req.target.port, 8080);
        assert!(text(&req).starts_with("GET / HTTP/1.0\r\n"));
    }

    #[test]
    fn ignored_headers_dropped_by_prefix() {
        let req = rewrite(concat!(
            "GET http://h/ HTTP/1.1\r\n",
            "Connection: keep-alive\r\n",
            "Accept: */*\r\n",
            "Proxy-Connection: keep-alive\r\n",
            "Connection-Extra: yes\r\n",
            "User-Agentish: x\r\n",
            "X-Weird:   spaced\tvalue;;\r\n",
            "connection: lower-case-survives\r\n",
            "\r\n",
        ));
        assert_eq!(
            text(&req),
            format!(
                "GET / HTTP/1.0\r\nAccept: */*\r\nX-Weird:   spaced\tvalue;;\r\nconnection: lower-case-survives\r\n{}\r\n",
                injected()
            )
        );
    }

    #[test]
    fn copied_headers_keep_order_and_duplicates() {
        let req = rewrite("GET http://h/ HTTP/1.1\r\nB: 2\r\nA: 1\r\nB: 3\r\n\r\n");
        assert_eq!(
            text(&req),
            format!("GET / HTTP/1.0\r\nB: 2\r\nA: 1\r\nB: 3\r\n{}\r\n", injected())
        );
    }

    #[test]
    fn rewriting_twice_reinjects_once() {
        let first = rewrite("GET http://h/x HTTP/1.1\r\nA: b\r\nUser-Agent: curl\r\n\r\n");
        let headers = text(&first).split_once("\r\n").unwrap().1;
        let again = format!("GET http://h/x HTTP/1.0\r\n{headers}");

        let second = rewrite(&again);
        assert_eq!(text(&second), text(&first));
        assert_eq!(text(&second).matches("Connection: close\r\n").count(), 2);
        assert_eq!(text(&second).matches("Proxy-Connection: close\r\n").count(), 1);
        assert_eq!(text(&second).matches("User-Agent: ").count(), 1);
    }

    #[test]
    fn stops_at_empty_line() {
        let req = rewrite("GET http://h/ HTTP/1.0\r\nA: 1\r\n\r\nB: body\r\n");
        assert!(!text(&req).contains("B: body"));
    }

    #[test]
    fn method_is_copied_verbatim() {
        let req = rewrite("  get   HTTP://Host/p HTTP/1.0\r\n\r\n");
        assert!(text(&req).starts_with("get /p HTTP/1.0\r\n"));
        assert_eq!(req.target.host, "Host");
    }

    #[test]
    fn malformed_targets_are_bad_requests() {
        let cases: [(&[u8], RewriteError); 7] = [
            (b"GET /relative HTTP/1.0\r\n\r\n", RewriteError::MissingScheme),
            (b"GET http:///path HTTP/1.0\r\n\r\n", RewriteError::EmptyHost),
            (b"GET http://h:http/ HTTP/1.0\r\n\r\n", RewriteError::InvalidPort("http".into())),
            (b"GET http://h:99999/ HTTP/1.0\r\n\r\n", RewriteError::InvalidPort("99999".into())),
            (b"GET http://h:+81/ HTTP/1.0\r\n\r\n", RewriteError::InvalidPort("+81".into())),
            (b"GET http://h:0/ HTTP/1.0\r\n\r\n", RewriteError::InvalidPort("0".into())),
            (b"GET http://h:/ HTTP/1.0\r\n\r\n", RewriteError::InvalidPort("".into())),
        ];
        for (raw, expected) in cases {
            let err = rewrite_request(raw, 64_000).unwrap_err();
            assert_eq!(err, expected);
            assert_eq!(err.rejection(), Some(Rejection::BadRequest));
        }
    }

    #[test]
    fn header_without_crlf_is_refused() {
        let smuggled = b"GET http://h/ HTTP/1.0\r\nA: 1\r\n\nX: smuggled\r\n\r\n";
        let err = rewrite_request(smuggled, 64_000).unwrap_err();
        assert_eq!(err, RewriteError::MalformedHeader("\n".into()));
        assert_eq!(err.rejection(), Some(Rejection::BadRequest));

        let lf_only = b"GET http://h/ HTTP/1.0\r\nA: 1\n\r\n";
        assert_eq!(
            rewrite_request(lf_only, 64_000).unwrap_err(),
            RewriteError::MalformedHeader("A: 1\n".into())
        );
    }

    #[test]
    fn capacity_overrun_fails_only_with_error() {
        let raw = b"GET http://h/ HTTP/1.0\r\nX-Pad: 0123456789\r\n\r\n";
        let needed = rewrite_request(raw, usize::MAX).unwrap().bytes.len();

        assert!(rewrite_request(raw, needed).is_ok());
        let err = rewrite_request(raw, needed - 1).unwrap_err();
        assert_eq!(
            err,
            RewriteError::BufferTooSmall {
                needed,
                capacity: needed - 1
            }
        );
        assert_eq!(err.rejection(), None);
    }

    #[test]
    fn minimum_length_matches_bare_request() {
        let req = rewrite("GET http://h HTTP/1.0\r\n\r\n");
        assert_eq!(req.bytes.len(), min_rewritten_len());
    }
}

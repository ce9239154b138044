//! Cached response decorator
//!
//! [`CachedResponse`] reads the wrapped body once, on first use, and then
//! serves every [`Response::body`] call from an owned buffer through a fresh
//! reader at offset zero. How the original stream ended is remembered: a
//! clean end replays as EOF, a read error replays as an error of the same
//! kind and message once the buffered prefix is exhausted.

use std::any::Any;
use std::io::{self, Read};

use http::HeaderMap;

use crate::ports::Response;

/// How the wrapped body stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Terminal {
    Eof,
    Error { kind: io::ErrorKind, message: String },
}

#[derive(Debug)]
struct BodyCache {
    bytes: Vec<u8>,
    terminal: Terminal,
}

impl BodyCache {
    fn read_from(mut reader: impl Read) -> Self {
        let mut bytes = Vec::new();
        let terminal = match reader.read_to_end(&mut bytes) {
            Ok(_) => Terminal::Eof,
            Err(e) => Terminal::Error {
                kind: e.kind(),
                message: e.to_string(),
            },
        };
        Self { bytes, terminal }
    }
}

/// A response whose body can be read any number of times.
///
/// Single owner: the first read needs `&mut self`.
pub struct CachedResponse {
    inner: Box<dyn Response>,
    cache: Option<BodyCache>,
}

impl CachedResponse {
    /// Wraps a response. Nothing is read until the body is first requested.
    #[must_use]
    pub fn new(inner: Box<dyn Response>) -> Self {
        Self { inner, cache: None }
    }

    fn cache(&mut self) -> &BodyCache {
        let inner = &mut self.inner;
        self.cache
            .get_or_insert_with(|| BodyCache::read_from(inner.body()))
    }

    /// The buffered body bytes (the prefix read before any error).
    pub fn bytes(&mut self) -> &[u8] {
        &self.cache().bytes
    }

    /// The buffered body as text, with invalid UTF-8 replaced.
    pub fn text(&mut self) -> String {
        String::from_utf8_lossy(self.bytes()).into_owned()
    }

    /// Returns the wrapped response.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn Response> {
        self.inner
    }
}

impl std::fmt::Debug for CachedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedResponse")
            .field("status_code", &self.inner.status_code())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Response for CachedResponse {
    fn status_code(&self) -> u16 {
        self.inner.status_code()
    }

    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn body(&mut self) -> Box<dyn Read + '_> {
        let cache = self.cache();
        Box::new(CachedReader {
            bytes: &cache.bytes,
            terminal: &cache.terminal,
            pos: 0,
        })
    }

    fn raw(&self) -> &dyn Any {
        self.inner.raw()
    }
}

/// Independent cursor over a [`CachedResponse`] buffer.
struct CachedReader<'a> {
    bytes: &'a [u8],
    terminal: &'a Terminal,
    pos: usize,
}

impl Read for CachedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let remaining = &self.bytes[self.pos..];
        if remaining.is_empty() {
            return match self.terminal {
                Terminal::Eof => Ok(0),
                Terminal::Error { kind, message } => Err(io::Error::new(*kind, message.clone())),
            };
        }
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FailingReader, StubResponse};
    use pretty_assertions::assert_eq;
    use restit_domain::JsonType;

    fn read_all(resp: &mut dyn Response) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        resp.body().read_to_end(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_plain_body_is_single_consumption() {
        let mut resp = StubResponse::new(200, r#"{"a":1}"#);
        assert_eq!(read_all(&mut resp).unwrap(), br#"{"a":1}"#.to_vec());
        assert_eq!(read_all(&mut resp).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_cached_body_is_repeatable() {
        let mut resp = CachedResponse::new(Box::new(StubResponse::new(200, r#"{"a":1}"#)));
        for _ in 0..3 {
            assert_eq!(read_all(&mut resp).unwrap(), br#"{"a":1}"#.to_vec());
        }
        assert_eq!(resp.text(), r#"{"a":1}"#);
    }

    #[test]
    fn test_cached_json_is_repeatable() {
        let mut resp = CachedResponse::new(Box::new(StubResponse::new(200, r#"{"a":[1,2]}"#)));
        let first = resp.json().unwrap();
        let second = resp.json().unwrap();
        assert_eq!(first.raw(), second.raw());
        assert_eq!(second.get("a").json_type(), JsonType::Array);
    }

    #[test]
    fn test_readers_are_independent() {
        let mut resp = CachedResponse::new(Box::new(StubResponse::new(200, "abcdef")));
        let mut head = [0u8; 3];
        {
            let mut reader = resp.body();
            reader.read_exact(&mut head).unwrap();
        }
        assert_eq!(&head, b"abc");
        assert_eq!(read_all(&mut resp).unwrap(), b"abcdef".to_vec());
    }

    #[test]
    fn test_read_error_is_replayed_after_prefix() {
        let failing = FailingReader::new(b"partial", io::ErrorKind::ConnectionReset, "peer hung up");
        let mut resp = CachedResponse::new(Box::new(StubResponse::with_reader(500, failing)));

        for _ in 0..2 {
            let mut out = Vec::new();
            let err = resp.body().read_to_end(&mut out).unwrap_err();
            assert_eq!(out, b"partial".to_vec());
            assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
            assert_eq!(err.to_string(), "peer hung up");
        }
        assert_eq!(resp.bytes(), b"partial");
        assert!(resp.json().is_err());
    }

    #[test]
    fn test_delegates_status_and_headers() {
        let resp = CachedResponse::new(Box::new(
            StubResponse::new(201, "").with_header("x-request-id", "abc"),
        ));
        assert_eq!(resp.status_code(), 201);
        assert_eq!(resp.headers()["x-request-id"], "abc");
        assert!(resp.raw().downcast_ref::<&'static str>().is_some());
    }
}

//! In-memory responses for unit tests.

use std::any::Any;
use std::io::{self, Cursor, Read};

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::ports::Response;

/// A response over an arbitrary single-consumption reader.
pub struct StubResponse {
    status: u16,
    headers: HeaderMap,
    body: Box<dyn Read + Send>,
    label: &'static str,
}

impl StubResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::with_reader(status, Cursor::new(body.into()))
    }

    pub fn with_reader(status: u16, reader: impl Read + Send + 'static) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Box::new(reader),
            label: "stub",
        }
    }

    #[allow(clippy::unwrap_used)]
    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.append(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }
}

impl Response for StubResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&mut self) -> Box<dyn Read + '_> {
        Box::new(&mut self.body)
    }

    fn raw(&self) -> &dyn Any {
        &self.label
    }
}

/// Yields `data`, then fails with the given error on every later read.
pub struct FailingReader {
    data: Cursor<Vec<u8>>,
    kind: io::ErrorKind,
    message: &'static str,
}

impl FailingReader {
    pub fn new(data: &[u8], kind: io::ErrorKind, message: &'static str) -> Self {
        Self {
            data: Cursor::new(data.to_vec()),
            kind,
            message,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 if !buf.is_empty() => Err(io::Error::new(self.kind, self.message)),
            n => Ok(n),
        }
    }
}

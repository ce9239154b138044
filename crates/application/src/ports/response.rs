//! Response port

use std::any::Any;
use std::io::{self, Read};

use http::HeaderMap;
use restit_domain::json::Node;

/// A response produced by a [`Handler`](super::Handler).
///
/// The body of a plain implementation is a single-consumption stream: a
/// second call to [`Response::body`] may yield nothing. Wrap it in a
/// [`CachedResponse`](crate::response::CachedResponse) to read it more than
/// once.
pub trait Response: Send {
    /// HTTP status code.
    fn status_code(&self) -> u16;

    /// Response headers.
    fn headers(&self) -> &HeaderMap;

    /// Body stream.
    fn body(&mut self) -> Box<dyn Read + '_>;

    /// The transport's own response value, for debugging.
    fn raw(&self) -> &dyn Any;

    /// Decodes the body into a JSON node.
    ///
    /// Content that is not JSON still yields a node (of type
    /// [`JsonType::Unknown`](restit_domain::JsonType::Unknown)).
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while reading the body.
    fn json(&mut self) -> io::Result<Node> {
        Node::decode(self.body())
    }
}

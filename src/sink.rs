use crate::error::HijackError;
use http::{HeaderMap, Request, StatusCode};
use std::io::{self, Read, Write};

/// A raw, bidirectional connection handed over by [`Hijack::hijack`].
pub trait Connection: Read + Write + Send {}

impl<T: Read + Write + Send> Connection for T {}

/// Connection takeover capability of a sink.
pub trait Hijack {
    /// Takes over the underlying connection.
    fn hijack(&mut self) -> Result<Box<dyn Connection>, HijackError>;
}

/// Explicit flush capability of a sink.
pub trait Flush {
    /// Flushes buffered output to the client.
    fn flush(&mut self) -> io::Result<()>;
}

/// Where a handler writes its response.
///
/// Optional capabilities are queried at call time through [`hijacker`] and
/// [`flusher`]; sinks that lack one keep the default `None`.
///
/// [`hijacker`]: ResponseSink::hijacker
/// [`flusher`]: ResponseSink::flusher
pub trait ResponseSink {
    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for modification.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sets the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Writes part of the response body.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Returns the connection takeover capability, if supported.
    fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
        None
    }

    /// Returns the flush capability, if supported.
    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        None
    }

    /// Name of the concrete sink type, used in diagnostics.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<W: ResponseSink + ?Sized> ResponseSink for &mut W {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
        (**self).hijacker()
    }

    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        (**self).flusher()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

/// A downstream handler invoked with a request and the sink to answer on.
pub trait Handler<B> {
    /// Handles one request.
    fn serve(&self, request: Request<B>, sink: &mut dyn ResponseSink);
}

impl<B, F> Handler<B> for F
where
    F: Fn(Request<B>, &mut dyn ResponseSink),
{
    fn serve(&self, request: Request<B>, sink: &mut dyn ResponseSink) {
        self(request, sink)
    }
}

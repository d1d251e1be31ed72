use crate::error::HijackError;
use crate::sink::{Connection, Flush, Hijack, ResponseSink};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use std::io;

/// A response sink that buffers the body instead of sending it.
///
/// Status and body writes stay in memory until [`into_parts`] hands them to
/// the caller. Headers are the real sink's own header map. Connection
/// takeover and flushing are delegated to the real sink when it supports
/// them.
///
/// [`into_parts`]: ResponseCapture::into_parts
#[derive(Debug, Default)]
pub struct ResponseCapture<W> {
    inner: W,
    status: Option<StatusCode>,
    body: BytesMut,
}

impl<W: ResponseSink> ResponseCapture<W> {
    /// Creates a capture in front of the given real sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            status: None,
            body: BytesMut::new(),
        }
    }

    /// Returns the recorded status, if any was set or implied.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the body captured so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns a reference to the real sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Takes over the real sink's connection.
    ///
    /// Buffering no longer applies once the connection is taken.
    pub fn hijack(&mut self) -> Result<Box<dyn Connection>, HijackError> {
        // Name the sink before borrowing it for the capability query
        let kind = self.inner.kind();
        match self.inner.hijacker() {
            Some(hijacker) => hijacker.hijack(),
            None => Err(HijackError::Unsupported { kind }),
        }
    }

    /// Flushes the real sink if it can be flushed.
    pub fn flush(&mut self) -> io::Result<()> {
        match self.inner.flusher() {
            Some(flusher) => flusher.flush(),
            None => Ok(()),
        }
    }

    /// Consumes the capture, returning the real sink and the captured body.
    pub fn into_parts(self) -> (W, Bytes) {
        (self.inner, self.body.freeze())
    }

    pub(crate) fn append(&mut self, buf: &[u8]) {
        // A body without an explicit status implies 200 OK
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
    }
}

impl<W: ResponseSink> ResponseSink for ResponseCapture<W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        // First status wins; nothing is forwarded.
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
        Some(self)
    }

    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        Some(self)
    }

    fn kind(&self) -> &'static str {
        self.inner.kind()
    }
}

impl<W: ResponseSink> Hijack for ResponseCapture<W> {
    fn hijack(&mut self) -> Result<Box<dyn Connection>, HijackError> {
        ResponseCapture::hijack(self)
    }
}

impl<W: ResponseSink> Flush for ResponseCapture<W> {
    fn flush(&mut self) -> io::Result<()> {
        ResponseCapture::flush(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::BufferedResponse;
    use http::header;
    use std::io::{Cursor, Read, Write};

    /// A real sink with both optional capabilities.
    #[derive(Default)]
    struct CapableSink {
        headers: HeaderMap,
        written: Vec<u8>,
        status: Option<StatusCode>,
        flushes: usize,
        hijacked: bool,
    }

    impl ResponseSink for CapableSink {
        fn headers(&self) -> &HeaderMap {
            &self.headers
        }

        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn set_status(&mut self, status: StatusCode) {
            self.status = Some(status);
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
            Some(self)
        }

        fn flusher(&mut self) -> Option<&mut dyn Flush> {
            Some(self)
        }
    }

    impl Hijack for CapableSink {
        fn hijack(&mut self) -> Result<Box<dyn Connection>, HijackError> {
            self.hijacked = true;
            Ok(Box::new(Cursor::new(b"raw".to_vec())))
        }
    }

    impl Flush for CapableSink {
        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_write_implies_ok_status() {
        let mut capture = ResponseCapture::new(BufferedResponse::new());
        assert_eq!(capture.status(), None);

        capture.write(b"hello").unwrap();
        assert_eq!(capture.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_first_status_is_kept() {
        let mut capture = ResponseCapture::new(BufferedResponse::new());
        capture.set_status(StatusCode::CREATED);
        capture.set_status(StatusCode::NOT_FOUND);
        capture.write(b"body").unwrap();

        assert_eq!(capture.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_nothing_reaches_real_sink() {
        let mut sink = CapableSink::default();
        let mut capture = ResponseCapture::new(&mut sink);
        capture.set_status(StatusCode::ACCEPTED);
        capture.write(b"hello ").unwrap();
        capture.write(b"world").unwrap();

        let (_, body) = capture.into_parts();
        assert_eq!(body, Bytes::from("hello world"));
        assert!(sink.written.is_empty());
        assert_eq!(sink.status, None);
    }

    #[test]
    fn test_headers_are_shared_with_real_sink() {
        let mut sink = CapableSink::default();
        let mut capture = ResponseCapture::new(&mut sink);
        capture
            .headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        drop(capture);

        assert_eq!(
            sink.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_hijack_delegates_to_real_sink() {
        let mut sink = CapableSink::default();
        let mut capture = ResponseCapture::new(&mut sink);

        let mut conn = capture.hijack().unwrap();
        let mut raw = String::new();
        conn.read_to_string(&mut raw).unwrap();
        conn.write_all(b"upgrade").unwrap();
        drop(conn);
        drop(capture);

        assert_eq!(raw, "raw");
        assert!(sink.hijacked);
    }

    #[test]
    fn test_hijack_unsupported_names_sink() {
        let mut capture = ResponseCapture::new(BufferedResponse::new());

        match capture.hijack() {
            Err(HijackError::Unsupported { kind }) => {
                assert!(kind.ends_with("BufferedResponse"), "unexpected kind {kind}");
            }
            _ => panic!("Expected unsupported hijack"),
        }
    }

    #[test]
    fn test_hijack_through_capability_query() {
        let mut sink = CapableSink::default();
        let mut capture = ResponseCapture::new(&mut sink);
        let dyn_sink: &mut dyn ResponseSink = &mut capture;

        assert!(dyn_sink.hijacker().unwrap().hijack().is_ok());
        drop(capture);

        assert!(sink.hijacked);
    }

    #[test]
    fn test_flush_delegates_when_supported() {
        let mut sink = CapableSink::default();
        let mut capture = ResponseCapture::new(&mut sink);
        capture.flush().unwrap();
        capture.flusher().unwrap().flush().unwrap();
        drop(capture);

        assert_eq!(sink.flushes, 2);
    }

    #[test]
    fn test_flush_is_noop_when_unsupported() {
        let mut capture = ResponseCapture::new(BufferedResponse::new());
        capture.write(b"pending").unwrap();

        assert!(capture.flush().is_ok());
        assert_eq!(capture.body(), b"pending");
    }
}

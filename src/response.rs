use crate::sink::ResponseSink;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode, Version, header};
use http_body_util::Full;
use std::io;

/// An in-memory real sink that assembles an [`http::Response`].
///
/// The last status set before [`into_response`] wins and defaults to
/// `200 OK`. It supports neither connection takeover nor flushing.
///
/// [`into_response`]: BufferedResponse::into_response
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    version: Version,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedResponse {
    /// Creates an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a response that starts from existing headers.
    pub fn with_headers(version: Version, headers: HeaderMap) -> Self {
        Self {
            version,
            headers,
            ..Self::default()
        }
    }

    /// Returns the status the response would be sent with.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns the body written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Assembles the final response.
    ///
    /// `Content-Length` is dropped since the body no longer matches whatever
    /// length the upstream announced.
    pub fn into_response(mut self) -> Response<Full<Bytes>> {
        let status = self.status();
        self.headers.remove(header::CONTENT_LENGTH);

        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for BufferedResponse {
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
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

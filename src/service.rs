use crate::future::ResponseFuture;
use crate::redirect::{RegexRedirect, disable_compression};
use http::Request;
use http_body::Body;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// A Tower service that buffers the inner service's response and redirects
/// to the first URL found in it.
#[derive(Debug, Clone)]
pub struct RegexRedirectService<S> {
    inner: S,
    redirect: Arc<RegexRedirect>,
}

impl<S> RegexRedirectService<S> {
    /// Creates a new service wrapping the given inner service.
    pub fn new(inner: S, redirect: Arc<RegexRedirect>) -> Self {
        Self { inner, redirect }
    }

    /// Returns the shared redirect logic.
    pub fn redirect(&self) -> &Arc<RegexRedirect> {
        &self.redirect
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner service.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes this service, returning the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RegexRedirectService<S>
where
    S: Service<Request<ReqBody>, Response = http::Response<ResBody>>,
    ResBody: Body,
    ResBody::Error: std::fmt::Display,
{
    type Response = http::Response<http_body_util::Full<bytes::Bytes>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        disable_compression(req.headers_mut());

        let inner = self.inner.call(req);

        ResponseFuture::new(inner, Arc::clone(&self.redirect))
    }
}

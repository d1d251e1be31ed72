use crate::capture::ResponseCapture;
use crate::redirect::RegexRedirect;
use crate::response::BufferedResponse;
use crate::sink::ResponseSink;
use bytes::{Buf, Bytes};
use http::{Response, StatusCode};
use http_body::Body;
use http_body_util::Full;
use pin_project_lite::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

pin_project! {
    /// Future for redirect service responses.
    ///
    /// Resolves once the inner response body has been read to the end.
    pub struct ResponseFuture<F, B> {
        #[pin]
        state: State<F, B>,
        redirect: Arc<RegexRedirect>,
    }
}

pin_project! {
    #[project = StateProj]
    enum State<F, B> {
        /// Waiting for the inner service.
        Waiting {
            #[pin]
            future: F,
        },
        /// Reading the inner body into the capture.
        Capturing {
            #[pin]
            body: B,
            capture: ResponseCapture<BufferedResponse>,
        },
        Done,
    }
}

impl<F, B> ResponseFuture<F, B> {
    pub(crate) fn new(inner: F, redirect: Arc<RegexRedirect>) -> Self {
        Self {
            state: State::Waiting { future: inner },
            redirect,
        }
    }
}

impl<F, B, E> Future for ResponseFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body,
    B::Error: fmt::Display,
{
    type Output = Result<Response<Full<Bytes>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            match this.state.as_mut().project() {
                StateProj::Waiting { future } => {
                    let response = match ready!(future.poll(cx)) {
                        Ok(response) => response,
                        Err(e) => {
                            this.state.set(State::Done);
                            return Poll::Ready(Err(e));
                        }
                    };

                    // Replay the upstream status and headers into the capture
                    let (parts, body) = response.into_parts();
                    let mut capture = ResponseCapture::new(BufferedResponse::with_headers(
                        parts.version,
                        parts.headers,
                    ));
                    capture.set_status(parts.status);

                    this.state.set(State::Capturing { body, capture });
                }

                StateProj::Capturing { mut body, capture } => {
                    match ready!(body.as_mut().poll_frame(cx)) {
                        Some(Ok(frame)) => {
                            if let Ok(data) = frame.into_data() {
                                append_data(capture, data);
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                middleware = %this.redirect.name(),
                                error = %e,
                                "upstream body failed while capturing"
                            );
                            this.state.set(State::Done);
                            return Poll::Ready(Ok(bad_gateway()));
                        }
                        None => {
                            // Body complete, decide on the full capture
                            let (mut sink, captured) = std::mem::take(capture).into_parts();
                            this.state.set(State::Done);

                            this.redirect.respond(&mut sink, &captured);
                            return Poll::Ready(Ok(sink.into_response()));
                        }
                    }
                }

                StateProj::Done => panic!("ResponseFuture polled after completion"),
            }
        }
    }
}

/// Appends every chunk of a data frame to the capture.
fn append_data<D: Buf>(capture: &mut ResponseCapture<BufferedResponse>, mut data: D) {
    while data.has_remaining() {
        let chunk = data.chunk();
        let len = chunk.len();
        capture.append(chunk);
        data.advance(len);
    }
}

fn bad_gateway() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::default());
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}

use crate::capture::ResponseCapture;
use crate::config::Config;
use crate::error::{BuildError, TargetError};
use crate::sink::{Handler, ResponseSink};
use crate::target::RedirectTarget;
use http::{HeaderMap, HeaderValue, Request, StatusCode, header};
use regex::bytes::{Regex, RegexBuilder};

/// Body written after the captured bytes when the upstream encoding is rejected.
pub const UNSUPPORTED_ENCODING_MESSAGE: &str = "Content encoding not supported";

const IDENTITY: &str = "identity";

/// Outcome of inspecting one captured response.
#[derive(Debug)]
pub enum Decision {
    /// The body matched and the match parsed as a URL reference.
    Redirect(RedirectTarget),
    /// The upstream used a content encoding that cannot be scanned.
    EncodingRejected,
    /// Nothing in the body matched.
    NoMatch,
    /// The match could not be parsed as a URL reference.
    MalformedMatch(TargetError),
}

impl Decision {
    /// Short name of the outcome, for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Redirect(_) => "redirect",
            Decision::EncodingRejected => "encoding_rejected",
            Decision::NoMatch => "no_match",
            Decision::MalformedMatch(_) => "malformed_match",
        }
    }
}

/// Redirects to the first URL an upstream response body contains.
///
/// One instance serves every request of a route; it holds no per-request
/// state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct RegexRedirect {
    name: String,
    regex: Regex,
}

impl RegexRedirect {
    /// Compiles the configured pattern.
    ///
    /// Perl classes such as `\w`, `\s` and `\b` are ASCII-only; a pattern
    /// can opt back into Unicode with `(?u)`.
    pub fn new(config: &Config, name: impl Into<String>) -> Result<Self, BuildError> {
        let regex = RegexBuilder::new(&config.regex)
            .unicode(false)
            .build()
            .map_err(|source| BuildError::InvalidPattern {
                pattern: config.regex.clone(),
                source,
            })?;

        Ok(Self {
            name: name.into(),
            regex,
        })
    }

    /// Returns the name this instance was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handles one request: runs `next` against a capture, then answers on `sink`.
    pub fn handle<B, W, H>(&self, mut request: Request<B>, sink: &mut W, next: &H)
    where
        W: ResponseSink + ?Sized,
        H: Handler<B> + ?Sized,
    {
        disable_compression(request.headers_mut());

        // Run the upstream against the capture; nothing reaches the client yet
        let mut capture = ResponseCapture::new(&mut *sink);
        next.serve(request, &mut capture);
        let (_, body) = capture.into_parts();

        self.respond(sink, &body);
    }

    /// Classifies a finished response from its headers and full body.
    pub fn decide(&self, headers: &HeaderMap, body: &[u8]) -> Decision {
        // Compressed bytes cannot be scanned
        if is_encoded(headers) {
            return Decision::EncodingRejected;
        }

        // Leftmost-first match over the whole body
        let Some(found) = self.regex.find(body) else {
            return Decision::NoMatch;
        };

        match RedirectTarget::parse(found.as_bytes()) {
            Ok(target) => Decision::Redirect(target),
            Err(err) => Decision::MalformedMatch(err),
        }
    }

    /// Writes the decided response for `body` to the real sink.
    pub(crate) fn respond<W>(&self, sink: &mut W, body: &[u8])
    where
        W: ResponseSink + ?Sized,
    {
        let decision = self.decide(sink.headers(), body);
        tracing::debug!(
            middleware = %self.name,
            outcome = decision.as_str(),
            captured = body.len(),
            "inspected upstream response"
        );

        match decision {
            Decision::EncodingRejected => {
                // Captured bytes go out before the status; both writes always happen.
                if let Err(err) = sink.write(body) {
                    tracing::warn!(
                        middleware = %self.name,
                        error = %err,
                        "failed to forward body with unsupported content encoding"
                    );
                }
                sink.set_status(StatusCode::UNPROCESSABLE_ENTITY);
                if let Err(err) = sink.write(UNSUPPORTED_ENCODING_MESSAGE.as_bytes()) {
                    tracing::warn!(middleware = %self.name, error = %err, "failed to write diagnostic");
                }
            }
            Decision::NoMatch => sink.set_status(StatusCode::NOT_FOUND),
            Decision::MalformedMatch(err) => {
                sink.set_status(StatusCode::NOT_FOUND);
                if let Err(write_err) = sink.write(err.to_string().as_bytes()) {
                    tracing::warn!(middleware = %self.name, error = %write_err, "failed to write diagnostic");
                }
            }
            Decision::Redirect(target) => {
                // Location goes on the real headers, next to whatever the upstream set
                sink.headers_mut()
                    .insert(header::LOCATION, target.header_value().clone());
                sink.set_status(StatusCode::TEMPORARY_REDIRECT);
            }
        }
    }
}

/// Steers the upstream away from compressing its response.
pub(crate) fn disable_compression(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static(IDENTITY),
    );
}

/// Checks for a non-empty Content-Encoding other than `identity`.
fn is_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .is_some_and(|v| !v.is_empty() && v.as_bytes() != IDENTITY.as_bytes())
}

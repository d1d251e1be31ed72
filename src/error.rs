use std::io;
use std::str::Utf8Error;

/// Error returned when a [`RegexRedirect`](crate::RegexRedirect) cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The configured pattern does not compile.
    #[error("invalid redirect pattern {pattern:?}")]
    InvalidPattern {
        /// The pattern as configured.
        pattern: String,
        /// The compiler's diagnostic.
        #[source]
        source: regex::Error,
    },
}

/// Error returned by a connection takeover.
#[derive(Debug, thiserror::Error)]
pub enum HijackError {
    /// The real sink cannot hand over its connection.
    #[error("{kind} does not support connection hijacking")]
    Unsupported {
        /// Concrete type name of the real sink.
        kind: &'static str,
    },
    /// The real sink supports takeover but it failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reason a matched substring could not be used as a redirect target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The match is not valid UTF-8.
    #[error("matched bytes are not valid UTF-8: {0}")]
    NotUtf8(#[from] Utf8Error),
    /// The match starts with `:`.
    #[error("missing protocol scheme")]
    MissingScheme,
    /// A scheme-less reference whose first path segment contains `:`.
    #[error("first path segment in URL cannot contain colon")]
    ColonInFirstSegment,
    /// A `%` not followed by two hex digits.
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
    /// The reference is syntactically invalid.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// The normalized reference is not a valid header value.
    #[error("redirect target is not a valid header value")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

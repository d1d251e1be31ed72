//! Regex-driven redirect middleware.
//!
//! This crate buffers an upstream HTTP response in full, searches its raw body
//! for the first match of a configured regular expression and answers with a
//! `307 Temporary Redirect` to that match, read as a URL reference.
//!
//! # Example
//!
//! ```ignore
//! use regex_redirect::{Config, RegexRedirectLayer};
//! use tower::ServiceBuilder;
//!
//! let layer = RegexRedirectLayer::new(&Config::new(r#"\w+:(\/?\/?)[^\s"]+"#), "regex2redirect")?;
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(my_service);
//! ```
//!
//! The same logic is available without Tower through
//! [`RegexRedirect::handle`], which runs a [`Handler`] against a
//! [`ResponseCapture`] placed in front of any [`ResponseSink`].
//!
//! # Outcomes
//!
//! | Upstream response | Answer |
//! |---|---|
//! | `Content-Encoding` set to anything but `identity` | captured bytes, then `422` and a diagnostic |
//! | no match in the body | `404`, empty body |
//! | match is not a URL reference | `404`, parse error as body |
//! | match parses | `307` with `Location` set to the normalized match |
//!
//! # Request Modifications
//!
//! - `Accept-Encoding` is always overwritten with `identity` before the
//!   upstream runs, so bodies arrive uncompressed.

#![deny(missing_docs)]

mod capture;
mod config;
mod error;
mod future;
mod layer;
mod redirect;
mod response;
mod service;
mod sink;
mod target;

pub use capture::ResponseCapture;
pub use config::Config;
pub use error::{BuildError, HijackError, TargetError};
pub use future::ResponseFuture;
pub use layer::RegexRedirectLayer;
pub use redirect::{Decision, RegexRedirect, UNSUPPORTED_ENCODING_MESSAGE};
pub use response::BufferedResponse;
pub use service::RegexRedirectService;
pub use sink::{Connection, Flush, Handler, Hijack, ResponseSink};
pub use target::RedirectTarget;

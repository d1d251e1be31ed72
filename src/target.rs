use crate::error::TargetError;
use http::HeaderValue;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt;
use url::{Position, Url};

/// Base used to validate scheme-less references. Never part of the output.
const PLACEHOLDER_BASE: &str = "http://placeholder.invalid/";

const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');
const QUERY: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'<').add(b'>');
const PATH: &AsciiSet = &QUERY.add(b'?').add(b'`').add(b'{').add(b'}');

/// A matched URL reference, normalized and ready for a `Location` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    normalized: String,
    value: HeaderValue,
}

impl RedirectTarget {
    /// Parses raw matched bytes as an absolute or relative URL reference.
    pub fn parse(raw: &[u8]) -> Result<Self, TargetError> {
        let raw = std::str::from_utf8(raw)?;

        let normalized = if has_scheme(raw)? {
            String::from(Url::parse(raw)?)
        } else {
            normalize_relative(raw)?
        };

        let value = HeaderValue::from_str(&normalized)?;
        Ok(Self { normalized, value })
    }

    /// Returns the normalized reference.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Returns the reference as a header value.
    pub fn header_value(&self) -> &HeaderValue {
        &self.value
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports whether `raw` starts with an RFC 3986 scheme.
fn has_scheme(raw: &str) -> Result<bool, TargetError> {
    for (i, c) in raw.char_indices() {
        match c {
            'a'..='z' | 'A'..='Z' => {}
            '0'..='9' | '+' | '-' | '.' if i > 0 => {}
            ':' if i == 0 => return Err(TargetError::MissingScheme),
            ':' => return Ok(true),
            _ => return Ok(false),
        }
    }
    Ok(false)
}

/// Escapes a scheme-less reference while keeping it as written.
///
/// Dot segments are left alone; the client resolves them against the
/// request URL.
fn normalize_relative(raw: &str) -> Result<String, TargetError> {
    if !raw.starts_with('/') {
        let first_segment = raw.split(['/', '?', '#']).next().unwrap_or_default();
        if first_segment.contains(':') {
            return Err(TargetError::ColonInFirstSegment);
        }
    }
    check_escapes(raw)?;

    // Joining only validates; the joined form is not emitted.
    let url = Url::parse(PLACEHOLDER_BASE)?.join(raw)?;

    if let Some(rest) = raw.strip_prefix("//") {
        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let authority = &url[Position::BeforeUsername..Position::AfterPort];
        return Ok(format!("//{authority}{}", escape_reference(&rest[end..])));
    }

    Ok(escape_reference(raw))
}

/// Percent-encodes path, query and fragment separately.
fn escape_reference(raw: &str) -> String {
    let (rest, fragment) = match raw.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (raw, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let mut escaped = utf8_percent_encode(path, PATH).to_string();
    if let Some(query) = query {
        escaped.push('?');
        escaped.extend(utf8_percent_encode(query, QUERY));
    }
    if let Some(fragment) = fragment {
        escaped.push('#');
        escaped.extend(utf8_percent_encode(fragment, FRAGMENT));
    }
    escaped
}

/// Rejects a `%` that does not start a two-digit hex escape.
fn check_escapes(raw: &str) -> Result<(), TargetError> {
    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let escape = bytes.get(i + 1..i + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            let end = (i + 3).min(raw.len());
            let shown = raw.get(i..end).unwrap_or(&raw[i..]);
            return Err(TargetError::InvalidEscape(shown.to_owned()));
        }
    }
    Ok(())
}

//! Parsing of pipe-delimited raw header strings such as `accept: */*|:authority: example.org`.

use std::collections::HashMap;

use reqwest::header::{HeaderMap as ReqwestHeaderMap, HeaderName, HeaderValue};
use tracing::debug;

/// Header name to value mapping produced by [`parse_headers`].
pub type HeaderMap = HashMap<String, String>;

const LINE_SEPARATOR: char = '|';
const PSEUDO_PREFIX: char = ':';

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors raised while turning raw header strings into request headers.
pub enum HeaderError {
    /// A header line has no `name: value` separator.
    #[error("Header line {line:?} has no ':' separator")]
    MissingSeparator {
        /// The offending line.
        line: String,
    },
    /// A header line has a separator but nothing before it.
    #[error("Header line {line:?} has no name")]
    EmptyName {
        /// The offending line.
        line: String,
    },
    /// Header name or value cannot be sent over HTTP.
    #[error("Invalid header: {0}")]
    Invalid(String),
}

/// Parse a raw header string into a name to value map.
///
/// Lines are separated by `|`. A line starting with `:` is a pseudo-header and
/// keeps its leading colon in the key. Keys and values are trimmed, and a later
/// duplicate key replaces an earlier one.
///
/// # Errors
///
/// Returns [`HeaderError::MissingSeparator`] for a line without a `:` separator
/// and [`HeaderError::EmptyName`] for a line whose name is blank.
pub fn parse_headers(raw: &str) -> Result<HeaderMap, HeaderError> {
    let mut headers = HeaderMap::new();

    for line in raw.split(LINE_SEPARATOR) {
        let missing = || HeaderError::MissingSeparator {
            line: line.to_owned(),
        };

        let (prefix, rest) = match line.strip_prefix(PSEUDO_PREFIX) {
            Some(pseudo) => (":", pseudo),
            None => ("", line),
        };
        let (name, value) = rest.split_once(PSEUDO_PREFIX).ok_or_else(missing)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(HeaderError::EmptyName {
                line: line.to_owned(),
            });
        }

        headers.insert(format!("{prefix}{name}"), value.trim().to_owned());
    }

    Ok(headers)
}

/// Serialise a header map back into the raw `name: value|…` form, sorted by name.
#[must_use]
pub fn to_raw_headers(headers: &HeaderMap) -> String {
    let mut lines: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();
    lines.sort();
    lines.join("|")
}

/// Convert parsed headers into request headers for an HTTP client.
///
/// Pseudo-headers (`:authority`, `:path`, …) are set by the transport itself
/// and are skipped.
///
/// # Errors
///
/// Returns [`HeaderError::Invalid`] when a name or value is not a legal HTTP header.
pub fn to_request_headers(headers: &HeaderMap) -> Result<ReqwestHeaderMap, HeaderError> {
    let mut request_headers = ReqwestHeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        if name.starts_with(PSEUDO_PREFIX) {
            debug!(header = %name, "skipping pseudo-header");
            continue;
        }

        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| HeaderError::Invalid(format!("{name}: {err}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| HeaderError::Invalid(format!("{name}: {err}")))?;
        request_headers.insert(header_name, header_value);
    }

    Ok(request_headers)
}

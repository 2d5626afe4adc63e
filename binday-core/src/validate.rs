//! Checks applied to postcodes and house numbers before any request is made.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// UK postcode shape, including the `GIR 0AA` special case.
static POSTCODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Za-z][A-Ha-hJ-Yj-y]?[0-9][A-Za-z0-9]? ?[0-9][A-Za-z]{2}|[Gg][Ii][Rr] ?0[Aa]{2})$",
    )
    .expect("postcode pattern is valid")
});

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// User input rejected before contacting a council.
pub enum InvalidInput {
    /// Postcode missing or not shaped like a UK postcode.
    #[error("Invalid postcode{}", quoted(.0.as_deref()))]
    Postcode(Option<String>),
    /// House number missing or blank.
    #[error("Invalid house number")]
    HouseNumber,
}

impl InvalidInput {
    /// Operator-facing advice shown next to the error.
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            InvalidInput::Postcode(_) => {
                "Please check the provided postcode. If this error continues, try setting the \
                 postcode explicitly before raising an issue."
            }
            InvalidInput::HouseNumber => {
                "Please check the provided house number. If this error continues, try setting the \
                 house number explicitly before raising an issue."
            }
        }
    }
}

fn quoted(raw: Option<&str>) -> String {
    raw.map(|value| format!(" {value:?}")).unwrap_or_default()
}

/// Whether `raw` looks like a UK postcode, with or without the inner space.
#[must_use]
pub fn is_valid_postcode(raw: &str) -> bool {
    POSTCODE_REGEX.is_match(raw)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A postcode that passed [`is_valid_postcode`].
pub struct Postcode(String);

impl Postcode {
    /// Validate a postcode as supplied by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::Postcode`] when the postcode is missing or malformed.
    pub fn parse(raw: Option<&str>) -> Result<Self, InvalidInput> {
        match raw {
            Some(postcode) if is_valid_postcode(postcode) => Ok(Self(postcode.to_owned())),
            other => Err(InvalidInput::Postcode(other.map(str::to_owned))),
        }
    }

    /// The postcode as given, e.g. `NE34 6AA`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The postcode with all whitespace removed, e.g. `NE346AA`.
    #[must_use]
    pub fn compact(&self) -> String {
        self.0.split_whitespace().collect()
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Primary addressable object name, usually the house number. Stored trimmed.
pub struct HouseNumber(String);

impl HouseNumber {
    /// Validate a house number as supplied by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::HouseNumber`] when the value is missing or blank.
    pub fn parse(raw: Option<&str>) -> Result<Self, InvalidInput> {
        raw.map(str::trim)
            .filter(|paon| !paon.is_empty())
            .map(|paon| Self(paon.to_owned()))
            .ok_or(InvalidInput::HouseNumber)
    }

    /// The trimmed house number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HouseNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

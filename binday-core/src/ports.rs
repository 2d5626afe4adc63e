//! Traits describing provider capabilities and shared helper types.

use async_trait::async_trait;
use chrono::ParseError as ChronoParseError;
use reqwest::{Error as ReqwestError, StatusCode};

use crate::model::{CouncilId, CouncilMeta, ResolvedAddress, ResultSet};
use crate::validate::{HouseNumber, InvalidInput, Postcode};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to council backends.
pub enum PortError {
    /// Postcode or house number rejected before any request was made.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    /// No address for the house number was found at the postcode.
    #[error("No address matching house number {house_number:?} at postcode {postcode}")]
    AddressNotFound {
        /// Postcode that was searched.
        postcode: String,
        /// House number that had no match.
        house_number: String,
    },
    /// Network layer failed.
    #[error("Network error during {method}: {source}")]
    Network {
        /// Remote method being called.
        method: &'static str,
        /// Underlying client error.
        #[source]
        source: ReqwestError,
    },
    /// The council answered with a non-success status.
    #[error("{method} returned {status}: {body}")]
    Status {
        /// Remote method being called.
        method: &'static str,
        /// HTTP status of the response.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// Response body did not have the expected JSON shape.
    #[error("Unexpected response from {method}: {source} (body: {body})")]
    Decode {
        /// Remote method being called.
        method: &'static str,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
        /// Start of the raw response body.
        body: String,
    },
    /// The council answered with an RPC error instead of a result.
    #[error("{method} failed: {message}{}", code_suffix(.code))]
    Remote {
        /// Remote method being called.
        method: &'static str,
        /// Error code reported by the council, if any.
        code: Option<i64>,
        /// Error message reported by the council.
        message: String,
    },
    /// Failed to parse a collection date from the council response.
    #[error("Parse error in date {value:?}: {source}")]
    Date {
        /// Date text as received.
        value: String,
        /// Underlying parse error.
        #[source]
        source: ChronoParseError,
    },
    /// The council has no registered plugin.
    #[error("Unsupported council: {0}")]
    UnsupportedCouncil(CouncilId),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|value| format!(" (code {value})")).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Validated postcode and house number identifying one property.
pub struct AddressQuery {
    /// Postcode to look up.
    pub postcode: Postcode,
    /// House number (PAON) to pick from the postcode's addresses.
    pub house_number: HouseNumber,
}

impl AddressQuery {
    /// Validate raw user input into a query. The postcode is checked first.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] when either value is missing or malformed.
    pub fn new(postcode: Option<&str>, house_number: Option<&str>) -> Result<Self, InvalidInput> {
        Ok(Self {
            postcode: Postcode::parse(postcode)?,
            house_number: HouseNumber::parse(house_number)?,
        })
    }

    /// Error reported when no address matched this query.
    #[must_use]
    pub fn not_found(&self) -> PortError {
        PortError::AddressNotFound {
            postcode: self.postcode.to_string(),
            house_number: self.house_number.to_string(),
        }
    }
}

#[async_trait]
/// Trait for council-specific address lookup backends.
pub trait AddressPort: Send + Sync {
    /// Metadata describing the council handled by this port.
    fn council(&self) -> &CouncilMeta;

    /// Find the address token for the query, `None` when no address matches.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the council request fails.
    async fn resolve(&self, query: &AddressQuery) -> Result<Option<ResolvedAddress>, PortError>;
}

#[async_trait]
/// Trait for council-specific collection schedule backends.
pub trait SchedulePort: Send + Sync {
    /// Metadata describing the council handled by this port.
    fn council(&self) -> &CouncilMeta;

    /// Fetch the collections for a resolved address, in the council's order.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the council request fails or a date cannot be parsed.
    async fn schedule(&self, address: &ResolvedAddress) -> Result<ResultSet, PortError>;
}

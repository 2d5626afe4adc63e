//! Domain data structures for councils, resolved addresses, and bin collections.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Built-in councils supported by the application.
pub enum Councils {
    /// South Tyneside Council, England.
    SouthTyneside,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier (slug) for a council known to binday.
pub struct CouncilId(pub String);

impl fmt::Display for Councils {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            Councils::SouthTyneside => "south-tyneside",
        };
        write!(formatter, "{slug}")
    }
}

impl From<Councils> for CouncilId {
    fn from(council: Councils) -> Self {
        CouncilId(council.to_string())
    }
}

impl fmt::Display for CouncilId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a council and its human-friendly name.
pub struct CouncilMeta {
    /// Unique identifier.
    pub id: CouncilId,
    /// Display name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Opaque address token produced by an address lookup, `"<UPRN>|<Address>"`.
///
/// The token is handed back to the council API verbatim when requesting
/// collection dates.
pub struct ResolvedAddress(pub String);

impl ResolvedAddress {
    /// Combine a UPRN and its address line into a token.
    #[must_use]
    pub fn new(uprn: &str, address: &str) -> Self {
        Self(format!("{uprn}|{address}"))
    }

    /// Unique Property Reference Number part of the token.
    #[must_use]
    pub fn uprn(&self) -> &str {
        self.0.split_once('|').map_or(self.0.as_str(), |(uprn, _)| uprn)
    }

    /// Address line part of the token, empty if the token has none.
    #[must_use]
    pub fn address(&self) -> &str {
        self.0.split_once('|').map_or("", |(_, address)| address)
    }

    /// The raw token as sent to the API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single scheduled collection of one bin type.
pub struct BinRecord {
    /// Bin type as named by the council, e.g. "Household Waste".
    #[serde(rename = "type")]
    pub bin_type: String,
    /// Day of the collection, serialised as `DD/MM/YYYY`.
    #[serde(rename = "collectionDate", with = "uk_date")]
    pub collection_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Uniform result shape shared by every council provider.
pub struct ResultSet {
    /// Collections in the order the council reported them.
    pub bins: Vec<BinRecord>,
}

impl ResultSet {
    /// Number of collection records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether no collections were reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Output date format of [`BinRecord::collection_date`].
pub const COLLECTION_DATE_FORMAT: &str = "%d/%m/%Y";

mod uk_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::COLLECTION_DATE_FORMAT;

    pub(super) fn serialize<S: Serializer>(
        date: &NaiveDate,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(COLLECTION_DATE_FORMAT))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, COLLECTION_DATE_FORMAT).map_err(D::Error::custom)
    }
}

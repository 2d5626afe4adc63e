//! JSON-RPC style envelopes and the transport used to post them.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use binday_core::ports::PortError;

const JSONRPC_VERSION: &str = "2.0";

/// Request envelope, `{"jsonrpc":"2.0","id":…,"method":…,"params":…}`.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: &'a str,
    method: &'static str,
    params: P,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    pub(crate) fn new(id: &'a str, method: &'static str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

// Longest slice of a reply body kept in a decode error.
const BODY_EXCERPT_CHARS: usize = 512;

/// Response envelope carrying either `result` or `error`.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

/// Error member of a failed reply.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// Parameters of `ictGetAddressList`.
#[derive(Debug, Serialize)]
pub(crate) struct AddressListParams<'a> {
    pub(crate) postcode: &'a str,
    // the API expects the string "true", not a boolean
    pub(crate) localonly: &'static str,
}

/// One entry of the `ictGetAddressList` result.
#[derive(Debug, Deserialize)]
pub(crate) struct AddressRecord {
    #[serde(rename = "UPRN")]
    pub(crate) uprn: String,
    #[serde(rename = "Address")]
    pub(crate) address: String,
}

/// Parameters of `wtGetBinCollectionDates`.
#[derive(Debug, Serialize)]
pub(crate) struct CollectionDatesParams<'a> {
    pub(crate) addresscode: &'a str,
}

/// Result of `wtGetBinCollectionDates`.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionDates {
    #[serde(rename = "SortedCollections")]
    pub(crate) sorted_collections: Vec<CollectionMonth>,
}

/// Collections grouped by month.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionMonth {
    #[serde(rename = "Collections")]
    pub(crate) collections: Vec<CollectionItem>,
}

/// Single collection, e.g. `{"Type":"Household Waste","DateString":"03 January 2024"}`.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionItem {
    #[serde(rename = "Type")]
    pub(crate) bin_type: String,
    #[serde(rename = "DateString")]
    pub(crate) date_string: String,
}

#[async_trait]
/// Sends a serialised request body to the API and returns the raw response body.
pub trait RpcTransport: Send + Sync {
    /// POST `body` as `application/json` to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Network`] when the request cannot be completed and
    /// [`PortError::Status`] when the server answers with a non-success status.
    async fn post_json(
        &self,
        url: &str,
        method: &'static str,
        body: String,
    ) -> Result<String, PortError>;
}

/// [`RpcTransport`] backed by a shared `reqwest` client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport using the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        method: &'static str,
        body: String,
    ) -> Result<String, PortError> {
        let network = |source| PortError::Network { method, source };

        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(network)?;

        let status = resp.status();
        let text = resp.text().await.map_err(network)?;

        if !status.is_success() {
            return Err(PortError::Status {
                method,
                status,
                body: text,
            });
        }

        Ok(text)
    }
}

/// Serialise `request`, post it, and decode the `result` member of the reply.
pub(crate) async fn call<P: Serialize, R: DeserializeOwned>(
    transport: &dyn RpcTransport,
    url: &str,
    request: &RpcRequest<'_, P>,
) -> Result<R, PortError> {
    let method = request.method;
    let body = serde_json::to_string(request)
        .map_err(|err| PortError::Internal(format!("Cannot encode {method} request: {err}")))?;

    debug!(method, id = request.id, "posting request");
    let text = transport.post_json(url, method, body).await?;

    decode_reply(method, &text)
}

/// Decode a reply body, surfacing the council's own error member when present.
fn decode_reply<R: DeserializeOwned>(method: &'static str, text: &str) -> Result<R, PortError> {
    let decode_error = |source| PortError::Decode {
        method,
        source,
        body: excerpt(text),
    };

    let response: RpcResponse = serde_json::from_str(text).map_err(decode_error)?;

    if let Some(error) = response.error {
        warn!(method, code = error.code, message = %error.message, "council reported an error");
        return Err(PortError::Remote {
            method,
            code: error.code,
            message: error.message,
        });
    }

    // a missing or null result fails here with serde's own "invalid type: null" message
    serde_json::from_value(response.result.unwrap_or(Value::Null)).map_err(decode_error)
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let mut head: String = chars.by_ref().take(BODY_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        head.push('…');
    }
    head
}

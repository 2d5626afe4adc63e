//! Provider implementation for South Tyneside Council using its JSON-RPC style AJAX API.

mod rpc;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;

use binday_core::{
    model::{BinRecord, CouncilId, CouncilMeta, Councils, ResolvedAddress, ResultSet},
    plugin::CouncilPlugin,
    ports::{AddressPort, AddressQuery, PortError, SchedulePort},
};

pub use rpc::{HttpTransport, RpcTransport};

use crate::rpc::{
    AddressListParams, AddressRecord, CollectionDates, CollectionDatesParams, RpcRequest, call,
};

/// Production endpoint serving both address lookups and collection dates.
pub const BASE_URL: &str = "https://www.southtyneside.gov.uk/apiserver/ajaxlibrary/";

const ADDRESS_LIST_METHOD: &str = "ictGetAddressList";
const COLLECTION_DATES_METHOD: &str = "wtGetBinCollectionDates";

// The API does not check request ids, these mirror what the council website sends.
const ADDRESS_LIST_REQUEST_ID: &str = "1642260173663";
const COLLECTION_DATES_REQUEST_ID: &str = "1642260412610";

const DATE_FORMAT: &str = "%d %B %Y";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Endpoint and request ids used when talking to the council.
pub struct SouthTynesideConfig {
    /// URL both RPC methods are posted to.
    pub api_url: String,
    /// Request id sent with `ictGetAddressList`.
    pub address_request_id: String,
    /// Request id sent with `wtGetBinCollectionDates`.
    pub schedule_request_id: String,
}

impl Default for SouthTynesideConfig {
    fn default() -> Self {
        Self {
            api_url: BASE_URL.to_owned(),
            address_request_id: ADDRESS_LIST_REQUEST_ID.to_owned(),
            schedule_request_id: COLLECTION_DATES_REQUEST_ID.to_owned(),
        }
    }
}

impl SouthTynesideConfig {
    /// Point the provider at a different endpoint.
    #[must_use]
    pub fn with_api_url<S: Into<String>>(mut self, api_url: S) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Address lookup implementation for South Tyneside.
pub struct SouthTynesideAddressPort {
    transport: Arc<dyn RpcTransport>,
    config: Arc<SouthTynesideConfig>,
    meta: CouncilMeta,
}

impl SouthTynesideAddressPort {
    /// Create a new address port posting through the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>, config: Arc<SouthTynesideConfig>) -> Self {
        Self {
            transport,
            config,
            meta: council_meta(),
        }
    }
}

#[async_trait]
impl AddressPort for SouthTynesideAddressPort {
    fn council(&self) -> &CouncilMeta {
        &self.meta
    }

    async fn resolve(&self, query: &AddressQuery) -> Result<Option<ResolvedAddress>, PortError> {
        let postcode = query.postcode.compact();
        let request = RpcRequest::new(
            &self.config.address_request_id,
            ADDRESS_LIST_METHOD,
            AddressListParams {
                postcode: &postcode,
                localonly: "true",
            },
        );

        let records: Vec<AddressRecord> =
            call(self.transport.as_ref(), &self.config.api_url, &request).await?;
        debug!(postcode = %postcode, addresses = records.len(), "address list received");

        Ok(find_address(&records, query.house_number.as_str()))
    }
}

/// Collection schedule implementation for South Tyneside.
pub struct SouthTynesideSchedulePort {
    transport: Arc<dyn RpcTransport>,
    config: Arc<SouthTynesideConfig>,
    meta: CouncilMeta,
}

impl SouthTynesideSchedulePort {
    /// Create a new schedule port posting through the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>, config: Arc<SouthTynesideConfig>) -> Self {
        Self {
            transport,
            config,
            meta: council_meta(),
        }
    }
}

#[async_trait]
impl SchedulePort for SouthTynesideSchedulePort {
    fn council(&self) -> &CouncilMeta {
        &self.meta
    }

    async fn schedule(&self, address: &ResolvedAddress) -> Result<ResultSet, PortError> {
        let request = RpcRequest::new(
            &self.config.schedule_request_id,
            COLLECTION_DATES_METHOD,
            CollectionDatesParams {
                addresscode: address.as_str(),
            },
        );

        let dates: CollectionDates =
            call(self.transport.as_ref(), &self.config.api_url, &request).await?;

        let mut bins = Vec::new();
        for month in dates.sorted_collections {
            for item in month.collections {
                bins.push(BinRecord {
                    collection_date: parse_collection_date(&item.date_string)?,
                    bin_type: item.bin_type,
                });
            }
        }

        Ok(ResultSet { bins })
    }
}

/// Build the plugin bundle for the South Tyneside provider.
#[must_use]
pub fn plugin(client: Client) -> CouncilPlugin {
    plugin_with(
        Arc::new(HttpTransport::new(client)),
        SouthTynesideConfig::default(),
    )
}

/// Build the plugin bundle with a custom transport and configuration.
#[must_use]
pub fn plugin_with(
    transport: Arc<dyn RpcTransport>,
    config: SouthTynesideConfig,
) -> CouncilPlugin {
    let config = Arc::new(config);
    let address_port = Arc::new(SouthTynesideAddressPort::new(
        Arc::clone(&transport),
        Arc::clone(&config),
    ));
    let schedule_port = Arc::new(SouthTynesideSchedulePort::new(transport, config));

    CouncilPlugin {
        meta: council_meta(),
        address_port,
        schedule_port,
    }
}

/// Fetch the bin collections for a postcode and house number.
///
/// # Errors
///
/// Returns [`PortError::InvalidInput`] before any request for a malformed
/// postcode or missing house number, [`PortError::AddressNotFound`] when the
/// house number is not listed at the postcode, and transport, decoding or date
/// errors otherwise.
pub async fn fetch(
    client: Client,
    postcode: Option<&str>,
    house_number: Option<&str>,
) -> Result<ResultSet, PortError> {
    plugin(client).fetch_bins(postcode, house_number).await
}

fn council_meta() -> CouncilMeta {
    CouncilMeta {
        id: CouncilId::from(Councils::SouthTyneside),
        name: String::from("South Tyneside Council"),
    }
}

/// First record whose address starts with the house number as a whole word.
fn find_address(records: &[AddressRecord], house_number: &str) -> Option<ResolvedAddress> {
    let wanted = house_number.trim();
    records
        .iter()
        .find(|record| record.address.split_whitespace().next() == Some(wanted))
        .map(|record| ResolvedAddress::new(&record.uprn, &record.address))
}

/// Parse `03 January 2024` style dates.
fn parse_collection_date(raw: &str) -> Result<NaiveDate, PortError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|source| PortError::Date {
        value: raw.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use binday_core::validate::InvalidInput;

    use super::*;

    struct Sent {
        url: String,
        method: &'static str,
        body: Value,
    }

    /// Replays canned replies in order and records every request body.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<String, PortError>>>,
        sent: Mutex<Vec<Sent>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<String, PortError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn replying(bodies: &[Value]) -> Arc<Self> {
            Self::new(bodies.iter().map(|body| Ok(body.to_string())).collect())
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().expect("lock").len()
        }

        fn sent_body(&self, index: usize) -> Value {
            self.sent
                .lock()
                .expect("lock")
                .get(index)
                .map(|sent| sent.body.clone())
                .expect("request was sent")
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn post_json(
            &self,
            url: &str,
            method: &'static str,
            body: String,
        ) -> Result<String, PortError> {
            self.sent.lock().expect("lock").push(Sent {
                url: url.to_owned(),
                method,
                body: serde_json::from_str(&body).expect("request body is JSON"),
            });
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .expect("a reply is scripted for every request")
        }
    }

    fn address_list(records: &[(&str, &str)]) -> Value {
        let result: Vec<Value> = records
            .iter()
            .map(|(uprn, address)| json!({"UPRN": uprn, "Address": address}))
            .collect();
        json!({"result": result})
    }

    fn collections(months: &[&[(&str, &str)]]) -> Value {
        let sorted: Vec<Value> = months
            .iter()
            .map(|items| {
                let collections: Vec<Value> = items
                    .iter()
                    .map(|(bin_type, date)| json!({"Type": bin_type, "DateString": date}))
                    .collect();
                json!({"Collections": collections})
            })
            .collect();
        json!({"result": {"SortedCollections": sorted}})
    }

    fn query(postcode: &str, house_number: &str) -> AddressQuery {
        AddressQuery::new(Some(postcode), Some(house_number)).expect("valid query")
    }

    fn address_port(transport: &Arc<ScriptedTransport>) -> SouthTynesideAddressPort {
        SouthTynesideAddressPort::new(
            Arc::clone(transport) as Arc<dyn RpcTransport>,
            Arc::new(SouthTynesideConfig::default()),
        )
    }

    fn council(transport: &Arc<ScriptedTransport>) -> CouncilPlugin {
        plugin_with(
            Arc::clone(transport) as Arc<dyn RpcTransport>,
            SouthTynesideConfig::default(),
        )
    }

    #[tokio::test]
    async fn resolves_address_by_house_number() {
        let transport = ScriptedTransport::replying(&[address_list(&[("100", "12 High Street")])]);

        let address = address_port(&transport)
            .resolve(&query("NE34 6AA", "12"))
            .await
            .expect("resolve");

        assert_eq!(
            address.map(|token| token.0),
            Some("100|12 High Street".to_owned()),
            "uprn and address joined by a pipe"
        );
    }

    #[tokio::test]
    async fn address_request_uses_compact_postcode() {
        let transport = ScriptedTransport::replying(&[address_list(&[])]);

        address_port(&transport)
            .resolve(&query("NE34 6AA", "12"))
            .await
            .expect("resolve");

        assert_eq!(
            transport.sent_body(0),
            json!({
                "jsonrpc": "2.0",
                "id": "1642260173663",
                "method": "ictGetAddressList",
                "params": {"postcode": "NE346AA", "localonly": "true"}
            }),
            "address list request"
        );
        let sent = transport.sent.lock().expect("lock");
        let first = sent.first().expect("one request");
        assert_eq!(first.url, BASE_URL, "posted to the council endpoint");
        assert_eq!(first.method, "ictGetAddressList", "method reported to transport");
    }

    #[tokio::test]
    async fn house_number_must_be_the_whole_first_word() {
        let transport = ScriptedTransport::replying(&[address_list(&[
            ("100", "12 High Street"),
            ("101", "1 High Street"),
            ("102", "1 Low Street"),
        ])]);

        let address = address_port(&transport)
            .resolve(&query("NE34 6AA", " 1 "))
            .await
            .expect("resolve");

        assert_eq!(
            address.map(|token| token.0),
            Some("101|1 High Street".to_owned()),
            "first exact match wins, prefixes do not count"
        );
    }

    #[tokio::test]
    async fn unmatched_house_number_resolves_to_none() {
        let transport = ScriptedTransport::replying(&[address_list(&[
            ("100", "12 High Street"),
            ("200", ""),
        ])]);

        let address = address_port(&transport)
            .resolve(&query("NE34 6AA", "99"))
            .await
            .expect("resolve");

        assert_eq!(address, None, "no address for house 99");
    }

    #[tokio::test]
    async fn fetches_and_normalises_collections() {
        let transport = ScriptedTransport::replying(&[
            address_list(&[("100", "12 High Street")]),
            collections(&[&[("Household Waste", "03 January 2024")]]),
        ]);

        let bins = council(&transport)
            .fetch_bins(Some("NE34 6AA"), Some("12"))
            .await
            .expect("bins");

        assert_eq!(
            serde_json::to_value(&bins).expect("serialise"),
            json!({"bins": [{"type": "Household Waste", "collectionDate": "03/01/2024"}]}),
            "uniform output shape"
        );
        assert_eq!(
            transport.sent_body(1),
            json!({
                "jsonrpc": "2.0",
                "id": "1642260412610",
                "method": "wtGetBinCollectionDates",
                "params": {"addresscode": "100|12 High Street"}
            }),
            "schedule requested for the resolved token"
        );
    }

    #[tokio::test]
    async fn keeps_month_then_item_order() {
        let transport = ScriptedTransport::replying(&[
            address_list(&[("100", "12 High Street")]),
            collections(&[
                &[
                    ("Recycling", "31 January 2024"),
                    ("Household Waste", "24 January 2024"),
                ],
                &[],
                &[
                    ("Garden Waste", "07 February 2024"),
                    ("Household Waste", "07 February 2024"),
                ],
            ]),
        ]);

        let bins = council(&transport)
            .fetch_bins(Some("NE34 6AA"), Some("12"))
            .await
            .expect("bins");

        let flattened: Vec<(String, String)> = bins
            .bins
            .iter()
            .map(|bin| {
                (
                    bin.bin_type.clone(),
                    bin.collection_date.format("%d/%m/%Y").to_string(),
                )
            })
            .collect();
        assert_eq!(
            flattened,
            vec![
                ("Recycling".to_owned(), "31/01/2024".to_owned()),
                ("Household Waste".to_owned(), "24/01/2024".to_owned()),
                ("Garden Waste".to_owned(), "07/02/2024".to_owned()),
                ("Household Waste".to_owned(), "07/02/2024".to_owned()),
            ],
            "no sorting or deduplication"
        );
    }

    #[tokio::test]
    async fn invalid_postcode_makes_no_request() {
        let transport = ScriptedTransport::new(Vec::new());
        let council = council(&transport);

        for postcode in [None, Some("not a postcode")] {
            let err = council.fetch_bins(postcode, Some("12")).await.unwrap_err();
            assert!(
                matches!(err, PortError::InvalidInput(InvalidInput::Postcode(_))),
                "unexpected error for {postcode:?}: {err}"
            );
        }
        assert_eq!(transport.sent_count(), 0, "validation happens before HTTP");
    }

    #[tokio::test]
    async fn missing_house_number_makes_no_request() {
        let transport = ScriptedTransport::new(Vec::new());

        let err = council(&transport)
            .fetch_bins(Some("NE34 6AA"), None)
            .await
            .unwrap_err();

        assert!(
            matches!(err, PortError::InvalidInput(InvalidInput::HouseNumber)),
            "unexpected error: {err}"
        );
        assert_eq!(transport.sent_count(), 0, "validation happens before HTTP");
    }

    #[tokio::test]
    async fn unknown_address_stops_before_schedule_request() {
        let transport = ScriptedTransport::replying(&[address_list(&[("100", "12 High Street")])]);

        let err = council(&transport)
            .fetch_bins(Some("NE34 6AA"), Some("14"))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                PortError::AddressNotFound { ref house_number, .. } if house_number == "14"
            ),
            "unexpected error: {err}"
        );
        assert_eq!(transport.sent_count(), 1, "only the address lookup was sent");
    }

    #[tokio::test]
    async fn unparseable_date_fails_whole_fetch() {
        let transport = ScriptedTransport::replying(&[
            address_list(&[("100", "12 High Street")]),
            collections(&[&[
                ("Household Waste", "03 January 2024"),
                ("Recycling", "2024-01-10"),
            ]]),
        ]);

        let err = council(&transport)
            .fetch_bins(Some("NE34 6AA"), Some("12"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, PortError::Date { ref value, .. } if value == "2024-01-10"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let transport = ScriptedTransport::new(vec![Err(PortError::Status {
            method: ADDRESS_LIST_METHOD,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "oops".to_owned(),
        })]);

        let err = council(&transport)
            .fetch_bins(Some("NE34 6AA"), Some("12"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "ictGetAddressList returned 500 Internal Server Error: oops",
            "status error keeps method, status and body"
        );
    }

    #[tokio::test]
    async fn unexpected_shape_is_a_decode_error() {
        let transport = ScriptedTransport::replying(&[
            address_list(&[("100", "12 High Street")]),
            json!({"result": {"Collections": []}}),
        ]);

        let err = council(&transport)
            .fetch_bins(Some("NE34 6AA"), Some("12"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, PortError::Decode { method: COLLECTION_DATES_METHOD, .. }),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn council_error_reply_is_reported() {
        let transport = ScriptedTransport::replying(&[json!({
            "jsonrpc": "2.0",
            "id": "1642260173663",
            "error": {"code": -32_000, "message": "Postcode not in South Tyneside"}
        })]);

        let err = council(&transport)
            .fetch_bins(Some("NE34 6AA"), Some("12"))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                PortError::Remote { method: ADDRESS_LIST_METHOD, ref message, .. }
                    if message == "Postcode not in South Tyneside"
            ),
            "unexpected error: {err}"
        );
        assert_eq!(transport.sent_count(), 1, "no schedule request after an error reply");
    }

    #[tokio::test]
    async fn fetch_validates_before_using_the_client() {
        let err = fetch(Client::new(), Some("not a postcode"), Some("12"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, PortError::InvalidInput(InvalidInput::Postcode(_))),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn custom_api_url_is_used() {
        let transport = ScriptedTransport::replying(&[address_list(&[])]);
        let council = plugin_with(
            Arc::clone(&transport) as Arc<dyn RpcTransport>,
            SouthTynesideConfig::default().with_api_url("http://localhost:8080/rpc"),
        );

        let err = council
            .fetch_bins(Some("NE34 6AA"), Some("12"))
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::AddressNotFound { .. }), "unexpected error: {err}");
        let sent = transport.sent.lock().expect("lock");
        assert_eq!(
            sent.first().map(|request| request.url.as_str()),
            Some("http://localhost:8080/rpc"),
            "request went to the configured endpoint"
        );
    }

    #[tokio::test]
    async fn http_transport_reports_connection_failures() {
        let client = Client::builder().no_proxy().build().expect("client");
        let transport = HttpTransport::new(client);

        let err = transport
            .post_json("http://127.0.0.1:9/", ADDRESS_LIST_METHOD, "{}".to_owned())
            .await
            .unwrap_err();

        assert!(
            matches!(err, PortError::Network { method: ADDRESS_LIST_METHOD, .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn parses_long_month_names() {
        let date = parse_collection_date("28 February 2025").expect("date");

        assert_eq!(date.format("%d/%m/%Y").to_string(), "28/02/2025", "zero padded month");
    }

    #[test]
    fn rejects_numeric_dates() {
        assert!(
            matches!(parse_collection_date("28/02/2025"), Err(PortError::Date { .. })),
            "numeric form is not the API's format"
        );
    }
}

use crate::defines::*;
use crate::settings::ensure_dir;
use crate::types::*;
use crate::util::file_timestamp;

use isahc::http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use isahc::http::{request::Builder, Method};
use isahc::{Body, Request, RequestExt};
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Blocking client for OANDA's v20 REST API.
///
/// Every call is a single request, no retry and no timeout. Raw bodies of
/// instrument and historical-candle responses are dumped under the output path.
pub struct OandaClient {
    account_id: String,
    api_key: String,
    rest_api_url: String,
    streaming_api_url: String,
    output_path: PathBuf,
    headers: Vec<(HeaderName, String)>,
}

impl OandaClient {
    /// Create a client for the account in `settings`, making sure the dump
    /// directories exist under `output_path`.
    pub fn new(settings: &Settings, output_path: &Path) -> Result<Self, SettingsError> {
        for sub_directory in [INSTRUMENTS_DIR, HISTORICAL_CANDLES_DIR] {
            ensure_dir(&output_path.join(sub_directory))?;
        }

        Ok(OandaClient {
            account_id: settings.account_number.clone(),
            api_key: settings.api_key.clone(),
            rest_api_url: settings.rest_api_url.clone(),
            streaming_api_url: settings.streaming_api_url.clone(),
            output_path: output_path.to_path_buf(),
            headers: vec![
                (AUTHORIZATION, format!("Bearer {}", settings.api_key)),
                (CONTENT_TYPE, "application/json".to_string()),
            ],
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Get the instruments the account can trade.
    ///
    /// The raw response is saved to `instruments/instrument-{UTC}.json`.
    /// A body that isn't json, or has no `instruments` array, gives an empty list.
    pub fn list_instruments(&self) -> Result<Vec<Value>, ApiError> {
        let url = self.rest_endpoint(&["v3", "accounts", self.account_id.as_str(), "instruments"])?;
        let request = self.request(Method::GET, &url, &self.headers).body(())?;
        let response_data = self.execute(request)?;

        let file_name = format!("instrument-{}.json", file_timestamp());
        self.save_response(INSTRUMENTS_DIR, &file_name, &response_data)?;

        match serde_json::from_slice::<Value>(&response_data) {
            Ok(mut response_json) => match response_json.get_mut("instruments").map(Value::take) {
                Some(Value::Array(instruments)) => Ok(instruments),
                _ => {
                    warn!("response has no instruments array");
                    Ok(Vec::new())
                }
            },
            Err(ex) => {
                warn!("Invalid response_json; {}", ex);
                Ok(Vec::new())
            }
        }
    }

    /// Fetch just the latest candle for `candle_spec` (`INSTRUMENT:GRANULARITY:COMPONENTS`).
    pub fn get_latest_candle(&self, candle_spec: &str) -> Result<Option<Value>, ApiError> {
        if !is_valid_candle_spec(candle_spec) {
            warn!(candle_spec, "candle specification doesn't look like INSTRUMENT:GRANULARITY:COMPONENTS");
        }

        let mut url = self.rest_endpoint(&["v3", "accounts", self.account_id.as_str(), "candles", "latest"])?;
        url.query_pairs_mut().append_pair("candleSpecifications", candle_spec);

        let request = self.request(Method::GET, &url, &self.headers).body(())?;
        let response_data = self.execute(request)?;
        debug!("{}", String::from_utf8_lossy(&response_data));

        Ok(parse_or_warn(&response_data))
    }

    /// Fetch historical candles of `instrument_name` at `granularity` (e.g. `S10`).
    ///
    /// The raw response is saved byte-for-byte to
    /// `historical-candles/historical-candle-{instrument}-{granularity}-{UTC}.json`.
    pub fn get_historical_candles(&self, instrument_name: &str, granularity: &str) -> Result<Option<Value>, ApiError> {
        let mut url = self.rest_endpoint(&["v3", "accounts", self.account_id.as_str(), "instruments", instrument_name, "candles"])?;
        url.query_pairs_mut().append_pair("granularity", granularity);

        let request = self.request(Method::GET, &url, &self.headers).body(())?;
        let response_data = self.execute(request)?;

        let file_name = format!("historical-candle-{}-{}-{}.json", instrument_name, granularity, file_timestamp());
        self.save_response(HISTORICAL_CANDLES_DIR, &file_name, &response_data)?;

        Ok(parse_or_warn(&response_data))
    }

    /// Stream prices of `instruments`, writing every chunk read to `out`.
    ///
    /// Reads until the broker closes the connection. There is no reconnect.
    pub fn stream_prices<W: Write>(&self, instruments: &[&str], mut out: W) -> Result<(), ApiError> {
        let mut url = Self::endpoint(&self.streaming_api_url, &["v3", "accounts", self.account_id.as_str(), "pricing", "stream"])?;
        url.query_pairs_mut().append_pair("instruments", &instruments.join(","));

        let stream_headers = vec![
            (AUTHORIZATION, format!("Bearer {}", self.api_key)),
            (CONTENT_TYPE, "application/octet-stream".to_string()),
        ];
        let mut response = self.request(Method::GET, &url, &stream_headers).body(())?.send()?;

        let status = response.status();
        if !status.is_success() {
            let mut body = Vec::new();
            response.body_mut().read_to_end(&mut body)?;
            return Err(ApiError::ErrorApiResponse {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        info!(instruments = %instruments.join(","), "price stream opened");
        let mut chunk = vec![0u8; STREAM_CHUNK_SIZE];
        loop {
            let read = response.body_mut().read(&mut chunk)?;
            if read == 0 {
                info!("price stream closed by broker");
                return Ok(());
            }
            writeln!(out, "{}", String::from_utf8_lossy(&chunk[..read]))?;
            std::thread::sleep(Duration::from_millis(STREAM_READ_PAUSE_MS));
        }
    }

    /// Place a GTC limit order with stop-loss and take-profit on fill.
    ///
    /// Returns the broker's `orderCreateTransaction`, or `None` if the
    /// response doesn't carry one.
    pub fn place_limit_order(&self, order: &OrderRequest) -> Result<Option<OrderTransaction>, ApiError> {
        let url = self.rest_endpoint(&["v3", "accounts", self.account_id.as_str(), "orders"])?;

        let data = serde_json::to_string(&order.to_envelope())?;
        println!("{}", data);

        let request = self.request(Method::POST, &url, &self.headers).body(data.into_bytes())?;
        let response_data = self.execute(request)?;

        let transaction = parse_or_warn(&response_data)
            .and_then(|mut response_json| response_json.get_mut("orderCreateTransaction").map(Value::take));
        match transaction {
            Some(transaction) => match serde_json::from_value::<OrderTransaction>(transaction) {
                Ok(transaction) => {
                    info!(id = %transaction.id, instrument = %order.instrument, "limit order placed");
                    Ok(Some(transaction))
                }
                Err(ex) => {
                    warn!("Invalid orderCreateTransaction; {}", ex);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Cancel a pending order. Returns the raw response body.
    pub fn cancel_pending_order(&self, transaction_id: &str) -> Result<String, ApiError> {
        let url = self.rest_endpoint(&["v3", "accounts", self.account_id.as_str(), "orders", transaction_id, "cancel"])?;
        let request = self.request(Method::PUT, &url, &self.headers).body(())?;
        let response_data = self.execute(request)?;

        info!(id = transaction_id, "pending order cancelled");
        Ok(String::from_utf8_lossy(&response_data).into_owned())
    }

    /// Write `data` to `{output}/{sub_directory}/{file_name}` as-is.
    pub fn save_response(&self, sub_directory: &str, file_name: &str, data: &[u8]) -> Result<PathBuf, ApiError> {
        let save_file_path = self.output_path.join(sub_directory).join(file_name);
        std::fs::write(&save_file_path, data)?;
        debug!(path = %save_file_path.display(), bytes = data.len(), "response saved");
        Ok(save_file_path)
    }

    fn rest_endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        Self::endpoint(&self.rest_api_url, segments)
    }

    fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(base).map_err(|source| ApiError::InvalidUrl {
            url: base.to_string(),
            source,
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::CannotBeABase(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url, headers: &[(HeaderName, String)]) -> Builder {
        headers.iter().fold(
            Request::builder().method(method).uri(url.as_str()),
            |builder, (name, value)| builder.header(name.clone(), value.as_str()),
        )
    }

    /// Send `request` and read the whole body. Non-2xx statuses are errors.
    fn execute<B: Into<Body>>(&self, request: Request<B>) -> Result<Vec<u8>, ApiError> {
        let method = request.method().clone();
        let uri = request.uri().path().to_string();

        let mut response = request.send()?;
        let mut body = Vec::new();
        response.body_mut().read_to_end(&mut body)?;

        let status = response.status();
        debug!(%method, uri = %uri, status = status.as_u16(), bytes = body.len(), "response received");
        if !status.is_success() {
            return Err(ApiError::ErrorApiResponse {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }
}

fn parse_or_warn(data: &[u8]) -> Option<Value> {
    match serde_json::from_slice(data) {
        Ok(response_json) => Some(response_json),
        Err(ex) => {
            warn!("Invalid response_json; {}", ex);
            None
        }
    }
}

pub fn is_valid_candle_spec(candle_spec: &str) -> bool {
    regex::Regex::new(CANDLE_SPEC_PATTERN)
        .map(|re| re.is_match(candle_spec))
        .unwrap_or(false)
}

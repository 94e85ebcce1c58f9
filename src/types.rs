use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name="oanda-trader")]
#[clap(about="oanda-trader pulls candles, then places and cancels a test limit order against OANDA's REST API", long_about=None)]
pub struct CommandlineArgs {
    /// Location to oanda configuration (json) file
    #[clap(parse(from_os_str))]
    pub oanda_config: PathBuf,

    /// Folder location to save downloaded files
    #[clap(parse(from_os_str))]
    pub output_path: PathBuf,

    /// Comma-separated list of instruments to trade
    // NOTE: parsed and logged, not wired into any request yet.
    pub instruments_csv: String,

    /// Candle fixture to analyse instead of the default one under the output path
    #[clap(long, parse(from_os_str))]
    pub fixture: Option<PathBuf>,

    /// Fetch historical candles from the broker instead of loading the fixture
    #[clap(long)]
    pub fetch_candles: bool,

    /// List the account's tradeable instruments first
    #[clap(long)]
    pub list_instruments: bool,

    /// Print the latest candle for a specification such as EUR_USD:S10:BM
    #[clap(long, value_name="CANDLE_SPEC")]
    pub latest_candle: Option<String>,

    /// Stream prices to stdout after the order has been cancelled
    #[clap(long)]
    pub stream_prices: bool,

    /// Block until SIGINT or SIGTERM before exiting
    #[clap(long)]
    pub wait_for_signal: bool,
}

/// Broker credentials and endpoints as read from the config file.
/// Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub account_number: String,

    #[serde(default)]
    pub api_key: String,

    /// e.g. `https://api-fxpractice.oanda.com`
    #[serde(default)]
    pub rest_api_url: String,

    /// e.g. `https://stream-fxpractice.oanda.com`
    #[serde(default)]
    pub streaming_api_url: String,
}

/// Limit order with attached take-profit and stop-loss.
/// Built per call, serialized, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    /// Positive for buy side. Negative for sell side.
    pub quantity: i64,
    pub instrument: String,
    pub price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

/// Body of `POST /v3/accounts/{id}/orders`.
/// All numbers go over the wire as strings.
#[derive(Debug, serde::Serialize)]
pub struct OrderEnvelope {
    pub order: LimitOrderBody,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderBody {
    pub units: String,
    pub instrument: String,
    pub price: String,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub time_in_force: &'static str,
    pub position_fill: &'static str,
    pub stop_loss_on_fill: StopLossDetails,
    pub take_profit_on_fill: TakeProfitDetails,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopLossDetails {
    pub time_in_force: &'static str,
    pub price: String,
}

#[derive(Debug, serde::Serialize)]
pub struct TakeProfitDetails {
    pub price: String,
}

/// `orderCreateTransaction` as returned by the broker.
/// Only `id` is used; everything else is kept as-is.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct OrderTransaction {
    pub id: String,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Fatal errors while setting up. Each one terminates the process with its own exit code.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Path {0} does not exists.")]
    ConfigMissing(PathBuf),

    #[error("cannot read config file {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("config file {0} does not contain a json object")]
    ConfigNotObject(PathBuf),

    #[error("Config file does not proper structure; unexpected keys {found:?}, should have {expected:?}")]
    UnexpectedKeys {
        found: Vec<String>,
        expected: Vec<&'static str>,
    },

    #[error("ERROR - output path does not exists {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failure of a single broker API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("base url {0} cannot have path segments")]
    CannotBeABase(String),

    #[error("cannot build http request: {0}")]
    Request(#[from] isahc::http::Error),

    #[error("http request failed: {0}")]
    Transport(#[from] isahc::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("broker responded with status {status}: {body}")]
    ErrorApiResponse {
        status: u16,
        body: String,
    },
}

/// Errors while turning a candles payload into a table.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("cannot read candle fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse candle json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no `candles` array")]
    MissingCandles,

    #[error("invalid candle time {value:?}: {source}")]
    Time {
        value: String,
        source: chrono::ParseError,
    },

    #[error("invalid {field} price {value:?}")]
    Price {
        field: &'static str,
        value: String,
    },
}

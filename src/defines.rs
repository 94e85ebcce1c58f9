/// Keys a broker config file is allowed to carry.
pub const SETTINGS_KEYS: [&str; 4] = ["account_number", "api_key", "rest_api_url", "streaming_api_url"];

/// Process exit codes for fatal setup errors.
pub const EXIT_CODE_PATH: i32 = 2;
pub const EXIT_CODE_CONFIG_PARSE: i32 = 3;
pub const EXIT_CODE_CONFIG_KEYS: i32 = 4;

/// Sub-directories created under the output path.
pub const INSTRUMENTS_DIR: &str = "instruments";
pub const HISTORICAL_CANDLES_DIR: &str = "historical-candles";

/// UTC timestamp used in dumped file names.
pub const FILE_DATETIME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Candle time as the broker sends it, e.g. `2022-09-17T23:37:51.000000000Z`.
/// Exactly nine fraction digits, the last three always zero.
pub const CANDLE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6f000Z";

/// `INSTRUMENT:GRANULARITY:PRICE_COMPONENTS`, e.g. `EUR_USD:S10:BM`
pub const CANDLE_SPEC_PATTERN: &str = r"^[A-Z0-9]+_[A-Z0-9]+:[A-Z0-9]+:[ABM]+$";

pub const DEFAULT_GRANULARITY: &str = "S10";

// hard-coded test order placed by the main sequence
pub const TEST_ORDER_INSTRUMENT: &str = "XAU_USD";
pub const TEST_ORDER_UNITS: i64 = 1;
pub const TEST_ORDER_PRICE: f64 = 1680.000;
pub const TEST_ORDER_TAKE_PROFIT: f64 = 1680.020;
pub const TEST_ORDER_STOP_LOSS: f64 = 1679.970;

/// Seconds to wait between placing the test order and cancelling it.
pub const CANCEL_DELAY_SECS: u64 = 10;

/// Pause between two reads of the pricing stream.
pub const STREAM_READ_PAUSE_MS: u64 = 100;
pub const STREAM_CHUNK_SIZE: usize = 4096;

/// Fixture of historical candles analysed when `--fixture` isn't given.
/// Relative to the output path.
pub const DEFAULT_CANDLE_FIXTURE: &str = "historical-candles/historical-candle-XAU_USD-S10-20220917-233751.json";

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "oanda_trader=info";

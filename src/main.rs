mod analysis;
mod api;
mod defines;
mod impls;
mod settings;
mod signals;
mod types;
mod util;

use api::OandaClient;
use clap::Parser;
use defines::*;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use types::*;
use util::*;

fn main() {
    // parse arguments via clap
    let cmd_args = CommandlineArgs::parse();
    setup_logging();

    // settings and output directories are the only fatal errors, each with its own exit code
    let oanda_api = match setup(&cmd_args) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    let instruments_to_trade = split_instruments(&cmd_args.instruments_csv);
    info!(instruments = ?instruments_to_trade, "instruments to trade (not wired into requests yet)");

    if cmd_args.list_instruments {
        match oanda_api.list_instruments() {
            Ok(instruments) => info!(count = instruments.len(), "account instruments listed"),
            Err(e) => print_error_if_necessary("list_instruments", &e),
        }
    }

    if let Some(candle_spec) = &cmd_args.latest_candle {
        match oanda_api.get_latest_candle(candle_spec) {
            Ok(Some(latest)) => println!("{}", latest),
            Ok(None) => warn!(candle_spec = %candle_spec, "no latest candle in response"),
            Err(e) => print_error_if_necessary("get_latest_candle", &e),
        }
    }

    if let Some(historical_candles_json) = historical_candles(&cmd_args, &oanda_api) {
        match analysis::analyse(&historical_candles_json) {
            Ok(table) => table.print_shape(),
            Err(e) => error!("cannot analyse candles: {}", e),
        }
    }

    place_and_cancel_test_order(&oanda_api, Duration::from_secs(CANCEL_DELAY_SECS));

    if cmd_args.stream_prices {
        if let Err(e) = oanda_api.stream_prices(&[TEST_ORDER_INSTRUMENT], std::io::stdout().lock()) {
            print_error_if_necessary("stream_prices", &e);
        }
    }

    if cmd_args.wait_for_signal {
        match signals::SignalWaiter::install() {
            Ok(waiter) => waiter.wait(),
            Err(e) => error!("cannot install signal handlers: {}", e),
        }
    }

    info!(source = "program", event = "complete", "Program complete");
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn setup(cmd_args: &CommandlineArgs) -> Result<OandaClient, SettingsError> {
    let oanda_settings = settings::load_settings(&cmd_args.oanda_config)?;
    let output_path = settings::resolve_output_dir(&cmd_args.output_path)?;
    OandaClient::new(&oanda_settings, &output_path)
}

/// Candles to analyse: the local fixture by default, the broker with `--fetch-candles`.
fn historical_candles(cmd_args: &CommandlineArgs, oanda_api: &OandaClient) -> Option<Value> {
    if cmd_args.fetch_candles {
        return match oanda_api.get_historical_candles(TEST_ORDER_INSTRUMENT, DEFAULT_GRANULARITY) {
            Ok(candles) => candles,
            Err(e) => {
                print_error_if_necessary("get_historical_candles", &e);
                None
            }
        };
    }

    let fixture = cmd_args
        .fixture
        .clone()
        .unwrap_or_else(|| oanda_api.output_path().join(DEFAULT_CANDLE_FIXTURE));
    match analysis::load_candle_fixture(&fixture) {
        Ok(candles) => Some(candles),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

/// Place the hard-coded test order, wait `cancel_delay`, then cancel it.
/// Nothing is waited for or cancelled when no transaction came back.
fn place_and_cancel_test_order(oanda_api: &OandaClient, cancel_delay: Duration) {
    let start = measure_start();
    let order_create_transaction = match oanda_api.place_limit_order(&OrderRequest::default()) {
        Ok(Some(transaction)) => transaction,
        Ok(None) => {
            warn!("no orderCreateTransaction in response, nothing to cancel");
            return;
        }
        Err(e) => {
            print_error_if_necessary("place_limit_order", &e);
            return;
        }
    };
    measure_end(&start, "place_limit_order");

    std::thread::sleep(cancel_delay);

    match oanda_api.cancel_pending_order(&order_create_transaction.id) {
        Ok(response_data) => println!("{}", response_data),
        Err(e) => print_error_if_necessary("cancel_pending_order", &e),
    }
}

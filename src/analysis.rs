use crate::defines::CANDLE_TIME_FORMAT;
use crate::types::AnalysisError;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// One mid-price candle.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub time: NaiveDateTime,
    pub complete: bool,
    pub volume: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Candle element as the broker sends it.
#[derive(Debug, Deserialize)]
struct RawCandle {
    time: String,
    complete: bool,
    volume: i64,
    mid: RawPrices,
}

// prices come as strings ("1674.950"), numbers are accepted too
#[derive(Debug, Deserialize)]
struct RawPrices {
    o: Value,
    h: Value,
    l: Value,
    c: Value,
}

/// Candles laid out as fixed-order rows.
#[derive(Debug, Default)]
pub struct CandleTable {
    pub rows: Vec<Candle>,
}

impl CandleTable {
    pub const COLUMNS: [&'static str; 7] = ["time", "complete", "Volume", "Open", "High", "Low", "Close"];

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), Self::COLUMNS.len())
    }

    pub fn print_shape(&self) {
        let (rows, columns) = self.shape();
        println!("candle table shape: ({}, {})", rows, columns);
        if let Some(last) = self.rows.last() {
            tracing::debug!("last candle: {}", last);
        }
    }
}

impl std::fmt::Display for Candle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {} {} {} {}", self.time, self.complete, self.volume, self.open, self.high, self.low, self.close)
    }
}

/// Load a candles payload previously dumped to disk.
pub fn load_candle_fixture(path: &Path) -> Result<Value, AnalysisError> {
    let raw = std::fs::read(path).map_err(|source| AnalysisError::Fixture {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Flatten the `candles` array of `json_data` into a table.
pub fn analyse(json_data: &Value) -> Result<CandleTable, AnalysisError> {
    let candles = json_data
        .get("candles")
        .and_then(Value::as_array)
        .ok_or(AnalysisError::MissingCandles)?;

    let rows = candles
        .iter()
        .map(|candle| flatten_candle(RawCandle::deserialize(candle)?))
        .collect::<Result<Vec<_>, _>>()?;

    let table = CandleTable { rows };
    tracing::debug!(rows = table.rows.len(), "candles analysed");
    Ok(table)
}

fn flatten_candle(raw: RawCandle) -> Result<Candle, AnalysisError> {
    let time = NaiveDateTime::parse_from_str(&raw.time, CANDLE_TIME_FORMAT).map_err(|source| AnalysisError::Time {
        value: raw.time.clone(),
        source,
    })?;

    Ok(Candle {
        time,
        complete: raw.complete,
        volume: raw.volume,
        open: parse_price("open", &raw.mid.o)?,
        high: parse_price("high", &raw.mid.h)?,
        low: parse_price("low", &raw.mid.l)?,
        close: parse_price("close", &raw.mid.c)?,
    })
}

fn parse_price(field: &'static str, value: &Value) -> Result<f64, AnalysisError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| AnalysisError::Price {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    fn candle(time: &str, volume: i64) -> Value {
        json!({
            "complete": true,
            "volume": volume,
            "time": time,
            "mid": {"o": "1674.950", "h": "1675.080", "l": "1674.900", "c": "1675.055"}
        })
    }

    fn payload(n: usize) -> Value {
        let candles: Vec<Value> = (0..n)
            .map(|i| candle(&format!("2022-09-16T20:{:02}:{:02}.000000000Z", i / 6, (i % 6) * 10), i as i64 + 1))
            .collect();
        json!({"instrument": "XAU_USD", "granularity": "S10", "candles": candles})
    }

    #[test]
    fn test_shape_matches_candle_count() {
        for n in [0, 1, 5, 42] {
            let table = analyse(&payload(n)).unwrap();
            assert_eq!(table.shape(), (n, 7));
        }
    }

    #[test]
    fn test_row_values() {
        let table = analyse(&json!({"candles": [candle("2022-09-17T23:37:51.123456000Z", 9)]})).unwrap();
        let row = &table.rows[0];
        let expected_day = NaiveDate::from_ymd_opt(2022, 9, 17).unwrap();
        assert_eq!(row.time.date(), expected_day);
        assert_eq!(row.time.time().hour(), 23);
        assert_eq!(row.time.time().nanosecond(), 123_456_000);
        assert!(row.complete);
        assert_eq!(row.volume, 9);
        assert_eq!(row.open, 1674.95);
        assert_eq!(row.high, 1675.08);
        assert_eq!(row.low, 1674.9);
        assert_eq!(row.close, 1675.055);
    }

    #[test]
    fn test_candle_display_has_every_column() {
        let table = analyse(&payload(1)).unwrap();
        let shown = table.rows[0].to_string();
        assert_eq!(shown.split_whitespace().count(), CandleTable::COLUMNS.len() + 1);
        assert!(shown.starts_with("2022-09-16 20:00:00"));
    }

    #[test]
    fn test_numeric_prices_are_accepted() {
        let data = json!({"candles": [{
            "complete": false, "volume": 1, "time": "2022-09-16T20:59:50.000000000Z",
            "mid": {"o": 1.5, "h": 2, "l": 1.0, "c": 1.25}
        }]});
        let table = analyse(&data).unwrap();
        assert_eq!(table.rows[0].high, 2.0);
        assert!(!table.rows[0].complete);
    }

    #[test]
    fn test_missing_candles_key() {
        assert!(matches!(analyse(&json!({"instrument": "XAU_USD"})), Err(AnalysisError::MissingCandles)));
    }

    #[test]
    fn test_bad_time() {
        for time in [
            "16/09/2022 20:59",
            "2022-09-17T23:37:51Z",
            "2022-09-17T23:37:51.5Z",
            "2022-09-17T23:37:51.123456Z",
            "2022-09-17T23:37:51.123456789Z",
        ] {
            let data = json!({"candles": [candle(time, 1)]});
            assert!(matches!(analyse(&data), Err(AnalysisError::Time { .. })), "{} was accepted", time);
        }
    }

    #[test]
    fn test_bad_price() {
        let mut c = candle("2022-09-16T20:59:50.000000000Z", 1);
        c["mid"]["c"] = json!("n/a");
        assert!(matches!(analyse(&json!({"candles": [c]})), Err(AnalysisError::Price { field: "close", .. })));
    }

    #[test]
    fn test_missing_mid_is_json_error() {
        let data = json!({"candles": [{"complete": true, "volume": 1, "time": "2022-09-16T20:59:50.000000000Z"}]});
        assert!(matches!(analyse(&data), Err(AnalysisError::Json(_))));
    }

    #[test]
    fn test_load_candle_fixture() {
        let dir = crate::settings::tests::scratch_dir("fixture");
        let path = dir.join("historical-candle-XAU_USD-S10-20220917-233751.json");
        std::fs::write(&path, payload(3).to_string()).unwrap();
        let table = analyse(&load_candle_fixture(&path).unwrap()).unwrap();
        assert_eq!(table.shape(), (3, 7));

        assert!(matches!(load_candle_fixture(&dir.join("missing.json")), Err(AnalysisError::Fixture { .. })));
    }
}

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use crate::error::Error;
use crate::models::PriceObservation;
use crate::Result;

/// Raw CSV row: `timestamp,open,high,low,close[,volume]`
#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Parse a bar timestamp given as milliseconds since epoch or RFC 3339
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| Error::Feed(format!("timestamp out of range: {}", raw)));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Feed(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Load historical OHLCV bars for one instrument, oldest first
///
/// # Arguments
/// * `path` - CSV file with a `timestamp,open,high,low,close,volume` header
/// * `instrument` - Instrument the bars belong to
///
/// Rows with a non-finite or non-positive close are rejected.
pub fn load_bars_csv(path: impl AsRef<Path>, instrument: &str) -> Result<Vec<PriceObservation>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut bars = Vec::new();
    for (line, row) in reader.deserialize::<BarRow>().enumerate() {
        let row = row?;
        if !row.close.is_finite() || row.close <= 0.0 {
            return Err(Error::InvalidPrice {
                instrument: instrument.to_string(),
                price: row.close,
            });
        }
        let timestamp = parse_timestamp(&row.timestamp).map_err(|e| {
            Error::Feed(format!("{} row {}: {}", path.display(), line + 2, e))
        })?;

        bars.push(PriceObservation {
            instrument: instrument.to_string(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    tracing::info!(
        instrument = %instrument,
        "Loaded {} bars from {}",
        bars.len(),
        path.display()
    );
    Ok(bars)
}

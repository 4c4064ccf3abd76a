use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bollinger::calculate_bollinger;
use super::macd::Macd;
use super::rolling_window::RollingWindow;
use super::rsi::calculate_rsi;
use crate::models::PriceObservation;

/// Indicator parameters shared by the chart and the bot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndicatorParams {
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub rsi_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bollinger_window: 20,
            bollinger_std: 2.0,
            rsi_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

/// Point-in-time indicator values produced by one update
///
/// Every `None` means "not yet computable"; consumers must check before
/// acting on a value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSnapshot {
    pub timestamp: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    pub samples: usize,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
}

/// Stateful indicator pipeline for one price series
///
/// Bollinger and RSI are recomputed from the bounded price window on every
/// update; MACD carries its own EMA recurrence state. Replaying the same
/// observations into a fresh engine reproduces the same snapshots.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    params: IndicatorParams,
    prices: RollingWindow<f64>,
    macd: Macd,
    samples: usize,
    last: IndicatorSnapshot,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams, capacity: usize) -> Self {
        Self {
            params,
            prices: RollingWindow::new(capacity),
            macd: Macd::new(params.macd_fast, params.macd_slow, params.macd_signal),
            samples: 0,
            last: IndicatorSnapshot::default(),
        }
    }

    /// Seed from historical bars; identical to feeding them one by one
    pub fn preload(&mut self, bars: &[PriceObservation]) -> IndicatorSnapshot {
        for bar in bars {
            self.update(bar);
        }
        self.last.clone()
    }

    /// Push one observation and recompute every indicator
    pub fn update(&mut self, observation: &PriceObservation) -> IndicatorSnapshot {
        let price = observation.price();
        self.prices.push(price);
        self.samples += 1;

        let prices = self.prices.snapshot();
        let bands = calculate_bollinger(
            &prices,
            self.params.bollinger_window,
            self.params.bollinger_std,
        );
        let rsi = calculate_rsi(&prices, self.params.rsi_length);
        let macd = self.macd.update(price);

        self.last = IndicatorSnapshot {
            timestamp: Some(observation.timestamp),
            price: Some(price),
            samples: self.samples,
            bollinger_upper: bands.map(|b| b.upper),
            bollinger_middle: bands.map(|b| b.middle),
            bollinger_lower: bands.map(|b| b.lower),
            rsi,
            macd: macd.map(|m| m.macd),
            macd_signal: macd.and_then(|m| m.signal),
            macd_histogram: macd.and_then(|m| m.histogram()),
        };

        tracing::debug!(
            instrument = %observation.instrument,
            price = %price,
            rsi = ?self.last.rsi,
            macd = ?self.last.macd,
            "Indicators updated"
        );

        self.last.clone()
    }

    /// Latest snapshot (default/all-None before the first update)
    pub fn snapshot(&self) -> &IndicatorSnapshot {
        &self.last
    }

    /// Total observations fed, including those evicted from the window
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Prices currently held in the bounded window
    pub fn window(&self) -> &RollingWindow<f64> {
        &self.prices
    }
}

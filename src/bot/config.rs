use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Error;
use crate::indicators::IndicatorParams;
use crate::strategy::SignalEvaluator;
use crate::Result;

/// Bot settings, frozen once confirmed
///
/// A confirmed config is never edited in place: changing it means stopping
/// the bot, configuring a new draft and confirming again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotConfig {
    /// Instrument the bot trades
    pub instrument: String,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub rsi_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Quote amount spent per buy
    pub order_notional: f64,
    /// Capacity of the bot's own price window
    pub window_capacity: usize,
    /// Minimum spacing between two evaluations
    pub decision_interval_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            instrument: "BTCUSDT".to_string(),
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bollinger_window: 20,
            bollinger_std: 2.0,
            rsi_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            order_notional: 100.0,
            window_capacity: 100,
            decision_interval_ms: 1000,
        }
    }
}

impl BotConfig {
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            bollinger_window: self.bollinger_window,
            bollinger_std: self.bollinger_std,
            rsi_length: self.rsi_length,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
        }
    }

    pub fn evaluator(&self) -> SignalEvaluator {
        SignalEvaluator::new(self.rsi_oversold, self.rsi_overbought)
    }

    pub fn decision_interval(&self) -> Duration {
        Duration::from_millis(self.decision_interval_ms)
    }

    /// Reject settings the bot could never act on sensibly
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.instrument.trim().is_empty() {
            return invalid("instrument must not be empty".to_string());
        }
        for (name, value) in [
            ("rsi_oversold", self.rsi_oversold),
            ("rsi_overbought", self.rsi_overbought),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return invalid(format!("{name} must be within 0..=100, got {value}"));
            }
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return invalid(format!(
                "rsi_oversold ({}) must be below rsi_overbought ({})",
                self.rsi_oversold, self.rsi_overbought
            ));
        }
        for (name, value) in [
            ("bollinger_window", self.bollinger_window),
            ("rsi_length", self.rsi_length),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be at least 1"));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return invalid(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                self.macd_fast, self.macd_slow
            ));
        }
        if !self.bollinger_std.is_finite() || self.bollinger_std < 0.0 {
            return invalid(format!("bollinger_std must be >= 0, got {}", self.bollinger_std));
        }
        if !self.order_notional.is_finite() || self.order_notional <= 0.0 {
            return invalid(format!("order_notional must be > 0, got {}", self.order_notional));
        }
        let needed = self.bollinger_window.max(self.rsi_length + 1);
        if self.window_capacity < needed {
            return invalid(format!(
                "window_capacity ({}) must hold at least {} samples",
                self.window_capacity, needed
            ));
        }
        if self.decision_interval_ms == 0 {
            return invalid("decision_interval_ms must be at least 1".to_string());
        }

        Ok(())
    }
}

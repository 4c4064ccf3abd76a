//! Application configuration
//!
//! Loaded from defaults, an optional TOML file and `PAPERBOT__*` environment
//! variables (after `.env`), in that order of precedence.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bot::BotConfig;
use crate::indicators::IndicatorParams;
use crate::session::SessionConfig;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub session: SessionSettings,
    pub bot: BotSettings,
    pub log: LogSettings,
}

/// Paper account and feed settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    pub initial_balance: f64,
    pub order_notional: f64,
    pub chart_capacity: usize,
    pub instruments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotSettings {
    pub instrument: String,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub rsi_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub window_capacity: usize,
    pub decision_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub filter: String,
}

impl AppConfig {
    /// Load configuration
    ///
    /// # Arguments
    /// * `path` - Optional TOML file; when given it must exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            // Session
            .set_default("session.initial_balance", 10_000.0)?
            .set_default("session.order_notional", 100.0)?
            .set_default("session.chart_capacity", 1000_i64)?
            .set_default("session.instruments", vec!["BTCUSDT"])?
            // Bot
            .set_default("bot.instrument", "BTCUSDT")?
            .set_default("bot.rsi_oversold", 30.0)?
            .set_default("bot.rsi_overbought", 70.0)?
            .set_default("bot.bollinger_window", 20_i64)?
            .set_default("bot.bollinger_std", 2.0)?
            .set_default("bot.rsi_length", 14_i64)?
            .set_default("bot.macd_fast", 12_i64)?
            .set_default("bot.macd_slow", 26_i64)?
            .set_default("bot.macd_signal", 9_i64)?
            .set_default("bot.window_capacity", 100_i64)?
            .set_default("bot.decision_interval_ms", 1000_i64)?
            // Logging
            .set_default("log.filter", "paperbot=info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix("PAPERBOT").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Draft bot config; still has to be confirmed by the controller
    pub fn bot_config(&self) -> BotConfig {
        BotConfig {
            instrument: self.bot.instrument.clone(),
            rsi_oversold: self.bot.rsi_oversold,
            rsi_overbought: self.bot.rsi_overbought,
            bollinger_window: self.bot.bollinger_window,
            bollinger_std: self.bot.bollinger_std,
            rsi_length: self.bot.rsi_length,
            macd_fast: self.bot.macd_fast,
            macd_slow: self.bot.macd_slow,
            macd_signal: self.bot.macd_signal,
            order_notional: self.session.order_notional,
            window_capacity: self.bot.window_capacity,
            decision_interval_ms: self.bot.decision_interval_ms,
        }
    }

    /// Instruments a session subscribes: the configured list plus the bot
    /// instrument, first occurrence wins
    pub fn tracked_instruments(&self) -> Vec<String> {
        let mut instruments: Vec<String> = Vec::new();
        for instrument in self
            .session
            .instruments
            .iter()
            .chain(std::iter::once(&self.bot.instrument))
        {
            if !instruments.contains(instrument) {
                instruments.push(instrument.clone());
            }
        }
        instruments
    }

    /// Chart engines share the bot's indicator parameters
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            chart_capacity: self.session.chart_capacity,
            indicator_params: IndicatorParams {
                bollinger_window: self.bot.bollinger_window,
                bollinger_std: self.bot.bollinger_std,
                rsi_length: self.bot.rsi_length,
                macd_fast: self.bot.macd_fast,
                macd_slow: self.bot.macd_slow,
                macd_signal: self.bot.macd_signal,
            },
        }
    }
}

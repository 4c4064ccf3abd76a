use thiserror::Error;

use crate::bot::BotState;

/// Every recoverable failure the trading core reports.
///
/// None of these are fatal: the ledger and bot stay usable after any of
/// them and a failed call never leaves partially applied state behind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("insufficient balance: order needs {needed:.2}, available {available:.2}")]
    InsufficientBalance { needed: f64, available: f64 },

    #[error("insufficient position in {instrument}: requested {requested:.8}, held {held:.8}")]
    InsufficientPosition {
        instrument: String,
        requested: f64,
        held: f64,
    },

    #[error("no open position in {instrument}")]
    NoPosition { instrument: String },

    #[error("no price observed yet for {instrument}")]
    NoPrice { instrument: String },

    #[error("invalid order amount {amount}")]
    InvalidAmount { amount: f64 },

    #[error("invalid price {price} for {instrument}")]
    InvalidPrice { instrument: String, price: f64 },

    #[error("cannot {action} while bot is {from:?}")]
    InvalidTransition { from: BotState, action: &'static str },

    #[error("invalid bot configuration: {0}")]
    InvalidConfig(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::LockPoisoned(e.to_string())
    }
}

// Core modules
pub mod bot;
pub mod config;
pub mod error;
pub mod execution;
pub mod feed;
pub mod indicators;
pub mod models;
pub mod session;
pub mod strategy;

// Re-export commonly used types
pub use bot::{BotConfig, BotController, BotState, BotStats, BotStatus, SharedBot};
pub use error::Error;
pub use execution::{Ledger, LedgerSnapshot, SharedLedger};
pub use feed::FeedEvent;
pub use indicators::{IndicatorEngine, IndicatorParams, IndicatorSnapshot, RollingWindow};
pub use models::*;
pub use session::{Session, SessionConfig, SessionHandle};
pub use strategy::SignalEvaluator;

// Error handling
pub type Result<T> = std::result::Result<T, Error>;

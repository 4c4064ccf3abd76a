// Trading bot state machine
pub mod config;
pub mod controller;
pub mod throttle;

pub use config::BotConfig;
pub use controller::{BotController, BotState, BotStats, BotStatus, SharedBot};
pub use throttle::DecisionThrottle;

// Market data feed: events, historical bars, synthetic generator
pub mod loader;
pub mod synthetic;

use crate::models::PriceObservation;
use serde::{Deserialize, Serialize};

pub use loader::{load_bars_csv, parse_timestamp};
pub use synthetic::{backdated_start, interleave, MarketScenario, SyntheticFeed};

/// One event from the market data transport, consumed in arrival order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FeedEvent {
    /// Start tracking an instrument, seeding it with historical bars
    Subscribe {
        instrument: String,
        history: Vec<PriceObservation>,
    },
    /// Live tick or completed bar
    Observation(PriceObservation),
    /// Stop tracking an instrument and drop its window
    Unsubscribe { instrument: String },
}

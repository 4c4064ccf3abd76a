use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One decoded market observation for an instrument
///
/// Ticker-only feeds carry a single price; those are represented with all
/// four prices equal and zero volume (see [`PriceObservation::tick`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceObservation {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceObservation {
    /// Build a ticker observation (`{timestamp, price}` feeds)
    pub fn tick(instrument: impl Into<String>, timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }

    /// Price used by every indicator: the close
    pub fn price(&self) -> f64 {
        self.close
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Open holding in one instrument
///
/// `amount == 0` never occurs for a stored position: the ledger removes
/// the entry instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub instrument: String,
    pub amount: f64,
    pub total_cost: f64,
}

impl Position {
    /// Weighted average cost per unit
    pub fn average_price(&self) -> f64 {
        if self.amount > 0.0 {
            self.total_cost / self.amount
        } else {
            0.0
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.amount * price
    }
}

/// Immutable execution record, appended once and never edited
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub id: Uuid,
    pub side: TradeSide,
    pub instrument: String,
    pub price: f64,
    pub amount: f64,
    pub notional: f64,
    pub timestamp: DateTime<Utc>,
    /// Only set on sells
    pub realized_pnl: Option<f64>,
    /// Cost basis released by a sell (None for buys)
    pub cost_basis: Option<f64>,
}

impl Trade {
    /// Realized PnL as a percentage of the cost basis released (sells only)
    pub fn realized_pnl_pct(&self) -> Option<f64> {
        match (self.realized_pnl, self.cost_basis) {
            (Some(pnl), Some(basis)) if basis > 0.0 => Some(pnl / basis * 100.0),
            _ => None,
        }
    }
}

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;

use crate::error::Error;
use crate::models::PriceObservation;
use crate::Result;

/// Market scenario types for synthetic ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Upward drift with noise
    Uptrend,
    /// Downward drift with noise
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
    /// Large random swings
    Volatile,
}

impl FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uptrend" => Ok(MarketScenario::Uptrend),
            "downtrend" => Ok(MarketScenario::Downtrend),
            "sideways" => Ok(MarketScenario::Sideways),
            "volatile" => Ok(MarketScenario::Volatile),
            other => Err(format!(
                "unknown scenario '{}' (expected uptrend, downtrend, sideways or volatile)",
                other
            )),
        }
    }
}

/// Start time such that `ticks` ticks spaced `interval_ms` apart end at `end`
///
/// Fails instead of overflowing when the span does not fit in a timestamp.
pub fn backdated_start(end: DateTime<Utc>, ticks: usize, interval_ms: i64) -> Result<DateTime<Utc>> {
    if interval_ms <= 0 {
        return Err(Error::Feed(format!(
            "tick interval must be positive, got {} ms",
            interval_ms
        )));
    }
    i64::try_from(ticks)
        .ok()
        .and_then(|n| interval_ms.checked_mul(n))
        .and_then(Duration::try_milliseconds)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| {
            Error::Feed(format!(
                "{} ticks at {} ms do not fit in the timestamp range",
                ticks, interval_ms
            ))
        })
}

/// Merge per-instrument feeds into one stream ordered by timestamp
///
/// Ticks sharing a timestamp keep the order of `feeds`.
pub fn interleave(feeds: Vec<Vec<PriceObservation>>) -> Vec<PriceObservation> {
    let mut merged: Vec<PriceObservation> = feeds.into_iter().flatten().collect();
    merged.sort_by_key(|obs| obs.timestamp);
    merged
}

/// Seeded random-walk tick generator
///
/// The same seed, scenario and start time always produce the same ticks.
pub struct SyntheticFeed {
    rng: StdRng,
    instrument: String,
    base_price: f64,
}

impl SyntheticFeed {
    pub fn new(instrument: impl Into<String>, base_price: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            instrument: instrument.into(),
            base_price,
        }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Generate ticks for a scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_ticks` - Number of observations to produce
    /// * `start` - Timestamp of the first tick
    /// * `interval` - Spacing between ticks
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_ticks: usize,
        start: DateTime<Utc>,
        interval: Duration,
    ) -> Vec<PriceObservation> {
        let mut ticks = Vec::new();
        let mut price = self.base_price;
        let floor = self.base_price * 0.1;

        let mut timestamp = start;
        for i in 0..num_ticks {
            price = self.step(scenario, price).max(floor);
            ticks.push(PriceObservation::tick(self.instrument.clone(), timestamp, price));
            if i + 1 == num_ticks {
                break;
            }

            timestamp = match timestamp.checked_add_signed(interval) {
                Some(next) => next,
                None => {
                    tracing::warn!(
                        instrument = %self.instrument,
                        "Timestamp range exhausted after {} of {} ticks",
                        i + 1,
                        num_ticks
                    );
                    break;
                }
            };
        }

        ticks
    }

    fn step(&mut self, scenario: MarketScenario, price: f64) -> f64 {
        match scenario {
            MarketScenario::Uptrend => {
                let noise = price * self.rng.gen_range(-0.003..0.003);
                price + price * 0.001 + noise
            }
            MarketScenario::Downtrend => {
                let noise = price * self.rng.gen_range(-0.003..0.003);
                price - price * 0.001 + noise
            }
            MarketScenario::Sideways => {
                // 10% pull back to the base price
                let reversion = (self.base_price - price) * 0.1;
                let noise = price * self.rng.gen_range(-0.01..0.01);
                price + reversion + noise
            }
            MarketScenario::Volatile => price + price * self.rng.gen_range(-0.05..0.05),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Position, Trade, TradeSide};
use crate::Result;

/// Relative tolerance on sell quantities: a sell within this fraction of
/// the held amount closes the position
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Mark-to-market PnL of one open position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PositionPnl {
    pub value: f64,
    pub percentage: f64,
}

/// Trade plus the PnL fields derived at read time
///
/// Buys are marked against the latest known price of their instrument;
/// sells report the PnL realized when they executed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeView {
    #[serde(flatten)]
    pub trade: Trade,
    pub unrealized_pnl: Option<f64>,
    pub pnl_percentage: Option<f64>,
}

/// Consistent point-in-time copy of the whole ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    pub balance: f64,
    pub initial_balance: f64,
    pub positions: Vec<Position>,
    pub trades: Vec<TradeView>,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    price: f64,
    timestamp: DateTime<Utc>,
}

/// Paper execution ledger shared by every instrument of a session
///
/// Holds the quote balance, one weighted-average-cost position per
/// instrument and the append-only trade history. Every operation either
/// applies completely or returns an error with no state changed.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_balance: f64,
    balance: f64,
    positions: HashMap<String, Position>,
    trades: Vec<Trade>,
    marks: HashMap<String, Mark>,
}

impl Ledger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            positions: HashMap::new(),
            trades: Vec::new(),
            marks: HashMap::new(),
        }
    }

    /// Record the latest observed price for an instrument
    pub fn mark_price(&mut self, instrument: &str, price: f64, timestamp: DateTime<Utc>) {
        if !price.is_finite() || price <= 0.0 {
            tracing::debug!(instrument = %instrument, price = %price, "Ignoring invalid mark");
            return;
        }
        self.marks
            .insert(instrument.to_string(), Mark { price, timestamp });
    }

    /// Latest marked price, if any observation has been seen
    pub fn last_price(&self, instrument: &str) -> Option<f64> {
        self.marks.get(instrument).map(|m| m.price)
    }

    /// An execution is also a price observation unless a newer mark exists
    fn record_fill_price(&mut self, instrument: &str, price: f64, timestamp: DateTime<Utc>) {
        let stale = self
            .marks
            .get(instrument)
            .map_or(true, |mark| mark.timestamp <= timestamp);
        if stale {
            self.marks
                .insert(instrument.to_string(), Mark { price, timestamp });
        }
    }

    fn current_mark(&self, instrument: &str) -> Result<Mark> {
        self.marks
            .get(instrument)
            .copied()
            .ok_or_else(|| Error::NoPrice {
                instrument: instrument.to_string(),
            })
    }

    /// Market buy of `notional` quote currency at the latest marked price
    pub fn buy(&mut self, instrument: &str, notional: f64) -> Result<Trade> {
        let mark = self.current_mark(instrument)?;
        self.buy_at(instrument, notional, mark.price, mark.timestamp)
    }

    /// Market sell of `notional` quote currency at the latest marked price
    pub fn sell(&mut self, instrument: &str, notional: f64) -> Result<Trade> {
        let mark = self.current_mark(instrument)?;
        self.sell_at(instrument, notional, mark.price, mark.timestamp)
    }

    /// Sell the whole position at the latest marked price
    pub fn close(&mut self, instrument: &str) -> Result<Trade> {
        let mark = self.current_mark(instrument)?;
        let amount = self
            .positions
            .get(instrument)
            .map(|p| p.amount)
            .ok_or_else(|| Error::NoPosition {
                instrument: instrument.to_string(),
            })?;
        self.sell_at(instrument, amount * mark.price, mark.price, mark.timestamp)
    }

    /// Buy at an explicit price
    ///
    /// Adds to an existing position with weighted-average cost:
    /// `amount += qty; total_cost += notional`.
    pub fn buy_at(
        &mut self,
        instrument: &str,
        notional: f64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Trade> {
        validate_order(instrument, notional, price)?;

        if self.balance < notional {
            return Err(Error::InsufficientBalance {
                needed: notional,
                available: self.balance,
            });
        }

        let quantity = notional / price;

        let position = self
            .positions
            .entry(instrument.to_string())
            .or_insert_with(|| Position {
                instrument: instrument.to_string(),
                amount: 0.0,
                total_cost: 0.0,
            });
        position.amount += quantity;
        position.total_cost += notional;
        let average_price = position.average_price();
        let held = position.amount;

        self.balance -= notional;
        self.record_fill_price(instrument, price, timestamp);

        let trade = Trade {
            id: Uuid::new_v4(),
            side: TradeSide::Buy,
            instrument: instrument.to_string(),
            price,
            amount: quantity,
            notional,
            timestamp,
            realized_pnl: None,
            cost_basis: None,
        };
        self.trades.push(trade.clone());

        tracing::info!(
            instrument = %instrument,
            price = %price,
            quantity = %quantity,
            "BUY ${:.2} (avg: ${:.4}, total qty: {:.8}, balance: ${:.2})",
            notional,
            average_price,
            held,
            self.balance
        );

        Ok(trade)
    }

    /// Sell at an explicit price
    ///
    /// Releases `qty * average_price` of cost basis and books the difference
    /// to the proceeds as realized PnL. A position reduced to (near) zero is
    /// removed from the ledger.
    pub fn sell_at(
        &mut self,
        instrument: &str,
        notional: f64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Trade> {
        validate_order(instrument, notional, price)?;

        let position = self
            .positions
            .get(instrument)
            .ok_or_else(|| Error::NoPosition {
                instrument: instrument.to_string(),
            })?;

        let requested = notional / price;
        let tolerance = position.amount * QUANTITY_EPSILON;
        if requested > position.amount + tolerance {
            return Err(Error::InsufficientPosition {
                instrument: instrument.to_string(),
                requested,
                held: position.amount,
            });
        }

        let closes_position = position.amount - requested <= tolerance;
        let (quantity, cost_basis) = if closes_position {
            (position.amount, position.total_cost)
        } else {
            (requested, requested * position.average_price())
        };
        let realized_pnl = notional - cost_basis;

        if closes_position {
            self.positions.remove(instrument);
        } else if let Some(position) = self.positions.get_mut(instrument) {
            position.amount -= quantity;
            position.total_cost -= cost_basis;
        }

        self.balance += notional;
        self.record_fill_price(instrument, price, timestamp);

        let trade = Trade {
            id: Uuid::new_v4(),
            side: TradeSide::Sell,
            instrument: instrument.to_string(),
            price,
            amount: quantity,
            notional,
            timestamp,
            realized_pnl: Some(realized_pnl),
            cost_basis: Some(cost_basis),
        };
        self.trades.push(trade.clone());

        tracing::info!(
            instrument = %instrument,
            price = %price,
            quantity = %quantity,
            "SELL ${:.2} (realized: ${:.2}, closed: {}, balance: ${:.2})",
            notional,
            realized_pnl,
            closes_position,
            self.balance
        );

        Ok(trade)
    }

    /// Mark-to-market PnL of the open position at `current_price`
    pub fn unrealized_pnl(&self, instrument: &str, current_price: f64) -> Option<PositionPnl> {
        let position = self.positions.get(instrument)?;
        let value = position.market_value(current_price) - position.total_cost;
        let percentage = if position.total_cost > 0.0 {
            value / position.total_cost * 100.0
        } else {
            0.0
        };
        Some(PositionPnl { value, percentage })
    }

    /// Unrealized PnL across all open positions at their latest marks
    pub fn total_unrealized_pnl(&self) -> f64 {
        self.positions
            .values()
            .filter_map(|p| {
                let price = self.last_price(&p.instrument)?;
                self.unrealized_pnl(&p.instrument, price)
            })
            .map(|pnl| pnl.value)
            .sum()
    }

    /// Sum of PnL realized by every sell
    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().filter_map(|t| t.realized_pnl).sum()
    }

    /// Realized plus unrealized PnL
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl() + self.total_unrealized_pnl()
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn position(&self, instrument: &str) -> Option<&Position> {
        self.positions.get(instrument)
    }

    pub fn has_position(&self, instrument: &str) -> bool {
        self.positions.contains_key(instrument)
    }

    /// Open positions ordered by instrument
    pub fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.instrument.cmp(&b.instrument));
        positions
    }

    /// Trade history in execution order
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Trade history with PnL derived from the latest marks
    pub fn trade_views(&self) -> Vec<TradeView> {
        self.trades
            .iter()
            .map(|trade| match trade.side {
                TradeSide::Buy => {
                    let current = self.last_price(&trade.instrument).unwrap_or(trade.price);
                    TradeView {
                        trade: trade.clone(),
                        unrealized_pnl: Some((current - trade.price) * trade.amount),
                        pnl_percentage: Some((current - trade.price) / trade.price * 100.0),
                    }
                }
                TradeSide::Sell => TradeView {
                    trade: trade.clone(),
                    unrealized_pnl: None,
                    pnl_percentage: trade.realized_pnl_pct(),
                },
            })
            .collect()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let realized_pnl = self.realized_pnl();
        let unrealized_pnl = self.total_unrealized_pnl();
        LedgerSnapshot {
            balance: self.balance,
            initial_balance: self.initial_balance,
            positions: self.positions(),
            trades: self.trade_views(),
            realized_pnl,
            unrealized_pnl,
            total_pnl: realized_pnl + unrealized_pnl,
        }
    }
}

fn validate_order(instrument: &str, notional: f64, price: f64) -> Result<()> {
    if !notional.is_finite() || notional <= 0.0 {
        return Err(Error::InvalidAmount { amount: notional });
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::InvalidPrice {
            instrument: instrument.to_string(),
            price,
        });
    }
    Ok(())
}

/// Thread-safe handle to the session ledger
///
/// Each call takes the lock exactly once, so a reader can never observe an
/// order half applied (balance moved but trade not yet recorded).
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(initial_balance: f64) -> Self {
        Self::from_ledger(Ledger::new(initial_balance))
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn mark_price(&self, instrument: &str, price: f64, timestamp: DateTime<Utc>) -> Result<()> {
        self.inner.write()?.mark_price(instrument, price, timestamp);
        Ok(())
    }

    pub fn buy(&self, instrument: &str, notional: f64) -> Result<Trade> {
        self.inner.write()?.buy(instrument, notional)
    }

    pub fn sell(&self, instrument: &str, notional: f64) -> Result<Trade> {
        self.inner.write()?.sell(instrument, notional)
    }

    pub fn close(&self, instrument: &str) -> Result<Trade> {
        self.inner.write()?.close(instrument)
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(self.inner.read()?.snapshot())
    }

    /// Run a read-only query under a single lock acquisition
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> Result<R> {
        let guard = self.inner.read()?;
        Ok(f(&*guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn ledger_with_price(instrument: &str, price: f64) -> Ledger {
        let mut ledger = Ledger::new(10_000.0);
        ledger.mark_price(instrument, price, Utc::now());
        ledger
    }

    #[test]
    fn test_buy_opens_position() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        let trade = ledger.buy("BTCUSDT", 100.0).unwrap();

        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.amount, 1.0);
        assert_eq!(trade.notional, 100.0);
        assert!(trade.realized_pnl.is_none());

        let position = ledger.position("BTCUSDT").unwrap();
        assert_eq!(position.amount, 1.0);
        assert_eq!(position.total_cost, 100.0);
        assert_eq!(position.average_price(), 100.0);
        assert_eq!(ledger.balance(), 9900.0);
    }

    #[test]
    fn test_buy_without_price_fails() {
        let mut ledger = Ledger::new(10_000.0);
        let result = ledger.buy("BTCUSDT", 100.0);
        assert!(matches!(result, Err(Error::NoPrice { .. })));
        assert!(ledger.trades().is_empty());
    }

    #[test]
    fn test_insufficient_balance() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        let result = ledger.buy("BTCUSDT", 10_000.01);

        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
        assert_eq!(ledger.balance(), 10_000.0);
        assert!(!ledger.has_position("BTCUSDT"));
        assert!(ledger.trades().is_empty());
    }

    #[test]
    fn test_buy_entire_balance_allowed() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        ledger.buy("BTCUSDT", 10_000.0).unwrap();
        assert_eq!(ledger.balance(), 0.0);
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        assert!(matches!(
            ledger.buy("BTCUSDT", 0.0),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            ledger.buy("BTCUSDT", -5.0),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            ledger.buy_at("BTCUSDT", 10.0, 0.0, Utc::now()),
            Err(Error::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_weighted_average_cost() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.buy_at("ETHUSDT", 100.0, 100.0, Utc::now()).unwrap();
        ledger.buy_at("ETHUSDT", 300.0, 150.0, Utc::now()).unwrap();

        let position = ledger.position("ETHUSDT").unwrap();
        // 1 unit + 2 units for 400 total
        assert_relative_eq!(position.amount, 3.0);
        assert_relative_eq!(position.total_cost, 400.0);
        assert_relative_eq!(position.average_price(), 400.0 / 3.0);
    }

    #[test]
    fn test_round_trip_same_price_is_flat() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        ledger.buy("BTCUSDT", 100.0).unwrap();
        let sell = ledger.sell("BTCUSDT", 100.0).unwrap();

        assert_eq!(sell.realized_pnl, Some(0.0));
        assert!(!ledger.has_position("BTCUSDT"));
        assert_eq!(ledger.balance(), 10_000.0);
    }

    #[test]
    fn test_round_trip_awkward_price_closes() {
        let mut ledger = ledger_with_price("SOLUSDT", 37.13);
        ledger.buy("SOLUSDT", 100.0).unwrap();
        let sell = ledger.close("SOLUSDT").unwrap();

        assert_relative_eq!(sell.realized_pnl.unwrap(), 0.0, epsilon = 1e-9);
        assert!(!ledger.has_position("SOLUSDT"));
    }

    #[test]
    fn test_partial_sell_realizes_against_average() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        ledger.buy("BTCUSDT", 200.0).unwrap();

        ledger.mark_price("BTCUSDT", 120.0, Utc::now());
        let sell = ledger.sell("BTCUSDT", 120.0).unwrap();

        // 1 unit sold, cost basis 100
        assert_relative_eq!(sell.amount, 1.0);
        assert_relative_eq!(sell.realized_pnl.unwrap(), 20.0);
        assert_relative_eq!(sell.realized_pnl_pct().unwrap(), 20.0);

        let position = ledger.position("BTCUSDT").unwrap();
        assert_relative_eq!(position.amount, 1.0);
        assert_relative_eq!(position.total_cost, 100.0);
        assert_relative_eq!(ledger.balance(), 9_920.0);
    }

    #[test]
    fn test_sell_beyond_position_leaves_state_unchanged() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        ledger.buy("BTCUSDT", 100.0).unwrap();
        let before = ledger.snapshot();

        let result = ledger.sell("BTCUSDT", 150.0);
        assert!(matches!(result, Err(Error::InsufficientPosition { .. })));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_sell_without_position() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        let result = ledger.sell("BTCUSDT", 10.0);
        assert!(matches!(result, Err(Error::NoPosition { .. })));
    }

    #[test]
    fn test_unrealized_pnl() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        ledger.buy("BTCUSDT", 200.0).unwrap();

        let pnl = ledger.unrealized_pnl("BTCUSDT", 110.0).unwrap();
        assert_relative_eq!(pnl.value, 20.0);
        assert_relative_eq!(pnl.percentage, 10.0);

        assert!(ledger.unrealized_pnl("ETHUSDT", 110.0).is_none());
    }

    #[test]
    fn test_total_pnl_across_instruments() {
        let mut ledger = Ledger::new(10_000.0);
        let now = Utc::now();
        ledger.mark_price("BTCUSDT", 100.0, now);
        ledger.mark_price("ETHUSDT", 50.0, now);
        ledger.buy("BTCUSDT", 100.0).unwrap();
        ledger.buy("ETHUSDT", 100.0).unwrap();

        // Realize +10 on half the BTC
        ledger.mark_price("BTCUSDT", 120.0, now);
        ledger.sell("BTCUSDT", 60.0).unwrap();

        // BTC: 0.5 left at cost 50, marked 120 -> +10
        // ETH: 2 units at cost 100, marked 45 -> -10
        ledger.mark_price("ETHUSDT", 45.0, now);

        assert_relative_eq!(ledger.realized_pnl(), 10.0);
        assert_relative_eq!(ledger.total_unrealized_pnl(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(ledger.total_pnl(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_buy_views_follow_latest_price() {
        let mut ledger = ledger_with_price("BTCUSDT", 100.0);
        ledger.buy("BTCUSDT", 100.0).unwrap();

        ledger.mark_price("BTCUSDT", 105.0, Utc::now());
        let views = ledger.trade_views();
        assert_relative_eq!(views[0].unrealized_pnl.unwrap(), 5.0);
        assert_relative_eq!(views[0].pnl_percentage.unwrap(), 5.0);

        // The stored trade itself never changes
        assert_eq!(ledger.trades()[0].price, 100.0);
    }

    #[test]
    fn test_shared_ledger_snapshot() {
        let shared = SharedLedger::new(1_000.0);
        shared.mark_price("BTCUSDT", 50.0, Utc::now()).unwrap();
        shared.buy("BTCUSDT", 100.0).unwrap();

        let snapshot = shared.snapshot().unwrap();
        assert_eq!(snapshot.balance, 900.0);
        assert_eq!(snapshot.positions.len(), 1);
        assert_eq!(snapshot.trades.len(), 1);
        assert!(shared.read(|l| l.has_position("BTCUSDT")).unwrap());
    }

    #[test]
    fn test_shared_ledger_concurrent_buys() {
        use std::thread;

        let shared = SharedLedger::new(1_000.0);
        shared.mark_price("BTCUSDT", 10.0, Utc::now()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = shared.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _ = ledger.buy("BTCUSDT", 10.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 200 attempts of $10 against $1000: exactly 100 succeed
        let snapshot = shared.snapshot().unwrap();
        assert_eq!(snapshot.trades.len(), 100);
        assert_relative_eq!(snapshot.balance, 0.0, epsilon = 1e-9);
        assert_relative_eq!(snapshot.positions[0].total_cost, 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_oversell_rejected_at_high_price() {
        let mut ledger = ledger_with_price("X", 1e9);
        ledger.buy("X", 100.0).unwrap();
        let before = ledger.snapshot();

        // 1e-7 units held; half a dollar more is still an oversell
        let result = ledger.sell("X", 100.5);
        assert!(matches!(result, Err(Error::InsufficientPosition { .. })));
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(ledger.balance(), 9_900.0);
    }

    #[test]
    fn test_partial_sell_at_high_price_keeps_position() {
        let mut ledger = ledger_with_price("X", 1e9);
        ledger.buy("X", 100.0).unwrap();

        let sell = ledger.sell("X", 99.5).unwrap();

        assert_relative_eq!(sell.realized_pnl.unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(sell.cost_basis.unwrap(), 99.5, epsilon = 1e-9);
        let position = ledger.position("X").unwrap();
        assert_relative_eq!(position.total_cost, 0.5, epsilon = 1e-9);
        assert_relative_eq!(position.amount, 5e-10, epsilon = 1e-18);

        // The remainder still closes cleanly
        let close = ledger.close("X").unwrap();
        assert_relative_eq!(close.realized_pnl.unwrap(), 0.0, epsilon = 1e-9);
        assert!(!ledger.has_position("X"));
    }

    #[test]
    fn test_explicit_price_fill_is_marked() {
        let mut ledger = Ledger::new(10_000.0);
        let t0 = Utc::now();
        ledger.buy_at("ETHUSDT", 100.0, 50.0, t0).unwrap();

        assert_eq!(ledger.last_price("ETHUSDT"), Some(50.0));
        assert_relative_eq!(ledger.total_unrealized_pnl(), 0.0);

        // A later observation wins over an older fill
        ledger.mark_price("ETHUSDT", 60.0, t0 + chrono::Duration::seconds(5));
        ledger.buy_at("ETHUSDT", 100.0, 55.0, t0 + chrono::Duration::seconds(1)).unwrap();
        assert_eq!(ledger.last_price("ETHUSDT"), Some(60.0));

        // 2 units at 50 plus 100/55 units at 55, marked at 60
        let expected = (2.0 + 100.0 / 55.0) * 60.0 - 200.0;
        assert_relative_eq!(ledger.total_pnl(), expected, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn prop_average_cost_formula(
            a in 1.0f64..1_000.0,
            b in 1.0f64..1_000.0,
            p1 in 0.01f64..10_000.0,
            p2 in 0.01f64..10_000.0,
        ) {
            let mut ledger = Ledger::new(10_000.0);
            ledger.buy_at("X", a, p1, Utc::now()).unwrap();
            ledger.buy_at("X", b, p2, Utc::now()).unwrap();

            let expected = (a + b) / (a / p1 + b / p2);
            let actual = ledger.position("X").unwrap().average_price();
            prop_assert!((actual - expected).abs() <= expected * 1e-9);
        }
    }
}

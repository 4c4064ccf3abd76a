use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use super::config::BotConfig;
use super::throttle::DecisionThrottle;
use crate::error::Error;
use crate::execution::SharedLedger;
use crate::indicators::{IndicatorEngine, IndicatorSnapshot};
use crate::models::{PriceObservation, Signal, Trade, TradeSide};
use crate::strategy::SignalEvaluator;
use crate::Result;

/// Bot lifecycle
///
/// `Idle -> Configuring -> Ready -> Running -> Idle`; every other move is
/// rejected with [`Error::InvalidTransition`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BotState {
    Idle,
    Configuring,
    Ready,
    Running,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BotStats {
    /// Orders the bot executed (buys and sells)
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub realized_profit: f64,
    /// Realized profit plus the unrealized PnL of the bot's instrument
    pub total_profit: f64,
    pub last_trade_result: Option<f64>,
    pub entry_price: Option<f64>,
    pub evaluations: u64,
    pub rejected_orders: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotStatus {
    pub state: BotState,
    pub config: Option<BotConfig>,
    pub draft: Option<BotConfig>,
    pub indicators: Option<IndicatorSnapshot>,
    pub stats: BotStats,
}

/// Per-run state built from a confirmed config
#[derive(Debug)]
struct Runtime {
    engine: IndicatorEngine,
    evaluator: SignalEvaluator,
    throttle: Option<DecisionThrottle>,
}

impl Runtime {
    fn new(config: &BotConfig) -> Self {
        Self {
            engine: IndicatorEngine::new(config.indicator_params(), config.window_capacity),
            evaluator: config.evaluator(),
            throttle: None,
        }
    }
}

/// RSI trading bot state machine
///
/// Owns its own bounded indicator window (separate from the chart history)
/// and only ever issues orders while `Running`.
#[derive(Debug)]
pub struct BotController {
    state: BotState,
    draft: Option<BotConfig>,
    config: Option<BotConfig>,
    runtime: Option<Runtime>,
    last_snapshot: Option<IndicatorSnapshot>,
    stats: BotStats,
}

impl Default for BotController {
    fn default() -> Self {
        Self::new()
    }
}

impl BotController {
    pub fn new() -> Self {
        Self {
            state: BotState::Idle,
            draft: None,
            config: None,
            runtime: None,
            last_snapshot: None,
            stats: BotStats::default(),
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn config(&self) -> Option<&BotConfig> {
        self.config.as_ref()
    }

    fn transition(&mut self, to: BotState) {
        tracing::info!("Bot state {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    fn expect_state(&self, expected: BotState, action: &'static str) -> Result<()> {
        if self.state != expected {
            tracing::warn!("Rejected {} while bot is {:?}", action, self.state);
            return Err(Error::InvalidTransition {
                from: self.state,
                action,
            });
        }
        Ok(())
    }

    /// Idle -> Configuring with an editable draft
    pub fn configure(&mut self, draft: BotConfig) -> Result<()> {
        self.expect_state(BotState::Idle, "configure")?;
        self.draft = Some(draft);
        self.transition(BotState::Configuring);
        Ok(())
    }

    /// Replace the draft while still configuring
    pub fn update_draft(&mut self, draft: BotConfig) -> Result<()> {
        self.expect_state(BotState::Configuring, "update draft")?;
        self.draft = Some(draft);
        Ok(())
    }

    /// Configuring -> Ready; validates and freezes the draft
    ///
    /// An invalid draft keeps the bot in `Configuring`.
    pub fn confirm(&mut self) -> Result<()> {
        self.expect_state(BotState::Configuring, "confirm")?;

        let draft = self
            .draft
            .take()
            .ok_or_else(|| Error::InvalidConfig("no draft to confirm".to_string()))?;
        if let Err(e) = draft.validate() {
            self.draft = Some(draft);
            return Err(e);
        }

        tracing::info!(
            instrument = %draft.instrument,
            "Confirmed bot settings: buy below RSI {}, sell above RSI {}, ${:.2} per order",
            draft.rsi_oversold,
            draft.rsi_overbought,
            draft.order_notional
        );

        self.runtime = Some(Runtime::new(&draft));
        self.config = Some(draft);
        self.last_snapshot = None;
        self.transition(BotState::Ready);
        Ok(())
    }

    /// Ready -> Running
    pub fn start(&mut self) -> Result<()> {
        self.expect_state(BotState::Ready, "start")?;
        if let (Some(runtime), Some(config)) = (self.runtime.as_mut(), self.config.as_ref()) {
            let throttle = DecisionThrottle::new(config.decision_interval());
            tracing::info!(
                instrument = %config.instrument,
                "Bot evaluating at most once every {:?}",
                throttle.interval()
            );
            runtime.throttle = Some(throttle);
        }
        self.transition(BotState::Running);
        Ok(())
    }

    /// Running -> Idle; no evaluation starts after this returns
    pub fn stop(&mut self) -> Result<()> {
        self.expect_state(BotState::Running, "stop")?;
        self.runtime = None;
        self.transition(BotState::Idle);
        Ok(())
    }

    pub fn status(&self) -> BotStatus {
        BotStatus {
            state: self.state,
            config: self.config.clone(),
            draft: self.draft.clone(),
            indicators: self.last_snapshot.clone(),
            stats: self.stats.clone(),
        }
    }

    /// Feed one observation; may execute at most one order
    ///
    /// Every observation for the bot's instrument updates its indicators, but
    /// only observations admitted by the decision throttle are evaluated.
    /// Ledger rejections are counted and logged, not returned.
    pub fn on_observation(
        &mut self,
        observation: &PriceObservation,
        ledger: &SharedLedger,
    ) -> Result<Option<Trade>> {
        if self.state != BotState::Running {
            return Ok(None);
        }
        let (config, runtime) = match (self.config.as_ref(), self.runtime.as_mut()) {
            (Some(config), Some(runtime)) => (config, runtime),
            _ => return Ok(None),
        };
        if observation.instrument != config.instrument {
            return Ok(None);
        }

        let instrument = config.instrument.clone();
        let order_notional = config.order_notional;

        let snapshot = runtime.engine.update(observation);
        self.last_snapshot = Some(snapshot.clone());

        ledger.mark_price(&instrument, observation.price(), observation.timestamp)?;

        let admitted = runtime
            .throttle
            .as_mut()
            .map(|t| t.admit(observation.timestamp))
            .unwrap_or(false);
        if !admitted {
            tracing::debug!(instrument = %instrument, "Tick inside decision interval, skipping evaluation");
            self.refresh_profit(ledger, &instrument, observation.price())?;
            return Ok(None);
        }

        self.stats.evaluations += 1;
        let has_position = ledger.read(|l| l.has_position(&instrument))?;
        let signal = runtime.evaluator.evaluate(&snapshot, has_position);

        let result = match signal {
            Signal::Buy => ledger.buy(&instrument, order_notional),
            Signal::Sell => ledger.close(&instrument),
            Signal::Hold => {
                self.refresh_profit(ledger, &instrument, observation.price())?;
                return Ok(None);
            }
        };

        let trade = match result {
            Ok(trade) => trade,
            Err(Error::LockPoisoned(reason)) => return Err(Error::LockPoisoned(reason)),
            Err(e) => {
                tracing::warn!(instrument = %instrument, "Bot order {:?} rejected: {}", signal, e);
                self.stats.rejected_orders += 1;
                self.refresh_profit(ledger, &instrument, observation.price())?;
                return Ok(None);
            }
        };

        self.record_trade(&trade);
        self.refresh_profit(ledger, &instrument, observation.price())?;
        Ok(Some(trade))
    }

    fn record_trade(&mut self, trade: &Trade) {
        self.stats.total_trades += 1;
        match trade.side {
            TradeSide::Buy => {
                self.stats.entry_price = Some(trade.price);
            }
            TradeSide::Sell => {
                let pnl = trade.realized_pnl.unwrap_or(0.0);
                self.stats.realized_profit += pnl;
                self.stats.last_trade_result = Some(pnl);
                self.stats.entry_price = None;
                if pnl > 0.0 {
                    self.stats.winning_trades += 1;
                } else if pnl < 0.0 {
                    self.stats.losing_trades += 1;
                }
            }
        }
    }

    fn refresh_profit(&mut self, ledger: &SharedLedger, instrument: &str, price: f64) -> Result<()> {
        let unrealized = ledger
            .read(|l| l.unrealized_pnl(instrument, price))?
            .map(|pnl| pnl.value)
            .unwrap_or(0.0);
        self.stats.total_profit = self.stats.realized_profit + unrealized;
        Ok(())
    }
}

/// Bot shared between the feed loop and status readers
///
/// An evaluation holds the lock through its ledger call, so once `stop`
/// returns no further order can be issued.
#[derive(Debug, Clone, Default)]
pub struct SharedBot {
    inner: Arc<Mutex<BotController>>,
}

impl SharedBot {
    pub fn new(controller: BotController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn configure(&self, draft: BotConfig) -> Result<()> {
        self.inner.lock()?.configure(draft)
    }

    pub fn update_draft(&self, draft: BotConfig) -> Result<()> {
        self.inner.lock()?.update_draft(draft)
    }

    pub fn confirm(&self) -> Result<()> {
        self.inner.lock()?.confirm()
    }

    pub fn start(&self) -> Result<()> {
        self.inner.lock()?.start()
    }

    pub fn stop(&self) -> Result<()> {
        self.inner.lock()?.stop()
    }

    pub fn state(&self) -> Result<BotState> {
        Ok(self.inner.lock()?.state())
    }

    pub fn status(&self) -> Result<BotStatus> {
        Ok(self.inner.lock()?.status())
    }

    pub fn on_observation(
        &self,
        observation: &PriceObservation,
        ledger: &SharedLedger,
    ) -> Result<Option<Trade>> {
        self.inner.lock()?.on_observation(observation, ledger)
    }
}

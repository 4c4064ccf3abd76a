use std::collections::HashMap;
use tokio::sync::{mpsc, watch};

use crate::bot::SharedBot;
use crate::error::Error;
use crate::execution::SharedLedger;
use crate::feed::FeedEvent;
use crate::indicators::{IndicatorEngine, IndicatorParams, IndicatorSnapshot, RollingWindow};
use crate::models::{PriceObservation, Trade};
use crate::Result;

/// Latest indicator snapshot per tracked instrument
pub type SnapshotMap = HashMap<String, IndicatorSnapshot>;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Bars kept per instrument for charting
    pub chart_capacity: usize,
    /// Indicator parameters for the chart engines
    pub indicator_params: IndicatorParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chart_capacity: 1000,
            indicator_params: IndicatorParams::default(),
        }
    }
}

/// Chart history and indicators for one subscribed instrument
#[derive(Debug, Clone)]
pub struct InstrumentTracker {
    history: RollingWindow<PriceObservation>,
    engine: IndicatorEngine,
}

impl InstrumentTracker {
    pub fn new(params: IndicatorParams, capacity: usize, history: &[PriceObservation]) -> Self {
        let mut window = RollingWindow::new(capacity);
        for bar in history {
            window.push(bar.clone());
        }
        let mut engine = IndicatorEngine::new(params, capacity);
        engine.preload(history);

        Self {
            history: window,
            engine,
        }
    }

    pub fn update(&mut self, observation: &PriceObservation) -> IndicatorSnapshot {
        self.history.push(observation.clone());
        self.engine.update(observation)
    }

    pub fn history(&self) -> &RollingWindow<PriceObservation> {
        &self.history
    }

    pub fn snapshot(&self) -> &IndicatorSnapshot {
        self.engine.snapshot()
    }

    pub fn last(&self) -> Option<&PriceObservation> {
        self.history.last()
    }
}

/// Ingestion boundary between the feed and the trading core
///
/// Events are handled strictly in arrival order. Per observation: mark the
/// ledger, update the instrument's chart indicators, hand the observation to
/// the bot, then publish the new snapshot.
pub struct Session {
    config: SessionConfig,
    trackers: HashMap<String, InstrumentTracker>,
    ledger: SharedLedger,
    bot: SharedBot,
    snapshots: watch::Sender<SnapshotMap>,
    rejected_observations: u64,
}

/// Read side of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    ledger: SharedLedger,
    bot: SharedBot,
    snapshots: watch::Receiver<SnapshotMap>,
}

impl SessionHandle {
    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn bot(&self) -> &SharedBot {
        &self.bot
    }

    /// Receiver for snapshot updates
    pub fn indicators(&self) -> watch::Receiver<SnapshotMap> {
        self.snapshots.clone()
    }

    pub fn latest(&self, instrument: &str) -> Option<IndicatorSnapshot> {
        self.snapshots.borrow().get(instrument).cloned()
    }
}

impl Session {
    pub fn new(config: SessionConfig, ledger: SharedLedger, bot: SharedBot) -> Self {
        let (snapshots, _) = watch::channel(SnapshotMap::new());
        Self {
            config,
            trackers: HashMap::new(),
            ledger,
            bot,
            snapshots,
            rejected_observations: 0,
        }
    }

    pub fn session_handle(&self) -> SessionHandle {
        SessionHandle {
            ledger: self.ledger.clone(),
            bot: self.bot.clone(),
            snapshots: self.snapshots.subscribe(),
        }
    }

    pub fn tracker(&self, instrument: &str) -> Option<&InstrumentTracker> {
        self.trackers.get(instrument)
    }

    pub fn instruments(&self) -> Vec<String> {
        let mut names: Vec<String> = self.trackers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn rejected_observations(&self) -> u64 {
        self.rejected_observations
    }

    /// Process one feed event; returns the bot's trade if it executed one
    pub fn handle(&mut self, event: FeedEvent) -> Result<Option<Trade>> {
        match event {
            FeedEvent::Subscribe {
                instrument,
                history,
            } => {
                self.subscribe(instrument, history)?;
                Ok(None)
            }
            FeedEvent::Observation(observation) => self.observe(observation),
            FeedEvent::Unsubscribe { instrument } => {
                self.unsubscribe(&instrument);
                Ok(None)
            }
        }
    }

    /// Drain the channel until every sender is dropped
    pub async fn run(&mut self, mut rx: mpsc::Receiver<FeedEvent>) -> Result<()> {
        tracing::info!("Session started");
        while let Some(event) = rx.recv().await {
            match self.handle(event) {
                Ok(_) => {}
                Err(Error::LockPoisoned(reason)) => return Err(Error::LockPoisoned(reason)),
                Err(e) => tracing::warn!("Feed event failed: {}", e),
            }
        }
        tracing::info!(
            "Feed closed, session stopped ({} observations rejected)",
            self.rejected_observations
        );
        Ok(())
    }

    fn subscribe(&mut self, instrument: String, history: Vec<PriceObservation>) -> Result<()> {
        let mut history: Vec<PriceObservation> = history
            .into_iter()
            .filter(|bar| bar.instrument == instrument && valid_price(bar.price()))
            .collect();
        history.sort_by_key(|bar| bar.timestamp);

        let tracker = InstrumentTracker::new(
            self.config.indicator_params,
            self.config.chart_capacity,
            &history,
        );
        if let Some(last) = tracker.last() {
            self.ledger
                .mark_price(&instrument, last.price(), last.timestamp)?;
        }

        tracing::info!(
            instrument = %instrument,
            "Subscribed with {} historical bars",
            history.len()
        );
        let snapshot = tracker.snapshot().clone();
        if self.trackers.insert(instrument.clone(), tracker).is_some() {
            tracing::info!(instrument = %instrument, "Re-subscribed, history reset");
        }
        self.publish(&instrument, snapshot);
        Ok(())
    }

    fn unsubscribe(&mut self, instrument: &str) {
        if self.trackers.remove(instrument).is_some() {
            tracing::info!(instrument = %instrument, "Unsubscribed");
            self.snapshots.send_modify(|map| {
                map.remove(instrument);
            });
        } else {
            tracing::debug!(instrument = %instrument, "Unsubscribe for untracked instrument");
        }
    }

    fn observe(&mut self, observation: PriceObservation) -> Result<Option<Trade>> {
        let tracker = match self.trackers.get_mut(&observation.instrument) {
            Some(tracker) => tracker,
            None => {
                tracing::debug!(
                    instrument = %observation.instrument,
                    "Observation for unsubscribed instrument ignored"
                );
                return Ok(None);
            }
        };

        if !valid_price(observation.price()) {
            tracing::warn!(
                instrument = %observation.instrument,
                "Rejected observation with invalid price {}",
                observation.price()
            );
            self.rejected_observations += 1;
            return Ok(None);
        }
        if let Some(last) = tracker.last() {
            if observation.timestamp < last.timestamp {
                tracing::warn!(
                    instrument = %observation.instrument,
                    "Rejected out-of-order observation at {} (last {})",
                    observation.timestamp,
                    last.timestamp
                );
                self.rejected_observations += 1;
                return Ok(None);
            }
        }

        self.ledger.mark_price(
            &observation.instrument,
            observation.price(),
            observation.timestamp,
        )?;

        let snapshot = tracker.update(&observation);
        tracing::debug!(
            instrument = %observation.instrument,
            price = %observation.price(),
            "rsi={:?} bb=({:?}, {:?}) macd={:?}",
            snapshot.rsi,
            snapshot.bollinger_lower,
            snapshot.bollinger_upper,
            snapshot.macd
        );

        let trade = self.bot.on_observation(&observation, &self.ledger)?;
        self.publish(&observation.instrument, snapshot);
        Ok(trade)
    }

    fn publish(&self, instrument: &str, snapshot: IndicatorSnapshot) {
        self.snapshots.send_modify(|map| {
            map.insert(instrument.to_string(), snapshot);
        });
    }
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{BotConfig, BotController, BotState};
    use chrono::{DateTime, Duration, Utc};

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tick(instrument: &str, secs: i64, price: f64) -> PriceObservation {
        PriceObservation::tick(instrument, start() + Duration::seconds(secs), price)
    }

    fn session() -> Session {
        Session::new(
            SessionConfig::default(),
            SharedLedger::new(10_000.0),
            SharedBot::new(BotController::new()),
        )
    }

    fn subscribe(session: &mut Session, instrument: &str, history: Vec<PriceObservation>) {
        session
            .handle(FeedEvent::Subscribe {
                instrument: instrument.to_string(),
                history,
            })
            .unwrap();
    }

    #[test]
    fn test_subscribe_seeds_history() {
        let mut session = session();
        let history: Vec<_> = (0..30).map(|i| tick("BTCUSDT", i, 100.0 + i as f64)).collect();
        subscribe(&mut session, "BTCUSDT", history);

        let tracker = session.tracker("BTCUSDT").unwrap();
        assert_eq!(tracker.history().len(), 30);
        assert!(tracker.snapshot().bollinger_upper.is_some());
        assert!(tracker.snapshot().rsi.is_some());

        let handle = session.session_handle();
        assert_eq!(handle.latest("BTCUSDT").unwrap().samples, 30);
        assert_eq!(
            handle.ledger().read(|l| l.last_price("BTCUSDT")).unwrap(),
            Some(129.0)
        );
    }

    #[test]
    fn test_chart_history_is_bounded() {
        let mut session = Session::new(
            SessionConfig {
                chart_capacity: 50,
                ..Default::default()
            },
            SharedLedger::new(10_000.0),
            SharedBot::default(),
        );
        subscribe(&mut session, "ETHUSDT", Vec::new());

        for i in 0..120 {
            session
                .handle(FeedEvent::Observation(tick("ETHUSDT", i, 2000.0 + i as f64)))
                .unwrap();
        }

        let history = session.tracker("ETHUSDT").unwrap().history();
        assert_eq!(history.len(), 50);
        assert_eq!(history.last().unwrap().close, 2119.0);
    }

    #[test]
    fn test_unsubscribed_observations_ignored() {
        let mut session = session();
        session
            .handle(FeedEvent::Observation(tick("SOLUSDT", 0, 150.0)))
            .unwrap();

        assert!(session.tracker("SOLUSDT").is_none());
        assert!(session.session_handle().latest("SOLUSDT").is_none());
    }

    #[test]
    fn test_unsubscribe_drops_tracker() {
        let mut session = session();
        subscribe(&mut session, "BTCUSDT", vec![tick("BTCUSDT", 0, 100.0)]);
        subscribe(&mut session, "ETHUSDT", vec![tick("ETHUSDT", 0, 2000.0)]);
        assert_eq!(session.instruments(), vec!["BTCUSDT", "ETHUSDT"]);

        session
            .handle(FeedEvent::Unsubscribe {
                instrument: "BTCUSDT".to_string(),
            })
            .unwrap();

        assert_eq!(session.instruments(), vec!["ETHUSDT"]);
        assert!(session.session_handle().latest("BTCUSDT").is_none());
    }

    #[test]
    fn test_invalid_and_out_of_order_rejected() {
        let mut session = session();
        subscribe(&mut session, "BTCUSDT", Vec::new());

        session
            .handle(FeedEvent::Observation(tick("BTCUSDT", 10, 100.0)))
            .unwrap();
        session
            .handle(FeedEvent::Observation(tick("BTCUSDT", 5, 101.0)))
            .unwrap();
        session
            .handle(FeedEvent::Observation(tick("BTCUSDT", 11, f64::NAN)))
            .unwrap();
        session
            .handle(FeedEvent::Observation(tick("BTCUSDT", 12, -1.0)))
            .unwrap();

        assert_eq!(session.rejected_observations(), 3);
        assert_eq!(session.tracker("BTCUSDT").unwrap().history().len(), 1);
    }

    #[test]
    fn test_instruments_tracked_independently() {
        let mut session = session();
        subscribe(&mut session, "BTCUSDT", Vec::new());
        subscribe(&mut session, "ETHUSDT", Vec::new());

        for i in 0..25 {
            session
                .handle(FeedEvent::Observation(tick("BTCUSDT", i, 100.0 + i as f64)))
                .unwrap();
        }
        session
            .handle(FeedEvent::Observation(tick("ETHUSDT", 0, 2000.0)))
            .unwrap();

        let handle = session.session_handle();
        assert_eq!(handle.latest("BTCUSDT").unwrap().samples, 25);
        assert_eq!(handle.latest("ETHUSDT").unwrap().samples, 1);
        assert!(handle.latest("ETHUSDT").unwrap().rsi.is_none());
    }

    #[test]
    fn test_bot_sees_session_observations() {
        let bot = SharedBot::default();
        bot.configure(BotConfig {
            rsi_length: 3,
            bollinger_window: 3,
            window_capacity: 10,
            macd_fast: 2,
            macd_slow: 3,
            macd_signal: 2,
            ..Default::default()
        })
        .unwrap();
        bot.confirm().unwrap();
        bot.start().unwrap();

        let mut session = Session::new(SessionConfig::default(), SharedLedger::new(10_000.0), bot);
        subscribe(&mut session, "BTCUSDT", Vec::new());

        let mut trades = Vec::new();
        for (i, price) in [100.0, 95.0, 90.0, 85.0].iter().enumerate() {
            if let Some(trade) = session
                .handle(FeedEvent::Observation(tick("BTCUSDT", i as i64 * 2, *price)))
                .unwrap()
            {
                trades.push(trade);
            }
        }

        assert_eq!(trades.len(), 1);
        let handle = session.session_handle();
        assert_eq!(handle.bot().state().unwrap(), BotState::Running);
        assert!(handle.ledger().read(|l| l.has_position("BTCUSDT")).unwrap());
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let mut session = session();
        let handle = session.session_handle();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            tx.send(FeedEvent::Subscribe {
                instrument: "BTCUSDT".to_string(),
                history: Vec::new(),
            })
            .await
            .unwrap();
            for i in 0..5 {
                tx.send(FeedEvent::Observation(tick("BTCUSDT", i, 100.0)))
                    .await
                    .unwrap();
            }
        });

        session.run(rx).await.unwrap();
        assert_eq!(handle.latest("BTCUSDT").unwrap().samples, 5);
    }
}

use crate::indicators::IndicatorSnapshot;
use crate::models::Signal;

/// RSI threshold rule used by the bot
///
/// - flat and RSI below `oversold` → Buy
/// - holding and RSI above `overbought` → Sell
/// - anything else, including RSI not ready → Hold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalEvaluator {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl SignalEvaluator {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
        }
    }

    /// Map the current snapshot and position state to exactly one signal
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot, has_position: bool) -> Signal {
        let rsi = match snapshot.rsi {
            Some(rsi) => rsi,
            None => {
                tracing::debug!("HOLD: RSI not ready ({} samples)", snapshot.samples);
                return Signal::Hold;
            }
        };

        if !has_position && rsi < self.oversold {
            tracing::info!("BUY condition: RSI {:.2} < oversold {:.2}", rsi, self.oversold);
            Signal::Buy
        } else if has_position && rsi > self.overbought {
            tracing::info!(
                "SELL condition: RSI {:.2} > overbought {:.2}",
                rsi,
                self.overbought
            );
            Signal::Sell
        } else {
            tracing::debug!(
                "HOLD: RSI {:.2}, position open = {}",
                rsi,
                has_position
            );
            Signal::Hold
        }
    }
}

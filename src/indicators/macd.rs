use super::moving_average::Ema;

/// Streaming MACD
///
/// MACD line = EMA(fast) - EMA(slow) on prices. The signal line is a
/// second-order EMA fed with the MACD values themselves, so it only becomes
/// ready after `signal` MACD values have accumulated.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    line: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: Option<f64>,
}

impl MacdValue {
    pub fn histogram(&self) -> Option<f64> {
        self.signal.map(|s| self.macd - s)
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            line: None,
        }
    }

    /// Feed one price; None until both price EMAs are ready
    pub fn update(&mut self, price: f64) -> Option<MacdValue> {
        let fast = self.fast.update(price);
        let slow = self.slow.update(price);

        let (fast, slow) = match (fast, slow) {
            (Some(f), Some(s)) => (f, s),
            _ => return None,
        };

        let macd = fast - slow;
        self.line = Some(macd);
        let signal = self.signal.update(macd);

        Some(MacdValue { macd, signal })
    }

    pub fn value(&self) -> Option<MacdValue> {
        self.line.map(|macd| MacdValue {
            macd,
            signal: self.signal.value(),
        })
    }
}

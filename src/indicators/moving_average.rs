/// Calculate Simple Moving Average (SMA) over the last `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Calculate Exponential Moving Average (EMA) over a whole series
///
/// Seeded with the SMA of the first `period` prices, then folded forward.
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    let mut ema = Ema::new(period);
    let mut last = None;
    for &price in prices {
        last = ema.update(price);
    }
    last
}

/// Streaming EMA recurrence
///
/// Not ready until `period` samples have been seen. The seed is the mean of
/// those first samples; every later sample applies
/// `ema = (sample - ema) * 2 / (period + 1) + ema`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    seed_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            count: 0,
            value: None,
        }
    }

    /// Feed one sample and return the current value (None while seeding)
    pub fn update(&mut self, sample: f64) -> Option<f64> {
        self.count += 1;

        match self.value {
            Some(ema) => {
                self.value = Some((sample - ema) * self.multiplier + ema);
            }
            None => {
                self.seed_sum += sample;
                if self.count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }

        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}

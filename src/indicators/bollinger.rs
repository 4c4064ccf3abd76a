use serde::{Deserialize, Serialize};

/// Bollinger Bands over the most recent window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands
///
/// `middle` is the SMA of the last `window` prices; the band width uses the
/// population standard deviation (divisor `window`, not `window - 1`).
pub fn calculate_bollinger(prices: &[f64], window: usize, multiplier: f64) -> Option<BollingerBands> {
    if window == 0 || prices.len() < window {
        return None;
    }

    let recent = &prices[prices.len() - window..];
    let mean = recent.iter().sum::<f64>() / window as f64;
    let variance = recent.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / window as f64;
    let std_dev = variance.sqrt();

    Some(BollingerBands {
        upper: mean + multiplier * std_dev,
        middle: mean,
        lower: mean - multiplier * std_dev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_bollinger_not_ready() {
        let prices = vec![1.0, 2.0, 3.0];
        assert!(calculate_bollinger(&prices, 20, 2.0).is_none());
    }

    #[test]
    fn test_bollinger_population_std() {
        // mean 5, population variance 4, std 2
        let prices = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = calculate_bollinger(&prices, 8, 2.0).unwrap();

        assert_relative_eq!(bands.middle, 5.0);
        assert_relative_eq!(bands.upper, 9.0);
        assert_relative_eq!(bands.lower, 1.0);
    }

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let prices = vec![10.0; 20];
        let bands = calculate_bollinger(&prices, 20, 2.0).unwrap();
        assert_eq!(bands.upper, bands.lower);
    }

    #[test]
    fn test_bollinger_uses_last_window() {
        let mut prices = vec![1000.0; 10];
        prices.extend([1.0, 2.0, 3.0]);
        let bands = calculate_bollinger(&prices, 3, 1.0).unwrap();
        assert_relative_eq!(bands.middle, 2.0);
    }

    proptest! {
        #[test]
        fn prop_upper_never_below_lower(
            prices in proptest::collection::vec(0.01f64..1e6, 1..100),
            window in 1usize..40,
            multiplier in 0.0f64..5.0,
        ) {
            if let Some(bands) = calculate_bollinger(&prices, window, multiplier) {
                prop_assert!(bands.upper >= bands.lower);
            }
        }
    }
}

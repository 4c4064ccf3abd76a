// Technical indicators module
// Implements Bollinger Bands, RSI, EMA and MACD over bounded price windows

pub mod bollinger;
pub mod engine;
pub mod macd;
pub mod moving_average;
pub mod rolling_window;
pub mod rsi;

pub use bollinger::{calculate_bollinger, BollingerBands};
pub use engine::{IndicatorEngine, IndicatorParams, IndicatorSnapshot};
pub use macd::{Macd, MacdValue};
pub use moving_average::{calculate_ema, calculate_sma, Ema};
pub use rolling_window::RollingWindow;
pub use rsi::calculate_rsi;

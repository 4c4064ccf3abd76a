// Trading strategy module
pub mod signals;

pub use signals::SignalEvaluator;

// Paper order execution and position bookkeeping
pub mod ledger;

pub use ledger::{Ledger, LedgerSnapshot, PositionPnl, SharedLedger, TradeView, QUANTITY_EPSILON};

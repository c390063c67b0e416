pub mod bucket;
pub mod direction;
pub mod trade;

pub use bucket::TimeBucket;
pub use direction::*;
pub use trade::{Trade, TradeBehavior};

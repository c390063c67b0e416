pub mod report;
pub mod store;

pub use report::JournalReport;
pub use store::{InMemoryStore, JsonFileStore, TradeQuery, TradeStore};

//! Model persistence
//!
//! - [`statistics`]: the word-statistics store and its save batching
//! - `lock`: exclusive advisory lock guarding model writes

mod lock;
pub mod statistics;

pub use statistics::StatisticsStore;

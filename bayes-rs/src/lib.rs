//! bayes-rs: Bayesian spam rating
//!
//! Classifies text as spam or ham using per-word statistics learned
//! incrementally from labeled messages.
//!
//! # Features
//!
//! - **Tokenizer**: word splitting that keeps numbers like `127.0.0.1` intact
//! - **Classifier**: per-token ratings combined into one score in `[0, 1]`
//! - **Storage**: a single JSON model file, written atomically under an
//!   exclusive advisory lock, with batched saves
//!
//! # Example
//!
//! ```no_run
//! use bayes_rs::spam::BayesianClassifier;
//! use bayes_rs::storage::StatisticsStore;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = StatisticsStore::new("bayes.db");
//!     if let Err(e) = store.load() {
//!         if !e.is_not_found() {
//!             return Err(e.into());
//!         }
//!     }
//!
//!     {
//!         let mut classifier = BayesianClassifier::new(&mut store);
//!         classifier.train("Cheap pills, act now!", true)?;
//!         classifier.train("Lunch at noon tomorrow?", false)?;
//!         println!("{:.2}", classifier.spam_rating("cheap pills"));
//!     }
//!
//!     store.finish()?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`spam`]: Tokenizer and classifier
//! - [`storage`]: Model persistence

pub mod config;
pub mod error;
pub mod spam;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{BayesError, Result};
pub use spam::BayesianClassifier;
pub use storage::StatisticsStore;

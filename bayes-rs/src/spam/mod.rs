//! Spam rating module
//!
//! Word-frequency Bayesian classification: tokenizer, model types and the
//! classifier that trains and queries the statistics store.

pub mod classifier;
pub mod tokenizer;
pub mod types;

pub use classifier::{token_rating, BayesianClassifier, NEUTRAL_RATING};
pub use tokenizer::{feature_key, tokenize};
pub use types::*;

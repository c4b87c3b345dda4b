//! Spam model types and data structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature key: 64-bit hash of an uppercased token
pub type FeatureKey = u64;

/// Per-feature counts, keyed by hash (collisions share an entry)
pub type TokenTable = HashMap<FeatureKey, TokenCounts>;

/// Number of messages trained per class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Messages trained as spam
    pub spam: u64,
    /// Messages trained as ham
    pub ham: u64,
}

impl Totals {
    /// Total number of training calls recorded
    pub fn messages(&self) -> u64 {
        self.spam + self.ham
    }
}

/// Training events in which a feature appeared, per class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub ham: u64,
    pub spam: u64,
}

impl TokenCounts {
    /// Counts for a feature seen once, in the given class
    pub fn first(is_spam: bool) -> Self {
        if is_spam {
            Self { ham: 0, spam: 1 }
        } else {
            Self { ham: 1, spam: 0 }
        }
    }

    pub fn increment(&mut self, is_spam: bool) {
        if is_spam {
            self.spam += 1;
        } else {
            self.ham += 1;
        }
    }
}

/// Result of looking a feature up in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLookup {
    Found(TokenCounts),
    NotFound,
}

/// How per-token ratings are combined into a message rating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMethod {
    /// `Πr / (Πr + Π(1-r))`
    #[default]
    Product,
    /// Robinson's geometric-mean combination
    Robinson,
}

/// Rating of a single message
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    /// Spam rating in [0, 1]
    pub rating: f64,
    /// Rating exceeded the spam threshold
    pub is_spam: bool,
}

/// Summary of the model contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub spam_messages: u64,
    pub ham_messages: u64,
    /// Distinct feature keys in the table
    pub token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_counts_first() {
        assert_eq!(TokenCounts::first(true), TokenCounts { ham: 0, spam: 1 });
        assert_eq!(TokenCounts::first(false), TokenCounts { ham: 1, spam: 0 });
    }

    #[test]
    fn test_token_counts_increment() {
        let mut counts = TokenCounts::first(true);
        counts.increment(true);
        counts.increment(false);
        assert_eq!(counts, TokenCounts { ham: 1, spam: 2 });
    }

    #[test]
    fn test_totals_messages() {
        let totals = Totals { spam: 8999, ham: 67 };
        assert_eq!(totals.messages(), 9066);
    }

    #[test]
    fn test_combine_method_serde_names() {
        assert_eq!(serde_json::to_string(&CombineMethod::Product).unwrap(), "\"product\"");
        let method: CombineMethod = serde_json::from_str("\"robinson\"").unwrap();
        assert_eq!(method, CombineMethod::Robinson);
    }
}

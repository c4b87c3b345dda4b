//! Bayesian spam classifier
//!
//! Trains the statistics store from labeled messages and rates new ones.
//! Each token gets a rating from its ham/spam counts; the most extreme
//! ratings are then combined into one score in `[0, 1]`.

use std::collections::HashSet;

use tracing::debug;

use super::tokenizer::{feature_key, tokenize};
use super::types::{CombineMethod, FeatureKey, TokenCounts, TokenLookup, Totals, Verdict};
use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::storage::StatisticsStore;

/// Rating when there is no evidence either way
pub const NEUTRAL_RATING: f64 = 0.4;

/// Token only ever seen in spam
const SPAM_ONLY_RATING: f64 = 0.99;
/// Token only ever seen in ham
const HAM_ONLY_RATING: f64 = 0.01;
const MIN_TOKEN_RATING: f64 = 0.01;
/// Combination underflowed to 0/0
const UNDECIDED_RATING: f64 = 0.5;

/// Above this many token ratings only the extremes are kept
const MAX_RATINGS: usize = 20;
/// Ratings kept from each end of the sorted list
const EXTREME_RATINGS: usize = 10;

/// Classifier over a borrowed statistics store
pub struct BayesianClassifier<'a> {
    store: &'a mut StatisticsStore,
    config: ClassifierConfig,
}

impl<'a> BayesianClassifier<'a> {
    pub fn new(store: &'a mut StatisticsStore) -> Self {
        Self::with_config(store, ClassifierConfig::default())
    }

    pub fn with_config(store: &'a mut StatisticsStore, config: ClassifierConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &StatisticsStore {
        &*self.store
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Learn from a labeled message.
    ///
    /// Each distinct feature in the message counts once, however often it
    /// repeats. The store is asked to persist once per call.
    pub fn train(&mut self, message: &str, is_spam: bool) -> Result<()> {
        let keys: HashSet<FeatureKey> = tokenize(message).map(feature_key).collect();
        debug!(
            "Training {} message with {} distinct tokens",
            if is_spam { "spam" } else { "ham" },
            keys.len()
        );

        self.store.record(keys, is_spam);
        self.store.save_if_needed()
    }

    /// Spam rating of a message in `[0, 1]`
    pub fn spam_rating(&self, message: &str) -> f64 {
        let Some(totals) = self.store.totals() else {
            return NEUTRAL_RATING;
        };
        if !self.store.is_populated() {
            return NEUTRAL_RATING;
        }

        let ratings: Vec<f64> = tokenize(message)
            .map(|token| token_rating(self.store.lookup(feature_key(token)), totals))
            .collect();
        let ratings = most_interesting(ratings);

        let rating = match self.config.combine {
            CombineMethod::Product => combine_product(&ratings),
            CombineMethod::Robinson => combine_robinson(&ratings),
        };
        debug!("Rated message from {} token ratings: {:.4}", ratings.len(), rating);
        rating
    }

    /// Rating strictly above the configured threshold (0.9 by default)
    pub fn is_spam(&self, message: &str) -> bool {
        self.classify(message).is_spam
    }

    pub fn classify(&self, message: &str) -> Verdict {
        let rating = self.spam_rating(message);
        Verdict {
            rating,
            is_spam: rating > self.config.spam_threshold,
        }
    }
}

/// Rating of a single token given the class totals
pub fn token_rating(lookup: TokenLookup, totals: Totals) -> f64 {
    match lookup {
        TokenLookup::NotFound => NEUTRAL_RATING,
        TokenLookup::Found(TokenCounts { ham: 0, spam }) if spam > 0 => SPAM_ONLY_RATING,
        TokenLookup::Found(TokenCounts { ham, spam: 0 }) if ham > 0 => HAM_ONLY_RATING,
        TokenLookup::Found(counts)
            if counts.ham > 0 && counts.spam > 0 && totals.ham > 0 && totals.spam > 0 =>
        {
            let ham_prob = counts.ham as f64 / totals.ham as f64;
            let spam_prob = counts.spam as f64 / totals.spam as f64;
            (spam_prob / (ham_prob + spam_prob)).max(MIN_TOKEN_RATING)
        }
        TokenLookup::Found(_) => NEUTRAL_RATING,
    }
}

/// Keep the lowest and highest ratings of a long list
fn most_interesting(mut ratings: Vec<f64>) -> Vec<f64> {
    if ratings.len() > MAX_RATINGS {
        ratings.sort_by(f64::total_cmp);
        let upper = ratings.len() - EXTREME_RATINGS;
        ratings.drain(EXTREME_RATINGS..upper);
    }
    ratings
}

fn combine_product(ratings: &[f64]) -> f64 {
    let p: f64 = ratings.iter().product();
    let q: f64 = ratings.iter().map(|r| 1.0 - r).product();
    if p + q == 0.0 {
        return UNDECIDED_RATING;
    }
    p / (p + q)
}

fn combine_robinson(ratings: &[f64]) -> f64 {
    if ratings.is_empty() {
        return UNDECIDED_RATING;
    }

    let nth = 1.0 / ratings.len() as f64;
    let p = 1.0 - ratings.iter().map(|r| 1.0 - r).product::<f64>().powf(nth);
    let q = 1.0 - ratings.iter().product::<f64>().powf(nth);
    if p + q == 0.0 {
        return UNDECIDED_RATING;
    }

    let s = (p - q) / (p + q);
    (1.0 + s) / 2.0
}

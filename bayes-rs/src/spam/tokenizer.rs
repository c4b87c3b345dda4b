//! Message tokenizer and feature keys
//!
//! Splits on whitespace, `: ; ( ) ? " ! /` and `--`. A `.` or `,` ends a
//! word unless it follows a digit, so numbers such as `127.0.0.1`,
//! `$10.22` or `1,000` survive as single tokens. Fragments of two
//! characters or fewer are dropped.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

use super::types::FeatureKey;

/// Tokens must be longer than this many characters
const MIN_TOKEN_CHARS: usize = 2;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\s:;()?"!/]+|--"#).expect("separator pattern is valid")
});

/// Split a message into word tokens, keeping their original case
pub fn tokenize(message: &str) -> impl Iterator<Item = &str> + '_ {
    SEPARATORS
        .split(message)
        .flat_map(PunctuationSplit::new)
        .filter(|word| word.chars().count() > MIN_TOKEN_CHARS)
}

/// Feature key for a token.
///
/// The token is uppercased and hashed with SHA-256; the first eight bytes
/// of the digest form the key. Distinct words that collide on these 64 bits
/// share one entry in the model.
pub fn feature_key(token: &str) -> FeatureKey {
    let digest = Sha256::digest(token.to_uppercase().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Splits a fragment on `.` and `,` unless the mark follows a digit
struct PunctuationSplit<'a> {
    rest: Option<&'a str>,
}

impl<'a> PunctuationSplit<'a> {
    fn new(fragment: &'a str) -> Self {
        Self {
            rest: Some(fragment),
        }
    }
}

impl<'a> Iterator for PunctuationSplit<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        let mut prev: Option<char> = None;

        for (idx, ch) in rest.char_indices() {
            let after_digit = prev.is_some_and(|p| p.is_ascii_digit());
            if matches!(ch, '.' | ',') && !after_digit {
                self.rest = Some(&rest[idx + ch.len_utf8()..]);
                return Some(&rest[..idx]);
            }
            prev = Some(ch);
        }

        self.rest = None;
        Some(rest)
    }
}

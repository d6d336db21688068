//! Approximate token counting for the current selection.
//!
//! This is a heuristic of one token per four characters, not a tokenizer.

use super::FileHandler;
use rayon::prelude::*;
use std::path::Path;

const CHARS_PER_TOKEN: usize = 4;

pub struct TokenEstimator;

impl TokenEstimator {
    /// Estimates the token count of a prompt plus the contents of the given files.
    ///
    /// Unreadable files contribute nothing. The result is approximate and
    /// should be labelled as such wherever it is shown.
    pub fn estimate<P>(prompt_text: &str, checked_file_paths: &[P]) -> usize
    where
        P: AsRef<Path> + Sync,
    {
        let file_chars: usize = checked_file_paths
            .par_iter()
            .map(|path| FileHandler::read_text_best_effort(path.as_ref()).chars().count())
            .sum();

        (prompt_text.chars().count() + file_chars) / CHARS_PER_TOKEN
    }

    /// Formats an estimate for display, e.g. `~1,234 tokens (approximate)`.
    pub fn format_estimate(tokens: usize) -> String {
        let digits = tokens.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("~{grouped} tokens (approximate)")
    }
}

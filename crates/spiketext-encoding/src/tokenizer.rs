// Copyright 2025 SpikeText Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sentence cleanup and whitespace tokenization

use regex::Regex;
use std::sync::OnceLock;

fn separator_regex() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[-/]").expect("static separator pattern"))
}

fn whitespace_regex() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s{2,}").expect("static whitespace pattern"))
}

/// Split a raw sentence into tokens
///
/// Hyphens and slashes become spaces, whitespace runs collapse, the text is
/// optionally lowercased, and empty tokens are discarded.
///
/// ```
/// use spiketext_encoding::clean_tokenize;
///
/// assert_eq!(clean_tokenize("well-made  and/or Fun", false), vec!["well", "made", "and", "or", "Fun"]);
/// assert_eq!(clean_tokenize("Fun", true), vec!["fun"]);
/// ```
pub fn clean_tokenize(text: &str, lowercase: bool) -> Vec<String> {
    let spaced = separator_regex().replace_all(text, " ");
    let collapsed = whitespace_regex().replace_all(&spaced, " ");
    let cleaned = if lowercase {
        collapsed.to_lowercase()
    } else {
        collapsed.into_owned()
    };

    cleaned
        .split_whitespace()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sentence() {
        assert_eq!(clean_tokenize("not good", false), vec!["not", "good"]);
    }

    #[test]
    fn test_separators_and_whitespace() {
        assert_eq!(
            clean_tokenize("  a--b / c\t\td  ", false),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn test_case_preserved_by_default() {
        assert_eq!(clean_tokenize("The Movie", false), vec!["The", "Movie"]);
        assert_eq!(clean_tokenize("The Movie", true), vec!["the", "movie"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(clean_tokenize("", false).is_empty());
        assert!(clean_tokenize(" - / ", false).is_empty());
    }
}

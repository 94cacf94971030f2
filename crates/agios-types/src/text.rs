//! Word counting and slug helpers.
//!
//! A "word" is a maximal run of Unicode letters (`L*`) or decimal digits
//! (`Nd`); everything else separates words.

use rand::{distributions::Alphanumeric, Rng};
use unicode_general_category::{get_general_category, GeneralCategory};

/// Number of leading query words that make up a thread slug prefix
pub const SLUG_PREFIX_WORDS: usize = 5;

const SLUG_SUFFIX_LEN: usize = 6;

fn is_word_char(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
    )
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

pub fn word_count(text: &str) -> usize {
    words(text).count()
}

/// First `n` words of `text`, joined with single spaces
pub fn first_n_words(text: &str, n: usize) -> String {
    words(text).take(n).collect::<Vec<_>>().join(" ")
}

pub fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| is_word_char(*c) || *c == '-')
        .collect();
    slug.trim_matches('-').to_string()
}

/// Slug prefix every thread started with `query_text` must carry
pub fn slug_prefix(query_text: &str) -> String {
    slugify(&first_n_words(query_text, SLUG_PREFIX_WORDS))
}

/// A slug is valid when it starts with the slugified first five words of the
/// query and still has a non-empty suffix once that prefix (and any hyphens
/// after it) is removed.
pub fn validate_slug_format(slug: &str, query_text: &str) -> bool {
    if query_text.is_empty() {
        return false;
    }

    let prefix = slug_prefix(query_text);
    match slug.strip_prefix(prefix.as_str()) {
        Some(rest) => !rest.trim_start_matches('-').is_empty(),
        None => false,
    }
}

/// Build a fresh valid slug for `query_text` with a random suffix
pub fn generate_slug(query_text: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    let prefix = slug_prefix(query_text);
    if prefix.is_empty() {
        suffix
    } else {
        format!("{}-{}", prefix, suffix)
    }
}

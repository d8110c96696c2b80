//! Resolution of a quiz question's declared correct answer onto one of its
//! rendered option strings.
//!
//! Upstream content generation phrases the key inconsistently: a bare letter
//! ("B"), the exact option text, or a re-labelled variant ("B) Lyon" against
//! an option list of plain city names). The resolver maps all of these onto
//! a canonical option so selection can be compared by string equality. When
//! nothing matches it returns the trimmed raw value, which never equals a
//! rendered option, so callers treat the question as having no selectable
//! answer rather than failing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::QuizQuestion;

static LETTER_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-D]$").expect("letter key pattern"));

static OPTION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-D][-).:\s]+").expect("option prefix pattern"));

fn canonical(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Strips one leading option-letter label like `"A) "`, `"b."`, or `"C - "`.
///
/// Only a single label is removed, and only when the letter is followed by
/// at least one of `)`, `.`, `-`, `:`, or whitespace. The result is trimmed
/// either way.
pub fn strip_option_prefix(value: &str) -> &str {
    match OPTION_PREFIX.find(value) {
        Some(m) => value[m.end()..].trim(),
        None => value.trim(),
    }
}

/// Maps `question.correct_answer` onto one of `question.options`.
///
/// Matching order, first hit wins:
/// 1. a bare option letter (`A`-`D`, any case) indexing into the options;
/// 2. case-insensitive, whitespace-trimmed equality with an option;
/// 3. the same equality after stripping an option-letter label from both
///    sides;
/// 4. fallback: the trimmed raw value, unmodified.
///
/// The result is either an exact element of `question.options` or the
/// fallback; an option is never fabricated.
pub fn resolve_correct_option(question: &QuizQuestion) -> String {
    let raw = question.correct_answer.trim();

    if LETTER_KEY.is_match(raw) {
        let index = (raw.as_bytes()[0].to_ascii_uppercase() - b'A') as usize;
        if index < question.options.len() {
            return question.options[index].clone();
        }
    }

    let target = canonical(raw);
    if let Some(hit) = question.options.iter().find(|opt| canonical(opt) == target) {
        return hit.clone();
    }

    let stripped = canonical(strip_option_prefix(raw));
    if let Some(hit) = question
        .options
        .iter()
        .find(|opt| canonical(strip_option_prefix(opt)) == stripped)
    {
        return hit.clone();
    }

    raw.to_string()
}

//! Incremental reconciliation of streamed assistant text.
//!
//! The chat transport chunks replies with no regard for what was already
//! delivered: a fragment may repeat trailing content, restate the whole
//! reply so far, or overlap the tail of it. `merge` folds one fragment into
//! the accumulated text without duplicating content. The accumulated text
//! only ever grows.
//!
//! Fragments must be applied in arrival order; the output of one call is the
//! `existing` argument of the next. Ordering is a transport guarantee, not
//! something enforced here.

/// Returns the part of `incoming` that is new relative to `existing`.
///
/// Empty when the fragment only repeats content `existing` already has.
/// `merge` appends exactly this suffix, so callers driving an incremental
/// display can write the return value as-is.
pub fn novel_suffix<'a>(existing: &str, incoming: &'a str) -> &'a str {
    if incoming.is_empty() {
        return "";
    }
    if existing.is_empty() {
        return incoming;
    }
    // Pure repeat: the fragment is already present (anywhere, or as the
    // current tail).
    if existing.contains(incoming) || existing.ends_with(incoming) {
        return "";
    }
    // Full restatement: the fragment is everything so far plus more.
    if let Some(rest) = incoming.strip_prefix(existing) {
        return rest;
    }

    // Longest suffix of `existing` that equals a prefix of `incoming`.
    // Widest window first; only char boundaries of `incoming` are valid
    // split points.
    let max_overlap = existing.len().min(incoming.len());
    for overlap in (1..=max_overlap).rev() {
        if !incoming.is_char_boundary(overlap) {
            continue;
        }
        if existing.ends_with(&incoming[..overlap]) {
            return &incoming[overlap..];
        }
    }

    // No detectable relationship: treat the fragment as all-new.
    incoming
}

/// Merges one streamed fragment into the text accumulated so far.
///
/// Total and pure: any pair of strings is valid input, and the result is
/// never shorter than `existing`.
pub fn merge(existing: &str, incoming: &str) -> String {
    let suffix = novel_suffix(existing, incoming);
    let mut out = String::with_capacity(existing.len() + suffix.len());
    out.push_str(existing);
    out.push_str(suffix);
    out
}

/// Accumulated text for one streamed assistant turn.
///
/// Created empty when the turn begins, fed one fragment per transport chunk,
/// and discarded when the turn ends.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TurnBuffer {
    text: String,
}

impl TurnBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one fragment in and returns the newly appended text.
    pub fn push(&mut self, fragment: &str) -> &str {
        let suffix = novel_suffix(&self.text, fragment);
        let start = self.text.len();
        self.text.push_str(suffix);
        &self.text[start..]
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_incoming_is_identity() {
        assert_eq!(merge("The cat", ""), "The cat");
        assert_eq!(merge("", ""), "");
    }

    #[test]
    fn empty_existing_takes_incoming() {
        assert_eq!(merge("", "Hello"), "Hello");
    }

    #[test]
    fn repeated_fragment_is_dropped() {
        assert_eq!(merge("The cat sat", "cat"), "The cat sat");
        assert_eq!(merge("The cat sat", " sat"), "The cat sat");
        assert_eq!(merge("The cat sat", "The cat sat"), "The cat sat");
    }

    #[test]
    fn superset_fragment_replaces() {
        assert_eq!(merge("Hello wor", "Hello world"), "Hello world");
    }

    #[test]
    fn overlap_is_deduplicated() {
        assert_eq!(merge("The cat sat", " sat on the mat"), "The cat sat on the mat");
    }

    #[test]
    fn disjoint_fragment_is_appended() {
        assert_eq!(merge("abc", "xyz"), "abcxyz");
    }

    #[test]
    fn ambiguous_overlap_prefers_longest() {
        // Both "aa" and "a" are suffix/prefix overlaps; the widest wins.
        assert_eq!(merge("aaa", "aa b"), "aaa b");
    }

    #[test]
    fn result_never_shrinks() {
        let cases = [
            ("", ""),
            ("abc", ""),
            ("", "abc"),
            ("abc", "abc"),
            ("abc", "bcd"),
            ("abc", "xyz"),
            ("Hello wor", "Hello world"),
        ];
        for (existing, incoming) in cases {
            assert!(merge(existing, incoming).len() >= existing.len(), "{existing:?} + {incoming:?}");
        }
    }

    #[test]
    fn reapplying_a_repeat_is_idempotent() {
        let once = merge("The cat sat", " sat");
        let twice = merge(&once, " sat");
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_is_existing_plus_novel_suffix() {
        let cases = [
            ("", "abc"),
            ("abc", ""),
            ("The cat sat", " sat on the mat"),
            ("Hello wor", "Hello world"),
            ("abc", "xyz"),
            ("The cat sat", "cat"),
        ];
        for (existing, incoming) in cases {
            let expected = format!("{existing}{}", novel_suffix(existing, incoming));
            assert_eq!(merge(existing, incoming), expected, "{existing:?} + {incoming:?}");
        }
    }

    #[test]
    fn multibyte_overlap_is_found() {
        assert_eq!(merge("Héllo wö", "wörld"), "Héllo wörld");
    }

    #[test]
    fn multibyte_input_never_panics() {
        // max_overlap lands mid-char in `incoming`; those offsets are skipped.
        assert_eq!(merge("ab", "日本語"), "ab日本語");
        assert_eq!(merge("日本", "本語"), "日本語");
        assert_eq!(merge("naïve", "ïve approach"), "naïve approach");
    }

    #[test]
    fn turn_buffer_reports_appended_text() {
        let mut turn = TurnBuffer::new();
        assert_eq!(turn.push("The cat"), "The cat");
        assert_eq!(turn.push(" cat sat"), " sat");
        assert_eq!(turn.push(" sat"), "");
        assert_eq!(turn.push(" on the mat"), " on the mat");
        assert_eq!(turn.as_str(), "The cat sat on the mat");
    }

    #[test]
    fn turn_buffer_only_grows() {
        let mut turn = TurnBuffer::new();
        let mut last_len = 0;
        for fragment in ["Once", "Once upon", " a time", "time.", ""] {
            turn.push(fragment);
            assert!(turn.as_str().len() >= last_len);
            last_len = turn.as_str().len();
        }
        assert_eq!(turn.into_string(), "Once upon a time.");
    }
}

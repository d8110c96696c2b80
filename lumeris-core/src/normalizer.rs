use crate::model::{ChatQuery, Flashcard, QuizQuestion};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

fn clean_text(s: &str) -> String {
    // Unicode NFC normalization + BOM strip + CRLF -> LF + trim
    let mut t = s.nfc().collect::<String>();
    if t.starts_with('\u{FEFF}') {
        // Byte Order Mark
        t.remove(0);
    }
    if t.contains("\r\n") {
        t = t.replace("\r\n", "\n");
    }
    t.trim().to_string()
}

pub fn normalize_query(mut query: ChatQuery) -> ChatQuery {
    query.query = clean_text(&query.query);
    query.resource_id = query.resource_id.trim().to_string();
    query
}

/// Cleans generated questions and drops ones the study view could not
/// render: empty question text, or fewer than two non-empty options.
/// Option order and count are preserved for surviving questions; the answer
/// key may address options by position.
pub fn normalize_questions(questions: Vec<QuizQuestion>) -> Vec<QuizQuestion> {
    questions
        .into_iter()
        .map(|mut q| {
            q.question = clean_text(&q.question);
            for opt in &mut q.options {
                *opt = clean_text(opt);
            }
            q.correct_answer = clean_text(&q.correct_answer);
            q
        })
        .filter(|q| !q.question.is_empty())
        .filter(|q| q.options.iter().filter(|o| !o.is_empty()).count() >= 2)
        .collect()
}

/// Cleans generated flashcards, drops cards missing either side, and
/// removes exact duplicates keeping the first occurrence.
pub fn normalize_flashcards(cards: Vec<Flashcard>) -> Vec<Flashcard> {
    let mut cards = cards
        .into_iter()
        .map(|mut c| {
            c.question = clean_text(&c.question);
            c.answer = clean_text(&c.answer);
            c
        })
        .filter(|c| !c.question.is_empty() && !c.answer.is_empty())
        .collect::<Vec<_>>();
    let mut seen = HashSet::new();
    cards.retain(|c| seen.insert((c.question.clone(), c.answer.clone())));
    cards
}

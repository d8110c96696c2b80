//! Presentation-free state for the three study modes.
//!
//! The surrounding application drives re-renders from whatever event/state
//! mechanism it has; these types hold the state transitions only. No I/O,
//! no callbacks.

use crate::answer_key::resolve_correct_option;
use crate::model::{ChatMessage, Flashcard, HistoryMessage, QuizQuestion, Role};
use crate::reconcile;

/// Ordered transcript of one resource's chat, with at most one assistant
/// turn open for streaming at a time.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    open_turn: bool,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from stored history. Only user and assistant entries
    /// are rendered; anything else the backend stored is dropped.
    pub fn from_history(history: Vec<HistoryMessage>) -> Self {
        let messages = history
            .into_iter()
            .filter_map(|entry| {
                let role = match entry.role.as_str() {
                    "user" => Role::User,
                    "assistant" => Role::Assistant,
                    _ => return None,
                };
                Some(ChatMessage {
                    role,
                    content: entry.message,
                })
            })
            .collect();
        Self {
            messages,
            open_turn: false,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.close_turn();
        self.messages.push(ChatMessage {
            role: Role::User,
            content: content.into(),
        });
    }

    /// Starts an empty assistant turn that subsequent fragments append to.
    pub fn begin_assistant_turn(&mut self) {
        self.close_turn();
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: String::new(),
        });
        self.open_turn = true;
    }

    /// Reconciles one streamed fragment into the open turn and returns the
    /// text that was appended. Returns empty when no turn is open.
    pub fn append_to_open_turn<'a>(&mut self, fragment: &'a str) -> &'a str {
        if !self.open_turn {
            return "";
        }
        let Some(last) = self.messages.last_mut() else {
            return "";
        };
        let suffix = reconcile::novel_suffix(&last.content, fragment);
        last.content.push_str(suffix);
        suffix
    }

    pub fn close_turn(&mut self) {
        self.open_turn = false;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One run through a generated quiz: question cursor, the current pick, and
/// the running score.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    resolved: Vec<String>,
    current: usize,
    score: u32,
    selected: Option<String>,
    answered: bool,
    finished: bool,
}

impl QuizSession {
    /// Resolves every question's correct option up front; each pick is then
    /// a plain string comparison, and the resolution never changes within a
    /// session.
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let resolved = questions.iter().map(resolve_correct_option).collect();
        Self {
            questions,
            resolved,
            current: 0,
            score: 0,
            selected: None,
            answered: false,
            finished: false,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        if self.finished {
            return None;
        }
        self.questions.get(self.current)
    }

    /// The canonical correct option for the current question.
    pub fn correct_option(&self) -> Option<&str> {
        if self.finished {
            return None;
        }
        self.resolved.get(self.current).map(String::as_str)
    }

    /// Records the pick for the current question. Returns whether it was
    /// correct, or None when the question was already answered or the quiz
    /// is over.
    pub fn select(&mut self, option: &str) -> Option<bool> {
        if self.answered || self.finished || self.questions.is_empty() {
            return None;
        }
        self.answered = true;
        self.selected = Some(option.to_string());
        let correct = self.resolved.get(self.current).is_some_and(|r| r == option);
        if correct {
            self.score += 1;
        }
        Some(correct)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    /// Moves to the next question, or finishes the quiz after the last one.
    pub fn advance(&mut self) {
        if self.finished {
            return;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            self.answered = false;
        } else {
            self.finished = true;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Score as a percentage of all questions, rounded to the nearest
    /// integer. Zero for an empty quiz.
    pub fn percent(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        ((self.score as f64 / self.questions.len() as f64) * 100.0).round() as u32
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.score = 0;
        self.selected = None;
        self.answered = false;
        self.finished = false;
    }
}

/// A deck of generated flashcards with wrap-around navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardDeck {
    cards: Vec<Flashcard>,
    current: usize,
    flipped: bool,
}

impl FlashcardDeck {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self {
            cards,
            current: 0,
            flipped: false,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.current)
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        if !self.cards.is_empty() {
            self.flipped = !self.flipped;
        }
    }

    /// Advances with wrap-around; the new card starts face down.
    pub fn next(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.flipped = false;
        self.current = (self.current + 1) % self.cards.len();
    }

    pub fn prev(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.flipped = false;
        self.current = (self.current + self.cards.len() - 1) % self.cards.len();
    }
}

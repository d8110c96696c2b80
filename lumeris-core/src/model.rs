use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One rendered transcript entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Body of a chat request: one user question scoped to a resource.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatQuery {
    pub query: String,
    pub resource_id: String,
}

/// One stored history entry as the backend returns it. `role` stays a raw
/// string: entries with roles other than user/assistant are filtered by the
/// session layer, not rejected at decode time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryMessage>,
}

/// A generated multiple-choice question. Immutable once constructed;
/// `options` is index-addressable (A, B, C, D) and `correct_answer` is the
/// upstream's free-form key, resolved by [`crate::answer_key`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuizResponse {
    pub quizzes: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FlashcardResponse {
    pub flashcards: Vec<Flashcard>,
}

/// Body of the generate-quiz / generate-flashcards requests.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LearningRequest {
    pub resource_id: String,
}

/// A study resource (a processed video or PDF) as listed by the backend.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResourceResponse {
    pub resources: Vec<Resource>,
}

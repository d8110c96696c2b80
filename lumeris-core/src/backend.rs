use async_trait::async_trait;
use futures::StreamExt;

use crate::error::CoreResult;
use crate::model::{ChatQuery, Flashcard, HistoryMessage, QuizQuestion, Resource};

/// Boxed stream of reply fragments for one assistant turn.
///
/// Fragments arrive in order and may overlap; feed them through
/// [`crate::reconcile`] before display. The stream simply ends when the turn
/// is complete; there is no explicit terminal value.
pub type TextFragments = futures::stream::BoxStream<'static, CoreResult<String>>;

/// The learning API as the study modes see it.
#[async_trait]
pub trait LearningBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Sends one user question scoped to a resource and returns the
    /// assistant reply as a fragment stream.
    async fn chat_stream(&self, query: ChatQuery) -> CoreResult<TextFragments>;

    async fn chat_history(&self, resource_id: &str) -> CoreResult<Vec<HistoryMessage>>;

    async fn clear_chat_history(&self, resource_id: &str) -> CoreResult<()>;

    async fn generate_quiz(&self, resource_id: &str) -> CoreResult<Vec<QuizQuestion>>;

    async fn generate_flashcards(&self, resource_id: &str) -> CoreResult<Vec<Flashcard>>;

    async fn list_resources(&self) -> CoreResult<Vec<Resource>>;
}

/// A canned in-process backend. Useful for tests and as the fallback when no
/// learning API is configured.
pub struct NullBackend;

#[async_trait]
impl LearningBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    async fn chat_stream(&self, query: ChatQuery) -> CoreResult<TextFragments> {
        let fragments = vec![
            Ok(format!("[null backend] You asked: {}. ", query.query)),
            Ok("Configure a learning API to get real answers.".to_string()),
        ];
        Ok(futures::stream::iter(fragments).boxed())
    }

    async fn chat_history(&self, _resource_id: &str) -> CoreResult<Vec<HistoryMessage>> {
        Ok(vec![])
    }

    async fn clear_chat_history(&self, _resource_id: &str) -> CoreResult<()> {
        Ok(())
    }

    async fn generate_quiz(&self, _resource_id: &str) -> CoreResult<Vec<QuizQuestion>> {
        Ok(vec![QuizQuestion {
            question: "[null backend] Which backend produced this question?".to_string(),
            options: vec![
                "The learning API".to_string(),
                "The null backend".to_string(),
            ],
            correct_answer: "B".to_string(),
        }])
    }

    async fn generate_flashcards(&self, _resource_id: &str) -> CoreResult<Vec<Flashcard>> {
        Ok(vec![Flashcard {
            question: "[null backend] What is this card?".to_string(),
            answer: "A canned placeholder.".to_string(),
        }])
    }

    async fn list_resources(&self) -> CoreResult<Vec<Resource>> {
        Ok(vec![])
    }
}

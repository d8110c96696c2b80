use async_trait::async_trait;
use serde::Deserialize;

use crate::backend::{LearningBackend, TextFragments};
use crate::config::Config;
use crate::error::{CoreResult, LumerisError};
use crate::http_client::HttpClient;
use crate::identity::UserIdentity;
use crate::model::{
    ChatQuery, Flashcard, HistoryMessage, HistoryResponse, LearningRequest, QuizQuestion,
    QuizResponse, Resource, ResourceResponse,
};
use crate::normalizer;

/// HTTP implementation of [`LearningBackend`] against the learning API.
#[derive(Debug, Clone)]
pub struct RestBackend {
    http: HttpClient,
    base: String,
    identity: UserIdentity,
    name: String,
}

// ---- Wire structs (minimal) ----
#[derive(Deserialize)]
struct ClearStatus {
    #[allow(dead_code)]
    status: String,
}

impl RestBackend {
    pub fn new(http: HttpClient, identity: UserIdentity, base: String) -> Self {
        Self {
            http,
            identity,
            base: base.trim_end_matches('/').to_string(),
            name: "rest".into(),
        }
    }

    /// Builds a backend from a loaded config. The config must carry an
    /// identity section; the API rejects anonymous requests.
    pub fn from_config(cfg: &Config) -> CoreResult<Self> {
        let identity_cfg = cfg.identity.as_ref().ok_or_else(|| {
            LumerisError::Validation("config has no identity section".to_string())
        })?;
        let http = HttpClient::with_timeouts(
            std::time::Duration::from_millis(cfg.http.connect_timeout_ms),
            std::time::Duration::from_millis(cfg.http.request_timeout_ms),
            cfg.http.pool_max_idle_per_host,
        )?;
        let identity = UserIdentity::new(identity_cfg.user_id.clone(), identity_cfg.email.clone());
        Ok(Self::new(http, identity, cfg.backend.base_url.clone()))
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.identity.headers()
    }
}

#[async_trait]
impl LearningBackend for RestBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat_stream(&self, query: ChatQuery) -> CoreResult<TextFragments> {
        let query = normalizer::normalize_query(query);
        if query.query.is_empty() {
            return Err(LumerisError::Validation("empty chat query".to_string()));
        }
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/api/chat/", self.base);
        self.http.post_text_stream(&url, &query, &hdrs).await
    }

    async fn chat_history(&self, resource_id: &str) -> CoreResult<Vec<HistoryMessage>> {
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/api/chat/history/{}", self.base, resource_id);
        let resp: HistoryResponse = self.http.get_json(&url, &hdrs).await?;
        Ok(resp.messages)
    }

    async fn clear_chat_history(&self, resource_id: &str) -> CoreResult<()> {
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/api/chat/history/{}", self.base, resource_id);
        let _status: ClearStatus = self.http.delete_json(&url, &hdrs).await?;
        Ok(())
    }

    async fn generate_quiz(&self, resource_id: &str) -> CoreResult<Vec<QuizQuestion>> {
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/api/learning/generate-quiz", self.base);
        let body = LearningRequest {
            resource_id: resource_id.to_string(),
        };
        let resp: QuizResponse = self.http.post_json(&url, &body, &hdrs).await?;
        Ok(normalizer::normalize_questions(resp.quizzes))
    }

    async fn generate_flashcards(&self, resource_id: &str) -> CoreResult<Vec<Flashcard>> {
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/api/learning/generate-flashcards", self.base);
        let body = LearningRequest {
            resource_id: resource_id.to_string(),
        };
        let resp: crate::model::FlashcardResponse = self.http.post_json(&url, &body, &hdrs).await?;
        Ok(normalizer::normalize_flashcards(resp.flashcards))
    }

    async fn list_resources(&self) -> CoreResult<Vec<Resource>> {
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/api/resources", self.base);
        let resp: ResourceResponse = self.http.get_json(&url, &hdrs).await?;
        Ok(resp.resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use httpmock::Method::{DELETE, GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    fn backend_for(server: &MockServer) -> RestBackend {
        RestBackend::new(
            HttpClient::new_default().unwrap(),
            UserIdentity::new("u-1", Some("student@example.com".into())),
            server.base_url(),
        )
    }

    #[tokio::test]
    async fn chat_stream_sends_identity_and_delivers_reply() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/api/chat/")
                .header("x-user-id", "u-1")
                .header("x-user-email", "student@example.com")
                .json_body(json!({"query":"What is entropy?","resource_id":"r-1"}));
            then.status(200).body("Entropy is a measure of disorder.");
        });

        let backend = backend_for(&server);
        let stream = backend
            .chat_stream(ChatQuery {
                query: "  What is entropy?  ".into(),
                resource_id: "r-1".into(),
            })
            .await
            .expect("stream");
        let text: String = stream.map(|r| r.expect("fragment")).collect().await;
        assert_eq!(text, "Entropy is a measure of disorder.");
        m.assert();
    }

    #[tokio::test]
    async fn chat_stream_rejects_blank_query_without_calling_out() {
        let server = MockServer::start();
        let backend = backend_for(&server);
        let err = match backend
            .chat_stream(ChatQuery {
                query: "   ".into(),
                resource_id: "r-1".into(),
            })
            .await
        {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(matches!(err, LumerisError::Validation(_)));
    }

    #[tokio::test]
    async fn history_200_maps_fields() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET)
                .path("/api/chat/history/r-1")
                .header("x-user-id", "u-1");
            then.status(200).json_body(json!({
                "messages": [
                    {"id":"m-1","role":"user","message":"hi","created_at":"2025-01-01T00:00:00"},
                    {"id":"m-2","role":"assistant","message":"hello","created_at":null}
                ]
            }));
        });

        let backend = backend_for(&server);
        let history = backend.chat_history("r-1").await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].message, "hello");
        assert_eq!(history[1].created_at, None);
    }

    #[tokio::test]
    async fn history_404_maps_to_not_found() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/api/chat/history/r-missing");
            then.status(404).body("Resource not found");
        });

        let backend = backend_for(&server);
        let err = backend.chat_history("r-missing").await.unwrap_err();
        assert!(matches!(err, LumerisError::NotFound { .. }));
    }

    #[tokio::test]
    async fn missing_identity_is_rejected_by_backend() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/api/chat/history/r-1");
            then.status(401).body("Missing x-user-id header");
        });

        let backend = backend_for(&server);
        let err = backend.chat_history("r-1").await.unwrap_err();
        match err {
            LumerisError::Unauthorized { message } => assert!(message.contains("x-user-id")),
            other => panic!("expected Unauthorized, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn clear_history_deletes() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(DELETE)
                .path("/api/chat/history/r-1")
                .header("x-user-id", "u-1");
            then.status(200).json_body(json!({"status":"success"}));
        });

        let backend = backend_for(&server);
        backend.clear_chat_history("r-1").await.expect("clear");
        m.assert();
    }

    #[tokio::test]
    async fn quiz_200_is_normalized() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(POST)
                .path("/api/learning/generate-quiz")
                .json_body(json!({"resource_id":"r-1"}));
            then.status(200).json_body(json!({
                "quizzes": [
                    {"question":"  Which city?  ","options":["Paris ","Lyon","Nice","Metz"],"correct_answer":" B "},
                    {"question":"Broken","options":["only one"],"correct_answer":"A"}
                ]
            }));
        });

        let backend = backend_for(&server);
        let questions = backend.generate_quiz("r-1").await.expect("quiz");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Which city?");
        assert_eq!(questions[0].options[0], "Paris");
        assert_eq!(questions[0].correct_answer, "B");
    }

    #[tokio::test]
    async fn flashcards_200_are_normalized() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(POST)
                .path("/api/learning/generate-flashcards")
                .json_body(json!({"resource_id":"r-1"}));
            then.status(200).json_body(json!({
                "flashcards": [
                    {"question":" Define entropy ","answer":"A measure of disorder"},
                    {"question":"Define entropy","answer":"A measure of disorder"},
                    {"question":"","answer":"orphan"}
                ]
            }));
        });

        let backend = backend_for(&server);
        let cards = backend.generate_flashcards("r-1").await.expect("cards");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "Define entropy");
    }

    #[tokio::test]
    async fn resources_200_unwraps_list() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/api/resources").header("x-user-id", "u-1");
            then.status(200).json_body(json!({
                "resources": [
                    {"id":"r-1","type":"pdf","title":"Lecture 3","created_at":"2025-01-01T00:00:00"},
                    {"id":"r-2","type":"youtube","title":"Intro","created_at":null}
                ]
            }));
        });

        let backend = backend_for(&server);
        let resources = backend.list_resources().await.expect("resources");
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].kind, "pdf");
        assert_eq!(resources[1].title, "Intro");
    }

    #[tokio::test]
    async fn from_config_requires_identity() {
        let cfg = Config {
            backend: Default::default(),
            identity: None,
            http: Default::default(),
        };
        let err = RestBackend::from_config(&cfg).unwrap_err();
        assert!(matches!(err, LumerisError::Validation(_)));
    }

    #[tokio::test]
    async fn base_url_trailing_slash_is_tolerated() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/api/resources");
            then.status(200).json_body(json!({"resources": []}));
        });

        let backend = RestBackend::new(
            HttpClient::new_default().unwrap(),
            UserIdentity::new("u-1", None),
            format!("{}/", server.base_url()),
        );
        let resources = backend.list_resources().await.expect("resources");
        assert!(resources.is_empty());
    }
}

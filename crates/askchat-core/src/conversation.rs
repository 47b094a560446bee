//! The conversation controller.
//!
//! A submission goes through three steps so the network call never holds a
//! borrow of the conversation:
//!
//! 1. [`Conversation::submit`] records the user turn, marks the conversation
//!    busy and hands back an [`AnswerRequest`].
//! 2. [`AnswerRequest::send`] performs the call. It owns everything it needs,
//!    so a UI can spawn it and keep drawing.
//! 3. [`Conversation::complete`] records the assistant turn and clears the
//!    busy flag, whatever the outcome was.
//!
//! Callers that can simply await use [`Conversation::ask`].

use tracing::{debug, warn};

use crate::ai::AnswerClient;
use crate::error::AnswerOutcome;
use crate::state::{ChatMessage, ConversationState, DEFAULT_FALLBACK_MESSAGE};

pub struct Conversation {
    state: ConversationState,
    client: AnswerClient,
    fallback_message: String,
}

/// An answer request that has been accepted but not yet sent.
#[derive(Debug)]
#[must_use = "the conversation stays busy until this request is sent and completed"]
pub struct AnswerRequest {
    question: String,
    client: AnswerClient,
}

impl AnswerRequest {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub async fn send(self) -> AnswerOutcome {
        self.client.ask(&self.question).await
    }
}

impl Conversation {
    pub fn new(client: AnswerClient) -> Self {
        Self {
            state: ConversationState::default(),
            client,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.state.messages
    }

    pub fn pending_input(&self) -> &str {
        &self.state.pending_input
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }

    pub fn update_input(&mut self, text: impl Into<String>) {
        self.state.pending_input = text.into();
    }

    /// Accept `text` as the next question.
    ///
    /// Returns `None`, leaving the state untouched, while busy or when `text`
    /// is blank.
    pub fn submit(&mut self, text: &str) -> Option<AnswerRequest> {
        let question = text.trim();
        if self.state.is_busy || question.is_empty() {
            return None;
        }
        let question = question.to_string();

        self.state.pending_input.clear();
        self.state.messages.push(ChatMessage::user(question.clone()));
        self.state.is_busy = true;
        debug!(turns = self.state.messages.len(), "question accepted");

        Some(AnswerRequest {
            question,
            client: self.client.clone(),
        })
    }

    /// Key-submit: submit whatever is in the input box.
    pub fn submit_pending(&mut self) -> Option<AnswerRequest> {
        let text = self.state.pending_input.clone();
        self.submit(&text)
    }

    /// Record the outcome of the in-flight request and leave the busy state.
    ///
    /// Ignored if nothing is in flight.
    pub fn complete(&mut self, outcome: AnswerOutcome) {
        if !self.state.is_busy {
            warn!("answer arrived with no request in flight; dropping it");
            return;
        }

        let reply = match outcome {
            Ok(answer) => ChatMessage::assistant(answer),
            Err(err) => {
                warn!(error = %err, "answer request failed");
                ChatMessage::assistant(self.fallback_message.clone())
            }
        };
        self.state.messages.push(reply);
        self.state.is_busy = false;
    }

    /// Submit `text` and wait for the reply in place.
    ///
    /// Returns false if the submission was a no-op.
    pub async fn ask(&mut self, text: &str) -> bool {
        let Some(request) = self.submit(text) else {
            return false;
        };
        let outcome = request.send().await;
        self.complete(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AskError;
    use crate::state::ChatRole;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn conversation_for(server: &MockServer) -> Conversation {
        Conversation::new(AnswerClient::new(&format!("{}/ask", server.uri())))
    }

    fn offline_conversation() -> Conversation {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Conversation::new(AnswerClient::new(&format!("http://127.0.0.1:{port}/ask")))
    }

    #[test]
    fn test_update_input_is_verbatim() {
        let mut convo = offline_conversation();
        convo.update_input("  spaced  \t");
        assert_eq!(convo.pending_input(), "  spaced  \t");
        assert!(convo.messages().is_empty());
    }

    #[test]
    fn test_submit_records_user_turn_before_request() {
        let mut convo = offline_conversation();
        convo.update_input("  hello  ");

        let request = convo.submit_pending().unwrap();

        assert_eq!(request.question(), "hello");
        assert_eq!(convo.messages(), &[ChatMessage::user("hello")]);
        assert_eq!(convo.pending_input(), "");
        assert!(convo.is_busy());
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut convo = offline_conversation();
        convo.update_input(" \n\t ");
        let before = convo.state().clone();

        assert!(convo.submit_pending().is_none());
        assert!(convo.submit("").is_none());
        assert_eq!(convo.state(), &before);
    }

    #[test]
    fn test_submit_while_busy_is_noop() {
        let mut convo = offline_conversation();
        let _first = convo.submit("first").unwrap();
        convo.update_input("second");
        let before = convo.state().clone();

        assert!(convo.submit_pending().is_none());
        assert!(convo.submit("third").is_none());
        assert_eq!(convo.state(), &before);
    }

    #[test]
    fn test_complete_without_request_is_ignored() {
        let mut convo = offline_conversation();
        convo.complete(Ok("stray".to_string()));
        assert!(convo.messages().is_empty());
        assert!(!convo.is_busy());
    }

    #[test]
    fn test_failed_outcome_uses_fallback() {
        let mut convo = offline_conversation().with_fallback_message("oops");
        let _request = convo.submit("hello").unwrap();

        convo.complete(Err(AskError::TaskFailed("panicked".to_string())));

        assert_eq!(
            convo.messages(),
            &[ChatMessage::user("hello"), ChatMessage::assistant("oops")]
        );
        assert!(!convo.is_busy());
    }

    #[tokio::test]
    async fn test_ask_success_scenario() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(body_json(serde_json::json!({ "question": "hello" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "answer": "hi there" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut convo = conversation_for(&mock_server);
        assert!(convo.ask("hello").await);

        assert_eq!(
            convo.messages(),
            &[ChatMessage::user("hello"), ChatMessage::assistant("hi there")]
        );
        assert!(!convo.is_busy());
    }

    #[tokio::test]
    async fn test_ask_network_failure_scenario() {
        let mut convo = offline_conversation();
        assert!(convo.ask("hello").await);

        let messages = convo.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::user("hello"));
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[1].content, DEFAULT_FALLBACK_MESSAGE);
        assert!(!convo.is_busy());
    }

    #[tokio::test]
    async fn test_ask_error_status_uses_fallback_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut convo = conversation_for(&mock_server);
        convo.ask("hello").await;

        let replies: Vec<_> = convo
            .messages()
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .collect();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].content, DEFAULT_FALLBACK_MESSAGE);
        assert!(!convo.is_busy());
    }

    #[tokio::test]
    async fn test_blank_ask_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut convo = conversation_for(&mock_server);
        assert!(!convo.ask("   ").await);
        assert!(convo.messages().is_empty());
    }

    #[tokio::test]
    async fn test_busy_for_whole_flight_and_second_submit_dropped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "answer": "slow" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut convo = conversation_for(&mock_server);
        let request = convo.submit("first").unwrap();
        let in_flight = tokio::spawn(request.send());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(convo.is_busy());
        assert!(convo.submit("second").is_none());
        assert_eq!(convo.messages().len(), 1);

        let outcome = in_flight.await.unwrap();
        convo.complete(outcome);

        assert!(!convo.is_busy());
        assert_eq!(
            convo.messages(),
            &[ChatMessage::user("first"), ChatMessage::assistant("slow")]
        );
    }

    #[tokio::test]
    async fn test_usable_after_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({ "question": "bad" })))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({ "question": "good" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "ok" })),
            )
            .mount(&mock_server)
            .await;

        let mut convo = conversation_for(&mock_server);
        convo.ask("bad").await;
        convo.ask("good").await;

        let contents: Vec<_> = convo.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["bad", DEFAULT_FALLBACK_MESSAGE, "good", "ok"]);
    }
}

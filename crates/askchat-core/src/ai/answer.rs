use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnswerOutcome, AskError};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/ask";

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: Option<String>,
    // The service reports model failures as a 200 with an `error` field
    error: Option<String>,
}

/// Client for the remote answer service: one POST per question.
#[derive(Clone, Debug)]
pub struct AnswerClient {
    client: Client,
    endpoint: String,
}

impl AnswerClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn ask(&self, question: &str) -> AnswerOutcome {
        debug!(endpoint = %self.endpoint, chars = question.chars().count(), "sending question");

        // `.json()` sets `Content-Type: application/json`
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(AskError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AskError::Status { status, body });
        }

        let body: AskResponse = response.json().await.map_err(AskError::Decode)?;
        match body.answer {
            Some(answer) => {
                debug!(chars = answer.chars().count(), "received answer");
                Ok(answer)
            }
            None => Err(AskError::MissingAnswer { error: body.error }),
        }
    }
}

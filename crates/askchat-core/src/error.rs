use thiserror::Error;

/// Why an answer request failed.
///
/// The chat screen shows the same fallback text for every variant; the
/// distinction only shows up in the log.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("could not reach answer service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("answer service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("answer service sent an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("answer service response had no answer{}", error_suffix(.error))]
    MissingAnswer { error: Option<String> },

    #[error("answer task did not finish: {0}")]
    TaskFailed(String),
}

pub type AnswerOutcome = Result<String, AskError>;

fn error_suffix(error: &Option<String>) -> String {
    match error {
        Some(e) => format!(" (error: {e})"),
        None => String::new(),
    }
}

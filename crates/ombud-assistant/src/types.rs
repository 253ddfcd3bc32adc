use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
/// Failure surfaced by generative-response calls.
pub enum AssistantError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("answer not ready after {attempts} poll attempts")]
    Timeout { attempts: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A generated reply plus the session handle to thread into the next turn.
pub struct AssistantReply {
    pub text: String,
    pub session_handle: String,
}

#[async_trait]
/// Trait contract for the generative-response backend.
pub trait AssistantBackend: Send + Sync {
    /// Produces a reply for `user_text`, continuing the conversational
    /// context behind `session_handle` when one is supplied.
    async fn respond(
        &self,
        session_handle: Option<&str>,
        user_text: &str,
    ) -> Result<AssistantReply, AssistantError>;
}

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
/// Failure surfaced by conversation API calls.
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("platform returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Current platform-side view of one conversation.
pub struct ConversationSnapshot {
    /// Assignee agent id, `None` when the conversation is unassigned.
    pub assigned_agent_id: Option<String>,
    pub status: Option<String>,
}

#[async_trait]
/// Trait contract for conversation-resource access.
pub trait ConversationApi: Send + Sync {
    /// Fetches the conversation's current assignee state.
    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSnapshot, PlatformError>;

    /// Sets the conversation assignee and status.
    async fn set_assignee(
        &self,
        conversation_id: &str,
        agent_id: &str,
        status: &str,
    ) -> Result<(), PlatformError>;

    /// Posts a message into the conversation as the given agent.
    async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
        sender_agent_id: &str,
    ) -> Result<(), PlatformError>;
}

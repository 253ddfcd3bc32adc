//! Broker configuration: agent identities, phrase lists, fixed messages.
//!
//! Phrase lists and the canned messages are configuration data rather than
//! code branches; deployments tune them without touching dispatch logic.

/// Platform status written alongside every assignee change.
pub const ASSIGNED_STATUS: &str = "assigned";

const DEFAULT_ESCALATION_PHRASES: &[&str] = &[
    "human agent",
    "real person",
    "human representative",
    "speak to a human",
    "transfer you to an agent",
];

const DEFAULT_RESOLUTION_PHRASES: &[&str] = &[
    "closing this conversation",
    "returning to bot",
    "back to the bot",
    "resolving this conversation",
];

const DEFAULT_WELCOME_MESSAGE: &str =
    "You're back with our automated assistant. How can I help you today?";

const DEFAULT_MEDIA_ACK_MESSAGE: &str =
    "Thanks for sharing! I can only read text right now, so please describe the issue in a message.";

#[derive(Debug, Clone)]
/// Runtime configuration consumed by the dispatcher and transition engine.
pub struct BrokerConfig {
    /// Agent id the platform uses for the bot. Required for auto-claim,
    /// de-escalation, and ownership self-resolution.
    pub automation_agent_id: Option<String>,
    /// Fallback human agent (or queue) id. Required for escalation.
    pub human_agent_id: Option<String>,
    /// Phrases in a generated reply that request a hand-off to a human.
    pub escalation_phrases: Vec<String>,
    /// Phrases in a human agent's message that hand the conversation back.
    pub resolution_phrases: Vec<String>,
    /// Re-engagement message sent when a conversation returns to automation.
    pub welcome_message: String,
    /// Acknowledgment for media-only messages the assistant cannot read.
    pub media_ack_message: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            automation_agent_id: None,
            human_agent_id: None,
            escalation_phrases: default_phrases(DEFAULT_ESCALATION_PHRASES),
            resolution_phrases: default_phrases(DEFAULT_RESOLUTION_PHRASES),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            media_ack_message: DEFAULT_MEDIA_ACK_MESSAGE.to_string(),
        }
    }
}

impl BrokerConfig {
    /// Sender id used when the bot posts messages. Falls back to an empty id
    /// when no automation agent is configured; the platform then attributes
    /// the message to the API credential's default actor.
    pub fn sender_agent_id(&self) -> &str {
        self.automation_agent_id.as_deref().unwrap_or_default()
    }
}

fn default_phrases(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|phrase| phrase.to_string()).collect()
}

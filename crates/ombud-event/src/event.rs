use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Action category of an inbound webhook event.
pub enum ActionKind {
    MessageCreate,
    AssignmentChange,
    Unclassified,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreate => "message_create",
            Self::AssignmentChange => "assignment_change",
            Self::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Author category of a message event. Only meaningful for `MessageCreate`.
pub enum ActorKind {
    EndUser,
    Agent,
    Unknown,
}

impl ActorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EndUser => "end_user",
            Self::Agent => "agent",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
/// Media tag carried by a message part.
pub enum MediaKind {
    Image,
    File,
    Video,
    Audio,
    Sticker,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::File => "file",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Sticker => "sticker",
        }
    }

    /// Maps a message-part key to its media tag, if it names one.
    pub fn from_part_key(key: &str) -> Option<Self> {
        match key {
            "image" => Some(Self::Image),
            "file" => Some(Self::File),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "sticker" => Some(Self::Sticker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// Normalized form of one inbound webhook delivery.
///
/// Every field is optional at the wire level; absent data stays `None`/empty
/// rather than failing classification.
pub struct CanonicalEvent {
    pub action: ActionKind,
    pub actor: ActorKind,
    pub conversation_id: Option<String>,
    /// Message text, present only for `MessageCreate` events with a text part.
    pub text: Option<String>,
    /// Media tags present across the message parts.
    pub media: BTreeSet<MediaKind>,
    /// Authoring agent id, when the actor is an agent.
    pub actor_agent_id: Option<String>,
    /// Assignment target, for `AssignmentChange` events.
    pub new_assignee_agent_id: Option<String>,
    /// Previous assignee, for `AssignmentChange` events.
    pub old_assignee_agent_id: Option<String>,
}

impl CanonicalEvent {
    pub fn unclassified() -> Self {
        Self {
            action: ActionKind::Unclassified,
            actor: ActorKind::Unknown,
            conversation_id: None,
            text: None,
            media: BTreeSet::new(),
            actor_agent_id: None,
            new_assignee_agent_id: None,
            old_assignee_agent_id: None,
        }
    }

    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }

    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }
}

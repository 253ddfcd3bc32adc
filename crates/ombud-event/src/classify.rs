//! Normalization of raw webhook bodies into `CanonicalEvent`.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::event::{ActionKind, ActorKind, CanonicalEvent, MediaKind};

const MESSAGE_ACTION_NAMES: &[&str] = &["message_create", "message_created"];
const ASSIGNMENT_ACTION_NAMES: &[&str] = &[
    "conversation_assignment",
    "conversation_reassignment",
    "assignment_change",
];

/// Payload paths probed, in order, for the conversation id. The platform
/// emits the id at different depths depending on event origin.
const CONVERSATION_ID_PATHS: &[&[&str]] = &[
    &["data", "message", "conversation_id"],
    &["data", "conversation", "conversation_id"],
    &["data", "assignment", "conversation", "conversation_id"],
    &["conversation", "id"],
];

/// Change-log `{old, new}` pairs are the most explicit assignment signal the
/// platform sends, so they win over the plain fields.
const NEW_ASSIGNEE_PATHS: &[&[&str]] = &[
    &["changes", "assigned_agent_id", "new"],
    &["data", "assignment", "to_agent_id"],
    &["data", "conversation", "assigned_agent_id"],
];

const OLD_ASSIGNEE_PATHS: &[&[&str]] = &[
    &["changes", "assigned_agent_id", "old"],
    &["data", "assignment", "from_agent_id"],
];

/// Classifies a raw webhook body. Total: unknown or malformed payloads come
/// back as `ActionKind::Unclassified`, never an error.
pub fn classify(payload: &Value) -> CanonicalEvent {
    if !payload.is_object() {
        return CanonicalEvent::unclassified();
    }

    let action_name = string_at(payload, &["action"]);
    let action = resolve_action_kind(payload, action_name.as_deref());
    if action == ActionKind::Unclassified {
        return CanonicalEvent::unclassified();
    }

    let conversation_id = first_string(payload, CONVERSATION_ID_PATHS);

    match action {
        ActionKind::MessageCreate => {
            let actor = resolve_actor_kind(payload);
            let actor_agent_id = match actor {
                ActorKind::Agent => string_at(payload, &["actor", "actor_id"]),
                _ => None,
            };
            let (text, media) = extract_message_parts(payload);
            CanonicalEvent {
                action,
                actor,
                conversation_id,
                text,
                media,
                actor_agent_id,
                new_assignee_agent_id: None,
                old_assignee_agent_id: None,
            }
        }
        ActionKind::AssignmentChange => CanonicalEvent {
            action,
            actor: ActorKind::Unknown,
            conversation_id,
            text: None,
            media: BTreeSet::new(),
            actor_agent_id: None,
            new_assignee_agent_id: first_string(payload, NEW_ASSIGNEE_PATHS),
            old_assignee_agent_id: first_string(payload, OLD_ASSIGNEE_PATHS),
        },
        ActionKind::Unclassified => CanonicalEvent::unclassified(),
    }
}

fn resolve_action_kind(payload: &Value, action_name: Option<&str>) -> ActionKind {
    if let Some(name) = action_name {
        if MESSAGE_ACTION_NAMES.contains(&name) {
            return ActionKind::MessageCreate;
        }
        if ASSIGNMENT_ACTION_NAMES.contains(&name) {
            return ActionKind::AssignmentChange;
        }
    }
    // Some deployments omit the action name on assignment events; the
    // presence of assignment-shaped data is treated as equivalent.
    if has_assignment_shape(payload) {
        return ActionKind::AssignmentChange;
    }
    ActionKind::Unclassified
}

fn has_assignment_shape(payload: &Value) -> bool {
    value_at(payload, &["data", "assignment"]).is_some_and(Value::is_object)
        || value_at(payload, &["changes", "assigned_agent_id"]).is_some_and(Value::is_object)
}

fn resolve_actor_kind(payload: &Value) -> ActorKind {
    match string_at(payload, &["actor", "actor_type"]).as_deref() {
        Some("user") => ActorKind::EndUser,
        Some("agent") | Some("bot") => ActorKind::Agent,
        _ => ActorKind::Unknown,
    }
}

fn extract_message_parts(payload: &Value) -> (Option<String>, BTreeSet<MediaKind>) {
    let mut text = None;
    let mut media = BTreeSet::new();

    let parts = value_at(payload, &["data", "message", "message_parts"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for part in parts {
        let Some(part) = part.as_object() else {
            continue;
        };
        if text.is_none() {
            if let Some(content) = optional_string(part.get("text").and_then(|t| t.get("content")))
            {
                if !content.is_empty() {
                    text = Some(content);
                }
            }
        }
        for key in part.keys() {
            if let Some(kind) = MediaKind::from_part_key(key) {
                media.insert(kind);
            }
        }
    }

    (text, media)
}

fn first_string(root: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| string_at(root, path))
}

fn string_at(root: &Value, path: &[&str]) -> Option<String> {
    optional_string(value_at(root, path))
}

fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Accepts both string and numeric wire values; agent ids have been observed
/// as either depending on the payload origin.
fn optional_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(raw) => Some(raw.trim().to_string()),
        Value::Number(raw) => Some(raw.to_string()),
        _ => None,
    }
}

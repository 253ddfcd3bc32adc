//! Authoritative-ownership resolution.
//!
//! The local record is a cache that the platform can move underneath us
//! (manual UI reassignment, other integrations), so every respond attempt
//! re-derives ownership from a fresh read of the conversation resource.
//! An unreachable control plane fails open to automation.

use ombud_platform::ConversationApi;

use crate::store::{OwnershipState, OwnershipStore};

/// Resolves the authoritative owner of `conversation_id`, syncing the local
/// record to the platform's assignee along the way. Automation may respond
/// iff this returns `WithAutomation`.
pub async fn reconcile_ownership(
    store: &OwnershipStore,
    platform: &dyn ConversationApi,
    automation_agent_id: Option<&str>,
    conversation_id: &str,
) -> OwnershipState {
    let snapshot = match platform.get_conversation(conversation_id).await {
        Ok(snapshot) => snapshot,
        Err(error) => {
            tracing::warn!(
                conversation_id,
                error = %error,
                "assignee read failed; failing open to automation"
            );
            return OwnershipState::WithAutomation;
        }
    };

    let local = store.record(conversation_id);
    match snapshot.assigned_agent_id.as_deref() {
        Some(assignee) if automation_agent_id != Some(assignee) => {
            // A human (or another integration) holds the conversation.
            if local.state != OwnershipState::WithHuman {
                tracing::info!(conversation_id, assignee, "conversation is with a human");
                store.set_state(conversation_id, OwnershipState::WithHuman);
                store.set_session_handle(conversation_id, None);
            }
            OwnershipState::WithHuman
        }
        None if local.state == OwnershipState::WithHuman => {
            // Reopen: the human resolved the conversation and the platform
            // cleared the assignee; a fresh end-user message brought it back.
            tracing::info!(conversation_id, "assignee cleared; reopening to automation");
            store.remove(conversation_id);
            OwnershipState::WithAutomation
        }
        Some(_) if local.state == OwnershipState::WithHuman => {
            // Assignee equals the automation agent: the local human flag is
            // stale relative to the platform. Self-heal.
            tracing::info!(conversation_id, "assignee is automation; clearing stale human flag");
            store.set_state(conversation_id, OwnershipState::WithAutomation);
            OwnershipState::WithAutomation
        }
        _ => local.state,
    }
}

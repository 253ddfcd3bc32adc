//! Ownership transitions and their external side effects.
//!
//! All three operations are idempotent: repeated or concurrent invocation
//! converges on the same end state. External write failures are logged and
//! local state still advances; a conversation wrongly marked human goes
//! quiet, while one wrongly marked automation double-responds.

use anyhow::{bail, Result};

use ombud_platform::ConversationApi;

use crate::config::{BrokerConfig, ASSIGNED_STATUS};
use crate::store::{OwnershipState, OwnershipStore};

/// Hands the conversation to the configured human agent. Local state moves
/// to `WithHuman` and the session handle is cleared even when the external
/// reassignment fails.
pub async fn escalate(
    store: &OwnershipStore,
    platform: &dyn ConversationApi,
    config: &BrokerConfig,
    conversation_id: &str,
) -> Result<()> {
    let Some(human_agent_id) = config.human_agent_id.as_deref() else {
        bail!("cannot escalate {conversation_id}: no human agent configured");
    };

    if store.record(conversation_id).state == OwnershipState::WithHuman {
        tracing::debug!(conversation_id, "already with a human; escalation is a no-op");
        return Ok(());
    }

    if let Err(error) = platform
        .set_assignee(conversation_id, human_agent_id, ASSIGNED_STATUS)
        .await
    {
        tracing::warn!(
            conversation_id,
            human_agent_id,
            error = %error,
            "external reassignment failed; marking local state human anyway"
        );
    }

    store.set_state(conversation_id, OwnershipState::WithHuman);
    store.set_session_handle(conversation_id, None);
    tracing::info!(conversation_id, human_agent_id, "conversation escalated");
    Ok(())
}

/// Returns the conversation to automation. The external reassignment and the
/// welcome message are both best-effort; clearing the local human flag is
/// not.
pub async fn deescalate(
    store: &OwnershipStore,
    platform: &dyn ConversationApi,
    config: &BrokerConfig,
    conversation_id: &str,
    send_welcome: bool,
    reassign_externally: bool,
) -> Result<()> {
    let Some(automation_agent_id) = config.automation_agent_id.as_deref() else {
        bail!("cannot de-escalate {conversation_id}: no automation agent configured");
    };

    if store.record(conversation_id).state == OwnershipState::WithAutomation {
        tracing::debug!(
            conversation_id,
            "already with automation; de-escalation is a no-op"
        );
        return Ok(());
    }

    if reassign_externally {
        if let Err(error) = platform
            .set_assignee(conversation_id, automation_agent_id, ASSIGNED_STATUS)
            .await
        {
            // The assignment may already be correct, e.g. when a platform-UI
            // reassignment is what triggered this call.
            tracing::warn!(
                conversation_id,
                error = %error,
                "external reassignment to automation failed; continuing"
            );
        }
    }

    store.set_state(conversation_id, OwnershipState::WithAutomation);
    tracing::info!(conversation_id, "conversation returned to automation");

    if send_welcome {
        if let Err(error) = platform
            .post_message(conversation_id, &config.welcome_message, automation_agent_id)
            .await
        {
            tracing::warn!(conversation_id, error = %error, "welcome message send failed");
        }
    }
    Ok(())
}

/// Claims an unassigned conversation for the automation agent so the
/// platform UI shows an active owner. Never overrides an existing assignee.
pub async fn auto_claim(
    platform: &dyn ConversationApi,
    config: &BrokerConfig,
    conversation_id: &str,
) -> Result<()> {
    let Some(automation_agent_id) = config.automation_agent_id.as_deref() else {
        tracing::debug!(conversation_id, "no automation agent configured; skipping claim");
        return Ok(());
    };

    let snapshot = match platform.get_conversation(conversation_id).await {
        Ok(snapshot) => snapshot,
        Err(error) => {
            tracing::warn!(conversation_id, error = %error, "claim check read failed");
            return Ok(());
        }
    };

    match snapshot.assigned_agent_id.as_deref() {
        None => {
            if let Err(error) = platform
                .set_assignee(conversation_id, automation_agent_id, ASSIGNED_STATUS)
                .await
            {
                tracing::warn!(conversation_id, error = %error, "auto-claim write failed");
            } else {
                tracing::debug!(conversation_id, "claimed unassigned conversation");
            }
        }
        Some(assignee) if assignee == automation_agent_id => {}
        Some(assignee) => {
            tracing::debug!(conversation_id, assignee, "assigned elsewhere; not claiming");
        }
    }
    Ok(())
}

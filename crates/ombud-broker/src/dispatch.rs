//! Webhook event routing.
//!
//! Routes each classified event by (action, actor) and runs the respond
//! pipeline when automation owns the conversation. Each conversation's
//! mutating flows run under its store guard; webhooks for different
//! conversations proceed concurrently. Processing failures never propagate
//! to the webhook caller; the transport ack has already happened by the
//! time dispatch runs.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use ombud_assistant::{clean_reply, AssistantBackend};
use ombud_event::{classify, ActionKind, ActorKind, CanonicalEvent};
use ombud_platform::ConversationApi;

use crate::config::BrokerConfig;
use crate::detect::HandoffDetector;
use crate::reconcile::reconcile_ownership;
use crate::store::{OwnershipState, OwnershipStore};
use crate::transition::{auto_claim, deescalate, escalate};

/// Routes classified webhook events to the ownership machinery and the
/// generative backend.
pub struct WebhookDispatcher {
    config: BrokerConfig,
    store: Arc<OwnershipStore>,
    platform: Arc<dyn ConversationApi>,
    assistant: Arc<dyn AssistantBackend>,
    detector: HandoffDetector,
}

impl WebhookDispatcher {
    pub fn new(
        config: BrokerConfig,
        platform: Arc<dyn ConversationApi>,
        assistant: Arc<dyn AssistantBackend>,
    ) -> Result<Self> {
        let detector = HandoffDetector::new(&config.escalation_phrases, &config.resolution_phrases)?;
        Ok(Self {
            config,
            store: Arc::new(OwnershipStore::new()),
            platform,
            assistant,
            detector,
        })
    }

    /// Shared ownership store, exposed for health/debug reporting.
    pub fn store(&self) -> Arc<OwnershipStore> {
        Arc::clone(&self.store)
    }

    /// Processes one raw webhook body to completion. Infallible by design:
    /// every failure is logged and absorbed here.
    pub async fn dispatch(&self, payload: &Value) {
        let event = classify(payload);
        if event.action == ActionKind::Unclassified {
            tracing::debug!("ignoring unclassifiable webhook payload");
            return;
        }
        let Some(conversation_id) = event.conversation_id.clone() else {
            tracing::debug!(
                action = event.action.as_str(),
                "ignoring event without a conversation id"
            );
            return;
        };

        // Serialize all mutating flows for this conversation; concurrent
        // deliveries for other conversations are unaffected.
        let guard = self.store.conversation_guard(&conversation_id);
        let _held = guard.lock().await;

        match (event.action, event.actor) {
            (ActionKind::AssignmentChange, _) => {
                self.handle_assignment_change(&event, &conversation_id).await;
            }
            (ActionKind::MessageCreate, ActorKind::Agent) => {
                self.handle_agent_message(&event, &conversation_id).await;
            }
            (ActionKind::MessageCreate, ActorKind::EndUser) => {
                self.handle_end_user_message(&event, &conversation_id).await;
            }
            (action, actor) => {
                tracing::debug!(
                    conversation_id,
                    action = action.as_str(),
                    actor = actor.as_str(),
                    "no route for event; ignoring"
                );
            }
        }
    }

    async fn handle_assignment_change(&self, event: &CanonicalEvent, conversation_id: &str) {
        match event.new_assignee_agent_id.as_deref() {
            Some(assignee) if self.config.automation_agent_id.as_deref() == Some(assignee) => {
                // Already reassigned externally; resync local state and greet.
                if let Err(error) = deescalate(
                    &self.store,
                    self.platform.as_ref(),
                    &self.config,
                    conversation_id,
                    true,
                    false,
                )
                .await
                {
                    tracing::warn!(conversation_id, error = %error, "de-escalation failed");
                }
            }
            Some(assignee) => {
                if self.store.record(conversation_id).state != OwnershipState::WithHuman {
                    tracing::info!(conversation_id, assignee, "assigned to a human agent");
                    self.store
                        .set_state(conversation_id, OwnershipState::WithHuman);
                    self.store.set_session_handle(conversation_id, None);
                }
            }
            None => {
                // Unassignment alone is not a reopen; that transition needs a
                // fresh end-user message and happens during reconciliation.
                tracing::debug!(conversation_id, "assignment cleared");
            }
        }
    }

    async fn handle_agent_message(&self, event: &CanonicalEvent, conversation_id: &str) {
        let agent_id = event.actor_agent_id.as_deref();
        if agent_id.is_some() && agent_id == self.config.automation_agent_id.as_deref() {
            // Echo of our own outbound message.
            return;
        }
        if self.store.record(conversation_id).state != OwnershipState::WithHuman {
            return;
        }
        let Some(text) = event.text.as_deref() else {
            return;
        };
        if !self.detector.is_resolution_message(text) {
            return;
        }
        tracing::info!(conversation_id, "agent resolution message; returning to bot");
        if let Err(error) = deescalate(
            &self.store,
            self.platform.as_ref(),
            &self.config,
            conversation_id,
            true,
            true,
        )
        .await
        {
            tracing::warn!(conversation_id, error = %error, "de-escalation failed");
        }
    }

    async fn handle_end_user_message(&self, event: &CanonicalEvent, conversation_id: &str) {
        if event.has_text() {
            let text = event.text.clone().unwrap_or_default();
            if let Err(error) = self.run_respond_pipeline(conversation_id, &text).await {
                tracing::error!(conversation_id, error = %error, "respond pipeline failed");
                self.escalate_fallback(conversation_id).await;
            }
        } else if event.has_media() {
            let media: Vec<&str> = event.media.iter().map(|kind| kind.as_str()).collect();
            tracing::debug!(conversation_id, media = media.join(","), "media-only message");
            self.acknowledge_media(conversation_id).await;
        } else {
            tracing::debug!(conversation_id, "end-user message with no text or media");
        }
    }

    /// Media-only messages get a fixed acknowledgment; no generative call.
    async fn acknowledge_media(&self, conversation_id: &str) {
        let state = self.reconcile(conversation_id).await;
        if state == OwnershipState::WithHuman {
            tracing::debug!(conversation_id, "with human; dropping media acknowledgment");
            return;
        }
        if let Err(error) = auto_claim(self.platform.as_ref(), &self.config, conversation_id).await
        {
            tracing::warn!(conversation_id, error = %error, "auto-claim failed");
        }
        if let Err(error) = self
            .platform
            .post_message(
                conversation_id,
                &self.config.media_ack_message,
                self.config.sender_agent_id(),
            )
            .await
        {
            tracing::warn!(conversation_id, error = %error, "media acknowledgment send failed");
        }
    }

    async fn run_respond_pipeline(&self, conversation_id: &str, text: &str) -> Result<()> {
        let state = self.reconcile(conversation_id).await;
        if state == OwnershipState::WithHuman {
            tracing::debug!(conversation_id, "with human; dropping end-user message");
            return Ok(());
        }
        if let Err(error) = auto_claim(self.platform.as_ref(), &self.config, conversation_id).await
        {
            tracing::warn!(conversation_id, error = %error, "auto-claim failed");
        }

        let session_handle = self.store.record(conversation_id).session_handle;
        let reply = self
            .assistant
            .respond(session_handle.as_deref(), text)
            .await
            .context("generative respond failed")?;
        self.store
            .set_session_handle(conversation_id, Some(reply.session_handle.clone()));

        let display_text = clean_reply(&reply.text);
        self.platform
            .post_message(conversation_id, &display_text, self.config.sender_agent_id())
            .await
            .context("reply send failed")?;

        // At most one escalation attempt per generated reply.
        if self.detector.needs_escalation(&reply.text) {
            tracing::info!(conversation_id, "generated reply requested a hand-off");
            if let Err(error) = escalate(
                &self.store,
                self.platform.as_ref(),
                &self.config,
                conversation_id,
            )
            .await
            {
                tracing::warn!(conversation_id, error = %error, "keyword escalation failed");
            }
        }
        Ok(())
    }

    /// Safety fallback for a broken respond pipeline: hand off silently, no
    /// failure text toward the end user.
    async fn escalate_fallback(&self, conversation_id: &str) {
        if self.config.human_agent_id.is_none() {
            tracing::warn!(conversation_id, "no human agent configured; staying silent");
            return;
        }
        if let Err(error) = escalate(
            &self.store,
            self.platform.as_ref(),
            &self.config,
            conversation_id,
        )
        .await
        {
            tracing::error!(conversation_id, error = %error, "fallback escalation failed");
        }
    }

    async fn reconcile(&self, conversation_id: &str) -> OwnershipState {
        let state = reconcile_ownership(
            &self.store,
            self.platform.as_ref(),
            self.config.automation_agent_id.as_deref(),
            conversation_id,
        )
        .await;
        tracing::debug!(conversation_id, state = state.as_str(), "ownership reconciled");
        state
    }
}

//! End-to-end broker scenarios driven through scripted collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;

use ombud_assistant::{AssistantBackend, AssistantError, AssistantReply};
use ombud_broker::{BrokerConfig, OwnershipState, WebhookDispatcher};
use ombud_platform::{ConversationApi, ConversationSnapshot, PlatformError};

/// Platform fake that tracks the live assignee and records every write.
#[derive(Default)]
struct RecordingPlatform {
    assignee: Mutex<Option<String>>,
    read_fails: Mutex<bool>,
    assignments: Mutex<Vec<(String, String)>>,
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingPlatform {
    fn with_assignee(agent_id: Option<&str>) -> Self {
        Self {
            assignee: Mutex::new(agent_id.map(str::to_string)),
            ..Self::default()
        }
    }

    fn set_read_fails(&self, fails: bool) {
        *self.read_fails.lock().expect("read_fails") = fails;
    }

    fn current_assignee(&self) -> Option<String> {
        self.assignee.lock().expect("assignee").clone()
    }

    fn assignments(&self) -> Vec<(String, String)> {
        self.assignments.lock().expect("assignments").clone()
    }

    fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().expect("messages").clone()
    }
}

#[async_trait]
impl ConversationApi for RecordingPlatform {
    async fn get_conversation(
        &self,
        _conversation_id: &str,
    ) -> Result<ConversationSnapshot, PlatformError> {
        if *self.read_fails.lock().expect("read_fails") {
            return Err(PlatformError::InvalidResponse(
                "control plane unreachable".to_string(),
            ));
        }
        Ok(ConversationSnapshot {
            assigned_agent_id: self.current_assignee(),
            status: None,
        })
    }

    async fn set_assignee(
        &self,
        conversation_id: &str,
        agent_id: &str,
        _status: &str,
    ) -> Result<(), PlatformError> {
        self.assignments
            .lock()
            .expect("assignments")
            .push((conversation_id.to_string(), agent_id.to_string()));
        *self.assignee.lock().expect("assignee") = Some(agent_id.to_string());
        Ok(())
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
        _sender_agent_id: &str,
    ) -> Result<(), PlatformError> {
        self.messages
            .lock()
            .expect("messages")
            .push((conversation_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Assistant fake that pops scripted replies and records observed sessions.
struct ScriptedAssistant {
    replies: AsyncMutex<VecDeque<AssistantReply>>,
    seen_sessions: Mutex<Vec<Option<String>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl ScriptedAssistant {
    fn new(replies: Vec<AssistantReply>) -> Self {
        Self {
            replies: AsyncMutex::new(VecDeque::from(replies)),
            seen_sessions: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn call_count(&self) -> usize {
        self.seen_sessions.lock().expect("seen_sessions").len()
    }

    fn seen_sessions(&self) -> Vec<Option<String>> {
        self.seen_sessions.lock().expect("seen_sessions").clone()
    }

    fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssistantBackend for ScriptedAssistant {
    async fn respond(
        &self,
        session_handle: Option<&str>,
        _user_text: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(active, Ordering::SeqCst);
        self.seen_sessions
            .lock()
            .expect("seen_sessions")
            .push(session_handle.map(str::to_string));
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.replies.lock().await.pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.ok_or_else(|| {
            AssistantError::InvalidResponse("scripted reply queue exhausted".to_string())
        })
    }
}

fn reply(text: &str, session: &str) -> AssistantReply {
    AssistantReply {
        text: text.to_string(),
        session_handle: session.to_string(),
    }
}

fn broker_config() -> BrokerConfig {
    BrokerConfig {
        automation_agent_id: Some("agent-bot".to_string()),
        human_agent_id: Some("agent-human".to_string()),
        ..BrokerConfig::default()
    }
}

fn dispatcher(
    platform: &Arc<RecordingPlatform>,
    assistant: &Arc<ScriptedAssistant>,
) -> WebhookDispatcher {
    WebhookDispatcher::new(
        broker_config(),
        Arc::clone(platform) as Arc<dyn ConversationApi>,
        Arc::clone(assistant) as Arc<dyn AssistantBackend>,
    )
    .expect("dispatcher")
}

fn end_user_message(conversation_id: &str, text: &str) -> serde_json::Value {
    json!({
        "action": "message_create",
        "actor": {"actor_type": "user", "actor_id": "user-1"},
        "data": {"message": {
            "conversation_id": conversation_id,
            "message_parts": [{"text": {"content": text}}],
        }},
    })
}

fn agent_message(conversation_id: &str, agent_id: &str, text: &str) -> serde_json::Value {
    json!({
        "action": "message_create",
        "actor": {"actor_type": "agent", "actor_id": agent_id},
        "data": {"message": {
            "conversation_id": conversation_id,
            "message_parts": [{"text": {"content": text}}],
        }},
    })
}

// Fresh conversation: automation keeps ownership, claims the unassigned
// conversation, and replies without escalating.
#[tokio::test]
async fn fresh_conversation_gets_automated_reply() {
    let platform = Arc::new(RecordingPlatform::with_assignee(None));
    let assistant = Arc::new(ScriptedAssistant::new(vec![reply(
        "Hi! How can I help?",
        "sess-a",
    )]));
    let dispatcher = dispatcher(&platform, &assistant);

    dispatcher.dispatch(&end_user_message("conv-a", "Hello")).await;

    let record = dispatcher.store().record("conv-a");
    assert_eq!(record.state, OwnershipState::WithAutomation);
    assert_eq!(record.session_handle.as_deref(), Some("sess-a"));
    assert_eq!(
        platform.assignments(),
        vec![("conv-a".to_string(), "agent-bot".to_string())]
    );
    assert_eq!(
        platform.messages(),
        vec![("conv-a".to_string(), "Hi! How can I help?".to_string())]
    );
}

// A generated reply that asks for a human is sent first, then the
// conversation escalates: human assignee, human state, no session handle.
#[tokio::test]
async fn handoff_phrase_in_reply_escalates_after_send() {
    let platform = Arc::new(RecordingPlatform::with_assignee(None));
    let assistant = Arc::new(ScriptedAssistant::new(vec![reply(
        "Let me connect you to our Human Representative.",
        "sess-b",
    )]));
    let dispatcher = dispatcher(&platform, &assistant);

    dispatcher.dispatch(&end_user_message("conv-b", "I want to cancel")).await;

    assert_eq!(platform.messages().len(), 1);
    assert_eq!(platform.current_assignee().as_deref(), Some("agent-human"));
    let record = dispatcher.store().record("conv-b");
    assert_eq!(record.state, OwnershipState::WithHuman);
    assert_eq!(record.session_handle, None);
}

// A human agent closing the conversation hands it back: reassignment to the
// bot, welcome message, local state with automation.
#[tokio::test]
async fn resolution_message_returns_conversation_with_welcome() {
    let platform = Arc::new(RecordingPlatform::with_assignee(Some("agent-human")));
    let assistant = Arc::new(ScriptedAssistant::new(Vec::new()));
    let dispatcher = dispatcher(&platform, &assistant);
    dispatcher.store().set_state("conv-c", OwnershipState::WithHuman);

    dispatcher
        .dispatch(&agent_message("conv-c", "agent-human", "Closing this conversation, thanks!"))
        .await;

    assert_eq!(
        dispatcher.store().record("conv-c").state,
        OwnershipState::WithAutomation
    );
    assert_eq!(platform.current_assignee().as_deref(), Some("agent-bot"));
    let messages = platform.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains("automated assistant"));
    assert_eq!(assistant.call_count(), 0);
}

// Media-only messages get the fixed acknowledgment and never reach the
// generative backend.
#[tokio::test]
async fn media_only_message_acknowledged_without_generation() {
    let platform = Arc::new(RecordingPlatform::with_assignee(None));
    let assistant = Arc::new(ScriptedAssistant::new(Vec::new()));
    let dispatcher = dispatcher(&platform, &assistant);

    let payload = json!({
        "action": "message_create",
        "actor": {"actor_type": "user", "actor_id": "user-1"},
        "data": {"message": {
            "conversation_id": "conv-d",
            "message_parts": [{"image": {"url": "https://cdn.example/photo.jpg"}}],
        }},
    });
    dispatcher.dispatch(&payload).await;

    assert_eq!(assistant.call_count(), 0);
    let messages = platform.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains("describe the issue"));
    assert_eq!(platform.current_assignee().as_deref(), Some("agent-bot"));
}

// Fail-open: an unreachable control plane must not drop the conversation;
// the generative call still happens. Deliberate availability bias.
#[tokio::test]
async fn unreachable_control_plane_fails_open_and_replies() {
    let platform = Arc::new(RecordingPlatform::with_assignee(None));
    platform.set_read_fails(true);
    let assistant = Arc::new(ScriptedAssistant::new(vec![reply(
        "Here is what I found.",
        "sess-e",
    )]));
    let dispatcher = dispatcher(&platform, &assistant);

    dispatcher.dispatch(&end_user_message("conv-e", "Where is my order?")).await;

    assert_eq!(assistant.call_count(), 1);
    assert_eq!(platform.messages().len(), 1);
    // No claim happened: the assignee read is down for auto-claim too.
    assert!(platform.assignments().is_empty());
}

// Reopen: human resolved the conversation (assignee cleared on the
// platform), then the end-user writes again; automation answers with a
// fresh session.
#[tokio::test]
async fn cleared_assignee_reopens_conversation_to_automation() {
    let platform = Arc::new(RecordingPlatform::with_assignee(None));
    let assistant = Arc::new(ScriptedAssistant::new(vec![reply(
        "Welcome back! How can I help?",
        "sess-f2",
    )]));
    let dispatcher = dispatcher(&platform, &assistant);
    // Stale local state from an earlier escalation.
    dispatcher.store().set_state("conv-f", OwnershipState::WithHuman);
    dispatcher
        .store()
        .set_session_handle("conv-f", Some("sess-f1".to_string()));

    dispatcher.dispatch(&end_user_message("conv-f", "hello again")).await;

    let record = dispatcher.store().record("conv-f");
    assert_eq!(record.state, OwnershipState::WithAutomation);
    assert_eq!(record.session_handle.as_deref(), Some("sess-f2"));
    assert_eq!(platform.messages().len(), 1);
    // The reopened conversation starts a fresh assistant session.
    assert_eq!(assistant.seen_sessions(), vec![None]);
}

// Two deliveries for the same conversation must serialize: the second
// respond observes the first one's session handle, and the backend never
// sees overlapping calls for the conversation.
#[tokio::test]
async fn concurrent_respond_pipelines_serialize_per_conversation() {
    let platform = Arc::new(RecordingPlatform::with_assignee(None));
    let assistant = Arc::new(
        ScriptedAssistant::new(vec![reply("first", "sess-1"), reply("second", "sess-2")])
            .with_delay(Duration::from_millis(50)),
    );
    let dispatcher = Arc::new(dispatcher(&platform, &assistant));

    let first = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher.dispatch(&end_user_message("conv-g", "one")).await;
        })
    };
    let second = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher.dispatch(&end_user_message("conv-g", "two")).await;
        })
    };
    first.await.expect("first task");
    second.await.expect("second task");

    assert_eq!(assistant.call_count(), 2);
    assert_eq!(assistant.max_concurrency(), 1);
    let sessions = assistant.seen_sessions();
    assert_eq!(sessions[0], None);
    // Whichever call went second saw the handle stored by the first.
    assert_eq!(sessions[1].as_deref(), Some("sess-1"));
    assert_eq!(
        dispatcher.store().record("conv-g").session_handle.as_deref(),
        Some("sess-2")
    );
}

// Duplicate escalation-triggering replies converge on the same end state.
#[tokio::test]
async fn duplicate_deliveries_do_not_corrupt_ownership() {
    let platform = Arc::new(RecordingPlatform::with_assignee(None));
    let assistant = Arc::new(ScriptedAssistant::new(vec![
        reply("please talk to a real person", "sess-h1"),
        reply("please talk to a real person", "sess-h2"),
    ]));
    let dispatcher = dispatcher(&platform, &assistant);

    let payload = end_user_message("conv-h", "help");
    dispatcher.dispatch(&payload).await;
    let state_after_first = dispatcher.store().record("conv-h").state;
    dispatcher.dispatch(&payload).await;

    assert_eq!(state_after_first, OwnershipState::WithHuman);
    let record = dispatcher.store().record("conv-h");
    assert_eq!(record.state, OwnershipState::WithHuman);
    assert_eq!(record.session_handle, None);
    // The duplicate was dropped at reconciliation: one generative call only.
    assert_eq!(assistant.call_count(), 1);
}

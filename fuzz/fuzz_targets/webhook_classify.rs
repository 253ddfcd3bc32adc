#![no_main]

use libfuzzer_sys::fuzz_target;
use ombud_event::{classify, ActionKind, ActorKind};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(payload) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return;
    };

    // Classification is total over arbitrary JSON and never panics.
    let event = classify(&payload);

    if event.action == ActionKind::Unclassified {
        assert_eq!(event.conversation_id, None);
        assert_eq!(event.text, None);
        assert!(event.media.is_empty());
    }
    if let Some(text) = &event.text {
        assert!(!text.is_empty());
    }
    if event.actor_agent_id.is_some() {
        assert_eq!(event.actor, ActorKind::Agent);
    }
    if event.new_assignee_agent_id.is_some() || event.old_assignee_agent_id.is_some() {
        assert_eq!(event.action, ActionKind::AssignmentChange);
    }
});

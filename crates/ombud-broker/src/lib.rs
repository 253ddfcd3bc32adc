//! Conversation-ownership state machine and webhook dispatch.
//!
//! This crate decides, for every inbound platform event, whether the
//! automated assistant may respond, whether a hand-off to a human agent must
//! happen, and whether a conversation previously handed to a human should
//! return to automation. The local ownership record is a cache; the assignee
//! on the platform's conversation resource is authoritative, so every respond
//! attempt reconciles against a fresh platform read before acting. All
//! transitions are idempotent because webhook delivery is at-least-once and
//! unordered.

mod config;
mod detect;
mod dispatch;
mod reconcile;
mod store;
mod transition;

pub use config::BrokerConfig;
pub use detect::HandoffDetector;
pub use dispatch::WebhookDispatcher;
pub use reconcile::reconcile_ownership;
pub use store::{OwnershipRecord, OwnershipSnapshotEntry, OwnershipState, OwnershipStore};
pub use transition::{auto_claim, deescalate, escalate};

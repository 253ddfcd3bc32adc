//! Canonical webhook event model and classification for ombud.
//!
//! The chat platform delivers the same semantic fields at different payload
//! paths depending on event origin (assignment UI, API, bulk change-log).
//! Classification normalizes every raw body into one canonical shape and is
//! total: malformed or unknown payloads classify as `Unclassified` instead of
//! failing.

mod classify;
mod event;

pub use classify::classify;
pub use event::{ActionKind, ActorKind, CanonicalEvent, MediaKind};

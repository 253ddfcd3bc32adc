//! Chat-platform conversation API client.
//!
//! The conversation resource on the platform is the source of truth for who
//! owns a conversation. This crate exposes the narrow contract the broker
//! needs (read assignee, write assignee, post a message) behind the
//! `ConversationApi` trait, plus the reqwest-backed HTTP implementation.
//! Timeouts and transport errors surface uniformly as `PlatformError`; the
//! broker treats them all as "could not confirm/mutate".

mod http_client;
mod types;

pub use http_client::HttpConversationApi;
pub use types::{ConversationApi, ConversationSnapshot, PlatformError};

//! Generative-response backend client and outbound reply rendering.
//!
//! The backend produces reply text plus an opaque session handle scoped to
//! one conversation. Answers may be returned inline or queued; queued
//! answers are polled under a bounded attempt budget so a stalled backend
//! fails the respond attempt instead of hanging it.

mod http_backend;
mod render;
mod types;

pub use http_backend::HttpAssistantBackend;
pub use render::clean_reply;
pub use types::{AssistantBackend, AssistantError, AssistantReply};

//! Inbound webhook boundary for the ombud broker.
//!
//! The platform requires an immediate acknowledgment on every webhook
//! delivery, so the endpoint acks with a fixed body and finishes processing
//! on a spawned task. Health and ownership-snapshot endpoints ride along for
//! operations.

pub mod cli;
pub mod server;

pub use cli::GatewayArgs;
pub use server::{build_gateway_router, run_gateway_server, GatewayServerState};

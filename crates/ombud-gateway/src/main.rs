use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ombud_assistant::HttpAssistantBackend;
use ombud_broker::WebhookDispatcher;
use ombud_gateway::server::{run_gateway_server, GatewayServerState};
use ombud_gateway::GatewayArgs;
use ombud_platform::HttpConversationApi;

#[tokio::main]
async fn main() -> Result<()> {
    let args = GatewayArgs::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let platform = Arc::new(HttpConversationApi::new(
        &args.platform_api_base,
        &args.platform_api_token,
        args.request_timeout_ms,
    )?);
    let assistant = Arc::new(HttpAssistantBackend::new(
        &args.assistant_api_base,
        args.request_timeout_ms,
        args.assistant_poll_interval_ms,
        args.assistant_poll_max_attempts,
    )?);
    let dispatcher = Arc::new(WebhookDispatcher::new(
        args.broker_config(),
        platform,
        assistant,
    )?);

    let state = Arc::new(GatewayServerState::new(dispatcher));
    run_gateway_server(&args.bind, state).await
}

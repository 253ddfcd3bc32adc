//! Gateway command-line and environment configuration.

use clap::Parser;

use ombud_broker::BrokerConfig;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "ombud-gateway",
    about = "Brokers support conversations between an automated assistant and human agents",
    version
)]
pub struct GatewayArgs {
    /// Socket address the webhook server binds to.
    #[arg(long, env = "OMBUD_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Base URL of the chat platform's conversation API.
    #[arg(long, env = "OMBUD_PLATFORM_API_BASE")]
    pub platform_api_base: String,

    /// Bearer token for the conversation API.
    #[arg(long, env = "OMBUD_PLATFORM_API_TOKEN")]
    pub platform_api_token: String,

    /// Base URL of the generative-response backend.
    #[arg(long, env = "OMBUD_ASSISTANT_API_BASE")]
    pub assistant_api_base: String,

    /// Agent id the platform uses for the bot. Without it the broker cannot
    /// auto-claim or self-resolve ownership.
    #[arg(long, env = "OMBUD_AUTOMATION_AGENT_ID")]
    pub automation_agent_id: Option<String>,

    /// Fallback human agent (or queue) id. Without it escalation is skipped.
    #[arg(long, env = "OMBUD_HUMAN_AGENT_ID")]
    pub human_agent_id: Option<String>,

    /// Timeout applied to every outbound HTTP call.
    #[arg(
        long,
        env = "OMBUD_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64
    )]
    pub request_timeout_ms: u64,

    /// Delay between polls while waiting for a queued assistant answer.
    #[arg(
        long,
        env = "OMBUD_ASSISTANT_POLL_INTERVAL_MS",
        default_value_t = 1_000,
        value_parser = parse_positive_u64
    )]
    pub assistant_poll_interval_ms: u64,

    /// Poll attempts before a queued assistant answer counts as timed out.
    #[arg(
        long,
        env = "OMBUD_ASSISTANT_POLL_MAX_ATTEMPTS",
        default_value_t = 30,
        value_parser = parse_positive_usize
    )]
    pub assistant_poll_max_attempts: usize,

    /// Comma-separated phrases that make a generated reply escalate.
    /// Empty keeps the built-in list.
    #[arg(long, env = "OMBUD_ESCALATION_PHRASES", value_delimiter = ',')]
    pub escalation_phrases: Vec<String>,

    /// Comma-separated phrases that make a human agent's reply hand the
    /// conversation back to the bot. Empty keeps the built-in list.
    #[arg(long, env = "OMBUD_RESOLUTION_PHRASES", value_delimiter = ',')]
    pub resolution_phrases: Vec<String>,

    /// Message posted when a conversation returns to automation.
    #[arg(long, env = "OMBUD_WELCOME_MESSAGE")]
    pub welcome_message: Option<String>,

    /// Acknowledgment posted for media-only messages.
    #[arg(long, env = "OMBUD_MEDIA_ACK_MESSAGE")]
    pub media_ack_message: Option<String>,
}

impl GatewayArgs {
    pub fn broker_config(&self) -> BrokerConfig {
        let mut config = BrokerConfig {
            automation_agent_id: normalized(&self.automation_agent_id),
            human_agent_id: normalized(&self.human_agent_id),
            ..BrokerConfig::default()
        };
        if !self.escalation_phrases.is_empty() {
            config.escalation_phrases = trimmed_phrases(&self.escalation_phrases);
        }
        if !self.resolution_phrases.is_empty() {
            config.resolution_phrases = trimmed_phrases(&self.resolution_phrases);
        }
        if let Some(welcome) = normalized(&self.welcome_message) {
            config.welcome_message = welcome;
        }
        if let Some(media_ack) = normalized(&self.media_ack_message) {
            config.media_ack_message = media_ack;
        }
        config
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

fn trimmed_phrases(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|phrase| phrase.trim().to_string())
        .filter(|phrase| !phrase.is_empty())
        .collect()
}

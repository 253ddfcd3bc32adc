//! HTTP implementation of the conversation API contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{ConversationApi, ConversationSnapshot, PlatformError};

const ERROR_BODY_MAX_CHARS: usize = 600;

#[derive(Debug, Clone, Deserialize)]
struct ConversationResource {
    #[serde(default)]
    assigned_agent_id: Option<Value>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Clone)]
/// Conversation API client backed by the platform's REST surface.
pub struct HttpConversationApi {
    http: reqwest::Client,
    api_base: String,
    api_token: String,
}

impl HttpConversationApi {
    pub fn new(
        api_base: &str,
        api_token: &str,
        request_timeout_ms: u64,
    ) -> Result<Self, PlatformError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("ombud-gateway"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_token: api_token.trim().to_string(),
        })
    }

    fn conversation_url(&self, conversation_id: &str) -> String {
        format!("{}/v2/conversations/{conversation_id}", self.api_base)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::HttpStatus {
            status: status.as_u16(),
            body: truncate_for_error(&body),
        })
    }
}

#[async_trait]
impl ConversationApi for HttpConversationApi {
    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSnapshot, PlatformError> {
        let response = self
            .http
            .get(self.conversation_url(conversation_id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let resource: ConversationResource = response.json().await?;
        Ok(ConversationSnapshot {
            assigned_agent_id: agent_id_string(resource.assigned_agent_id),
            status: resource.status,
        })
    }

    async fn set_assignee(
        &self,
        conversation_id: &str,
        agent_id: &str,
        status: &str,
    ) -> Result<(), PlatformError> {
        let response = self
            .http
            .put(self.conversation_url(conversation_id))
            .bearer_auth(&self.api_token)
            .json(&json!({
                "assigned_agent_id": agent_id,
                "status": status,
            }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
        sender_agent_id: &str,
    ) -> Result<(), PlatformError> {
        let url = format!("{}/messages", self.conversation_url(conversation_id));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "message_parts": [{"text": {"content": text}}],
                "actor_type": "agent",
                "actor_id": sender_agent_id,
            }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// The platform serializes agent ids as strings or numbers depending on the
/// API version that produced the record.
fn agent_id_string(raw: Option<Value>) -> Option<String> {
    match raw? {
        Value::String(value) => {
            let trimmed = value.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn truncate_for_error(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_MAX_CHARS {
        return body.to_string();
    }
    let truncated: String = body.chars().take(ERROR_BODY_MAX_CHARS).collect();
    format!("{truncated}…")
}

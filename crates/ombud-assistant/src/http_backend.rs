//! HTTP implementation of the generative-response contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::types::{AssistantBackend, AssistantError, AssistantReply};

const ERROR_BODY_MAX_CHARS: usize = 600;

#[derive(Debug, Clone, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Clone)]
/// Backend client that submits a query and polls for the queued answer.
pub struct HttpAssistantBackend {
    http: reqwest::Client,
    api_base: String,
    poll_interval: Duration,
    poll_max_attempts: usize,
}

impl HttpAssistantBackend {
    pub fn new(
        api_base: &str,
        request_timeout_ms: u64,
        poll_interval_ms: u64,
        poll_max_attempts: usize,
    ) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
            poll_max_attempts: poll_max_attempts.max(1),
        })
    }

    async fn submit_query(
        &self,
        session_handle: Option<&str>,
        user_text: &str,
    ) -> Result<(u16, QueryResponse), AssistantError> {
        let mut body = json!({ "question": user_text });
        if let Some(handle) = session_handle {
            body["session_id"] = json!(handle);
        }
        let response = self
            .http
            .post(format!("{}/api/v1/query", self.api_base))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::HttpStatus {
                status: status.as_u16(),
                body: truncate_for_error(&body),
            });
        }
        Ok((status.as_u16(), response.json().await?))
    }

    async fn poll_answer(
        &self,
        request_id: &str,
        fallback_session: Option<String>,
    ) -> Result<AssistantReply, AssistantError> {
        for attempt in 0..self.poll_max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.poll_interval).await;
            }
            let response = self
                .http
                .get(format!("{}/api/v1/answer/{request_id}", self.api_base))
                .send()
                .await?;
            let status = response.status();
            if status.as_u16() == 202 {
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AssistantError::HttpStatus {
                    status: status.as_u16(),
                    body: truncate_for_error(&body),
                });
            }
            let parsed: QueryResponse = response.json().await?;
            return reply_from(parsed, fallback_session);
        }
        Err(AssistantError::Timeout {
            attempts: self.poll_max_attempts,
        })
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistantBackend {
    async fn respond(
        &self,
        session_handle: Option<&str>,
        user_text: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let (status, parsed) = self.submit_query(session_handle, user_text).await?;
        if status == 202 || parsed.answer.is_none() {
            let request_id = parsed.request_id.clone().ok_or_else(|| {
                AssistantError::InvalidResponse(
                    "queued query response carried no request_id".to_string(),
                )
            })?;
            let fallback_session = parsed
                .session_id
                .or_else(|| session_handle.map(str::to_string));
            return self.poll_answer(&request_id, fallback_session).await;
        }
        reply_from(parsed, session_handle.map(str::to_string))
    }
}

fn reply_from(
    parsed: QueryResponse,
    fallback_session: Option<String>,
) -> Result<AssistantReply, AssistantError> {
    let text = parsed
        .answer
        .ok_or_else(|| AssistantError::InvalidResponse("answer missing from response".to_string()))?;
    let session_handle = parsed
        .session_id
        .or(fallback_session)
        .ok_or_else(|| AssistantError::InvalidResponse("session_id missing from response".to_string()))?;
    Ok(AssistantReply {
        text,
        session_handle,
    })
}

fn truncate_for_error(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_MAX_CHARS {
        return body.to_string();
    }
    let truncated: String = body.chars().take(ERROR_BODY_MAX_CHARS).collect();
    format!("{truncated}…")
}

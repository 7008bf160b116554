use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::{into_lines, sse_data, HttpClientTrait, HttpError};
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmStream, Message, ProviderKind, StreamChunk,
};

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// Model id fragments of speech models served from the same listing
const NON_CHAT_MARKERS: [&str; 2] = ["whisper", "tts"];

/// Groq API provider (OpenAI-compatible wire format)
pub struct GroqProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> std::fmt::Debug for GroqProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClientTrait> GroqProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GROQ_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
        }
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<GroqMessage> = request.messages.iter().map(GroqMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": true,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    async fn fetch_models(&self) -> Result<Vec<GroqModel>, DomainError> {
        let json = self
            .client
            .get_json(&self.models_url(), self.headers())
            .await
            .map_err(map_error)?;

        let list: GroqModelList = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("groq", format!("Failed to parse model list: {e}"))
        })?;

        Ok(list.data)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for GroqProvider<C> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    async fn list_models(&self) -> Result<Vec<String>, DomainError> {
        let models: Vec<String> = self
            .fetch_models()
            .await?
            .into_iter()
            .filter(GroqModel::is_chat_model)
            .map(|m| m.id)
            .collect();

        if models.is_empty() {
            return Err(DomainError::provider("groq", "No chat models offered"));
        }

        debug!(count = models.len(), "Discovered Groq models");
        Ok(models)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.fetch_models().await.map(|_| ())
    }

    async fn chat_stream(
        &self,
        model: &str,
        request: LlmRequest,
    ) -> Result<LlmStream, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, &request);
        let bytes = self
            .client
            .post_json_stream(&url, self.headers(), &body)
            .await
            .map_err(map_error)?;

        let model = model.to_string();
        let stream = into_lines(bytes).filter_map(move |line| {
            let model = model.clone();
            async move {
                match line {
                    Ok(line) => parse_sse_line(&line, &model),
                    Err(e) => Some(Err(map_error(e))),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

fn map_error(error: HttpError) -> DomainError {
    error.into_domain("groq")
}

fn parse_sse_line(line: &str, model: &str) -> Option<Result<StreamChunk, DomainError>> {
    let data = sse_data(line)?;
    if data.is_empty() {
        return None;
    }

    if data == "[DONE]" {
        return Some(Ok(StreamChunk::new(model).with_finish_reason(FinishReason::Stop)));
    }

    let chunk: GroqStreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(DomainError::provider(
                "groq",
                format!("Malformed stream event: {e}"),
            )));
        }
    };

    if let Some(error) = chunk.error {
        return Some(Err(DomainError::provider("groq", error.message)));
    }

    // finish_reason arrives one event before [DONE]; [DONE] ends the stream
    let delta = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|d| !d.is_empty())?;

    Some(Ok(StreamChunk::new(chunk.model.unwrap_or_else(|| model.to_string())).with_delta(delta)))
}

// Groq API types

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: &'static str,
    content: String,
}

impl GroqMessage {
    fn from_domain(message: &Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroqModelList {
    #[serde(default)]
    data: Vec<GroqModel>,
}

#[derive(Debug, Deserialize)]
struct GroqModel {
    id: String,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl GroqModel {
    fn is_chat_model(&self) -> bool {
        let id = self.id.to_ascii_lowercase();
        self.active && !NON_CHAT_MARKERS.iter().any(|m| id.contains(m))
    }
}

#[derive(Debug, Deserialize)]
struct GroqStreamChunk {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<GroqStreamChoice>,
    error: Option<GroqError>,
}

#[derive(Debug, Deserialize)]
struct GroqStreamChoice {
    delta: GroqDelta,
}

#[derive(Debug, Deserialize)]
struct GroqDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    message: String,
}

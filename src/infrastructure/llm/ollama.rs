use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::{into_lines, HttpClientTrait, HttpError};
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmStream, Message, ProviderKind,
    StreamChunk,
};

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Provider for a locally running Ollama daemon
#[derive(Debug)]
pub struct OllamaProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> OllamaProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![("Content-Type", "application/json")]
    }

    fn map_error(&self, error: HttpError) -> DomainError {
        map_error(&self.base_url, error)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<OllamaMessage> =
            request.messages.iter().map(OllamaMessage::from_domain).collect();

        let mut options = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            options.insert("temperature".into(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = request.max_tokens {
            options.insert("num_predict".into(), serde_json::json!(max_tokens));
        }

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": true,
        });

        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OllamaProvider<C> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    /// Installed models by full `name:tag`, in daemon order
    async fn list_models(&self) -> Result<Vec<String>, DomainError> {
        let json = self
            .client
            .get_json(&self.url("/api/tags"), self.headers())
            .await
            .map_err(|e| self.map_error(e))?;

        let tags: OllamaTags = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("ollama", format!("Failed to parse model list: {e}"))
        })?;

        let mut models: Vec<String> = Vec::new();
        for entry in tags.models {
            let name = entry.name().trim();
            if !name.is_empty() && !models.iter().any(|m| m == name) {
                models.push(name.to_string());
            }
        }

        if models.is_empty() {
            return Err(DomainError::NoModelsInstalled);
        }

        debug!(count = models.len(), endpoint = %self.base_url, "Discovered Ollama models");
        Ok(models)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.client
            .get_json(&self.url("/api/version"), self.headers())
            .await
            .map(|_| ())
            .map_err(|e| self.map_error(e))
    }

    async fn chat_stream(
        &self,
        model: &str,
        request: LlmRequest,
    ) -> Result<LlmStream, DomainError> {
        let body = self.build_request(model, &request);
        let bytes = self
            .client
            .post_json_stream(&self.url("/api/chat"), self.headers(), &body)
            .await
            .map_err(|e| self.map_error(e))?;

        let model = model.to_string();
        let endpoint = self.base_url.clone();
        let stream = into_lines(bytes).filter_map(move |line| {
            let model = model.clone();
            let endpoint = endpoint.clone();
            async move {
                match line {
                    Ok(line) => parse_ndjson_line(&line, &model),
                    Err(e) => Some(Err(map_error(&endpoint, e))),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

fn map_error(endpoint: &str, error: HttpError) -> DomainError {
    if error.is_unreachable() {
        return DomainError::daemon_unreachable(endpoint, error.to_string());
    }

    match error {
        HttpError::Status { body, .. } => {
            let message = serde_json::from_str::<OllamaError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            DomainError::provider("ollama", message)
        }
        other => DomainError::provider("ollama", other.to_string()),
    }
}

fn parse_ndjson_line(line: &str, model: &str) -> Option<Result<StreamChunk, DomainError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let chunk: OllamaChatChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(DomainError::provider(
                "ollama",
                format!("Malformed stream line: {e}"),
            )));
        }
    };

    if let Some(error) = chunk.error {
        return Some(Err(DomainError::provider("ollama", error)));
    }

    let mut out = StreamChunk::new(chunk.model.unwrap_or_else(|| model.to_string()));
    if let Some(content) = chunk.message.map(|m| m.content).filter(|c| !c.is_empty()) {
        out = out.with_delta(content);
    }
    if chunk.done {
        let reason = chunk.done_reason.as_deref().unwrap_or("stop");
        out = out.with_finish_reason(FinishReason::parse(reason));
    }

    if out.delta.is_none() && !out.is_final() {
        return None;
    }
    Some(Ok(out))
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

impl OllamaMessage {
    fn from_domain(message: &Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    #[serde(default)]
    name: String,
    #[serde(default)]
    model: String,
}

impl OllamaTag {
    fn name(&self) -> &str {
        if self.name.is_empty() {
            &self.model
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    model: Option<String>,
    message: Option<OllamaResponseMessage>,
    #[serde(default)]
    done: bool,
    done_reason: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

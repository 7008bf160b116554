use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::{into_lines, sse_data, HttpClientTrait, HttpError};
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmStream, MessageRole, ProviderKind,
    StreamChunk,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Upper bound on listing pages followed through `nextPageToken`
const MAX_MODEL_PAGES: usize = 10;

/// Google Gemini API provider
pub struct GeminiProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> std::fmt::Debug for GeminiProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClientTrait> GeminiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn models_url(&self, page_size: u32, page_token: Option<&str>) -> Result<String, DomainError> {
        let mut url = reqwest::Url::parse(&format!("{}/v1beta/models", self.base_url)).map_err(|e| {
            DomainError::configuration(format!("Invalid Gemini base URL '{}': {e}", self.base_url))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        Ok(url.into())
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    async fn fetch_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<GeminiModelList, DomainError> {
        let json = self
            .client
            .get_json(&self.models_url(page_size, page_token)?, self.headers())
            .await
            .map_err(map_error)?;

        serde_json::from_value(json).map_err(|e| {
            DomainError::provider("gemini", format!("Failed to parse model list: {e}"))
        })
    }

    fn build_request(&self, request: &LlmRequest) -> serde_json::Value {
        let contents: Vec<GeminiContent> = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| GeminiContent {
                role: match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                },
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        let mut body = serde_json::json!({ "contents": contents });

        if let Some(system) = request.system_text() {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            generation_config.insert("temperature".into(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = request.max_tokens {
            generation_config.insert("maxOutputTokens".into(), serde_json::json!(max_tokens));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation_config);
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for GeminiProvider<C> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn list_models(&self) -> Result<Vec<String>, DomainError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let page = self.fetch_page(1000, page_token.as_deref()).await?;

            models.extend(
                page.models
                    .into_iter()
                    .filter(|m| m.supports_generation())
                    .map(|m| m.id().to_string()),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if models.is_empty() {
            return Err(DomainError::provider(
                "gemini",
                "No models support generateContent",
            ));
        }

        debug!(count = models.len(), "Discovered Gemini models");
        Ok(models)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.fetch_page(1, None).await.map(|_| ())
    }

    async fn chat_stream(
        &self,
        model: &str,
        request: LlmRequest,
    ) -> Result<LlmStream, DomainError> {
        let url = self.stream_url(model);
        let body = self.build_request(&request);
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
                    Ok(line) => parse_stream_line(&line, &model),
                    Err(e) => Some(Err(map_error(e))),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

/// Gemini reports a bad key as a 400 with `API_KEY_INVALID`
fn map_error(error: HttpError) -> DomainError {
    match &error {
        HttpError::Status { status: 400, body }
            if body.contains("API_KEY_INVALID") || body.contains("API key not valid") =>
        {
            DomainError::auth("gemini", "API key rejected")
        }
        _ => error.into_domain("gemini"),
    }
}

fn parse_stream_line(line: &str, model: &str) -> Option<Result<StreamChunk, DomainError>> {
    let data = sse_data(line)?;
    if data.is_empty() {
        return None;
    }

    let chunk: GeminiStreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(DomainError::provider(
                "gemini",
                format!("Malformed stream event: {e}"),
            )));
        }
    };

    if let Some(error) = chunk.error {
        return Some(Err(DomainError::provider("gemini", error.message)));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        // A prompt blocked before generation has feedback and no candidates
        return chunk
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|reason| {
                Ok(StreamChunk::new(model).with_finish_reason(FinishReason::parse(&reason)))
            });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let mut out = StreamChunk::new(model);
    if !text.is_empty() {
        out = out.with_delta(text);
    }
    if let Some(reason) = candidate.finish_reason {
        out = out.with_finish_reason(FinishReason::parse(&reason));
    }

    if out.delta.is_none() && !out.is_final() {
        return None;
    }
    Some(Ok(out))
}

// Gemini API types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl GeminiModel {
    fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }

    fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

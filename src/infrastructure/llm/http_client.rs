use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use crate::domain::DomainError;

/// Stream type for HTTP responses
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Response body split into lines (SSE and NDJSON framing)
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, HttpError>> + Send>>;

/// Transport-level failure, before any provider-specific interpretation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Body(String),
}

impl HttpError {
    /// The remote end could not be reached or did not answer in time
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout | Self::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Default mapping shared by the hosted providers
    pub fn into_domain(self, provider: &str) -> DomainError {
        match self.status() {
            Some(401 | 403) => DomainError::auth(provider, self.to_string()),
            Some(429 | 500..=599) => DomainError::provider_unavailable(provider, self.to_string()),
            _ if self.is_unreachable() => {
                DomainError::provider_unavailable(provider, self.to_string())
            }
            _ => DomainError::provider(provider, self.to_string()),
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_decode() || error.is_body() {
            Self::Body(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn get_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
    ) -> Result<serde_json::Value, HttpError>;

    async fn post_json_stream(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<ByteStream, HttpError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            request_timeout: None,
        }
    }

    /// Client whose JSON requests must finish within `timeout`.
    ///
    /// Streaming responses have no overall deadline; they fail only when the
    /// server goes quiet for longer than `timeout` between reads.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .read_timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            request_timeout: Some(timeout),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(HttpError::Status { status, body })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
    ) -> Result<serde_json::Value, HttpError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(HttpError::from_reqwest)?;
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| HttpError::Body(e.to_string()))
    }

    async fn post_json_stream(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<ByteStream, HttpError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(HttpError::from_reqwest)?;
        let response = Self::check_status(response).await?;

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(HttpError::from_reqwest));

        Ok(Box::pin(stream))
    }
}

/// Re-frame a byte stream into lines. Lines may span network chunks; a
/// trailing `\r` is dropped and a final unterminated line is still yielded.
pub fn into_lines(bytes: ByteStream) -> LineStream {
    let state = (bytes, Vec::<u8>::new(), false);

    Box::pin(stream::unfold(state, |(mut bytes, mut buf, mut done)| async move {
        loop {
            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                let line = String::from_utf8_lossy(&line).into_owned();
                return Some((Ok(line), (bytes, buf, done)));
            }

            if done {
                if buf.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                return Some((Ok(line), (bytes, buf, done)));
            }

            match bytes.next().await {
                Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    buf.clear();
                    return Some((Err(e), (bytes, buf, true)));
                }
                None => done = true,
            }
        }
    }))
}

/// Payload of an SSE `data:` line, if the line is one
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, RwLock};

    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, serde_json::Value>>,
        stream_responses: RwLock<HashMap<String, Vec<Result<Bytes, HttpError>>>>,
        errors: RwLock<HashMap<String, HttpError>>,
        requests: Mutex<Vec<(String, Option<serde_json::Value>)>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.responses.write().unwrap().insert(url.into(), response);
            self
        }

        pub fn with_stream_response(self, url: impl Into<String>, chunks: Vec<&str>) -> Self {
            let chunks = chunks
                .into_iter()
                .map(|c| Ok(Bytes::from(c.to_string())))
                .collect();
            self.stream_responses
                .write()
                .unwrap()
                .insert(url.into(), chunks);
            self
        }

        pub fn with_stream_items(
            self,
            url: impl Into<String>,
            items: Vec<Result<Bytes, HttpError>>,
        ) -> Self {
            self.stream_responses.write().unwrap().insert(url.into(), items);
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: HttpError) -> Self {
            self.errors.write().unwrap().insert(url.into(), error);
            self
        }

        /// URLs and JSON bodies seen so far, in call order
        pub fn requests(&self) -> Vec<(String, Option<serde_json::Value>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn get_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
        ) -> Result<serde_json::Value, HttpError> {
            self.requests.lock().unwrap().push((url.to_string(), None));

            if let Some(error) = self.errors.read().unwrap().get(url) {
                return Err(error.clone());
            }

            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| HttpError::Status {
                    status: 404,
                    body: format!("No mock response for {url}"),
                })
        }

        async fn post_json_stream(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<ByteStream, HttpError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), Some(body.clone())));

            if let Some(error) = self.errors.read().unwrap().get(url) {
                return Err(error.clone());
            }

            let chunks = self
                .stream_responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_default();

            Ok(Box::pin(stream::iter(chunks)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn byte_stream(parts: Vec<Result<&'static str, HttpError>>) -> ByteStream {
        Box::pin(stream::iter(
            parts
                .into_iter()
                .map(|p| p.map(|s| Bytes::from_static(s.as_bytes()))),
        ))
    }

    #[tokio::test]
    async fn test_lines_span_chunk_boundaries() {
        let bytes = byte_stream(vec![Ok("data: {\"a\""), Ok(":1}\r\n\nda"), Ok("ta: [DONE]")]);

        let lines: Vec<String> = into_lines(bytes)
            .map(|l| l.unwrap())
            .collect()
            .await;

        assert_eq!(lines, vec!["data: {\"a\":1}", "", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_lines_stop_after_error() {
        let bytes = byte_stream(vec![
            Ok("one\ntw"),
            Err(HttpError::Transport("reset".into())),
            Ok("never\n"),
        ]);

        let items: Vec<Result<String, HttpError>> = into_lines(bytes).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref(), Ok("one"));
        assert!(items[1].is_err());
    }

    #[test]
    fn test_sse_data() {
        assert_eq!(sse_data("data: {}"), Some("{}"));
        assert_eq!(sse_data("data:{}"), Some("{}"));
        assert_eq!(sse_data(": keep-alive"), None);
    }

    #[test]
    fn test_default_error_mapping() {
        let auth = HttpError::Status {
            status: 401,
            body: "invalid api key".into(),
        };
        assert!(matches!(auth.into_domain("groq"), DomainError::Auth { .. }));

        let down = HttpError::Connect("refused".into());
        assert!(matches!(
            down.into_domain("groq"),
            DomainError::ProviderUnavailable { .. }
        ));

        let bad = HttpError::Status {
            status: 404,
            body: "model not found".into(),
        };
        assert!(matches!(bad.into_domain("groq"), DomainError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_get_json_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("Authorization", "Bearer k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/v1/models", server.uri());

        let json = assert_ok!(client.get_json(&url, vec![("Authorization", "Bearer k")]).await);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_status_error_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = HttpClient::new()
            .get_json(&server.uri(), vec![])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            HttpError::Status {
                status: 403,
                body: "forbidden".into()
            }
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let err = HttpClient::new()
            .get_json("http://127.0.0.1:1/api/tags", vec![])
            .await
            .unwrap_err();

        assert!(err.is_unreachable());
    }

    /// Serve one chunked NDJSON response, writing a line every `interval`
    async fn trickle_server(lines: usize, interval: Duration) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\ntransfer-encoding: chunked\r\n\r\n",
                )
                .await
                .unwrap();

            for i in 0..lines {
                tokio::time::sleep(interval).await;
                let line = format!("{{\"n\":{i}}}\n");
                let chunk = format!("{:x}\r\n{line}\r\n", line.len());
                if socket.write_all(chunk.as_bytes()).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });

        format!("http://{addr}/api/chat")
    }

    #[tokio::test]
    async fn test_slow_stream_outlives_timeout() {
        let url = trickle_server(5, Duration::from_millis(300)).await;
        let client = HttpClient::with_timeout(Duration::from_secs(1)).unwrap();

        let bytes = client
            .post_json_stream(&url, vec![], &serde_json::json!({"stream": true}))
            .await
            .unwrap();
        let items: Vec<Result<String, HttpError>> = into_lines(bytes).collect().await;

        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|item| item.is_ok()));
        assert_eq!(items[4].as_deref(), Ok("{\"n\":4}"));
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let url = trickle_server(2, Duration::from_millis(800)).await;
        let client = HttpClient::with_timeout(Duration::from_millis(300)).unwrap();

        let result = client
            .post_json_stream(&url, vec![], &serde_json::json!({"stream": true}))
            .await;

        let failed = match result {
            Err(_) => true,
            Ok(bytes) => into_lines(bytes).any(|item| async move { item.is_err() }).await,
        };
        assert!(failed);
    }

    #[tokio::test]
    async fn test_post_stream_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"a\":1}\n{\"b\":2}\n"))
            .mount(&server)
            .await;

        let client = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        let url = format!("{}/api/chat", server.uri());
        let bytes = client
            .post_json_stream(&url, vec![], &serde_json::json!({"stream": true}))
            .await
            .unwrap();

        let lines: Vec<String> = into_lines(bytes).map(|l| l.unwrap()).collect().await;
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}"]);
    }
}

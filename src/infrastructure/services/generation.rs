//! Token stream handed to callers of `generate`

use futures::stream::FusedStream;
use futures::{ready, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::domain::{DomainError, FinishReason, LlmStream, ProviderKind};

/// One item of a generation.
///
/// Exactly one terminal event (`End` or `Error`) is produced, after which
/// the stream yields nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Token(String),
    End(FinishReason),
    Error(DomainError),
}

/// Lazy, single-pass sequence of text increments.
///
/// Dropping it abandons the underlying connection; the backend is not told.
pub struct GenerationStream {
    provider: ProviderKind,
    inner: LlmStream,
    pending: Option<GenerationEvent>,
    finished: bool,
}

impl GenerationStream {
    pub fn new(provider: ProviderKind, inner: LlmStream) -> Self {
        Self {
            provider,
            inner,
            pending: None,
            finished: false,
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Drain the stream into the full answer text
    pub async fn collect_text(mut self) -> Result<String, DomainError> {
        let mut text = String::new();

        while let Some(event) = self.next().await {
            match event {
                GenerationEvent::Token(token) => text.push_str(&token),
                GenerationEvent::End(_) => return Ok(text),
                GenerationEvent::Error(e) => return Err(e),
            }
        }

        Ok(text)
    }

    fn finish(&mut self, event: GenerationEvent) -> Poll<Option<GenerationEvent>> {
        self.finished = true;
        Poll::Ready(Some(event))
    }
}

impl std::fmt::Debug for GenerationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationStream")
            .field("provider", &self.provider)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Stream for GenerationStream {
    type Item = GenerationEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(event) = this.pending.take() {
            return Poll::Ready(Some(event));
        }
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    let token = chunk.delta.filter(|d| !d.is_empty());

                    match (token, chunk.finish_reason) {
                        (Some(token), Some(reason)) => {
                            this.pending = Some(GenerationEvent::End(reason));
                            return this.finish(GenerationEvent::Token(token));
                        }
                        (Some(token), None) => return Poll::Ready(Some(GenerationEvent::Token(token))),
                        (None, Some(reason)) => return this.finish(GenerationEvent::End(reason)),
                        (None, None) => continue,
                    }
                }
                Some(Err(e)) => return this.finish(GenerationEvent::Error(e)),
                None => {
                    let error = DomainError::provider(
                        this.provider.name(),
                        "Stream closed before the response was complete",
                    );
                    return this.finish(GenerationEvent::Error(error));
                }
            }
        }
    }
}

impl FusedStream for GenerationStream {
    fn is_terminated(&self) -> bool {
        self.finished && self.pending.is_none()
    }
}

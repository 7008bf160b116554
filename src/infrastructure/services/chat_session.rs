//! Per-user chat session

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::generation::GenerationStream;
use super::provider_manager::ProviderManager;
use crate::domain::{Conversation, ConversationTurn, DomainError, UploadedFile};
use crate::infrastructure::ingestion::{DocumentProcessor, ProcessedDocument};

/// Everything one user works with: the loaded document, the provider
/// access and the conversation.
///
/// Sessions share nothing. Two sessions in the same process hold separate
/// credentials, catalogs and histories.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    processor: DocumentProcessor,
    providers: ProviderManager,
    document: Option<ProcessedDocument>,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(processor: DocumentProcessor, providers: ProviderManager) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "Session started");

        Self {
            id,
            created_at: Utc::now(),
            processor,
            providers,
            document: None,
            conversation: Conversation::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    pub fn providers(&self) -> &ProviderManager {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ProviderManager {
        &mut self.providers
    }

    pub fn document(&self) -> Option<&ProcessedDocument> {
        self.document.as_ref()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Process an upload and make it the session's document.
    ///
    /// A rejected upload leaves the previously loaded document in place.
    pub async fn load_document(
        &mut self,
        file: UploadedFile,
    ) -> Result<&ProcessedDocument, DomainError> {
        let document = self.processor.process_upload(file).await?;

        info!(
            session = %self.id,
            filename = document.filename().unwrap_or_default(),
            chunks = document.chunks.len(),
            "Document loaded"
        );

        Ok(self.document.insert(document))
    }

    pub fn clear_document(&mut self) {
        if self.document.take().is_some() {
            debug!(session = %self.id, "Document cleared");
        }
    }

    /// Append `question` and start streaming the answer.
    ///
    /// A previous question whose answer was never recorded is marked failed
    /// first and is not replayed. When the local daemon is the active provider its liveness is
    /// re-checked first, so a stopped daemon is reported before the request
    /// is sent. A failed start marks the question as failed.
    pub async fn ask(&mut self, question: &str) -> Result<GenerationStream, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("Question cannot be empty"));
        }

        if self.conversation.awaiting_answer() {
            self.conversation
                .record_failure("Answer was abandoned before it completed");
            debug!(session = %self.id, "Previous answer abandoned");
        }

        let mut turn = ConversationTurn::user(question);
        if let Some(name) = self.document.as_ref().and_then(|d| d.filename()) {
            turn = turn.with_source(name);
        }
        self.conversation.push(turn);

        if let Some(kind) = self.providers.active_config().map(|c| c.kind()) {
            if kind.is_local_daemon() && self.providers.state(kind).is_recheckable() {
                self.providers.check_health(kind).await;
            }
        }

        let context = self
            .document
            .as_ref()
            .and_then(|d| self.processor.context(d));

        match self
            .providers
            .generate(&self.conversation, context.as_deref())
            .await
        {
            Ok(stream) => Ok(stream),
            Err(e) => {
                self.conversation.record_failure(e.user_message());
                Err(e)
            }
        }
    }

    /// Store the completed answer for the pending question
    pub fn record_answer(&mut self, answer: impl Into<String>) {
        let mut turn = ConversationTurn::assistant(answer);
        if let Some(source) = self.conversation.last().and_then(|t| t.source.clone()) {
            turn = turn.with_source(source);
        }
        self.conversation.push(turn);
    }

    /// Mark the pending question as failed, e.g. after a mid-stream error
    pub fn record_failure(&mut self, error: &DomainError) -> bool {
        self.conversation.record_failure(error.user_message())
    }

    /// Drop the conversation history. The document and provider stay.
    pub fn reset(&mut self) {
        self.conversation.clear();
        info!(session = %self.id, "Conversation reset");
    }

    pub fn summary(&self) -> String {
        self.conversation
            .summary(self.document.as_ref().map(|d| &d.metadata))
    }
}

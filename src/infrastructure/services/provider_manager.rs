//! Provider manager - one interface over the Gemini, Groq and Ollama backends

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::generation::GenerationStream;
use crate::domain::{
    build_request, Conversation, DomainError, ErrorKind, HealthEvent, LlmProvider, ModelCatalog,
    PromptSettings, ProviderConfig, ProviderKind, ProviderState,
};
use crate::infrastructure::llm::LlmProviderFactoryTrait;

/// Per-backend session state
#[derive(Default)]
struct ProviderSlot {
    credential: Option<String>,
    endpoint: Option<String>,
    client: Option<Arc<dyn LlmProvider>>,
    state: ProviderState,
    catalog: Option<ModelCatalog>,
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("catalog", &self.catalog.as_ref().map(|c| c.models.len()))
            .finish_non_exhaustive()
    }
}

/// Session-scoped access to the language model backends.
///
/// Holds the credentials, cached catalogs and health state of each
/// provider kind, plus the active configuration used by [`generate`].
/// Nothing is shared between managers.
///
/// [`generate`]: ProviderManager::generate
#[derive(Debug)]
pub struct ProviderManager {
    factory: Arc<dyn LlmProviderFactoryTrait>,
    offered: Vec<ProviderKind>,
    prompt: PromptSettings,
    slots: HashMap<ProviderKind, ProviderSlot>,
    active: Option<ProviderConfig>,
}

impl ProviderManager {
    pub fn new(
        factory: Arc<dyn LlmProviderFactoryTrait>,
        offered: Vec<ProviderKind>,
        prompt: PromptSettings,
    ) -> Self {
        Self {
            factory,
            offered,
            prompt,
            slots: HashMap::new(),
            active: None,
        }
    }

    /// Providers a front-end may present on this platform
    pub fn offered_providers(&self) -> &[ProviderKind] {
        &self.offered
    }

    pub fn is_offered(&self, kind: ProviderKind) -> bool {
        self.offered.contains(&kind)
    }

    pub fn state(&self, kind: ProviderKind) -> ProviderState {
        self.slots.get(&kind).map(|s| s.state).unwrap_or_default()
    }

    /// Model selection is only meaningful once discovery has succeeded
    pub fn can_select_model(&self, kind: ProviderKind) -> bool {
        self.state(kind).is_ready()
    }

    pub fn active_config(&self) -> Option<&ProviderConfig> {
        self.active.as_ref()
    }

    pub fn cached_catalog(&self, kind: ProviderKind) -> Option<&ModelCatalog> {
        self.slots.get(&kind).and_then(|s| s.catalog.as_ref())
    }

    pub fn prompt_settings(&self) -> &PromptSettings {
        &self.prompt
    }

    /// Replace the credential for a provider. A different value drops the
    /// cached catalog and client.
    pub fn set_credential(&mut self, kind: ProviderKind, credential: Option<&str>) {
        let credential = normalize(credential);
        let slot = self.slots.entry(kind).or_default();

        if slot.credential != credential {
            slot.credential = credential;
            Self::invalidate(kind, slot);
        }
    }

    /// Override the base URL for a provider (the Ollama host, typically)
    pub fn set_endpoint(&mut self, kind: ProviderKind, endpoint: Option<&str>) {
        let endpoint = normalize(endpoint);
        let slot = self.slots.entry(kind).or_default();

        if slot.endpoint != endpoint {
            slot.endpoint = endpoint;
            Self::invalidate(kind, slot);
        }
    }

    fn invalidate(kind: ProviderKind, slot: &mut ProviderSlot) {
        slot.client = None;
        slot.catalog = None;
        slot.state = ProviderState::NotConfigured;
        debug!(provider = %kind, "Provider access changed, cached catalog dropped");
    }

    /// Models offered by `kind`, from the session cache when a previous
    /// discovery with the same credential succeeded.
    ///
    /// Failures come back as a catalog with `success = false`; no static
    /// list is substituted.
    pub async fn list_models(
        &mut self,
        kind: ProviderKind,
        credential: Option<&str>,
    ) -> ModelCatalog {
        self.set_credential(kind, credential);

        if let Some(catalog) = self.cached_catalog(kind).filter(|c| c.is_success()) {
            debug!(provider = %kind, "Using cached model catalog");
            return catalog.clone();
        }

        self.discover(kind)
            .await
            .unwrap_or_else(|e| ModelCatalog::failed(kind, &e))
    }

    /// Discard the cached catalog and ask the backend again
    pub async fn refresh_models(&mut self, kind: ProviderKind) -> ModelCatalog {
        if let Some(slot) = self.slots.get_mut(&kind) {
            slot.catalog = None;
        }

        self.discover(kind)
            .await
            .unwrap_or_else(|e| ModelCatalog::failed(kind, &e))
    }

    async fn discover(&mut self, kind: ProviderKind) -> Result<ModelCatalog, DomainError> {
        let client = match self.client_for(kind) {
            Ok(client) => client,
            Err(e) => {
                self.slots.entry(kind).or_default().state = ProviderState::NotConfigured;
                warn!(provider = %kind, error = %e, "Provider cannot be used yet");
                return Err(e);
            }
        };

        self.transition(kind, HealthEvent::ConfigurationAttempt);

        match client.list_models().await {
            Ok(models) => {
                self.transition(kind, HealthEvent::Succeeded);
                info!(provider = %kind, count = models.len(), "Model discovery succeeded");

                let catalog = ModelCatalog::discovered(kind, models);
                self.slots.entry(kind).or_default().catalog = Some(catalog.clone());
                Ok(catalog)
            }
            Err(e) => {
                self.transition(kind, HealthEvent::from_error(&e));
                warn!(provider = %kind, error = %e, "Model discovery failed");
                Err(e)
            }
        }
    }

    /// Set the active provider and model.
    ///
    /// Runs discovery, so the provider ends up `Ready`, `Misconfigured` or
    /// `Unreachable`. The previous active configuration is dropped first,
    /// even when this one is rejected.
    pub async fn configure(&mut self, config: ProviderConfig) -> Result<(), DomainError> {
        let kind = config.kind();
        self.active = None;

        if !self.is_offered(kind) {
            return Err(DomainError::validation(format!(
                "{kind} is not available on this platform"
            )));
        }

        self.set_credential(kind, config.credential());
        if config.endpoint().is_some() {
            self.set_endpoint(kind, config.endpoint());
        }
        config.validate()?;

        let catalog = self.discover(kind).await?;

        let config = match catalog.resolve(config.model()) {
            Some(model) if model != config.model() => {
                debug!(
                    provider = %kind,
                    requested = config.model(),
                    resolved = model,
                    "Resolved model name"
                );
                let model = model.to_string();
                config.with_model(model)
            }
            Some(_) => config,
            None if kind.is_local_daemon() => {
                return Err(DomainError::validation(format!(
                    "Model '{}' is not installed. Pull it with `ollama pull {}`.",
                    config.model(),
                    config.model()
                )));
            }
            None => {
                warn!(provider = %kind, model = config.model(), "Model not in discovered catalog");
                config
            }
        };

        info!(
            provider = %kind,
            model = config.model(),
            credential = ?config.masked_credential(),
            "Provider configured"
        );
        self.active = Some(config);
        Ok(())
    }

    /// Cheap liveness check. Updates the health state of a configured
    /// provider; the answer itself does not depend on configuration.
    pub async fn is_available(&mut self, kind: ProviderKind) -> bool {
        let client = match self.client_for(kind) {
            Ok(client) => client,
            Err(_) => return false,
        };

        let result = client.ping().await;
        let event = match &result {
            Ok(()) => HealthEvent::Succeeded,
            Err(e) => {
                debug!(provider = %kind, error = %e, "Liveness check failed");
                HealthEvent::from_error(e)
            }
        };
        self.transition(kind, event);

        result.is_ok()
    }

    /// Ping and report the resulting state
    pub async fn check_health(&mut self, kind: ProviderKind) -> ProviderState {
        self.is_available(kind).await;
        self.state(kind)
    }

    /// Stream an answer to the pending question in `conversation` from the
    /// active provider
    pub async fn generate(
        &mut self,
        conversation: &Conversation,
        context: Option<&str>,
    ) -> Result<GenerationStream, DomainError> {
        let config = self
            .active
            .clone()
            .ok_or_else(|| DomainError::not_configured("No provider has been configured"))?;

        self.generate_with(&config, conversation, context).await
    }

    /// Stream an answer from the provider and model named by `config`.
    ///
    /// The provider must already be `Ready` in this session; access fields of
    /// `config` are not re-applied here.
    pub async fn generate_with(
        &mut self,
        config: &ProviderConfig,
        conversation: &Conversation,
        context: Option<&str>,
    ) -> Result<GenerationStream, DomainError> {
        let kind = config.kind();
        self.ensure_ready(kind)?;

        let request = build_request(conversation, context, &self.prompt)?;
        let client = self.client_for(kind)?;

        debug!(
            provider = %kind,
            model = config.model(),
            messages = request.messages.len(),
            with_context = context.is_some(),
            "Starting generation"
        );

        match client.chat_stream(config.model(), request).await {
            Ok(stream) => Ok(GenerationStream::new(kind, stream)),
            Err(e) => {
                match e.kind() {
                    ErrorKind::DaemonUnreachable => {
                        self.transition(kind, HealthEvent::ConnectionFailed)
                    }
                    ErrorKind::Auth => self.transition(kind, HealthEvent::Rejected),
                    _ => {}
                }
                warn!(provider = %kind, error = %e, "Generation request failed");
                Err(e)
            }
        }
    }

    fn ensure_ready(&self, kind: ProviderKind) -> Result<(), DomainError> {
        let state = self.state(kind);
        if state.is_ready() {
            return Ok(());
        }

        let reason = format!("provider is {}", state.label());
        Err(match (kind.is_local_daemon(), state) {
            (true, ProviderState::Unreachable) => {
                let endpoint = self
                    .slots
                    .get(&kind)
                    .and_then(|s| s.endpoint.clone())
                    .unwrap_or_else(|| "local daemon".to_string());
                DomainError::daemon_unreachable(endpoint, reason)
            }
            _ => DomainError::provider_unavailable(kind.name(), reason),
        })
    }

    fn client_for(&mut self, kind: ProviderKind) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let slot = self.slots.entry(kind).or_default();

        if let Some(client) = &slot.client {
            return Ok(Arc::clone(client));
        }

        let client = self
            .factory
            .create(kind, slot.credential.clone(), slot.endpoint.clone())?;
        slot.client = Some(Arc::clone(&client));
        Ok(client)
    }

    fn transition(&mut self, kind: ProviderKind, event: HealthEvent) {
        let slot = self.slots.entry(kind).or_default();
        let before = slot.state;
        slot.state = before.apply(event);

        if slot.state != before {
            info!(
                provider = %kind,
                from = before.label(),
                to = slot.state.label(),
                "Provider state changed"
            );
        }
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

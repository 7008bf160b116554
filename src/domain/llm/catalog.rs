//! Model catalogs produced by provider discovery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProviderKind;
use crate::domain::{DomainError, ErrorKind};

/// Outcome of the last discovery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    Success,
    Failure { kind: ErrorKind, reason: String },
}

/// Models offered by one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub provider: ProviderKind,
    pub models: Vec<String>,
    /// True only when `models` came from a successful live discovery
    pub fresh: bool,
    /// True when `models` is the static offline list
    pub is_fallback: bool,
    pub outcome: DiscoveryOutcome,
    pub fetched_at: DateTime<Utc>,
}

impl ModelCatalog {
    /// Catalog from a successful live discovery
    pub fn discovered(provider: ProviderKind, models: Vec<String>) -> Self {
        Self {
            provider,
            models,
            fresh: true,
            is_fallback: false,
            outcome: DiscoveryOutcome::Success,
            fetched_at: Utc::now(),
        }
    }

    /// Catalog for a failed discovery. Carries no models.
    pub fn failed(provider: ProviderKind, error: &DomainError) -> Self {
        let reason = error.to_string();
        Self {
            provider,
            models: Vec::new(),
            fresh: false,
            is_fallback: false,
            outcome: DiscoveryOutcome::Failure {
                kind: error.kind(),
                reason: if reason.is_empty() {
                    format!("{:?}", error.kind())
                } else {
                    reason
                },
            },
            fetched_at: Utc::now(),
        }
    }

    /// Attach the static model list to a failed catalog.
    ///
    /// The failure outcome and `fresh = false` are kept so callers can
    /// show the list with an offline indicator.
    pub fn with_fallback(mut self) -> Self {
        if self.is_success() {
            return self;
        }

        self.models = self
            .provider
            .fallback_models()
            .iter()
            .map(|m| m.to_string())
            .collect();
        self.is_fallback = true;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DiscoveryOutcome::Success)
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            DiscoveryOutcome::Success => None,
            DiscoveryOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            DiscoveryOutcome::Success => None,
            DiscoveryOutcome::Failure { reason, .. } => Some(reason),
        }
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    /// Catalog entry a requested model name refers to.
    ///
    /// The local daemon reads an untagged name as `name:latest`, so that
    /// form is tried as well for its catalogs.
    pub fn resolve(&self, model: &str) -> Option<&str> {
        let model = model.trim();
        if let Some(found) = self.models.iter().find(|m| *m == model) {
            return Some(found);
        }

        if self.provider.is_local_daemon() && !model.is_empty() && !model.contains(':') {
            let latest = format!("{model}:latest");
            return self.models.iter().find(|m| **m == latest).map(String::as_str);
        }

        None
    }
}

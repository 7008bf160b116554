//! Per-provider availability state machine
//!
//! Transitions happen only on explicit caller actions (configuration,
//! refresh, opportunistic re-check). Nothing here retries on its own.

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, ErrorKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    #[default]
    NotConfigured,
    Validating,
    Ready,
    Unreachable,
    Misconfigured,
}

/// Observation fed into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEvent {
    /// Credential or endpoint supplied by the user
    ConfigurationAttempt,
    /// Discovery or liveness check succeeded
    Succeeded,
    /// Backend rejected the credential, or is reachable but unusable
    Rejected,
    /// Network or connection failure
    ConnectionFailed,
}

impl HealthEvent {
    /// Classify a discovery or ping failure
    pub fn from_error(error: &DomainError) -> Self {
        match error.kind() {
            ErrorKind::Auth
            | ErrorKind::NoModelsInstalled
            | ErrorKind::NotConfigured
            | ErrorKind::Validation
            | ErrorKind::Configuration => Self::Rejected,
            _ => Self::ConnectionFailed,
        }
    }
}

impl ProviderState {
    pub fn apply(self, event: HealthEvent) -> Self {
        use HealthEvent::*;
        use ProviderState::*;

        match (self, event) {
            (_, ConfigurationAttempt) => Validating,
            (NotConfigured, _) => NotConfigured,

            (Validating | Ready | Unreachable, Succeeded) => Ready,
            (Validating | Ready | Unreachable, Rejected) => Misconfigured,
            (Validating | Ready | Unreachable, ConnectionFailed) => Unreachable,

            // A rejected configuration stays rejected until the user reconfigures
            (Misconfigured, _) => Misconfigured,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// States in which an opportunistic liveness re-check is meaningful
    pub fn is_recheckable(&self) -> bool {
        matches!(self, Self::Ready | Self::Unreachable)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not configured",
            Self::Validating => "validating",
            Self::Ready => "ready",
            Self::Unreachable => "unreachable",
            Self::Misconfigured => "misconfigured",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HealthEvent::*;
    use ProviderState::*;

    #[test]
    fn test_configuration_starts_validation_from_any_state() {
        for state in [NotConfigured, Validating, Ready, Unreachable, Misconfigured] {
            assert_eq!(state.apply(ConfigurationAttempt), Validating);
        }
    }

    #[test]
    fn test_validation_outcomes() {
        assert_eq!(Validating.apply(Succeeded), Ready);
        assert_eq!(Validating.apply(Rejected), Misconfigured);
        assert_eq!(Validating.apply(ConnectionFailed), Unreachable);
    }

    #[test]
    fn test_recheck_transitions() {
        assert_eq!(Ready.apply(ConnectionFailed), Unreachable);
        assert_eq!(Unreachable.apply(Succeeded), Ready);
        assert_eq!(Ready.apply(Succeeded), Ready);
        assert_eq!(Unreachable.apply(ConnectionFailed), Unreachable);
    }

    #[test]
    fn test_unconfigured_and_misconfigured_ignore_pings() {
        assert_eq!(NotConfigured.apply(Succeeded), NotConfigured);
        assert_eq!(NotConfigured.apply(ConnectionFailed), NotConfigured);
        assert_eq!(Misconfigured.apply(Succeeded), Misconfigured);
    }

    #[test]
    fn test_event_from_error() {
        assert_eq!(HealthEvent::from_error(&DomainError::auth("groq", "bad key")), Rejected);
        assert_eq!(HealthEvent::from_error(&DomainError::NoModelsInstalled), Rejected);
        assert_eq!(
            HealthEvent::from_error(&DomainError::daemon_unreachable("http://x", "refused")),
            ConnectionFailed
        );
        assert_eq!(
            HealthEvent::from_error(&DomainError::provider_unavailable("gemini", "timeout")),
            ConnectionFailed
        );
    }

    #[test]
    fn test_default_state() {
        assert_eq!(ProviderState::default(), NotConfigured);
        assert!(!NotConfigured.is_recheckable());
        assert!(Unreachable.is_recheckable());
    }
}

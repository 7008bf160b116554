//! Hosting environment detection

use std::fmt;

use crate::config::LocalDaemonMode;
use crate::domain::ProviderKind;

/// Variables set by hosted notebook/space environments
const HOSTED_ENV_VARS: [&str; 2] = ["SPACE_ID", "SPACE_AUTHOR_NAME"];

/// Where the process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Hosted space. No local daemon can be reached from here.
    Hosted,
    /// Developer machine or self-managed server
    Local,
}

impl Platform {
    pub fn detect() -> Self {
        Self::detect_with(|name| std::env::var(name).ok())
    }

    /// Detect using an arbitrary variable lookup
    pub fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if HOSTED_ENV_VARS.iter().any(|name| lookup(name).is_some()) {
            Self::Hosted
        } else {
            Self::Local
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Local => "local",
        }
    }

    pub fn supports_local_daemon(&self, mode: LocalDaemonMode) -> bool {
        match mode {
            LocalDaemonMode::Auto => matches!(self, Self::Local),
            LocalDaemonMode::On => true,
            LocalDaemonMode::Off => false,
        }
    }

    /// Providers a front-end may offer here
    pub fn offered_providers(&self, mode: LocalDaemonMode) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| !kind.is_local_daemon() || self.supports_local_daemon(mode))
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_hosted() {
        let platform = Platform::detect_with(|name| (name == "SPACE_ID").then(|| "me/app".into()));
        assert_eq!(platform, Platform::Hosted);

        let platform =
            Platform::detect_with(|name| (name == "SPACE_AUTHOR_NAME").then(|| "me".into()));
        assert_eq!(platform, Platform::Hosted);
    }

    #[test]
    fn test_detect_local() {
        assert_eq!(Platform::detect_with(|_| None), Platform::Local);
    }

    #[test]
    fn test_local_daemon_not_offered_when_hosted() {
        let offered = Platform::Hosted.offered_providers(LocalDaemonMode::Auto);
        assert_eq!(offered, vec![ProviderKind::Gemini, ProviderKind::Groq]);

        let offered = Platform::Local.offered_providers(LocalDaemonMode::Auto);
        assert_eq!(offered, ProviderKind::ALL.to_vec());
    }

    #[test]
    fn test_override() {
        assert!(Platform::Hosted.supports_local_daemon(LocalDaemonMode::On));
        assert!(!Platform::Local.supports_local_daemon(LocalDaemonMode::Off));
    }
}

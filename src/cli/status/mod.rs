//! Status command - platform and per-provider availability

use crate::domain::ProviderKind;
use crate::infrastructure::platform::Platform;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();
    let mut providers = crate::create_provider_manager(&config)?;

    println!("Platform: {}", Platform::detect());

    for kind in ProviderKind::ALL {
        if !providers.is_offered(kind) {
            println!("  {kind:<7} not offered on this platform");
            continue;
        }

        let credential = config.credential(kind);
        if kind.requires_credential() && credential.is_none() {
            let var = kind.credential_env_var().unwrap_or("an API key");
            println!("  {kind:<7} not configured (set {var})");
            continue;
        }

        let catalog = providers.list_models(kind, credential).await;
        match catalog.failure_reason() {
            None => println!(
                "  {kind:<7} {} ({} models)",
                providers.state(kind).label(),
                catalog.models.len()
            ),
            Some(reason) => println!(
                "  {kind:<7} {}: {}",
                providers.state(kind).label(),
                reason
            ),
        }
    }

    Ok(())
}

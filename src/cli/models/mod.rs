//! Models command - live model discovery for one provider

use clap::Args;

use crate::domain::{ModelCatalog, ProviderKind};

/// Arguments for the models command
#[derive(Args, Clone)]
pub struct ModelsArgs {
    /// gemini, groq or ollama
    pub provider: ProviderKind,

    /// API key (defaults to the configured or environment key)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Ask the provider again instead of using the session cache
    #[arg(long)]
    pub refresh: bool,
}

pub async fn run(args: ModelsArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let mut providers = crate::create_provider_manager(&config)?;
    let kind = args.provider;

    if !providers.is_offered(kind) {
        anyhow::bail!("{kind} is not available on this platform");
    }

    let credential = args.api_key.as_deref().or(config.credential(kind));
    let mut catalog = providers.list_models(kind, credential).await;
    if args.refresh {
        catalog = providers.refresh_models(kind).await;
    }

    print_catalog(&catalog);
    println!("State: {}", providers.state(kind).label());

    Ok(())
}

fn print_catalog(catalog: &ModelCatalog) {
    if let Some(reason) = catalog.failure_reason() {
        println!("Discovery failed for {}: {}", catalog.provider, reason);

        let fallback = catalog.clone().with_fallback();
        println!("Offline list (not verified):");
        for model in &fallback.models {
            println!("  {model}");
        }
        return;
    }

    println!("{} models from {}:", catalog.models.len(), catalog.provider);
    for model in &catalog.models {
        println!("  {model}");
    }
}

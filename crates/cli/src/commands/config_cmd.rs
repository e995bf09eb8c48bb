//! `docia config` — Configuration commands.

use docia_config::AppConfig;

/// Print the default configuration as TOML.
pub fn show_default() {
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    print!("{}", AppConfig::default_toml());
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if config.generation.backend == docia_config::GenerationBackend::Remote
                && config.generation.api_key.is_none()
            {
                warnings.push("Remote generation without an API key (set MISTRAL_API_KEY)");
            }

            if !config.knowledge.path.exists() {
                warnings.push("Knowledge base file does not exist");
            }

            if config.gateway.cors_origins.is_empty() {
                warnings.push("No CORS origins configured; browsers will be refused");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Knowledge:  {}", config.knowledge.path.display());
            println!("   Threshold:  {}", config.retrieval.threshold);
            println!("   Encoder:    {:?} ({})", config.embedding.backend, config.embedding.model);
            println!("   Generation: {:?} ({})", config.generation.backend, config.generation.model);
            println!(
                "   Gateway:    {}:{}",
                config.gateway.host, config.gateway.port
            );
            println!("   Language:   {}", config.default_language);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

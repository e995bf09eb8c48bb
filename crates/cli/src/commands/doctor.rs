//! `docia doctor` — Diagnose the installation.

use docia_config::{AppConfig, GenerationBackend};
use docia_core::{KnowledgeBase, Language};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 DocIA Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file at {} — using defaults", config_path.display());
    }
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config before further checks.");
            return Ok(());
        }
    };

    // Check knowledge base
    match KnowledgeBase::load(&config.knowledge.path) {
        Ok(kb) => {
            println!(
                "  ✅ Knowledge base: {} condition(s), {} language entries",
                kb.conditions().len(),
                kb.len()
            );
            for language in Language::ALL {
                let count = kb.candidates(language).count();
                if count == 0 {
                    println!("  ⚠️  No {language} entries — {language} questions get no context");
                    issues += 1;
                } else {
                    println!("     {language}: {count} retrievable text(s)");
                }
            }
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    // Check encoder
    let embedding = config.embedding.clone();
    match tokio::task::spawn_blocking(move || docia_providers::build_embedder(&embedding)).await? {
        Ok(embedder) => println!(
            "  ✅ Encoder: {} (dimension {})",
            embedder.name(),
            embedder.dimension()
        ),
        Err(e) => {
            println!("  ❌ Encoder: {e}");
            issues += 1;
        }
    }

    // Check generation engine
    let generation = config.generation.clone();
    match tokio::task::spawn_blocking(move || docia_providers::build_generator(&generation)).await? {
        Ok(Some(generator)) => println!("  ✅ Generation engine: {}", generator.model_id()),
        Ok(None) => {
            println!("  ⚠️  Generation disabled — /ask answers with the unavailable message");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Generation engine: {e}");
            if config.generation.backend == GenerationBackend::Remote {
                println!("     Set MISTRAL_API_KEY or generation.api_key in config.toml");
            }
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

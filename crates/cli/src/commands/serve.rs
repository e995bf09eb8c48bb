//! `docia serve` — Start the HTTP API server.

use docia_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(docia_core::Error::from)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🩺 DocIA Gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Knowledge:  {}", config.knowledge.path.display());
    println!("   Generation: {:?} ({})", config.generation.backend, config.generation.model);

    docia_gateway::start(config).await?;

    Ok(())
}

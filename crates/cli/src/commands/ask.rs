//! `docia ask` — Run the answering pipeline once from the terminal.

use docia_assistant::Assistant;
use docia_config::AppConfig;
use docia_core::{Language, QueryRequest};

pub async fn run(text: String, language: Option<Language>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(docia_core::Error::from)?;
    let language = language.unwrap_or(config.default_language);

    let assistant = Assistant::load(config).await?;
    let answer = assistant.ask(&QueryRequest::new(text, language)).await?;

    println!("{answer}");
    Ok(())
}

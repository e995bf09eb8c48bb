//! `docia chat` — Keyword assistant, no model required.

use docia_assistant::KeywordMatcher;

pub async fn run(message: String) -> Result<(), Box<dyn std::error::Error>> {
    if message.trim().is_empty() {
        return Err("Message vide".into());
    }

    println!("{}", KeywordMatcher::diabetes_fr().respond(message.trim()));
    Ok(())
}

//! Inbound question type.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::language::Language;

/// A question asked of the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question, as typed
    pub text: String,

    /// Language to answer in (defaults to French)
    #[serde(default)]
    pub language: Language,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }

    /// Reject empty or whitespace-only questions.
    pub fn validate(&self) -> Result<(), Error> {
        if self.text.trim().is_empty() {
            return Err(Error::InvalidInput("Question text must not be empty".into()));
        }
        Ok(())
    }
}

//! Prompt composition.
//!
//! The safety rules live only in the prompt; the model is trusted to
//! follow them and nothing checks the output afterwards.

use docia_core::Language;

pub const ASSISTANT_NAME: &str = "DocIA";
pub const HOSPITAL: &str = "Douala General Hospital";

/// Build the instruction prompt for one question.
///
/// The prompt ends with `Answer:` so the continuation can be cut out of an
/// echoed decode by the sanitizer.
pub fn compose(context: &str, language: Language, question: &str) -> String {
    format!(
        "[INST] You are {ASSISTANT_NAME}, a medical assistant for {HOSPITAL}.\n\
         Strictly follow these rules:\n\
         1. ONLY use this context: {context}\n\
         2. Respond in {language}\n\
         3. Never diagnose - say \"I'm not a doctor\"\n\
         4. Always add: \"⚠️ Consult a real doctor\"\n\
         \n\
         Question: {question}\n\
         Answer: [/INST]"
    )
}

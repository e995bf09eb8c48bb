//! Fixed user-facing messages, per answer language.

use docia_core::Language;

/// Shown when no generation engine is loaded.
pub fn unavailable(language: Language) -> &'static str {
    match language {
        Language::En => {
            "The medical assistant is temporarily unavailable. Please try again later \
             or contact a healthcare professional. ⚠️ Consult a real doctor"
        }
        Language::Fr => {
            "L'assistant médical est temporairement indisponible. Veuillez réessayer plus \
             tard ou contacter un professionnel de santé. ⚠️ Consultez un vrai médecin"
        }
    }
}

/// Shown when generation fails mid-request.
pub fn apology(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Sorry, I could not answer your question right now. I'm not a doctor. \
             ⚠️ Consult a real doctor"
        }
        Language::Fr => {
            "Désolé, je ne peux pas répondre à votre question pour le moment. Je ne suis \
             pas médecin. ⚠️ Consultez un vrai médecin"
        }
    }
}

/// Safety line appended to generated answers when configured.
pub fn disclaimer(language: Language) -> &'static str {
    match language {
        Language::En => "⚠️ Consult a real doctor",
        Language::Fr => "⚠️ Consultez un vrai médecin",
    }
}

pub fn internal_error(language: Language) -> &'static str {
    match language {
        Language::En => "Internal server error",
        Language::Fr => "Erreur interne du serveur",
    }
}

/// Append the disclaimer unless the answer already carries it.
pub fn with_disclaimer(answer: &str, language: Language) -> String {
    let line = disclaimer(language);
    if answer.contains(line) {
        answer.to_string()
    } else if answer.is_empty() {
        line.to_string()
    } else {
        format!("{answer}\n\n{line}")
    }
}

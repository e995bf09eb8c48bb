//! The application context: everything a request needs, built once at startup.
//!
//! `Assistant` owns the knowledge base (through its retriever), the encoder,
//! the optional generation engine and the keyword catalogue. Handlers share
//! it behind an `Arc`; no request mutates it.

use docia_config::AppConfig;
use docia_core::error::Error;
use docia_core::{GenerationParams, Generator, QueryRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::keyword::KeywordMatcher;
use crate::messages;
use crate::prompt::compose;
use crate::retriever::Retriever;
use crate::sanitizer::sanitize;

/// Load state of the generation engine, as reported by `/health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub model: Option<String>,
}

pub struct Assistant {
    retriever: Arc<Retriever>,
    generator: Option<Arc<dyn Generator>>,
    sampling: GenerationParams,
    keywords: KeywordMatcher,
    append_disclaimer: bool,
}

impl Assistant {
    /// `generator` is `None` when no engine could be loaded; questions then
    /// get the unavailable message for the whole process lifetime.
    pub fn new(retriever: Retriever, generator: Option<Arc<dyn Generator>>) -> Self {
        Self {
            retriever: Arc::new(retriever),
            generator,
            sampling: GenerationParams::default(),
            keywords: KeywordMatcher::default(),
            append_disclaimer: false,
        }
    }

    pub fn with_sampling(mut self, sampling: GenerationParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_keywords(mut self, keywords: KeywordMatcher) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_appended_disclaimer(mut self, enabled: bool) -> Self {
        self.append_disclaimer = enabled;
        self
    }

    /// Build from configuration: load the knowledge base and both models.
    ///
    /// Blocking. A knowledge base or encoder failure is fatal; a generator
    /// failure only disables generation.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let knowledge = docia_core::KnowledgeBase::load(&config.knowledge.path)?;
        info!(
            path = %config.knowledge.path.display(),
            entries = knowledge.len(),
            conditions = knowledge.conditions().len(),
            "Knowledge base ready"
        );

        let embedder = docia_providers::build_embedder(&config.embedding)?;

        let mut retriever = Retriever::new(Arc::new(knowledge), embedder)
            .with_threshold(config.retrieval.threshold);
        if config.retrieval.precompute_embeddings {
            retriever = retriever.precompute()?;
        }
        info!(
            encoder = retriever.embedder().name(),
            dimension = retriever.embedder().dimension(),
            threshold = retriever.threshold(),
            precomputed = retriever.is_precomputed(),
            "Retriever ready"
        );

        let generator = match docia_providers::build_generator(&config.generation) {
            Ok(Some(generator)) => {
                info!(model = generator.model_id(), "Generation engine ready");
                Some(generator)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    model = %config.generation.model,
                    error = %e,
                    "Generation engine failed to load; answers will report it unavailable"
                );
                None
            }
        };

        Ok(Self::new(retriever, generator)
            .with_sampling(config.generation.sampling.clone())
            .with_appended_disclaimer(config.generation.append_disclaimer))
    }

    /// [`Assistant::from_config`] on a blocking thread.
    pub async fn load(config: AppConfig) -> Result<Self, Error> {
        tokio::task::spawn_blocking(move || Self::from_config(&config))
            .await
            .map_err(|e| Error::Internal(format!("Startup task failed: {e}")))?
    }

    /// Answer a question with the retrieval-augmented pipeline.
    ///
    /// Input errors come back as `Err(InvalidInput)`. Model unavailability
    /// and generation failures are answered with fixed messages. Encoder
    /// failures propagate.
    pub async fn ask(&self, request: &QueryRequest) -> Result<String, Error> {
        request.validate()?;
        let language = request.language;

        let Some(generator) = self.generator.clone() else {
            warn!(language = %language, "Question received but no generation engine is loaded");
            return Ok(messages::unavailable(language).to_string());
        };

        let retriever = self.retriever.clone();
        let text = request.text.clone();
        let context = tokio::task::spawn_blocking(move || retriever.retrieve(&text, language))
            .await
            .map_err(|e| Error::Internal(format!("Retrieval task failed: {e}")))??;

        let prompt = compose(&context, language, &request.text);
        debug!(prompt_len = prompt.len(), model = generator.model_id(), "Prompt composed");

        let raw = match generator.generate(&prompt, &self.sampling).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(model = generator.model_id(), error = %e, "Generation failed");
                return Ok(messages::apology(language).to_string());
            }
        };

        let answer = sanitize(&raw);
        debug!(raw_len = raw.len(), answer_len = answer.len(), "Answer sanitized");

        if self.append_disclaimer {
            Ok(messages::with_disclaimer(&answer, language))
        } else {
            Ok(answer)
        }
    }

    /// Answer a message with the keyword fallback (no model involved).
    pub fn chat(&self, message: &str) -> Result<String, Error> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::InvalidInput("Message must not be empty".into()));
        }
        Ok(self.keywords.respond(message))
    }

    pub fn model_status(&self) -> ModelStatus {
        ModelStatus {
            loaded: self.generator.is_some(),
            model: self.generator.as_ref().map(|g| g.model_id().to_string()),
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::NO_CONTEXT;
    use async_trait::async_trait;
    use docia_core::error::{EmbeddingError, GenerationError};
    use docia_core::{Embedder, KnowledgeBase, KnowledgeEntry, Language};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Every text maps to the same vector, so any candidate scores 1.0.
    struct ConstantEmbedder {
        calls: AtomicUsize,
    }

    impl Embedder for ConstantEmbedder {
        fn name(&self) -> &str {
            "constant"
        }
        fn dimension(&self) -> usize {
            3
        }
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0, 0.0])
        }
    }

    struct BrokenEmbedder;

    impl Embedder for BrokenEmbedder {
        fn name(&self) -> &str {
            "broken"
        }
        fn dimension(&self) -> usize {
            3
        }
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Inference("encoder crashed".into()))
        }
    }

    /// Echoes the prompt back followed by a scripted continuation.
    struct EchoGenerator {
        continuation: Result<String, GenerationError>,
        prompts: Mutex<Vec<String>>,
    }

    impl EchoGenerator {
        fn new(continuation: Result<String, GenerationError>) -> Arc<Self> {
            Arc::new(Self {
                continuation,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        fn model_id(&self) -> &str {
            "echo"
        }
        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let tail = self.continuation.clone()?;
            Ok(format!("{prompt}\n{tail}"))
        }
    }

    fn kb() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::from_entries(vec![
            KnowledgeEntry::new("malaria", Language::En).with_attribute("treatment", "ACT therapy"),
            KnowledgeEntry::new("paludisme", Language::Fr).with_attribute("traitement", "CTA"),
        ]))
    }

    fn assistant_with(
        embedder: Arc<dyn Embedder>,
        generator: Option<Arc<dyn Generator>>,
    ) -> Assistant {
        Assistant::new(Retriever::new(kb(), embedder), generator)
    }

    fn constant() -> Arc<ConstantEmbedder> {
        Arc::new(ConstantEmbedder {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn ask_runs_the_full_pipeline() {
        let generator = EchoGenerator::new(Ok("I'm not a doctor. ACT therapy. ⚠️ Consult a real doctor".into()));
        let assistant = assistant_with(constant(), Some(generator.clone()));

        let answer = assistant
            .ask(&QueryRequest::new("How is malaria treated?", Language::En))
            .await
            .unwrap();

        // The prompt echo ends with "Answer: [/INST]".
        assert_eq!(answer, "[/INST]\nI'm not a doctor. ACT therapy. ⚠️ Consult a real doctor");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("ONLY use this context: ACT therapy"));
        assert!(prompts[0].contains("Respond in en"));
    }

    #[tokio::test]
    async fn ask_uses_sentinel_when_language_has_no_entries() {
        let kb = Arc::new(KnowledgeBase::from_entries(vec![
            KnowledgeEntry::new("malaria", Language::En).with_attribute("treatment", "ACT therapy"),
        ]));
        let generator = EchoGenerator::new(Ok("Je ne suis pas médecin.".into()));
        let assistant = Assistant::new(Retriever::new(kb, constant()), Some(generator.clone()));

        assistant
            .ask(&QueryRequest::new("Comment traiter le paludisme ?", Language::Fr))
            .await
            .unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains(NO_CONTEXT));
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_model_work() {
        let embedder = constant();
        let generator = EchoGenerator::new(Ok("x".into()));
        let assistant = assistant_with(embedder.clone(), Some(generator.clone()));

        let err = assistant
            .ask(&QueryRequest::new("   ", Language::En))
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_engine_returns_unavailable_message() {
        let embedder = constant();
        let assistant = assistant_with(embedder.clone(), None);

        let answer = assistant
            .ask(&QueryRequest::new("Qu'est-ce que le paludisme ?", Language::Fr))
            .await
            .unwrap();

        assert_eq!(answer, messages::unavailable(Language::Fr));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            assistant.model_status(),
            ModelStatus {
                loaded: false,
                model: None
            }
        );
    }

    #[tokio::test]
    async fn generation_failure_becomes_apology() {
        let generator = EchoGenerator::new(Err(GenerationError::Inference("oom".into())));
        let assistant = assistant_with(constant(), Some(generator));

        let answer = assistant
            .ask(&QueryRequest::new("How is malaria treated?", Language::En))
            .await
            .unwrap();

        assert_eq!(answer, messages::apology(Language::En));
    }

    #[tokio::test]
    async fn encoder_failure_is_an_internal_error() {
        let generator = EchoGenerator::new(Ok("x".into()));
        let assistant = assistant_with(Arc::new(BrokenEmbedder), Some(generator.clone()));

        let err = assistant
            .ask(&QueryRequest::new("fever", Language::En))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Embedding(_)));
        assert!(!err.is_client_error());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disclaimer_can_be_appended_to_generated_answers() {
        let generator = EchoGenerator::new(Ok("Rest.".into()));
        let assistant =
            assistant_with(constant(), Some(generator)).with_appended_disclaimer(true);

        let answer = assistant
            .ask(&QueryRequest::new("fever", Language::En))
            .await
            .unwrap();

        assert!(answer.ends_with("\n\n⚠️ Consult a real doctor"));
    }

    #[test]
    fn chat_uses_keyword_catalogue() {
        let assistant = assistant_with(constant(), None);
        let reply = assistant.chat("  Quels sont les symptômes ?  ").unwrap();
        assert!(reply.starts_with("Les symptômes principaux du diabète"));
        assert!(assistant.chat(" \n ").unwrap_err().is_client_error());
    }

    #[test]
    fn model_status_reports_loaded_engine() {
        let generator: Arc<dyn Generator> = EchoGenerator::new(Ok(String::new()));
        let assistant = assistant_with(constant(), Some(generator));
        let status = assistant.model_status();
        assert!(status.loaded);
        assert_eq!(status.model.as_deref(), Some("echo"));
    }

    #[test]
    fn from_config_with_hash_encoder_and_no_engine() {
        let dir = tempfile::tempdir().unwrap();
        let kb_path = dir.path().join("medical_kb.json");
        std::fs::write(
            &kb_path,
            r#"{"malaria": {"en": {"symptoms": ["fever", "chills"]}, "fr": {"symptomes": "fièvre"}}}"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.knowledge.path = kb_path;
        config.embedding.backend = docia_config::EmbeddingBackend::Hash;
        config.generation.backend = docia_config::GenerationBackend::None;
        config.retrieval.precompute_embeddings = true;

        let assistant = Assistant::from_config(&config).unwrap();
        assert_eq!(assistant.retriever().knowledge().len(), 2);
        assert!(assistant.retriever().is_precomputed());
        assert!(!assistant.model_status().loaded);
    }

    #[test]
    fn from_config_fails_on_missing_knowledge_base() {
        let mut config = AppConfig::default();
        config.knowledge.path = "/nonexistent/medical_kb.json".into();
        config.embedding.backend = docia_config::EmbeddingBackend::Hash;
        assert!(matches!(
            Assistant::from_config(&config),
            Err(Error::Knowledge(_))
        ));
    }
}

//! Keyword fallback — canned answers picked by trigger-phrase counting.
//!
//! No model is involved. Each category counts how many of its trigger
//! substrings occur in the lowercased message; the first category with the
//! highest non-zero count answers. Every reply ends with the disclaimer.

/// A topic with its trigger phrases and canned answer.
#[derive(Debug, Clone)]
pub struct KeywordCategory {
    pub name: String,
    pub triggers: Vec<String>,
    pub response: String,
}

impl KeywordCategory {
    pub fn new<I, S>(name: impl Into<String>, triggers: I, response: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            triggers: triggers
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .collect(),
            response: response.into(),
        }
    }

    /// Number of distinct triggers present in an already-lowercased message.
    fn score(&self, lowered: &str) -> usize {
        self.triggers
            .iter()
            .filter(|t| lowered.contains(t.as_str()))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    categories: Vec<KeywordCategory>,
    redirect: String,
    disclaimer: String,
}

const DIABETES_DISCLAIMER: &str = "⚠️ Important : Ces informations sont fournies à titre éducatif uniquement et ne remplacent pas un avis médical professionnel. Consultez toujours un médecin pour un diagnostic et un traitement appropriés.";

const DIABETES_REDIRECT: &str = "Je comprends votre question, mais je me spécialise actuellement dans les informations sur le diabète. Pourriez-vous reformuler votre question en relation avec le diabète ? Par exemple, vous pouvez me demander des informations sur les symptômes, le traitement, la prévention ou l'alimentation diabétique.";

impl KeywordMatcher {
    pub fn new(
        categories: Vec<KeywordCategory>,
        redirect: impl Into<String>,
        disclaimer: impl Into<String>,
    ) -> Self {
        Self {
            categories,
            redirect: redirect.into(),
            disclaimer: disclaimer.into(),
        }
    }

    /// The built-in French diabetes catalogue.
    pub fn diabetes_fr() -> Self {
        Self::new(
            vec![
                KeywordCategory::new(
                    "definition",
                    ["qu'est-ce que", "définition", "c'est quoi", "diabète"],
                    "Le diabète est une maladie chronique qui survient lorsque le pancréas ne produit pas suffisamment d'insuline ou lorsque l'organisme n'utilise pas efficacement l'insuline qu'il produit. L'insuline est une hormone qui régule la glycémie (taux de sucre dans le sang).",
                ),
                KeywordCategory::new(
                    "symptoms",
                    ["symptômes", "signes", "comment savoir"],
                    "Les symptômes principaux du diabète incluent : soif excessive, urination fréquente, fatigue, vision floue, cicatrisation lente des plaies, infections fréquentes, et perte de poids inexpliquée. Si vous ressentez ces symptômes, consultez un professionnel de santé.",
                ),
                KeywordCategory::new(
                    "treatment",
                    ["traitement", "soigner", "médicaments", "insuline"],
                    "Le traitement du diabète peut inclure : une alimentation équilibrée, de l'exercice régulier, la surveillance de la glycémie, et selon le type, des médicaments oraux ou des injections d'insuline. Le plan de traitement doit toujours être personnalisé par un médecin.",
                ),
                KeywordCategory::new(
                    "prevention",
                    ["prévention", "éviter", "prévenir"],
                    "Pour prévenir le diabète de type 2 : maintenez un poids santé, adoptez une alimentation équilibrée riche en fibres et pauvre en sucres raffinés, pratiquez une activité physique régulière, limitez la consommation d'alcool et ne fumez pas.",
                ),
                KeywordCategory::new(
                    "diet",
                    ["alimentation", "manger", "régime", "nourriture"],
                    "Une alimentation diabétique doit privilégier : les légumes, les fruits à faible index glycémique, les céréales complètes, les protéines maigres, et limiter les sucres simples, les graisses saturées et les aliments transformés. Consultez un nutritionniste pour un plan personnalisé.",
                ),
            ],
            DIABETES_REDIRECT,
            DIABETES_DISCLAIMER,
        )
    }

    pub fn categories(&self) -> &[KeywordCategory] {
        &self.categories
    }

    pub fn disclaimer(&self) -> &str {
        &self.disclaimer
    }

    /// The winning category, if any trigger matched.
    pub fn classify(&self, message: &str) -> Option<&KeywordCategory> {
        let lowered = message.to_lowercase();
        let mut best: Option<&KeywordCategory> = None;
        let mut best_score = 0;

        for category in &self.categories {
            let score = category.score(&lowered);
            if score > best_score {
                best_score = score;
                best = Some(category);
            }
        }

        best
    }

    /// Answer a message: the category's response or the redirect, plus the disclaimer.
    pub fn respond(&self, message: &str) -> String {
        let body = match self.classify(message) {
            Some(category) => &category.response,
            None => &self.redirect,
        };
        format!("{body}\n\n{}", self.disclaimer)
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::diabetes_fr()
    }
}

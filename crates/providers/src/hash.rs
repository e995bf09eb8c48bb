//! Feature-hashing embedder — a dependency-free encoder.
//!
//! Each lowercase alphanumeric token is hashed (FNV-1a) into one of
//! `dimension` buckets and the resulting count vector is L2-normalized.
//! It captures lexical overlap only, but it is deterministic, needs no
//! model download, and identical texts always map to identical vectors.

use docia_core::Embedder;
use docia_core::error::EmbeddingError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(8),
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "feature-hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut h = FNV_OFFSET;
            for b in token.as_bytes() {
                h ^= u64::from(*b);
                h = h.wrapping_mul(FNV_PRIME);
            }
            let idx = (h % self.dimension as u64) as usize;
            v[idx] += 1.0;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }

        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn vectors_have_configured_dimension_and_unit_norm() {
        let embedder = HashEmbedder::new(64);
        let v = embedder.embed("Quels sont les symptômes du paludisme ?").unwrap();
        assert_eq!(v.len(), 64);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn identical_texts_are_identical_vectors() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("fever, chills, headache").unwrap();
        let b = embedder.embed("fever, chills, headache").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Fièvre; FRISSONS").unwrap();
        let b = embedder.embed("fièvre frissons").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlapping_texts_score_higher_than_disjoint() {
        let embedder = HashEmbedder::default();
        let q = embedder.embed("malaria fever treatment").unwrap();
        let near = embedder.embed("fever and malaria").unwrap();
        let far = embedder.embed("knee surgery recovery").unwrap();
        assert!(dot(&q, &near) > dot(&q, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed("  ...  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn tiny_dimension_is_clamped() {
        assert_eq!(HashEmbedder::new(2).dimension(), 8);
    }
}

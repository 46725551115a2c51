//! Cosine similarity and threshold ranking.

use crate::types::{Embedding, RetrievedPassage};
use docchat_core::{AppError, AppResult};

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// A zero-norm vector has similarity 0 with everything.
///
/// # Errors
/// Returns `AppError::DimensionMismatch` when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> AppResult<f32> {
    if a.len() != b.len() {
        return Err(AppError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

impl Embedding {
    /// Cosine similarity against another embedding of the same dimension.
    pub fn cosine_similarity(&self, other: &Embedding) -> AppResult<f32> {
        cosine_similarity(self.as_slice(), other.as_slice())
    }
}

/// Keep scored candidates strictly above `threshold`, best first, at most `limit`.
///
/// The sort is stable, so equal scores keep their input order.
pub fn rank(
    candidates: impl IntoIterator<Item = RetrievedPassage>,
    threshold: f32,
    limit: usize,
) -> Vec<RetrievedPassage> {
    let mut results: Vec<RetrievedPassage> = candidates
        .into_iter()
        .filter(|p| p.similarity > threshold)
        .collect();

    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(content: &str, similarity: f32) -> RetrievedPassage {
        RetrievedPassage {
            content: content.to_string(),
            similarity,
        }
    }

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -1.2, 4.0];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        let score = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(score.abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let pairs = [
            (vec![0.1, 0.9, -0.4], vec![0.7, -0.2, 0.5]),
            (vec![1e-3, 2e-3, 3e-3], vec![3e3, 2e3, 1e3]),
            (vec![5.0, 5.0, 5.0], vec![5.0, 5.0, 5.0]),
        ];

        for (a, b) in pairs {
            let ab = cosine_similarity(&a, &b).unwrap();
            let ba = cosine_similarity(&b, &a).unwrap();
            assert_eq!(ab, ba);
            assert!((-1.0..=1.0).contains(&ab));
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_embedding_method() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert!(a.cosine_similarity(&a).is_ok());
        assert!(a.cosine_similarity(&b).is_err());
    }

    #[test]
    fn test_rank_filters_orders_and_truncates() {
        let results = rank(
            vec![
                scored("a", 0.9),
                scored("b", 0.4),
                scored("c", 0.7),
                scored("d", 0.8),
            ],
            0.5,
            2,
        );

        let contents: Vec<&str> = results.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "d"]);
    }

    #[test]
    fn test_rank_threshold_is_strict() {
        let results = rank(vec![scored("edge", 0.5), scored("above", 0.5001)], 0.5, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "above");
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let results = rank(
            vec![scored("first", 0.8), scored("second", 0.8), scored("third", 0.8)],
            0.5,
            2,
        );
        let contents: Vec<&str> = results.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_rank_nothing_relevant() {
        let results = rank(vec![scored("low", 0.1)], 0.5, 2);
        assert!(results.is_empty());
    }
}

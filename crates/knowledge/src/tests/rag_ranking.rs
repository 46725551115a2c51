//! Tests for ranking correctness through the passage store.

use crate::store::{InMemoryPassageStore, PassageStore, SearchParams};
use crate::types::{Embedding, Passage};

/// Helper to create a normalized embedding.
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn query(v: &[f32]) -> Embedding {
    Embedding::new(normalize(v))
}

fn params(threshold: f32, limit: usize) -> SearchParams {
    SearchParams { threshold, limit }
}

#[tokio::test]
async fn test_relevant_query_returns_high_scores() {
    let store = InMemoryPassageStore::from_passages(
        4,
        vec![
            Passage::new(
                "Rust is a systems programming language",
                normalize(&[1.0, 0.5, 0.2, 0.1]),
            ),
            Passage::new("Cooking recipes for pasta", normalize(&[-0.3, -0.8, 0.4, -0.2])),
        ],
    )
    .unwrap();

    let results = store
        .search(&query(&[0.9, 0.4, 0.3, 0.1]), &params(-1.0, 5))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].content, "Rust is a systems programming language",
        "Most relevant passage should be first"
    );
    assert!(
        results[0].similarity > 0.8,
        "Relevant passage score should be high: {}",
        results[0].similarity
    );
    assert!(results[0].similarity > results[1].similarity, "Scores should be ordered");
}

#[tokio::test]
async fn test_default_threshold_drops_unrelated_passages() {
    let store = InMemoryPassageStore::from_passages(
        4,
        vec![Passage::new(
            "Rust programming language features",
            normalize(&[1.0, 0.0, 0.0, 0.0]),
        )],
    )
    .unwrap();

    let results = store
        .search(&query(&[0.0, 1.0, 0.0, 0.0]), &SearchParams::default())
        .await
        .unwrap();

    assert!(results.is_empty(), "Orthogonal passage must not pass 0.50");
}

#[tokio::test]
async fn test_scores_are_ordered_descending() {
    let store = InMemoryPassageStore::from_passages(
        3,
        vec![
            Passage::new("Text C", normalize(&[0.0, 1.0, 0.0])),
            Passage::new("Text B", normalize(&[0.7, 0.7, 0.0])),
            Passage::new("Text A", normalize(&[1.0, 0.0, 0.0])),
            Passage::new("Text D", normalize(&[-1.0, 0.0, 0.0])),
        ],
    )
    .unwrap();

    let results = store
        .search(&query(&[1.0, 0.0, 0.0]), &params(-1.0, 10))
        .await
        .unwrap();

    for i in 1..results.len() {
        assert!(
            results[i - 1].similarity >= results[i].similarity,
            "Scores should be ordered: {} >= {}",
            results[i - 1].similarity,
            results[i].similarity
        );
    }

    assert_eq!(results[0].content, "Text A");
    assert!(
        results[0].similarity > 0.99,
        "Perfect match should have score near 1.0"
    );
}

#[tokio::test]
async fn test_negative_similarity_passages() {
    let store = InMemoryPassageStore::from_passages(
        3,
        vec![Passage::new("Opposite content", normalize(&[-1.0, 0.0, 0.0]))],
    )
    .unwrap();

    let results = store
        .search(&query(&[1.0, 0.0, 0.0]), &params(-1.0, 5))
        .await
        .unwrap();

    // -1 is not strictly above -1
    assert!(results.is_empty());

    let results = store
        .search(&query(&[1.0, 0.0, 0.0]), &params(-1.01, 5))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(
        results[0].similarity > -1.01 && results[0].similarity < -0.99,
        "Should be close to -1.0"
    );
}

#[tokio::test]
async fn test_empty_store_returns_no_results() {
    let store = InMemoryPassageStore::new(3);

    let results = store
        .search(&query(&[1.0, 0.0, 0.0]), &params(-1.0, 5))
        .await
        .unwrap();

    assert_eq!(results.len(), 0, "Empty store should return no results");
}

#[tokio::test]
async fn test_limit_respected() {
    let passages = (1..=10).map(|i| {
        Passage::new(
            format!("Text {}", i),
            normalize(&[1.0, i as f32 / 10.0, 0.0]),
        )
    });
    let store = InMemoryPassageStore::from_passages(3, passages).unwrap();

    let results = store
        .search(&query(&[1.0, 0.0, 0.0]), &params(0.0, 3))
        .await
        .unwrap();

    let contents: Vec<&str> = results.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["Text 1", "Text 2", "Text 3"]);
}

#[tokio::test]
async fn test_ties_keep_insertion_order() {
    let mut store = InMemoryPassageStore::new(2);
    store
        .add_document(vec![Passage::new("first", vec![1.0, 1.0])])
        .unwrap();
    store
        .add_document(vec![
            Passage::new("second", vec![1.0, 1.0]),
            Passage::new("third", vec![1.0, 1.0]),
        ])
        .unwrap();

    let results = store
        .search(&Embedding::new(vec![1.0, 1.0]), &params(0.5, 2))
        .await
        .unwrap();

    let contents: Vec<&str> = results.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);
}

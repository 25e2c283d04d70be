//! Integration tests for outfit compatibility retrieval.
//!
//! These tests verify the full recommend path against an embedded catalog:
//! rule-scoped candidate selection, cosine ranking, the query-product failure
//! taxonomy, and tolerance for corrupt candidate embeddings.

mod common;

use std::sync::Arc;

use common::builders::ProductBuilder;
use common::harness::{set_embedding, set_raw_embedding, TestHarness};
use pretty_assertions::assert_eq;
use serde_json::json;
use vestra::embedding::provider::write_encoder_metadata;
use vestra::models::product::create_product_with_id;
use vestra::rules::OutfitRules;
use vestra::services::recommend::{
    CatalogRecommender, RecommendService, DEFAULT_RECOMMEND_LIMIT,
};
use vestra::VestraError;

async fn seed_embedded(
    harness: &TestHarness,
    key: &str,
    name: &str,
    category: &str,
    embedding: Vec<f32>,
) {
    create_product_with_id(
        &harness.db,
        key,
        ProductBuilder::new(name).category(category).build(),
    )
    .await
    .expect("Failed to create product");
    set_embedding(&harness.db, key, embedding).await;
}

fn recommender_with(harness: &TestHarness, rules: OutfitRules) -> CatalogRecommender {
    CatalogRecommender::new(harness.db.clone(), Arc::new(rules))
}

fn builtin_recommender(harness: &TestHarness) -> CatalogRecommender {
    recommender_with(harness, OutfitRules::builtin().expect("builtin rules"))
}

#[tokio::test]
async fn test_ranks_target_category_by_similarity() {
    let harness = TestHarness::new().await;

    seed_embedded(&harness, "q", "White Sneakers", "shoes", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "p1", "Plain Tee", "tshirt", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "p2", "Graphic Tee", "tshirt", vec![0.0, 1.0]).await;

    let results = builtin_recommender(&harness)
        .recommend("q", 5)
        .await
        .expect("Recommend should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "p1");
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(results[0].name.as_deref(), Some("Plain Tee"));
    assert_eq!(results[0].category.as_deref(), Some("tshirt"));
    assert_eq!(results[1].id, "p2");
    assert!(results[1].score.abs() < 1e-6);
}

/// Only rule-allowed categories may appear, however similar the style.
#[tokio::test]
async fn test_rule_targets_restrict_candidates() {
    let harness = TestHarness::new().await;

    seed_embedded(&harness, "q", "White Sneakers", "shoes", vec![1.0, 0.0]).await;
    // "dress" is not a target of "shoes" in the built-in table
    seed_embedded(&harness, "d1", "Summer Dress", "dress", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "j1", "Raw Denim", "jeans", vec![1.0, 0.0]).await;

    let results = builtin_recommender(&harness)
        .recommend("q", 5)
        .await
        .expect("Recommend should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "j1");
}

#[tokio::test]
async fn test_query_product_never_recommended() {
    let harness = TestHarness::new().await;

    // Self-targeting category makes the query product itself a candidate
    // unless it is excluded explicitly.
    let rules = OutfitRules::from_toml_str(r#"tshirt = ["tshirt"]"#).expect("rules");

    seed_embedded(&harness, "q", "Plain Tee", "tshirt", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "other", "Pocket Tee", "tshirt", vec![1.0, 0.0]).await;

    let results = recommender_with(&harness, rules)
        .recommend("q", 5)
        .await
        .expect("Recommend should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "other");
}

#[tokio::test]
async fn test_unknown_category_falls_back_to_default_entry() {
    let harness = TestHarness::new().await;

    let rules = OutfitRules::from_toml_str(
        r#"
        shoes = ["tshirt"]
        default = ["shoes"]
        "#,
    )
    .expect("rules");

    seed_embedded(&harness, "q", "Space Suit", "spacesuit", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "s1", "White Sneakers", "shoes", vec![1.0, 0.0]).await;

    let results = recommender_with(&harness, rules)
        .recommend("q", 5)
        .await
        .expect("Recommend should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "s1");
}

/// An explicit empty entry means "nothing completes this" and wins over the
/// default fallback.
#[tokio::test]
async fn test_explicit_empty_entry_yields_no_recommendations() {
    let harness = TestHarness::new().await;

    let rules = OutfitRules::from_toml_str(
        r#"
        hat = []
        default = ["shoes"]
        "#,
    )
    .expect("rules");

    seed_embedded(&harness, "q", "Bucket Hat", "hat", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "s1", "White Sneakers", "shoes", vec![1.0, 0.0]).await;

    let results = recommender_with(&harness, rules)
        .recommend("q", 5)
        .await
        .expect("Recommend should succeed");

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let harness = TestHarness::new().await;

    let err = builtin_recommender(&harness)
        .recommend("ghost", 5)
        .await
        .expect_err("Unknown product should error");

    match err {
        VestraError::NotFound { id } => assert_eq!(id, "ghost"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

/// A product that exists but was never embedded is a distinct failure, never
/// silently "no results".
#[tokio::test]
async fn test_unembedded_query_is_missing_embedding() {
    let harness = TestHarness::new().await;

    create_product_with_id(
        &harness.db,
        "raw",
        ProductBuilder::new("Unprocessed Tee").category("tshirt").build(),
    )
    .await
    .expect("Failed to create product");

    let err = builtin_recommender(&harness)
        .recommend("raw", 5)
        .await
        .expect_err("Unembedded product should error");

    assert!(matches!(err, VestraError::MissingEmbedding { .. }));
}

#[tokio::test]
async fn test_corrupt_query_embedding_is_invalid() {
    let harness = TestHarness::new().await;

    create_product_with_id(
        &harness.db,
        "bad",
        ProductBuilder::new("Corrupt Tee").category("tshirt").build(),
    )
    .await
    .expect("Failed to create product");
    set_raw_embedding(&harness.db, "bad", json!("corrupt")).await;

    let err = builtin_recommender(&harness)
        .recommend("bad", 5)
        .await
        .expect_err("Corrupt embedding should error");

    assert!(matches!(err, VestraError::InvalidEmbedding { .. }));
}

/// Once a fusion run has recorded the encoder width, a query embedding of
/// another width is rejected rather than compared.
#[tokio::test]
async fn test_query_width_checked_against_recorded_encoder() {
    let harness = TestHarness::new().await;

    write_encoder_metadata(&harness.db, "stub-encoder", 4)
        .await
        .expect("Failed to write encoder metadata");
    seed_embedded(&harness, "q", "White Sneakers", "shoes", vec![1.0, 0.0]).await;

    let err = builtin_recommender(&harness)
        .recommend("q", 5)
        .await
        .expect_err("Width mismatch should error");

    match err {
        VestraError::InvalidEmbedding { reason, .. } => {
            assert!(reason.contains("expected 4 dimensions"), "reason: {reason}");
        }
        other => panic!("expected InvalidEmbedding, got {:?}", other),
    }
}

/// One bad candidate must not fail the request; it is skipped.
#[tokio::test]
async fn test_corrupt_candidate_skipped_not_fatal() {
    let harness = TestHarness::new().await;

    seed_embedded(&harness, "q", "White Sneakers", "shoes", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "good", "Plain Tee", "tshirt", vec![0.9, 0.1]).await;
    seed_embedded(&harness, "wide", "Wide Tee", "tshirt", vec![1.0, 0.0, 0.0]).await;

    create_product_with_id(
        &harness.db,
        "corrupt",
        ProductBuilder::new("Corrupt Tee").category("tshirt").build(),
    )
    .await
    .expect("Failed to create product");
    set_raw_embedding(&harness.db, "corrupt", json!({"not": "a vector"})).await;

    let results = builtin_recommender(&harness)
        .recommend("q", 5)
        .await
        .expect("Recommend should tolerate bad candidates");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "good");
}

#[tokio::test]
async fn test_results_capped_best_first() {
    let harness = TestHarness::new().await;

    seed_embedded(&harness, "q", "White Sneakers", "shoes", vec![1.0, 0.0]).await;
    // Descending similarity as the index grows
    for i in 0..8 {
        let angle = i as f32 * 0.15;
        seed_embedded(
            &harness,
            &format!("j{}", i),
            &format!("Jeans {}", i),
            "jeans",
            vec![angle.cos(), angle.sin()],
        )
        .await;
    }

    let recommender = builtin_recommender(&harness);

    let results = recommender
        .recommend("q", DEFAULT_RECOMMEND_LIMIT)
        .await
        .expect("Recommend should succeed");
    assert_eq!(results.len(), 5);
    assert_eq!(results[0].id, "j0");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score, "results must be best-first");
    }

    let top2 = recommender
        .recommend("q", 2)
        .await
        .expect("Recommend should succeed");
    assert_eq!(top2.len(), 2);
    assert_eq!(top2[0].id, "j0");
    assert_eq!(top2[1].id, "j1");
}

/// Equal scores order by ascending id, so a fixed catalog always ranks
/// identically.
#[tokio::test]
async fn test_equal_scores_order_by_id() {
    let harness = TestHarness::new().await;

    seed_embedded(&harness, "q", "White Sneakers", "shoes", vec![1.0, 0.0]).await;
    seed_embedded(&harness, "zz", "Zeta Tee", "tshirt", vec![2.0, 0.0]).await;
    seed_embedded(&harness, "aa", "Alpha Tee", "tshirt", vec![3.0, 0.0]).await;

    let results = builtin_recommender(&harness)
        .recommend("q", 5)
        .await
        .expect("Recommend should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "aa");
    assert_eq!(results[1].id, "zz");
}

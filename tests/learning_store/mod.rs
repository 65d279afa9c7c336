use leadscout_core::db;
use leadscout_core::learning_store::LearningStore;
use leadscout_core::model::{Classification, Ethnicity, Method};
use leadscout_core::normalize::normalize_name;
use std::time::Instant;

async fn fresh_store() -> LearningStore {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.db");
    std::mem::forget(dir);
    let pool = db::connect(path.to_str().unwrap()).await.unwrap();
    LearningStore::new(pool)
}

fn llm_classification(joined: &str, ethnicity: Ethnicity) -> Classification {
    Classification {
        input_name: joined.to_string(),
        normalized_name: joined.to_string(),
        ethnicity,
        confidence: 0.92,
        method: Method::Llm,
        processing_time_ms: 2.0,
        phonetic_details: None,
        llm_cost_usd: Some(0.0015),
        llm_tokens: Some(64),
        error: None,
    }
}

#[tokio::test]
async fn storing_an_llm_result_makes_it_a_cache_hit_next_time() {
    let store = fresh_store().await;
    let (normalized, _) = normalize_name("Xiluva Rirhandzu");
    let classification = llm_classification(&normalized.joined, Ethnicity::African);
    store.store(&normalized, &classification).await.unwrap();

    let hit = store
        .lookup(&normalized, "Xiluva Rirhandzu", Instant::now())
        .await
        .unwrap()
        .expect("expected a cached hit");
    assert_eq!(hit.method, Method::Cache);
    assert_eq!(hit.ethnicity, Ethnicity::African);
}

#[tokio::test]
async fn higher_confidence_store_overwrites_a_lower_confidence_prior_entry() {
    let store = fresh_store().await;
    let (normalized, _) = normalize_name("Ashwin Patel");

    let mut low = llm_classification(&normalized.joined, Ethnicity::White);
    low.confidence = 0.55;
    store.store(&normalized, &low).await.unwrap();

    let high = llm_classification(&normalized.joined, Ethnicity::Indian);
    store.store(&normalized, &high).await.unwrap();

    let hit = store
        .lookup(&normalized, "Ashwin Patel", Instant::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.ethnicity, Ethnicity::Indian);
}

#[tokio::test]
async fn empty_input_never_touches_the_store() {
    let store = fresh_store().await;
    let (normalized, _) = normalize_name("   ");
    assert!(store
        .lookup(&normalized, "", Instant::now())
        .await
        .unwrap()
        .is_none());
}

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{BrokenStore, FailingModel, RecordingModel, VocabularyEmbedder};
use dayplan::{
    Assistant, Config, ContextStore, Document, ErrorKind, InMemoryStore, PlanGenerator,
    PlanRequest, TokenCounter,
};

fn october_7() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 7).unwrap()
}

async fn seeded_store() -> Arc<ContextStore> {
    let store = ContextStore::with_backend(VocabularyEmbedder::shared(), Arc::new(InMemoryStore::new()));
    store
        .add_document("Meeting with Bob at 3pm", "calendar", "meeting-1")
        .await
        .unwrap();
    store
        .add_document("Email from Alice: invoice due Friday", "email", "mail-1")
        .await
        .unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn plan_is_one_grounded_call_returned_verbatim() {
    let store = seeded_store().await;
    let reply = "1. Call client (15 min)\n2. Pay invoice (10 min)\n   ";
    let model = RecordingModel::replying(reply);
    let planner = PlanGenerator::new(store, model.clone());

    let plan = planner
        .generate_daily_plan(october_7(), "call client before noon")
        .await
        .unwrap();

    assert_eq!(plan, reply);

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    let (segments, temperature) = &calls[0];
    assert_eq!(segments.len(), 2);
    assert_eq!(*temperature, 0.5);

    let input = segments.join("\n");
    assert!(input.contains("- Meeting with Bob at 3pm"));
    assert!(input.contains("- Email from Alice: invoice due Friday"));
    assert!(input.contains("call client before noon"));
    assert!(!segments[0].contains("call client before noon"));
}

#[tokio::test]
async fn plan_over_empty_store_still_calls_the_model() {
    let store = Arc::new(ContextStore::with_backend(
        VocabularyEmbedder::shared(),
        Arc::new(InMemoryStore::new()),
    ));
    let model = RecordingModel::replying("1. Free day");
    let planner = PlanGenerator::new(store, model.clone());

    let plan = planner.generate_daily_plan(october_7(), "").await.unwrap();
    assert_eq!(plan, "1. Free day");
    assert_eq!(model.calls().len(), 1);
}

#[tokio::test]
async fn model_failure_is_a_generation_error_without_retry() {
    let store = seeded_store().await;
    let model = Arc::new(FailingModel::default());
    let planner = PlanGenerator::new(store, model.clone());

    let err = planner
        .generate_daily_plan(october_7(), "anything")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Generation);
    assert_eq!(model.attempts(), 1);
}

#[tokio::test]
async fn retrieval_failure_is_a_storage_error_and_skips_the_model() {
    let store = Arc::new(ContextStore::with_backend(
        VocabularyEmbedder::shared(),
        Arc::new(BrokenStore),
    ));
    let model = RecordingModel::replying("unused");
    let planner = PlanGenerator::new(store, model.clone());

    let err = planner
        .generate_daily_plan(october_7(), "anything")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn context_budget_keeps_the_best_match() {
    let store = seeded_store().await;
    let model = RecordingModel::replying("ok");
    let planner = PlanGenerator::new(store, model.clone())
        .with_context_budget(TokenCounter::cl100k().unwrap(), 1);

    planner.generate_daily_plan(october_7(), "").await.unwrap();

    let (segments, _) = &model.calls()[0];
    let bullets = segments[1].lines().filter(|l| l.starts_with("- ")).count();
    assert_eq!(bullets, 1);
}

#[tokio::test]
async fn revision_sends_existing_plan_and_guidance() {
    let store = seeded_store().await;
    let model = RecordingModel::replying("1. Revised");
    let planner = PlanGenerator::new(store, model.clone());

    let plan = planner
        .revise_plan("1. Email (30 min)", "move email to the afternoon")
        .await
        .unwrap();
    assert_eq!(plan, "1. Revised");

    let (segments, _) = &model.calls()[0];
    assert!(segments[1].contains("1. Email (30 min)"));
    assert!(segments[1].contains("move email to the afternoon"));

    let err = planner.revise_plan("  ", "x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(model.calls().len(), 1);
}

#[tokio::test]
async fn missing_api_key_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path().join("never-created"));

    let err = Assistant::from_config(&config).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!dir.path().join("never-created").exists());

    let err = PlanGenerator::from_config(&config, seeded_store().await)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn blank_api_key_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_data_dir(dir.path().join("never-created"));
    config.gemini_api_key = Some("   ".to_string());

    let err = Assistant::from_config(&config).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!dir.path().join("never-created").exists());
}

#[tokio::test]
async fn assistant_exposes_boundary_operations() {
    let store = seeded_store().await;
    let model = RecordingModel::replying("1. Plan");
    let assistant = Assistant::new(store.clone(), PlanGenerator::new(store, model.clone()));

    let receipt = assistant
        .ingest(&Document::new("note-3", "Dentist appointment Thursday", "manual_note"))
        .await
        .unwrap();
    assert_eq!(receipt.doc_id, "note-3");
    assert!(receipt.success);

    let status = assistant.query_status().await.unwrap();
    assert_eq!(status.model_name, "recording-model");
    assert_eq!(status.document_count, Some(3));
    assert_eq!(assistant.store().document_count().await.unwrap(), 3);

    let plan = assistant
        .generate_plan(&PlanRequest::new(october_7(), "no meetings after 5pm"))
        .await
        .unwrap();
    assert_eq!(plan.target_date, october_7());
    assert_eq!(plan.plan, "1. Plan");
}

//! End-to-end invocations against the in-memory store and orchestrator

use chrono::{TimeZone, Utc};
use lakeplan_compiler::engine::{keys, NON_PARTITIONED_EXTRACTOR};
use lakeplan_compiler::{CompilerConfig, KeyGenerator};
use lakeplan_config::{ConfigError, PipelineType};
use lakeplan_core::{
    ExecutionStatus, FixedClock, InMemoryConfigStore, InMemoryOrchestrator, LaunchConfig,
    LaunchError, LaunchRequest, PipelineLauncher, RetryPolicy,
};
use lakeplan_test_utils::{pipeline_record, TableFixture, CURATED_LAKE, RAW_LAKE, TENANT};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    store: Arc<InMemoryConfigStore>,
    orchestrator: Arc<InMemoryOrchestrator>,
    service: PipelineLauncher,
}

fn harness(retry: RetryPolicy) -> Harness {
    let store = Arc::new(InMemoryConfigStore::new().with_page_size(1));
    let orchestrator = Arc::new(InMemoryOrchestrator::new());
    let config = LaunchConfig::new("ingest-plan", CompilerConfig::new(RAW_LAKE, CURATED_LAKE))
        .with_caller_identity("launch-fn")
        .with_retry(retry);
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());

    let service = PipelineLauncher::with_clock(
        config,
        store.clone(),
        orchestrator.clone(),
        Arc::new(clock),
    );
    Harness {
        store,
        orchestrator,
        service,
    }
}

#[tokio::test]
async fn bulk_insert_single_table_launches_one_step() {
    let h = harness(RetryPolicy::default());
    h.store.insert(pipeline_record(TENANT, PipelineType::BulkInsert));
    h.store.insert(TableFixture::new("sales_orders").build(TENANT));

    let response = h
        .service
        .handle_value(json!({ "Identifier": TENANT, "PipelineType": "bulk_insert" }))
        .await;

    assert_eq!(response.status, 200);
    let handle = response.execution_handle.unwrap();
    assert_eq!(handle.execution_name, "t1-bulk_insert-20240102030405");
    assert_eq!(handle.status, ExecutionStatus::Running);

    let submitted = h.orchestrator.executions();
    assert_eq!(submitted.len(), 1);
    let document = &submitted[0].document;
    assert_eq!(submitted[0].plan_identity, "ingest-plan");
    assert_eq!(document.caller_identity, "launch-fn");
    assert_eq!(document.steps.len(), 1);

    let step = &document.steps[0];
    assert_eq!(step.step_name, "sales_orders");
    assert_eq!(step.flag_value("--op"), Some("BULK_INSERT"));
    let conf = step.flag_values("--hoodie-conf");
    let extractor = format!("{}={NON_PARTITIONED_EXTRACTOR}", keys::SYNC_PARTITION_EXTRACTOR);
    let generator = format!(
        "{}={}",
        keys::KEY_GENERATOR_CLASS,
        KeyGenerator::Nonpartitioned.class_name()
    );
    assert!(conf.contains(&extractor.as_str()));
    assert!(conf.contains(&generator.as_str()));
}

#[tokio::test]
async fn all_tables_disabled_fails_with_empty_plan() {
    let h = harness(RetryPolicy::default());
    h.store.insert(pipeline_record(TENANT, PipelineType::BulkInsert));
    h.store.insert(TableFixture::new("sales_orders").disabled().build(TENANT));

    let err = h
        .service
        .launch(&LaunchRequest::new(TENANT, "bulk_insert"))
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("bulk_insert"));
    assert!(h.orchestrator.executions().is_empty());
}

#[tokio::test]
async fn unsupported_pipeline_type_fails_immediately() {
    let h = harness(RetryPolicy::default());
    h.store.insert(pipeline_record(TENANT, PipelineType::BulkInsert));
    h.store.insert(TableFixture::new("broken").without_engine_field("record_key").build(TENANT));

    let err = h
        .service
        .launch(&LaunchRequest::new(TENANT, "snapshot"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LaunchError::Config(ConfigError::UnsupportedPipelineType(ref requested)) if requested == "snapshot"
    ));
    assert!(h.orchestrator.executions().is_empty());

    let response = h
        .service
        .handle(&LaunchRequest::new(TENANT, "snapshot"))
        .await;
    assert_eq!(response.status, 400);
    assert!(response.execution_handle.is_none());
}

#[tokio::test(start_paused = true)]
async fn running_execution_blocks_relaunch_until_cap() {
    let h = harness(RetryPolicy::default().with_max_elapsed(Duration::from_secs(10)));
    h.store.insert(pipeline_record(TENANT, PipelineType::ContinuousUpsert));
    h.store.insert(TableFixture::new("events").build(TENANT));
    let request = LaunchRequest::new(TENANT, "continuous_upsert");

    let first = h.service.launch(&request).await.unwrap();
    assert_eq!(h.orchestrator.running_count("ingest-plan"), 1);

    let start = tokio::time::Instant::now();
    let err = h.service.launch(&request).await.unwrap_err();
    assert!(matches!(
        &err,
        LaunchError::Conflict { execution_name, .. } if *execution_name == first.execution_name
    ));
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert_eq!(h.orchestrator.executions().len(), 1);
}

#[tokio::test]
async fn finished_execution_frees_plan_but_name_must_differ() {
    let h = harness(RetryPolicy::NONE);
    h.store.insert(pipeline_record(TENANT, PipelineType::IncrementalUpsert));
    h.store.insert(TableFixture::new("customers").partitioned("region").build(TENANT));
    let request = LaunchRequest::new(TENANT, "incremental_upsert");

    let first = h.service.launch(&request).await.unwrap();
    assert!(h.orchestrator.complete(&first.execution_name, ExecutionStatus::Succeeded));

    // Same second on the fixed clock, so the orchestrator sees a duplicate name.
    let response = h.service.handle(&request).await;
    assert_eq!(response.status, 400);
    assert!(response.error_message.unwrap().contains("already in use"));
}

#[tokio::test]
async fn other_tenants_records_are_ignored() {
    let h = harness(RetryPolicy::NONE);
    h.store.insert(pipeline_record(TENANT, PipelineType::BulkInsert));
    h.store.insert(TableFixture::new("mine").build(TENANT));
    h.store.insert(pipeline_record("t2", PipelineType::BulkInsert));
    h.store.insert(TableFixture::new("theirs").build("t2"));

    let document = h.service.compile(TENANT, "bulk_insert").await.unwrap();
    let names: Vec<&str> = document.steps.iter().map(|s| s.step_name.as_str()).collect();
    assert_eq!(names, vec!["mine"]);
}

//! End-to-end runs of page-indexed datasets

use crate::support::{
    create_test_config, list_body, mount_page_count, mount_term_page, terms, NoQueryParam,
};
use dorg_harvest::pipeline::{Orchestrator, RunOptions};
use dorg_harvest::{Dataset, HarvestError};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn read_chunk(dir: &std::path::Path, index: u64) -> Value {
    let content = std::fs::read_to_string(dir.join(format!("page_{}.json", index)))
        .expect("chunk should exist");
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_full_harvest_writes_one_chunk_per_page() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 3).await;
    mount_term_page(&mock_server, 0, terms(1, 2)).await;
    mount_term_page(&mock_server, 1, terms(3, 2)).await;
    mount_term_page(&mock_server, 2, terms(5, 1)).await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.total_units, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.records, 5);

    let dir = tmp.path().join("module_terms");
    assert_eq!(
        read_chunk(&dir, 0),
        json!([{"id": "1", "name": "term 1"}, {"id": "2", "name": "term 2"}])
    );
    assert_eq!(read_chunk(&dir, 2), json!([{"id": "5", "name": "term 5"}]));
    assert!(!dir.join("page_3.json").exists());

    // Chunks are compact with keys in mapping order
    let raw = std::fs::read_to_string(dir.join("page_2.json")).unwrap();
    assert_eq!(raw, r#"[{"id":"5","name":"term 5"}]"#);
}

#[tokio::test]
async fn test_requests_carry_filters_and_sort() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 1).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("vocabulary[]", "3"))
        .and(query_param("vocabulary[]", "44"))
        .and(query_param("vocabulary[]", "46"))
        .and(query_param("sort", "tid"))
        .and(query_param("direction", "ASC"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            &mock_server,
            "taxonomy_term.json",
            terms(1, 1),
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
}

#[tokio::test]
async fn test_empty_resource_writes_nothing() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api-d7/node.json"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": []})))
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::Event, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total_units, 0);
    assert!(report.is_clean());
    let chunks = std::fs::read_dir(tmp.path().join("event")).unwrap().count();
    assert_eq!(chunks, 0);
}

#[tokio::test]
async fn test_failed_probe_aborts_with_count_unavailable() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api-d7/node.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let err = orchestrator
        .run_dataset(Dataset::Module, &RunOptions::default())
        .await
        .unwrap_err();

    match err {
        HarvestError::CountUnavailable { dataset, .. } => assert_eq!(dataset, "module"),
        other => panic!("expected CountUnavailable, got {other}"),
    }
    assert!(!tmp.path().join("module").exists());
}

#[tokio::test]
async fn test_unparseable_last_link_is_count_unavailable() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api-d7/node.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [{"nid": "1"}],
            "last": "https://www.drupal.org/api-d7/node.json?type=theme"
        })))
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let err = orchestrator
        .run_dataset(Dataset::Theme, &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::CountUnavailable { .. }));
}

#[tokio::test]
async fn test_failed_unit_is_contained() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 10).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("page", "5"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    for page in 0..10 {
        mount_term_page(&mock_server, page, terms(page * 10, 2)).await;
    }

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 9);
    assert_eq!(report.failed, 1);
    assert_eq!(report.first_failed_unit(), Some(5));
    assert!(!report.is_clean());

    let dir = tmp.path().join("module_terms");
    assert!(!dir.join("page_5.json").exists());
    assert!(dir.join("page_4.json").exists());
    assert!(dir.join("page_6.json").exists());
}

#[tokio::test]
async fn test_slow_page_times_out_and_fails_alone() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 3).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(list_body(&mock_server, "taxonomy_term.json", terms(3, 2), None))
                .set_delay(Duration::from_secs(30)),
        )
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_term_page(&mock_server, 0, terms(1, 2)).await;
    mount_term_page(&mock_server, 2, terms(5, 1)).await;

    let mut config = create_test_config(&mock_server, tmp.path());
    config.api.request_timeout = 1;

    let orchestrator = Orchestrator::new(config).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.first_failed_unit(), Some(1));
    assert!(report.elapsed < Duration::from_secs(10));

    let dir = tmp.path().join("module_terms");
    assert!(!dir.join("page_1.json").exists());
    assert!(dir.join("page_0.json").exists());
    assert!(dir.join("page_2.json").exists());
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 1).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_term_page(&mock_server, 0, terms(1, 3)).await;

    let mut config = create_test_config(&mock_server, tmp.path());
    config.api.max_retries = 2;

    let orchestrator = Orchestrator::new(config).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.records, 3);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 1).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, tmp.path());
    config.api.max_retries = 3;

    let orchestrator = Orchestrator::new(config).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert!(report.failures[0].reason.contains("404"));
}

#[tokio::test]
async fn test_malformed_body_fails_unit() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 2).await;
    mount_term_page(&mock_server, 0, terms(1, 1)).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert!(!tmp.path().join("module_terms").join("page_1.json").exists());
}

#[tokio::test]
async fn test_resume_leaves_earlier_chunks_untouched() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let dir = tmp.path().join("module_terms");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("page_0.json"), "sentinel").unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 3).await;
    for page in 0..2 {
        Mock::given(method("GET"))
            .and(path("/api-d7/taxonomy_term.json"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;
    }
    mount_term_page(&mock_server, 2, terms(9, 1)).await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let options = RunOptions {
        start_from: 2,
        ..RunOptions::default()
    };
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &options)
        .await
        .unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(
        std::fs::read_to_string(dir.join("page_0.json")).unwrap(),
        "sentinel"
    );
    assert!(!dir.join("page_1.json").exists());
    assert!(dir.join("page_2.json").exists());
}

#[tokio::test]
async fn test_skip_existing_skips_chunks_on_disk() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let dir = tmp.path().join("module_terms");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("page_1.json"), "[]").unwrap();
    std::fs::write(dir.join("page_2.json.tmp"), "[{").unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 3).await;
    mount_term_page(&mock_server, 0, terms(1, 1)).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_term_page(&mock_server, 2, terms(3, 1)).await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let options = RunOptions {
        skip_existing: true,
        ..RunOptions::default()
    };
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &options)
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.total_units, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.succeeded, 2);
    assert!(!dir.join("page_2.json.tmp").exists());
    assert_eq!(read_chunk(&dir, 2), json!([{"id": "3", "name": "term 3"}]));
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 2).await;
    mount_term_page(&mock_server, 0, terms(1, 3)).await;
    mount_term_page(&mock_server, 1, terms(4, 3)).await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let dir = tmp.path().join("module_terms");

    orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();
    let first: Vec<Vec<u8>> = (0..2)
        .map(|i| std::fs::read(dir.join(format!("page_{}.json", i))).unwrap())
        .collect();

    orchestrator
        .run_dataset(Dataset::ModuleTerms, &RunOptions::default())
        .await
        .unwrap();
    let second: Vec<Vec<u8>> = (0..2)
        .map(|i| std::fs::read(dir.join(format!("page_{}.json", i))).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_gate_bounds_parallel_requests() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page_count(&mock_server, "taxonomy_term.json", 6).await;
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(NoQueryParam("full"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"list": [{"tid": "1", "name": "x"}]}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(create_test_config(&mock_server, tmp.path())).unwrap();
    let options = RunOptions {
        concurrency: Some(3),
        ..RunOptions::default()
    };
    let report = orchestrator
        .run_dataset(Dataset::ModuleTerms, &options)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 6);
    // Six 200ms pages through a gate of three take two waves, not one or six.
    assert!(report.elapsed >= Duration::from_millis(400), "{:?}", report.elapsed);
    assert!(report.elapsed < Duration::from_millis(1100), "{:?}", report.elapsed);
}

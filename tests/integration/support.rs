//! Shared fixtures: mock API responses and test configuration

use dorg_harvest::config::Config;
use serde_json::{json, Value};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests that do not carry a query parameter
pub struct NoQueryParam(pub &'static str);

impl Match for NoQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

/// Creates a test configuration pointing at a mock server
///
/// Retries are disabled so failure tests stay fast; tests that exercise
/// retries turn them back on.
pub fn create_test_config(server: &MockServer, data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api-d7", server.uri());
    config.api.max_retries = 0;
    config.api.retry_delay = 10;
    config.user_agent.client_name = "TestHarvester".to_string();
    config.fetch.page_concurrency = 4;
    config.output.data_dir = data_dir.display().to_string();
    config.output.id_list_path = data_dir.join("uids.json").display().to_string();
    config
}

/// A list envelope whose `last` link points at `last_page`
pub fn list_body(server: &MockServer, endpoint: &str, list: Value, last_page: Option<u64>) -> Value {
    let mut body = json!({
        "self": format!("{}/api-d7/{}", server.uri(), endpoint),
        "list": list,
    });
    if let Some(page) = last_page {
        body["last"] = json!(format!(
            "{}/api-d7/{}?sort=tid&direction=ASC&page={}",
            server.uri(),
            endpoint,
            page
        ));
    }
    body
}

/// Mounts the probe and count responses for an endpoint with `pages` pages
///
/// The probe (page size 1) reports a much larger last index than the real
/// count, as the live API does.
pub async fn mount_page_count(server: &MockServer, endpoint: &str, pages: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api-d7/{}", endpoint)))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            server,
            endpoint,
            json!([{"tid": "1"}]),
            Some(pages * 50 - 1),
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api-d7/{}", endpoint)))
        .and(query_param("full", "0"))
        .and(NoQueryParam("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            server,
            endpoint,
            json!([{"tid": "1"}]),
            Some(pages - 1),
        )))
        .mount(server)
        .await;
}

/// Raw taxonomy terms `first..first+count`
pub fn terms(first: u64, count: u64) -> Value {
    Value::Array(
        (first..first + count)
            .map(|tid| json!({"tid": tid.to_string(), "name": format!("term {}", tid), "vid": "3"}))
            .collect(),
    )
}

/// Mounts one page of taxonomy terms
pub async fn mount_term_page(server: &MockServer, page: u64, list: Value) {
    Mock::given(method("GET"))
        .and(path("/api-d7/taxonomy_term.json"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            server,
            "taxonomy_term.json",
            list,
            None,
        )))
        .mount(server)
        .await;
}

use std::sync::Arc;

use ::http::{Method, Request, StatusCode};
use bson::doc;
use grid_store::MemoryStore;
use grid_tables::{PlainRenderer, TableConfig, TableError, TableHttp, TableService};
use serde_json::{Value, json};

const COLLECTION: &str = "accounts";

fn store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store
        .insert_many(
            COLLECTION,
            vec![
                doc! { "_id": "acct-1", "name": "Acme Corp", "status": "active", "revenue": 50000.0, "address": { "city": "Austin" }, "uptime": 11045_i64 },
                doc! { "_id": "acct-2", "name": "Globex", "status": "rejected", "revenue": 80000.0, "uptime": 60_i64 },
                doc! { "_id": "acct-3", "name": "Initech", "status": "active", "revenue": 12000.0, "address": { "city": "Boston" }, "uptime": 3600_i64 },
                doc! { "_id": "acct-4", "name": "Umbrella", "status": "active", "revenue": 95000.0, "uptime": 0_i64 },
                doc! { "_id": "acct-5", "name": "Stark Industries", "status": "snoozed", "revenue": 200000.0, "uptime": 5_i64 },
            ],
        )
        .unwrap();
    Arc::new(store)
}

fn active_config() -> TableConfig {
    TableConfig::from_json(
        r#"{
            "collection": "accounts",
            "max_rows": 10,
            "columns": [
                { "name": "name" },
                { "name": "address.city" },
                { "name": "uptime", "format": { "kind": "duration" } }
            ],
            "search_fields": ["name"],
            "row": ["<b>{{ name }}</b>", "{{ address_city }}", "{{ uptime.formatted }}"],
            "highlight_search": true,
            "filters": [{ "field": "name", "value": { "type": "string_set", "value": ["Acme Corp", "Initech", "Umbrella"] } }]
        }"#,
    )
    .unwrap()
}

fn all_config() -> TableConfig {
    TableConfig::from_json(
        r#"{
            "collection": "accounts",
            "columns": [{ "name": "name" }, { "name": "status" }, { "name": "revenue" }]
        }"#,
    )
    .unwrap()
}

fn handler(config: TableConfig) -> TableHttp<MemoryStore> {
    TableHttp::new(TableService::new(config, store()).unwrap())
}

fn get(uri: &str) -> Request<Vec<u8>> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Vec::new())
        .unwrap()
}

fn post_form(body: &str) -> Request<Vec<u8>> {
    Request::builder()
        .method(Method::POST)
        .uri("/data")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body.as_bytes().to_vec())
        .unwrap()
}

fn body(response: &::http::Response<Vec<u8>>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn config_lists_columns() {
    let response = handler(active_config()).handle(get("/config")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        body(&response),
        json!({ "columns": ["name", "address.city", "uptime"], "max_rows": 10, "searchable": true })
    );
}

#[tokio::test]
async fn post_form_renders_templates() {
    let response = handler(active_config())
        .handle(post_form("start=0&length=10&order[0][column]=0&order[0][dir]=desc"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body(&response),
        json!({
            "data": [
                ["<b>Umbrella</b>", "", "0h 0m 0s"],
                ["<b>Initech</b>", "Boston", "1h 0m 0s"],
                ["<b>Acme Corp</b>", "Austin", "3h 4m 5s"],
            ],
            "recordsTotal": 5,
            "recordsFiltered": 3,
        })
    );
}

#[tokio::test]
async fn get_query_string_searches_and_highlights() {
    let response = handler(active_config())
        .handle(get("/data?start=0&length=5&search%5Bvalue%5D=ini"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body(&response),
        json!({
            "data": [[
                r#"<b><span class="textHighlighted">Ini</span>tech</b>"#,
                "Boston",
                "1h 0m 0s",
            ]],
            "recordsTotal": 5,
            "recordsFiltered": 1,
        })
    );
}

#[tokio::test]
async fn unfiltered_table_reports_total_as_filtered() {
    let service = TableService::new(all_config(), store())
        .unwrap()
        .with_renderer(PlainRenderer);
    let response = TableHttp::new(service)
        .handle(get("/data?start=3&length=-1&order[0][column]=2"))
        .await;
    assert_eq!(
        body(&response),
        json!({
            "data": [
                ["Umbrella", "active", "95000"],
                ["Stark Industries", "snoozed", "200000"],
            ],
            "recordsTotal": 5,
            "recordsFiltered": 5,
        })
    );
}

#[tokio::test]
async fn empty_result_is_an_empty_array() {
    let response = handler(active_config())
        .handle(get("/data?search[value]=nothing-matches"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body(&response),
        json!({ "data": [], "recordsTotal": 5, "recordsFiltered": 0 })
    );
}

#[tokio::test]
async fn oversized_page_is_a_bad_request() {
    let response = handler(active_config())
        .handle(post_form("length=11"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body(&response)["error"].as_str().unwrap().contains("length"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = handler(all_config()).handle(get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(&response), json!({ "error": "not found" }));
}

#[tokio::test]
async fn cancelled_request_is_unavailable() {
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let response = handler(all_config())
        .handle_with_cancel(get("/data"), &cancel)
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn invalid_config_is_rejected_by_the_service() {
    let mut config = all_config();
    config.search_fields = vec!["email".into()];
    assert!(matches!(
        TableService::new(config, store()),
        Err(TableError::Config(_))
    ));
}

use pretty_assertions::assert_eq;
use serde_json::json;
use stockflow_protocol::LineItem;
use stockflow_protocol::StepContext;
use stockflow_protocol::UserRef;
use stockflow_store::HttpStepStore;
use stockflow_store::RemoteStepStore;
use stockflow_store::StoreError;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

fn api_base(server: &MockServer) -> String {
    format!("{}/openboxes/api", server.uri())
}

fn pack_page(items: serde_json::Value) -> serde_json::Value {
    json!({ "data": { "packPage": { "packPageItems": items } } })
}

#[tokio::test]
async fn fetch_reads_pack_page_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openboxes/api/stockMovements/sm-1"))
        .and(query_param("stepNumber", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pack_page(json!([
            { "id": 1, "recipient": null, "splitLineItems": [] }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let items = store.fetch(&StepContext::packing("sm-1")).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id.as_str(), "1");
    assert_eq!(items[0].recipient, None);
}

#[tokio::test]
async fn fetch_surfaces_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openboxes/api/stockMovements/sm-1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let err = store.fetch(&StepContext::packing("sm-1")).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.is_network_failure());
}

#[tokio::test]
async fn fetch_rejects_duplicate_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openboxes/api/stockMovements/sm-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pack_page(json!([{ "id": "a" }, { "id": "a" }]))),
        )
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let err = store.fetch(&StepContext::packing("sm-1")).await.unwrap_err();

    assert!(matches!(err, StoreError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn save_posts_flattened_full_collection_and_returns_echo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openboxes/api/stockMovements/sm-1"))
        .and(body_json(json!({
            "id": "sm-1",
            "stepNumber": "5",
            "packPageItems": [{
                "id": "1",
                "quantityShipped": 5,
                "recipient.id": "u1",
                "recipient.name": "Ann Lee",
                "palletName": "PAL-1",
                "boxName": null,
                "splitLineItems": []
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(pack_page(json!([
            { "id": "1", "palletName": "PAL-1", "boxName": "BOX-9",
              "recipient": { "id": "u1", "name": "Ann Lee" } }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let mut item = LineItem::new("1");
    item.quantity_shipped = Some(5.into());
    item.recipient = Some(UserRef::new("u1", "Ann Lee"));
    item.pallet_name = Some("PAL-1".to_string());

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let canonical = store
        .save(&StepContext::packing("sm-1"), vec![item])
        .await
        .unwrap()
        .expect("non-empty save returns items");

    assert_eq!(canonical[0].box_name.as_deref(), Some("BOX-9"));
}

#[tokio::test]
async fn empty_save_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let result = store
        .save(&StepContext::packing("sm-1"), Vec::new())
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn transition_posts_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openboxes/api/stockMovements/sm-1/status"))
        .and(body_json(json!({ "status": "CHECKING" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    store
        .transition_status(&StepContext::packing("sm-1"), "CHECKING")
        .await
        .unwrap();
}

#[tokio::test]
async fn transition_failure_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openboxes/api/stockMovements/sm-1/status"))
        .respond_with(ResponseTemplate::new(409).set_body_string("not allowed"))
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let err = store
        .transition_status(&StepContext::packing("sm-1"), "CHECKING")
        .await
        .unwrap_err();

    match err {
        StoreError::Http { status, body } => {
            assert_eq!(status, 409);
            assert_eq!(body, "not allowed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn search_users_queries_persons_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openboxes/api/persons"))
        .and(query_param("name", "ann"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "u1", "name": "Ann Lee", "firstName": "Ann", "lastName": "Lee" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let users = store.search_users("ann").await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].label(), "Ann Lee");
    assert_eq!(users[0].extra["lastName"], json!("Lee"));
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    // Nothing listens on port 9 (discard) in the test environment.
    let store = HttpStepStore::new("http://127.0.0.1:9/api").unwrap();
    let err = store.fetch(&StepContext::packing("sm-1")).await.unwrap_err();

    assert!(matches!(err, StoreError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn save_response_without_pack_page_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openboxes/api/stockMovements/sm-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpStepStore::new(&api_base(&server)).unwrap();
    let err = store
        .save(&StepContext::packing("sm-1"), vec![LineItem::new("1")])
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Decode(_)), "got {err:?}");
}

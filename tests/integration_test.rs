use cryptopay_core::adapters::MemoryTransactionRepository;
use cryptopay_core::client::{await_settlement, submit_payment, ApiClient};
use cryptopay_core::domain::{Cryptocurrency, TransactionStatus};
use cryptopay_core::services::{MockPriceFeed, MockWallet, WalletAdapter};
use cryptopay_core::{create_app, AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

async fn setup_test_app() -> String {
    let app_state = AppState::new(Arc::new(MemoryTransactionRepository::new()));
    let app = create_app(app_state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], 0));
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let actual_addr = server.local_addr();

    tokio::spawn(async move {
        server.await.unwrap();
    });

    format!("http://{}", actual_addr)
}

fn usdc_payment() -> Value {
    json!({
        "amount": 10,
        "cryptocurrency": "USDC",
        "senderAddress": "A",
        "recipientAddress": "B",
        "status": "pending",
        "priceAtTransaction": 1
    })
}

#[tokio::test]
async fn test_create_then_complete_transaction() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/transactions", base_url))
        .json(&usdc_payment())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["id"], 1);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["cryptocurrency"], "USDC");
    assert!(created["createdAt"].is_string());

    let res = client
        .patch(format!("{}/transactions/1/status", base_url))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["id"], 1);
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["amount"], created["amount"]);
    assert_eq!(updated["senderAddress"], "A");
    assert_eq!(updated["recipientAddress"], "B");
    assert_eq!(updated["priceAtTransaction"], created["priceAtTransaction"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let res = client
        .get(format!("{}/transactions/1", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_negative_amount_is_rejected() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    let mut payload = usdc_payment();
    payload["amount"] = json!(-5);

    let res = client
        .post(format!("{}/transactions", base_url))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    let fields = body["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field"] == "amount"));

    let res = client
        .get(format!("{}/transactions", base_url))
        .send()
        .await
        .unwrap();
    let list: Vec<Value> = res.json().await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_every_invalid_field_is_reported() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/transactions", base_url))
        .json(&json!({
            "amount": 0,
            "cryptocurrency": "DOGE",
            "senderAddress": "",
            "recipientAddress": "B",
            "status": "unknown",
            "priceAtTransaction": -1
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    let mut fields: Vec<String> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap().to_string())
        .collect();
    fields.sort();
    assert_eq!(
        fields,
        vec![
            "amount",
            "cryptocurrency",
            "priceAtTransaction",
            "senderAddress",
            "status"
        ]
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/transactions", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_and_non_numeric_ids_are_not_found() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    for path in ["/transactions/999", "/transactions/abc"] {
        let res = client
            .get(format!("{}{}", base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = client
        .patch(format!("{}/transactions/999/status", base_url))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_id_wins_over_invalid_status_body() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    let res = client
        .patch(format!("{}/transactions/999/status", base_url))
        .json(&json!({ "status": "refunded" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .patch(format!("{}/transactions/999/status", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_addresses_and_precision_survive_round_trip() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    let recipient = "r".repeat(200);
    let mut payload = usdc_payment();
    payload["senderAddress"] = json!("  addr  with   spaces ");
    payload["recipientAddress"] = json!(recipient);

    let res = client
        .post(format!("{}/transactions", base_url))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["senderAddress"], "  addr  with   spaces ");
    assert_eq!(created["recipientAddress"], json!(recipient));

    for (field, value) in [
        ("amount", json!("1e-2000000000")),
        ("amount", json!(1e15)),
        ("priceAtTransaction", json!(0.000000001)),
    ] {
        let mut payload = usdc_payment();
        payload[field] = value;
        let res = client
            .post(format!("{}/transactions", base_url))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["fields"][0]["field"], field);
    }
}

#[tokio::test]
async fn test_invalid_status_update_leaves_record_untouched() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/transactions", base_url))
        .json(&usdc_payment())
        .send()
        .await
        .unwrap();

    let res = client
        .patch(format!("{}/transactions/1/status", base_url))
        .json(&json!({ "status": "refunded" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let fetched: Value = client
        .get(format!("{}/transactions/1", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "pending");
}

#[tokio::test]
async fn test_list_returns_newest_first() {
    let base_url = setup_test_app().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/transactions", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let empty: Vec<Value> = res.json().await.unwrap();
    assert!(empty.is_empty());

    for _ in 0..3 {
        let res = client
            .post(format!("{}/transactions", base_url))
            .json(&usdc_payment())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let list: Vec<Value> = client
        .get(format!("{}/transactions", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = list.iter().map(|t| t["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_health_reports_backend() {
    let base_url = setup_test_app().await;

    let res = reqwest::get(format!("{}/health", base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_api_client_round_trip() {
    let base_url = setup_test_app().await;
    let api = ApiClient::new(&base_url).unwrap();

    let wallet = MockWallet::new();
    let sender = wallet.connect().await.unwrap();
    let prices = MockPriceFeed::once();

    let created = submit_payment(
        &api,
        &wallet,
        prices.as_ref(),
        "0.25".parse().unwrap(),
        Cryptocurrency::Sol,
        "recipient-1".to_string(),
    )
    .await
    .unwrap();

    assert_eq!(created.sender_address, sender);
    assert_eq!(created.status, TransactionStatus::Pending);
    assert!(created.price_at_transaction >= "95".parse().unwrap());

    let fetched = api.get_transaction(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = api
        .update_status(created.id, TransactionStatus::Failed)
        .await
        .unwrap();
    assert_eq!(updated.status, TransactionStatus::Failed);
    assert_eq!(updated.created_at, created.created_at);

    let list = api.list_transactions().await.unwrap();
    assert_eq!(list, vec![updated]);

    let missing = api.get_transaction(999).await.unwrap_err();
    assert_eq!(missing.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_payment_requires_connected_wallet() {
    let base_url = setup_test_app().await;
    let api = ApiClient::new(&base_url).unwrap();

    let result = submit_payment(
        &api,
        &MockWallet::new(),
        MockPriceFeed::once().as_ref(),
        "1".parse().unwrap(),
        Cryptocurrency::Btc,
        "recipient".to_string(),
    )
    .await;
    assert!(result.is_err());
    assert!(api.list_transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_await_settlement_polls_until_not_pending() {
    let base_url = setup_test_app().await;
    let api = ApiClient::new(&base_url).unwrap();

    let created: Value = reqwest::Client::new()
        .post(format!("{}/transactions", base_url))
        .json(&usdc_payment())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let settler = api.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        settler
            .update_status(id, TransactionStatus::Completed)
            .await
            .unwrap();
    });

    let settled = tokio::time::timeout(
        Duration::from_secs(5),
        await_settlement(&api, id, Duration::from_millis(10)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(settled.status, TransactionStatus::Completed);

    let missing = await_settlement(&api, 999, Duration::from_millis(10))
        .await
        .unwrap_err();
    assert_eq!(missing.status(), Some(StatusCode::NOT_FOUND));
}

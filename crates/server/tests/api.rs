use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some("alice"), Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None, None).await
}

/// Creates bank "Main" with 100.00 and a `subtract` category "Rent".
async fn seed(app: &Router) -> (String, String) {
    let (status, bank) = post(
        app,
        "/banks",
        json!({ "name": "Main", "initial_balance_minor": 10000 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, category) = post(
        app,
        "/categories",
        json!({ "name": "Rent", "kind": "expense", "calculate_method": "subtract" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        bank["id"].as_str().unwrap().to_string(),
        category["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_ok() {
    let app = app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn mutations_require_actor() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/banks",
        None,
        Some(json!({ "name": "Main" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-actor-id"));

    let (status, _) = send(
        &app,
        "POST",
        "/banks",
        Some("   "),
        Some(json!({ "name": "Main" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get(&app, "/banks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn transaction_lifecycle_moves_balance() {
    let app = app().await;
    let (bank, rent) = seed(&app).await;

    let (status, tx) = post(
        &app,
        "/transactions",
        json!({
            "bank_id": bank,
            "category_id": rent,
            "date": "2026-03-01",
            "amount_minor": 3000,
            "note": "march"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tx["created_by"], "alice");
    let tx_id = tx["id"].as_str().unwrap().to_string();

    let (_, view) = get(&app, &format!("/banks/{bank}")).await;
    assert_eq!(view["balance_minor"], 7000);

    let (status, body) = post(
        &app,
        "/transactions",
        json!({
            "bank_id": bank,
            "category_id": rent,
            "date": "2026-03-02",
            "amount_minor": 10000
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Insufficient funds"));
    let (_, view) = get(&app, &format!("/banks/{bank}")).await;
    assert_eq!(view["balance_minor"], 7000);

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/transactions/{tx_id}"),
        Some("bob"),
        Some(json!({ "amount_minor": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount_minor"], 5000);
    assert_eq!(updated["note"], "march");
    let (_, view) = get(&app, &format!("/banks/{bank}")).await;
    assert_eq!(view["balance_minor"], 5000);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/transactions/{tx_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, view) = get(&app, &format!("/banks/{bank}")).await;
    assert_eq!(view["balance_minor"], 10000);

    let (status, _) = get(&app, &format!("/transactions/{tx_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guards_map_to_conflict() {
    let app = app().await;
    let (bank, rent) = seed(&app).await;

    let (status, _) = post(
        &app,
        "/categories",
        json!({ "name": "RENT", "kind": "expense", "calculate_method": "subtract" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(
        &app,
        "/transactions",
        json!({
            "bank_id": bank,
            "category_id": rent,
            "date": "2026-03-01",
            "amount_minor": 100
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "DELETE", &format!("/banks/{bank}"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/categories/{rent}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bad_input_is_rejected() {
    let app = app().await;
    let (bank, rent) = seed(&app).await;

    let (status, _) = post(
        &app,
        "/transactions",
        json!({
            "bank_id": bank,
            "category_id": rent,
            "date": "2026-03-01",
            "amount_minor": 0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = get(&app, "/transactions/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/transactions/{}", uuid::Uuid::new_v4()),
        Some("alice"),
        Some(json!({ "income_type_id": uuid::Uuid::new_v4(), "clear_income_type": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_and_stats() {
    let app = app().await;
    let (bank, rent) = seed(&app).await;
    let (_, fees) = post(
        &app,
        "/categories",
        json!({ "name": "Fees", "kind": "income", "calculate_method": "add" }),
    )
    .await;
    let fees = fees["id"].as_str().unwrap().to_string();

    for (category, amount, date) in [
        (&fees, 5000, "2026-03-01"),
        (&rent, 2000, "2026-03-02"),
        (&fees, 1000, "2026-03-03"),
    ] {
        let (status, _) = post(
            &app,
            "/transactions",
            json!({
                "bank_id": bank,
                "category_id": category,
                "date": date,
                "amount_minor": amount
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = get(&app, "/transactions?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(page["transactions"][0]["date"], "2026-03-03");
    let cursor = page["next_cursor"].as_str().unwrap().to_string();

    let (_, page) = get(&app, &format!("/transactions?limit=2&cursor={cursor}")).await;
    assert_eq!(page["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(page["transactions"][0]["date"], "2026-03-01");
    assert!(page["next_cursor"].is_null());

    let (status, totals) = get(&app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(totals["transaction_count"], 3);
    assert_eq!(totals["total_income_minor"], 6000);
    assert_eq!(totals["total_expense_minor"], 2000);
    assert_eq!(totals["net_minor"], 4000);

    let (_, totals) = get(&app, "/stats?from=2026-03-02").await;
    assert_eq!(totals["transaction_count"], 2);

    let (_, banks) = get(&app, "/stats/banks").await;
    assert_eq!(banks[0]["balance_minor"], 14000);
    assert_eq!(banks[0]["credits_minor"], 6000);

    let (_, categories) = get(&app, "/stats/categories").await;
    assert_eq!(categories[0]["name"], "Fees");
    assert_eq!(categories[0]["total_minor"], 6000);
    assert_eq!(categories[1]["calculate_method"], "subtract");
}

#[tokio::test]
async fn transaction_type_registry() {
    let app = app().await;

    let (status, tuition) = post(&app, "/income-types", json!({ "name": "Tuition" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = tuition["id"].as_str().unwrap().to_string();

    let (status, _) = post(&app, "/income-types", json!({ "name": "TUITION" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, renamed) = send(
        &app,
        "PATCH",
        &format!("/income-types/{id}"),
        Some("alice"),
        Some(json!({ "name": "Tuition fees" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Tuition fees");

    let (status, found) = get(&app, &format!("/income-types/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["name"], "Tuition fees");
    let (status, _) = get(&app, &format!("/expense-types/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/income-types/{id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = get(&app, "/income-types").await;
    assert_eq!(list, json!([]));
}

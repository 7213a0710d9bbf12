use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode},
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, MemoryStore};
use server::{AssistantClient, FALLBACK_MESSAGE, ServerState};

async fn app_with(assistant: Option<AssistantClient>) -> Router {
    let engine = Engine::builder()
        .memory(MemoryStore::new())
        .build()
        .await
        .unwrap();
    server::router(ServerState::new(engine, assistant))
}

async fn app() -> Router {
    app_with(None).await
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
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

#[tokio::test]
async fn add_edit_delete_personal_transactions() {
    let app = app().await;

    let (status, view) = call(
        &app,
        "POST",
        "/transactions",
        Some(json!({"userId": "alice@case.edu", "date": "2025-01-13", "category": "Job", "type": "Income", "amount": "100"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["total"], "$100.00");
    assert_eq!(view["weeklyBudget"], "$100.00");

    let (_, view) = call(
        &app,
        "POST",
        "/transactions",
        Some(json!({"userId": "alice@case.edu", "category": "Food", "type": "Expense", "amount": 30})),
    )
    .await;
    assert_eq!(view["total"], "$70.00");
    assert_eq!(view["entries"][1]["amount"], "30");

    let (status, view) = call(
        &app,
        "PATCH",
        "/transactions/alice@case.edu/1",
        Some(json!({"amount": "50"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total"], "$50.00");
    assert_eq!(view["entries"][1]["label"], "Food");
    assert_eq!(view["entries"][1]["type"], "Expense");

    let (status, view) = call(&app, "DELETE", "/transactions/alice@case.edu/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total"], "-$50.00");
    assert_eq!(view["entries"].as_array().unwrap().len(), 1);

    let (_, view) = call(&app, "GET", "/transactions/ALICE@case.edu", None).await;
    assert_eq!(view["userId"], "alice@case.edu");
    assert_eq!(view["total"], "-$50.00");
}

#[tokio::test]
async fn invalid_entries_are_rejected_with_422() {
    let app = app().await;

    for body in [
        json!({"userId": "a@case.edu", "category": "  ", "type": "Expense", "amount": "3"}),
        json!({"userId": "a@case.edu", "category": "Food", "type": "Expense", "amount": "abc"}),
        json!({"userId": "a@case.edu", "category": "Food", "type": "Expense", "amount": "0"}),
        json!({"userId": "a@case.edu", "category": "Food", "type": "Expense"}),
    ] {
        let (status, error) = call(&app, "POST", "/transactions", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error["error"].is_string());
    }

    let (status, _) = call(
        &app,
        "POST",
        "/casecash",
        Some(json!({"userId": "a@case.edu", "location": "", "amount": "2"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, view) = call(&app, "GET", "/transactions/a@case.edu", None).await;
    assert!(view["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn positions_outside_the_ledger_are_404() {
    let app = app().await;
    call(
        &app,
        "POST",
        "/casecash",
        Some(json!({"userId": "a@case.edu", "location": "Grab-It", "amount": "10.00"})),
    )
    .await;

    let (status, _) = call(&app, "DELETE", "/casecash/a@case.edu/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "DELETE", "/casecash/a@case.edu/-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(
        &app,
        "PATCH",
        "/casecash/a@case.edu/5",
        Some(json!({"amount": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, view) = call(&app, "GET", "/casecash/a@case.edu", None).await;
    assert_eq!(view["total"], "$10.00");
}

#[tokio::test]
async fn meal_plan_limit_swipes_and_reset() {
    let app = app().await;

    let (_, view) = call(
        &app,
        "PUT",
        "/mealplan/a@case.edu/limit",
        Some(json!({"weeklyLimit": 14})),
    )
    .await;
    assert_eq!(view["weeklyLimit"], 14);

    for _ in 0..14 {
        let (status, _) = call(
            &app,
            "POST",
            "/mealplan",
            Some(json!({"userId": "a@case.edu", "location": "Leutner"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, view) = call(&app, "GET", "/mealplan/a@case.edu", None).await;
    assert_eq!(view["total"], "14");
    assert_eq!(view["swipesRemaining"], 0);
    assert!(view["entries"][0]["date"].is_string());
    assert!(view["entries"][0]["time"].is_string());

    let (status, view) = call(&app, "POST", "/mealplan/a@case.edu/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total"], "0");
    assert_eq!(view["swipesRemaining"], 14);
    assert!(view["lastReset"].is_string());

    let (_, view) = call(
        &app,
        "PUT",
        "/mealplan/a@case.edu/limit",
        Some(json!({"weeklyLimit": "Unlimited"})),
    )
    .await;
    assert_eq!(view["weeklyLimit"], "Unlimited");
    assert!(view.get("swipesRemaining").is_none());

    let (status, _) = call(
        &app,
        "PUT",
        "/mealplan/a@case.edu/limit",
        Some(json!({"weeklyLimit": "lots"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn weekly_budget_update() {
    let app = app().await;

    let (status, view) = call(
        &app,
        "PUT",
        "/transactions/a@case.edu/budget",
        Some(json!({"weeklyBudget": "75.50"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["weeklyBudget"], "$75.50");

    let (status, _) = call(
        &app,
        "PUT",
        "/transactions/a@case.edu/budget",
        Some(json!({"weeklyBudget": "-5"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pools_and_users_are_isolated() {
    let app = app().await;
    call(
        &app,
        "POST",
        "/casecash",
        Some(json!({"userId": "a@case.edu", "location": "Starbucks", "amount": "5"})),
    )
    .await;
    call(
        &app,
        "POST",
        "/casecash",
        Some(json!({"location": "Denny's", "amount": "2.50"})),
    )
    .await;

    let (_, view) = call(&app, "GET", "/casecash/b@case.edu", None).await;
    assert_eq!(view["total"], "$0.00");
    let (_, view) = call(&app, "GET", "/transactions/a@case.edu", None).await;
    assert_eq!(view["total"], "$0.00");
    let (_, view) = call(&app, "GET", "/casecash/guest", None).await;
    assert_eq!(view["total"], "$2.50");
}

#[tokio::test]
async fn assistant_without_endpoint_returns_fallback() {
    let app = app().await;

    let (status, reply) = call(
        &app,
        "POST",
        "/assistant/ask",
        Some(json!({"userId": "a@case.edu", "question": "Can I afford pizza?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], FALLBACK_MESSAGE);

    let (status, _) = call(
        &app,
        "POST",
        "/assistant/ask",
        Some(json!({"question": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn assistant_unreachable_returns_fallback() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        AssistantClient::new(format!("http://{addr}/ask"), Duration::from_secs(2)).unwrap();
    let app = app_with(Some(client)).await;

    let (status, reply) = call(
        &app,
        "POST",
        "/assistant/ask",
        Some(json!({"question": "How many swipes are left?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], FALLBACK_MESSAGE);
}

#[tokio::test]
async fn assistant_receives_week_to_date_figures() {
    // Echoes part of the query back so the test can see what was sent.
    let fake = Router::new().route(
        "/ask",
        post(|Json(query): Json<Value>| async move {
            Json(json!({
                "message": format!(
                    "spent {} of {}, swipes {}/{}",
                    query["spentThisWeekPersonal"],
                    query["weeklyBudgetPersonal"],
                    query["mealSwipesUsedThisWeek"],
                    query["mealSwipesWeeklyTotal"],
                )
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fake).await.unwrap();
    });

    let client =
        AssistantClient::new(format!("http://{addr}/ask"), Duration::from_secs(5)).unwrap();
    let app = app_with(Some(client)).await;
    call(
        &app,
        "POST",
        "/mealplan",
        Some(json!({"userId": "a@case.edu", "location": "Fribley"})),
    )
    .await;
    call(
        &app,
        "PUT",
        "/mealplan/a@case.edu/limit",
        Some(json!({"weeklyLimit": "Unlimited"})),
    )
    .await;

    let (status, reply) = call(
        &app,
        "POST",
        "/assistant/ask",
        Some(json!({"userId": "a@case.edu", "question": "Am I on track?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "spent 0.0 of 100.0, swipes 1/null");
}

#[tokio::test]
async fn writes_that_cannot_be_saved_report_persisted_false() {
    // No migrations: the slot table does not exist, so every save fails.
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let app = server::router(ServerState::new(engine, None));

    let (status, view) = call(
        &app,
        "POST",
        "/casecash",
        Some(json!({"userId": "a@case.edu", "location": "Grab-It", "amount": "4.25"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["persisted"], false);
    assert_eq!(view["total"], "$4.25");

    let (status, view) = call(&app, "GET", "/casecash/a@case.edu", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total"], "$0.00");
}

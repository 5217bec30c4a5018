mod support;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::identity::{Caller, TokenType};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use support::{admin, user};
use tasks::{
    middleware::TokenVerifier, repositories::InMemoryTaskStore, routes::create_router,
    service::TaskService, settings::Settings, state::AppState,
};
use tower::ServiceExt;

async fn app() -> Router {
    let service = TaskService::new(InMemoryTaskStore::new(), support::directory(3).await);
    let verifier = TokenVerifier::new(support::PUBLIC_KEY).unwrap();
    create_router(AppState::new(service, verifier, Settings::default()))
}

fn request(method: &str, uri: &str, caller: Option<&Caller>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(
            header::AUTHORIZATION,
            format!("Bearer {}", support::token(caller, TokenType::Access)),
        );
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn create(app: &Router, title: &str, assignee_id: Option<i64>) -> i64 {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/tasks",
            Some(&admin()),
            Some(json!({
                "title": title,
                "status": "TODO",
                "priority": "MEDIUM",
                "assignee_id": assignee_id,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = send(&app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn task_routes_require_an_access_token() {
    let app = app().await;

    let (status, _) = send(&app, request("GET", "/tasks", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = Request::builder()
        .uri("/tasks")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", support::token(&admin(), TokenType::Refresh)),
        )
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn admin_creates_and_fetches_a_task() {
    let app = app().await;
    let id = create(&app, "Release notes", Some(2)).await;

    let (status, body) = send(&app, request("GET", &format!("/tasks/{}", id), Some(&user(3)), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Release notes");
    assert_eq!(body["author_id"], 1);
    assert_eq!(body["assignee_id"], 2);
    assert_eq!(body["status"], "TODO");
}

#[tokio::test]
async fn user_cannot_create_tasks() {
    let app = app().await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/tasks",
            Some(&user(2)),
            Some(json!({"title": "Sneaky", "status": "TODO", "priority": "LOW"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only admins can manage tasks");
}

#[tokio::test]
async fn missing_task_is_not_found() {
    let app = app().await;
    let (status, body) = send(&app, request("GET", "/tasks/999", Some(&admin()), None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found with id: 999");
}

#[tokio::test]
async fn assignee_status_route_checks_ownership() {
    let app = app().await;
    let id = create(&app, "Fix login", Some(2)).await;
    let uri = format!("/tasks/{}/status/user?status=DONE", id);

    let (status, _) = send(&app, request("PUT", &uri, Some(&user(3)), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("PUT", &uri, Some(&user(2)), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "DONE");
}

#[tokio::test]
async fn admin_mutations_through_query_parameters() {
    let app = app().await;
    let id = create(&app, "Triage", None).await;

    let (status, body) = send(
        &app,
        request("PUT", &format!("/tasks/{}/priority?priority=HIGH", id), Some(&admin()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priority"], "HIGH");

    let (status, body) = send(
        &app,
        request("PUT", &format!("/tasks/{}/assignee?assignee_id=3", id), Some(&admin()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignee_id"], 3);

    let (status, _) = send(
        &app,
        request("PUT", &format!("/tasks/{}/assignee?assignee_id=77", id), Some(&admin()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_without_body_is_bad_request() {
    let app = app().await;
    let id = create(&app, "Discuss", Some(2)).await;
    let uri = format!("/tasks/{}/comments", id);

    let (status, body) = send(&app, request("POST", &uri, Some(&admin()), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Comment cannot be null");

    let (status, body) = send(
        &app,
        request("POST", &format!("{}/user", uri), Some(&user(2)), Some(json!({"content": "Agreed"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], 2);

    let (status, body) = send(&app, request("GET", &uri, Some(&user(3)), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let app = app().await;
    for n in 0..5 {
        let id = create(&app, &format!("Task {}", n), Some(2)).await;
        if n % 2 == 0 {
            send(
                &app,
                request("PUT", &format!("/tasks/{}/status?status=DONE", id), Some(&admin()), None),
            )
            .await;
        }
    }

    let (status, body) = send(
        &app,
        request("GET", "/tasks?status=DONE&author_id=1&page=0&size=2", Some(&user(2)), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_elements"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["content"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        request("GET", "/tasks/assignee/2?sort=title,desc", Some(&user(2)), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"][0]["title"], "Task 4");
    assert_eq!(body["size"], 20);

    let (status, _) = send(&app, request("GET", "/tasks?sort=secret", Some(&admin()), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_returns_no_content_then_not_found() {
    let app = app().await;
    let id = create(&app, "Obsolete", None).await;
    let uri = format!("/tasks/{}", id);

    let (status, _) = send(&app, request("DELETE", &uri, Some(&admin()), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, request("GET", &format!("{}/comments", uri), Some(&admin()), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

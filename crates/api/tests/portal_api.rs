//! Client portal over its token, together with the staff side of tasks and
//! messages.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_client, get, get_auth, post, post_json, post_json_auth,
    put_json_auth, signup,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn tasks_flow_between_staff_and_client(pool: PgPool) {
    let app = build_test_app(pool);
    let (token, _) = signup(app.clone(), "sarah@firm.test", "staff").await;
    let client = create_client(app.clone(), &token, "Jane Smith", "individual").await;
    let id = client["id"].as_i64().unwrap();
    let portal = format!("/api/v1/portal/{}", client["portal_token"].as_str().unwrap());

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/clients/{id}/tasks"),
        &token,
        json!({ "title": "Upload W-2 Forms", "due_date": "2026-02-15", "priority": "high" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = body_json(response).await["data"].clone();
    assert_eq!(task["status"], "pending");
    assert_eq!(task["requested_by"], "Staff sarah@firm.test");
    let task_id = task["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/clients/{id}/tasks"),
        &token,
        json!({ "title": "Review organizer" }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["priority"], "medium");

    let overview = body_json(get(app.clone(), &portal).await).await;
    assert_eq!(overview["data"]["client"]["name"], "Jane Smith");
    assert_eq!(overview["data"]["open_tasks"].as_array().unwrap().len(), 2);
    assert_eq!(overview["data"]["completed_tasks"].as_array().unwrap().len(), 0);

    let response = post(app.clone(), &format!("{portal}/tasks/{task_id}/complete")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let done = body_json(response).await["data"].clone();
    assert_eq!(done["status"], "complete");
    assert!(done["completed_at"].is_string());

    // Completing again is a no-op.
    let again = body_json(post(app.clone(), &format!("{portal}/tasks/{task_id}/complete")).await).await;
    assert_eq!(again["data"]["completed_at"], done["completed_at"]);

    let overview = body_json(get(app.clone(), &portal).await).await;
    assert_eq!(overview["data"]["open_tasks"].as_array().unwrap().len(), 1);
    assert_eq!(overview["data"]["completed_tasks"][0]["id"], task_id);

    // Staff can reopen it.
    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/clients/{id}/tasks/{task_id}"),
        &token,
        json!({ "status": "in_progress" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["completed_at"].is_null());

    let tasks = body_json(get_auth(app, &format!("/api/v1/clients/{id}/tasks"), &token).await).await;
    assert_eq!(tasks["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn task_input_is_validated(pool: PgPool) {
    let app = build_test_app(pool);
    let (token, _) = signup(app.clone(), "cpa@firm.test", "staff").await;
    let client = create_client(app.clone(), &token, "Jane", "individual").await;
    let uri = format!("/api/v1/clients/{}/tasks", client["id"]);

    for body in [
        json!({ "title": "  " }),
        json!({ "title": "Sign", "priority": "urgent" }),
    ] {
        let response = post_json_auth(app.clone(), &uri, &token, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = put_json_auth(app, &format!("{uri}/999999"), &token, json!({ "status": "complete" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn messages_track_unread_staff_messages(pool: PgPool) {
    let app = build_test_app(pool);
    let (token, _) = signup(app.clone(), "cpa@firm.test", "staff").await;
    let client = create_client(app.clone(), &token, "Jane Smith", "individual").await;
    let id = client["id"].as_i64().unwrap();
    let portal = format!("/api/v1/portal/{}", client["portal_token"].as_str().unwrap());

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/clients/{id}/messages"),
        &token,
        json!({ "body": "Please upload your W-2." }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let staff_message = body_json(response).await["data"].clone();
    assert_eq!(staff_message["sender"], "staff");

    let response = post_json(app.clone(), &format!("{portal}/messages"), json!({ "body": "Uploaded!" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let client_message = body_json(response).await["data"].clone();
    assert_eq!(client_message["sender"], "client");
    assert_eq!(client_message["sender_name"], "Jane Smith");

    let overview = body_json(get(app.clone(), &portal).await).await;
    assert_eq!(overview["data"]["messages"].as_array().unwrap().len(), 2);
    assert_eq!(overview["data"]["unread_count"], 1);

    let response = post(app.clone(), &format!("{portal}/messages/{}/read", client_message["id"])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post(app.clone(), &format!("{portal}/messages/{}/read", staff_message["id"])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let read = body_json(response).await["data"].clone();
    assert!(read["read_at"].is_string());

    let overview = body_json(get(app.clone(), &portal).await).await;
    assert_eq!(overview["data"]["unread_count"], 0);

    let response = post_json(app.clone(), &format!("{portal}/messages"), json!({ "body": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let thread = body_json(get_auth(app, &format!("/api/v1/clients/{id}/messages"), &token).await).await;
    let senders: Vec<_> = thread["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["sender"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(senders, ["staff", "client"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn portal_tokens_do_not_cross_clients(pool: PgPool) {
    let app = build_test_app(pool);
    let (token, _) = signup(app.clone(), "cpa@firm.test", "staff").await;
    let first = create_client(app.clone(), &token, "First", "individual").await;
    let second = create_client(app.clone(), &token, "Second", "business").await;

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/clients/{}/tasks", first["id"]),
        &token,
        json!({ "title": "Sign engagement" }),
    )
    .await;
    let task_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let other_portal = format!("/api/v1/portal/{}", second["portal_token"].as_str().unwrap());
    let response = post(app.clone(), &format!("{other_portal}/tasks/{task_id}/complete")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app, &format!("/api/v1/portal/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

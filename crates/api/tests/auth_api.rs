//! HTTP-level tests for signup, login, lockout, refresh rotation and logout.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with, get, get_auth, post_auth, post_json, signup,
    test_config, TEST_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

async fn login(app: axum::Router, email: &str, password: &str) -> axum::http::Response<axum::body::Body> {
    post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn signup_defaults_to_admin(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/signup",
        json!({
            "email": "Owner@Firm.test",
            "display_name": "Owner",
            "password": TEST_PASSWORD,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert_eq!(data["expires_in"], 900);
    assert_eq!(data["user"]["email"], "owner@firm.test");
    assert_eq!(data["user"]["role"], "admin");
    assert!(data["user"].get("password_hash").is_none());

    let token = data["access_token"].as_str().unwrap();
    let me = get_auth(app, "/api/v1/auth/me", token).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["data"]["display_name"], "Owner");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn signup_can_be_disabled(pool: PgPool) {
    let mut config = test_config();
    config.signup_enabled = false;
    let app = build_test_app_with(pool, config);

    let response = post_json(
        app,
        "/api/v1/auth/signup",
        json!({ "email": "a@firm.test", "display_name": "A", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn signup_validates_input(pool: PgPool) {
    let app = build_test_app(pool);

    let cases = [
        json!({ "email": "not-an-email", "display_name": "A", "password": TEST_PASSWORD }),
        json!({ "email": "a@firm.test", "display_name": "", "password": TEST_PASSWORD }),
        json!({ "email": "a@firm.test", "display_name": "A", "password": "short" }),
        json!({ "email": "a@firm.test", "display_name": "A", "password": TEST_PASSWORD, "role": "owner" }),
    ];
    for body in cases {
        let response = post_json(app.clone(), "/api/v1/auth/signup", body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_conflicts_case_insensitively(pool: PgPool) {
    let app = build_test_app(pool);
    signup(app.clone(), "dup@firm.test", "staff").await;

    let response = post_json(
        app,
        "/api/v1/auth/signup",
        json!({ "email": "DUP@firm.test", "display_name": "B", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_rejects_bad_credentials(pool: PgPool) {
    let app = build_test_app(pool);
    signup(app.clone(), "staff@firm.test", "staff").await;

    let wrong = login(app.clone(), "staff@firm.test", "wrong-password").await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ghost = login(app.clone(), "ghost@firm.test", TEST_PASSWORD).await;
    assert_eq!(ghost.status(), StatusCode::UNAUTHORIZED);

    let ok = login(app, "STAFF@firm.test", TEST_PASSWORD).await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_json(ok).await["data"]["user"]["role"], "staff");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn five_failures_lock_the_account(pool: PgPool) {
    let app = build_test_app(pool);
    signup(app.clone(), "locked@firm.test", "staff").await;

    for _ in 0..5 {
        let response = login(app.clone(), "locked@firm.test", "nope-nope-nope").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = login(app, "locked@firm.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_the_token(pool: PgPool) {
    let app = build_test_app(pool);
    signup(app.clone(), "rot@firm.test", "staff").await;
    let first = body_json(login(app.clone(), "rot@firm.test", TEST_PASSWORD).await).await;
    let old_refresh = first["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        app.clone(),
        "/api/v1/auth/refresh",
        json!({ "refresh_token": old_refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_ne!(second["data"]["refresh_token"], first["data"]["refresh_token"]);

    let reused = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": old_refresh }),
    )
    .await;
    assert_eq!(reused.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_refresh_tokens(pool: PgPool) {
    let app = build_test_app(pool);
    signup(app.clone(), "out@firm.test", "staff").await;
    let json = body_json(login(app.clone(), "out@firm.test", TEST_PASSWORD).await).await;
    let access = json["data"]["access_token"].as_str().unwrap();
    let refresh = json["data"]["refresh_token"].as_str().unwrap();

    let response = post_auth(app.clone(), "/api/v1/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn protected_routes_need_a_bearer_token(pool: PgPool) {
    let app = build_test_app(pool);

    let missing = get(app.clone(), "/api/v1/auth/me").await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(missing).await["code"], "UNAUTHORIZED");

    let garbage = get_auth(app, "/api/v1/clients", "not-a-jwt").await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

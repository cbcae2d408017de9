//! End-to-end flows over the full router.

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use serde_json::json;

use crate::{
    api::models::{auth::ResetTokenResponse, users::UserResponse},
    auth::basic::encode_header,
    config::{AuthType, SessionDuration},
    test_utils::{create_test_app, create_test_config, create_test_pool, create_test_server},
};

const EMAIL: &str = "guillaume@holberton.io";
const PASSWD: &str = "b4l0u";
const NEW_PASSWD: &str = "t4rt1fl3tt3";

fn cookie(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("session_id={token}")).unwrap()
}

fn token_from(response: &axum_test::TestResponse) -> String {
    let set_cookie = response.header(header::SET_COOKIE);
    let (pair, _) = set_cookie.to_str().unwrap().split_once(';').unwrap();
    pair.strip_prefix("session_id=").unwrap().to_string()
}

async fn register_user(server: &TestServer, email: &str, password: &str) {
    let response = server.post("/users").form(&[("email", email), ("password", password)]).await;
    response.assert_status_ok();
    response.assert_json(&json!({"email": email, "message": "user created"}));
}

async fn log_in(server: &TestServer, email: &str, password: &str) -> String {
    let response = server.post("/sessions").form(&[("email", email), ("password", password)]).await;
    response.assert_status_ok();
    response.assert_json(&json!({"email": email, "message": "logged in"}));
    token_from(&response)
}

#[test_log::test(tokio::test)]
async fn test_account_lifecycle() {
    let (server, _state) = create_test_server(create_test_config()).await;

    register_user(&server, EMAIL, PASSWD).await;

    server
        .post("/sessions")
        .form(&[("email", EMAIL), ("password", NEW_PASSWD)])
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server.get("/profile").await.assert_status(StatusCode::FORBIDDEN);

    let session_id = log_in(&server, EMAIL, PASSWD).await;
    let response = server.get("/profile").add_header(header::COOKIE, cookie(&session_id)).await;
    response.assert_status_ok();
    response.assert_json(&json!({"email": EMAIL}));

    server
        .delete("/sessions")
        .add_header(header::COOKIE, cookie(&session_id))
        .await
        .assert_status(StatusCode::FOUND);

    let response = server.post("/reset_password").form(&[("email", EMAIL)]).await;
    response.assert_status_ok();
    let reset: ResetTokenResponse = response.json();

    let response = server
        .put("/reset_password")
        .form(&[
            ("email", EMAIL),
            ("reset_token", reset.reset_token.as_str()),
            ("new_password", NEW_PASSWD),
        ])
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({"email": EMAIL, "message": "Password updated"}));

    server
        .post("/sessions")
        .form(&[("email", EMAIL), ("password", PASSWD)])
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    log_in(&server, EMAIL, NEW_PASSWD).await;
}

#[test_log::test(tokio::test)]
async fn test_second_login_replaces_account_session() {
    let (server, _state) = create_test_server(create_test_config()).await;
    register_user(&server, EMAIL, PASSWD).await;

    let first = log_in(&server, EMAIL, PASSWD).await;
    let second = log_in(&server, EMAIL, PASSWD).await;
    assert_ne!(first, second);

    server
        .get("/profile")
        .add_header(header::COOKIE, cookie(&first))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .get("/profile")
        .add_header(header::COOKIE, cookie(&second))
        .await
        .assert_status_ok();
}

#[test_log::test(tokio::test)]
async fn test_basic_auth_api() {
    let mut config = create_test_config();
    config.auth.auth_type = AuthType::BasicAuth;
    let (server, _state) = create_test_server(config).await;
    register_user(&server, EMAIL, PASSWD).await;

    server.get("/api/v1/status").await.assert_status_ok();
    server.get("/api/v1/users/me").await.assert_status(StatusCode::UNAUTHORIZED);

    // Wrong scheme, bad base64 and a missing separator all resolve to nobody
    for value in [
        "Bearer abc".to_string(),
        "Basic %%%".to_string(),
        "Basic Z3VpbGxhdW1l".to_string(),
        encode_header(EMAIL, NEW_PASSWD),
    ] {
        server
            .get("/api/v1/users/me")
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap())
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    let response = server
        .get("/api/v1/users/me")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&encode_header(EMAIL, PASSWD)).unwrap(),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<UserResponse>().email, EMAIL);
}

#[test_log::test(tokio::test)]
async fn test_null_auth_guards_nothing() {
    let mut config = create_test_config();
    config.auth.auth_type = AuthType::None;
    let (server, _state) = create_test_server(config).await;

    server.get("/api/v1/status").await.assert_status_ok();
    // Reachable, but there is no caller to describe
    server.get("/api/v1/users/me").await.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_persisted_sessions_survive_restart() {
    let mut config = create_test_config();
    config.auth.auth_type = AuthType::SessionDbAuth;
    config.auth.session.duration = SessionDuration::from_secs(3600);
    let pool = create_test_pool().await;

    let (server, _state) = create_test_app(pool.clone(), config.clone()).await;
    register_user(&server, EMAIL, PASSWD).await;
    let response = server
        .post("/api/v1/auth_session/login")
        .form(&[("email", EMAIL), ("password", PASSWD)])
        .await;
    response.assert_status_ok();
    let session_id = token_from(&response);
    drop(server);

    // A new application over the same database starts with an empty memory map
    let (server, _state) = create_test_app(pool, config).await;
    let response = server
        .get("/api/v1/users/me")
        .add_header(header::COOKIE, cookie(&session_id))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<UserResponse>().email, EMAIL);
}

#[test_log::test(tokio::test)]
async fn test_memory_sessions_do_not_survive_restart() {
    let mut config = create_test_config();
    config.auth.auth_type = AuthType::SessionAuth;
    let pool = create_test_pool().await;

    let (server, _state) = create_test_app(pool.clone(), config.clone()).await;
    register_user(&server, EMAIL, PASSWD).await;
    let response = server
        .post("/api/v1/auth_session/login")
        .form(&[("email", EMAIL), ("password", PASSWD)])
        .await;
    let session_id = token_from(&response);
    drop(server);

    let (server, _state) = create_test_app(pool, config).await;
    server
        .get("/api/v1/users/me")
        .add_header(header::COOKIE, cookie(&session_id))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

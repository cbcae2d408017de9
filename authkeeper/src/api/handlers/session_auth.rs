//! Login and logout through whichever authenticator is configured.
//!
//! With a session based authenticator, login issues a session in its store and sets the cookie
//! it reads. Authenticators without sessions still validate the credentials but set no cookie.

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, info};

use super::{clear_session_cookie, session_cookie};
use crate::{
    AppState,
    api::models::{
        auth::{CredentialsForm, WithCookie, required},
        users::UserResponse,
    },
    auth::request::RequestView,
    db::models::users::UserFilter,
    errors::Error,
    redact::redact_pii,
    types::abbrev_uuid,
};

#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Form(form): Form<CredentialsForm>) -> Result<Response, Error> {
    let email = required(&form.email, "email")?;
    let password = required(&form.password, "password")?;
    info!("Session login attempt: {}", redact_pii(&format!("email={email};password={password};")));

    let user = state
        .identity
        .users()
        .find_one(&UserFilter::by_email(email))
        .await?
        .ok_or_else(|| Error::NotFound {
            message: "no user found for this email".to_string(),
        })?;

    if !state.identity.hasher().verify_blocking(password, &user.password_hash).await? {
        return Err(Error::Unauthenticated {
            message: Some("wrong password".to_string()),
        });
    }

    let body = UserResponse::from(user);
    match state.authenticator.create_session(body.id).await? {
        Some(token) => {
            debug!(user_id = %abbrev_uuid(&body.id), "Session created");
            Ok(WithCookie {
                body,
                cookie: session_cookie(&state.config.auth.session, &token),
            }
            .into_response())
        }
        None => Ok(Json(body).into_response()),
    }
}

#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    let view = RequestView::new("", headers);
    if !state.authenticator.destroy_session(&view).await? {
        return Err(Error::NotFound {
            message: "no session to destroy".to_string(),
        });
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(&state.config.auth.session))],
        Json(json!({})),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use axum_test::TestServer;

    use super::*;
    use crate::{
        config::{AuthType, SessionDuration},
        test_utils::{TEST_PASSWORD, create_test_config, create_test_server, create_test_user},
    };

    const LOGIN: &str = "/api/v1/auth_session/login";
    const LOGOUT: &str = "/api/v1/auth_session/logout";
    const ME: &str = "/api/v1/users/me";

    fn cookie(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("session_id={token}")).unwrap()
    }

    async fn login_token(server: &TestServer, email: &str) -> String {
        let response = server.post(LOGIN).form(&[("email", email), ("password", TEST_PASSWORD)]).await;
        response.assert_status_ok();
        let set_cookie = response.header(header::SET_COOKIE);
        let (pair, _) = set_cookie.to_str().unwrap().split_once(';').unwrap();
        pair.strip_prefix("session_id=").unwrap().to_string()
    }

    async fn session_server(auth_type: AuthType) -> (TestServer, AppState) {
        let mut config = create_test_config();
        config.auth.auth_type = auth_type;
        config.auth.session.duration = SessionDuration::from_secs(3600);
        create_test_server(config).await
    }

    #[test_log::test(tokio::test)]
    async fn test_login_errors() {
        let (server, state) = session_server(AuthType::SessionAuth).await;
        create_test_user(&state.db, "bob@hbtn.io").await;

        let response = server.post(LOGIN).form(&[("password", "x")]).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&serde_json::json!({"error": "email missing"}));

        let response = server.post(LOGIN).form(&[("email", "bob@hbtn.io")]).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&serde_json::json!({"error": "password missing"}));

        let response = server
            .post(LOGIN)
            .form(&[("email", "nobody@hbtn.io"), ("password", "x")])
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&serde_json::json!({"error": "no user found for this email"}));

        let response = server
            .post(LOGIN)
            .form(&[("email", "bob@hbtn.io"), ("password", "wrong")])
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&serde_json::json!({"error": "wrong password"}));
    }

    #[test_log::test(tokio::test)]
    async fn test_login_sets_cookie_for_each_session_type() {
        for auth_type in [AuthType::SessionAuth, AuthType::SessionExpAuth, AuthType::SessionDbAuth] {
            let (server, state) = session_server(auth_type).await;
            let user = create_test_user(&state.db, "bob@hbtn.io").await;

            let response = server
                .post(LOGIN)
                .form(&[("email", "bob@hbtn.io"), ("password", TEST_PASSWORD)])
                .await;
            response.assert_status_ok();
            let set_cookie = response.header(header::SET_COOKIE);
            assert!(set_cookie.to_str().unwrap().contains("Max-Age=3600"), "{auth_type}");
            let body: UserResponse = response.json();
            assert_eq!(body.id, user.id);

            let token = login_token(&server, "bob@hbtn.io").await;
            let me: UserResponse = server.get(ME).add_header(header::COOKIE, cookie(&token)).await.json();
            assert_eq!(me.email, "bob@hbtn.io", "{auth_type}");
        }
    }

    #[tokio::test]
    async fn test_login_without_session_support_sets_no_cookie() {
        let (server, state) = session_server(AuthType::BasicAuth).await;
        create_test_user(&state.db, "basic@hbtn.io").await;

        let response = server
            .post(LOGIN)
            .form(&[("email", "basic@hbtn.io"), ("password", TEST_PASSWORD)])
            .await;
        response.assert_status_ok();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_logout() {
        let (server, state) = session_server(AuthType::SessionDbAuth).await;
        create_test_user(&state.db, "bye@hbtn.io").await;
        let token = login_token(&server, "bye@hbtn.io").await;

        let response = server.delete(LOGOUT).add_header(header::COOKIE, cookie(&token)).await;
        response.assert_status_ok();
        response.assert_json(&serde_json::json!({}));
        assert!(response.header(header::SET_COOKIE).to_str().unwrap().contains("Max-Age=0"));

        // The session is gone, so the cookie no longer identifies anyone
        server
            .get(ME)
            .add_header(header::COOKIE, cookie(&token))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(LOGOUT)
            .add_header(header::COOKIE, cookie(&token))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_logout_without_sessions_is_not_found() {
        let (server, state) = session_server(AuthType::BasicAuth).await;
        create_test_user(&state.db, "nolog@hbtn.io").await;
        let header_value = crate::auth::basic::encode_header("nolog@hbtn.io", TEST_PASSWORD);

        server
            .delete(LOGOUT)
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&header_value).unwrap())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

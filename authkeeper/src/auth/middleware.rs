//! Route protection middleware.
//!
//! [`require_authentication`] runs before every protected handler:
//!
//! - paths the authenticator does not guard pass straight through
//! - no credential on the request at all ⇒ 401
//! - a credential that resolves to nobody ⇒ 403
//! - otherwise the caller is stored in the request extensions as a [`CurrentUser`]

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, trace};

use super::request::RequestView;
use crate::{AppState, api::models::users::CurrentUser, errors::Error, types::abbrev_uuid};

/// Implementation for [`require_authentication`]. Only the request is modified, so it is
/// returned for the caller to forward.
pub(crate) async fn authenticate_request(state: &AppState, mut request: Request) -> Result<Request, Error> {
    let view = RequestView::from_request(&request);
    let authenticator = &state.authenticator;

    if !authenticator.require_auth(Some(&view.path), &state.excluded_paths) {
        trace!("Path {} does not require authentication", view.path);
        return Ok(request);
    }

    if !authenticator.has_credential(&view) {
        return Err(Error::Unauthenticated { message: None });
    }

    let user = authenticator
        .resolve_identity(&view)
        .await?
        .ok_or(Error::Forbidden { message: None })?;

    debug!(user_id = %abbrev_uuid(&user.id), "Authenticated request to {}", view.path);
    request.extensions_mut().insert(CurrentUser::from(user));
    Ok(request)
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn require_authentication(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let request = authenticate_request(&state, request).await?;
    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        http::{HeaderValue, StatusCode, header},
        middleware::from_fn_with_state,
        routing::get,
    };
    use axum_test::TestServer;

    use super::*;
    use crate::{
        auth::basic::encode_header,
        config::AuthType,
        test_utils::{TEST_PASSWORD, create_test_app_state, create_test_config, create_test_pool, create_test_user},
    };

    async fn whoami(user: CurrentUser) -> Json<CurrentUser> {
        Json(user)
    }

    async fn server(auth_type: AuthType) -> (TestServer, AppState) {
        let pool = create_test_pool().await;
        let mut config = create_test_config();
        config.auth.auth_type = auth_type;
        config.auth.excluded_paths = vec!["/open/".to_string()];
        let state = create_test_app_state(pool, config);

        let app = Router::new()
            .route("/open", get(|| async { "open" }))
            .route("/me", get(whoami))
            .layer(from_fn_with_state(state.clone(), require_authentication))
            .with_state(state.clone());
        (TestServer::new(app).unwrap(), state)
    }

    #[test_log::test(tokio::test)]
    async fn test_basic_auth_statuses() {
        let (server, state) = server(AuthType::BasicAuth).await;
        let user = create_test_user(&state.db, "mw@example.com").await;

        server.get("/open").await.assert_status_ok();
        server.get("/me").await.assert_status(StatusCode::UNAUTHORIZED);

        let bad = encode_header("mw@example.com", "wrong");
        server
            .get("/me")
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&bad).unwrap())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let good = encode_header("mw@example.com", TEST_PASSWORD);
        let response = server
            .get("/me")
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&good).unwrap())
            .await;
        response.assert_status_ok();
        let body: CurrentUser = response.json();
        assert_eq!(body.id, user.id);
    }

    #[test_log::test(tokio::test)]
    async fn test_session_auth_statuses() {
        let (server, state) = server(AuthType::SessionAuth).await;
        let user = create_test_user(&state.db, "cookie-mw@example.com").await;

        server.get("/me").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/me")
            .add_header(header::COOKIE, HeaderValue::from_static("session_id=forged"))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let token = state.authenticator.create_session(user.id).await.unwrap().unwrap();
        server
            .get("/me")
            .add_header(header::COOKIE, HeaderValue::from_str(&format!("session_id={token}")).unwrap())
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_null_auth_lets_everything_through_but_has_no_user() {
        let (server, _state) = server(AuthType::None).await;

        server.get("/open").await.assert_status_ok();
        // Nothing guarded, but the extractor still needs an identity
        server.get("/me").await.assert_status(StatusCode::UNAUTHORIZED);
    }
}

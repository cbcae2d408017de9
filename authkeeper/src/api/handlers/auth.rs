//! Account routes backed by [`IdentityService`](crate::auth::identity::IdentityService).
//!
//! These routes read the session cookie themselves and look the session up on the user row, so
//! they behave the same whatever authenticator guards `/api/v1`.

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use super::{clear_session_cookie, session_cookie};
use crate::{
    AppState,
    api::models::auth::{
        CredentialsForm, EmailMessageResponse, EmailResponse, MessageResponse, ResetTokenForm, ResetTokenResponse,
        UpdatePasswordForm, WithCookie, required,
    },
    auth::request::RequestView,
    db::models::users::User,
    errors::Error,
    redact::redact_pii,
};

fn check_password_length(state: &AppState, password: &str) -> Result<(), Error> {
    let min_length = state.config.auth.password.min_length;
    if password.chars().count() < min_length {
        return Err(Error::BadRequest {
            message: format!("password must be at least {min_length} characters"),
        });
    }
    Ok(())
}

/// The account bound to the request's session cookie, or 403.
async fn session_user(state: &AppState, headers: HeaderMap) -> Result<User, Error> {
    let view = RequestView::new("", headers);
    let token = view.cookie(&state.config.auth.session.cookie_name);
    state
        .identity
        .resolve_session(token.as_deref())
        .await?
        .ok_or(Error::Forbidden { message: None })
}

/// Map a "nothing bound to this" result to a plain 403.
fn forbid_not_found(error: Error) -> Error {
    match error {
        Error::NotFound { .. } => Error::Forbidden { message: None },
        other => other,
    }
}

pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Bienvenue".to_string(),
    })
}

#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Form(form): Form<CredentialsForm>) -> Result<Json<EmailMessageResponse>, Error> {
    let email = required(&form.email, "email")?;
    let password = required(&form.password, "password")?;
    check_password_length(&state, password)?;

    let user = state.identity.register(email, password).await?;
    Ok(Json(EmailMessageResponse {
        email: user.email,
        message: "user created".to_string(),
    }))
}

#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Form(form): Form<CredentialsForm>) -> Result<WithCookie<EmailMessageResponse>, Error> {
    let email = required(&form.email, "email")?;
    let password = required(&form.password, "password")?;
    info!("Login attempt: {}", redact_pii(&format!("email={email};password={password};")));

    if !state.identity.validate_login(email, password).await? {
        return Err(Error::Unauthenticated { message: None });
    }

    let token = state
        .identity
        .create_session(email)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    Ok(WithCookie {
        body: EmailMessageResponse {
            email: email.to_string(),
            message: "logged in".to_string(),
        },
        cookie: session_cookie(&state.config.auth.session, &token),
    })
}

/// Ends the account session and redirects home.
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    let user = session_user(&state, headers).await?;
    state.identity.destroy_session(user.id).await?;

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie(&state.config.auth.session)),
        ],
    )
        .into_response())
}

#[tracing::instrument(skip_all)]
pub async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<EmailResponse>, Error> {
    let user = session_user(&state, headers).await?;
    Ok(Json(EmailResponse { email: user.email }))
}

#[tracing::instrument(skip_all)]
pub async fn get_reset_password_token(
    State(state): State<AppState>,
    Form(form): Form<ResetTokenForm>,
) -> Result<Json<ResetTokenResponse>, Error> {
    let email = required(&form.email, "email")?;
    let reset_token = state.identity.issue_reset_token(email).await.map_err(forbid_not_found)?;

    Ok(Json(ResetTokenResponse {
        email: email.to_string(),
        reset_token,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn update_password(
    State(state): State<AppState>,
    Form(form): Form<UpdatePasswordForm>,
) -> Result<Json<EmailMessageResponse>, Error> {
    let email = required(&form.email, "email")?;
    let reset_token = required(&form.reset_token, "reset_token")?;
    let new_password = required(&form.new_password, "new_password")?;
    check_password_length(&state, new_password)?;

    state
        .identity
        .apply_reset_for(email, reset_token, new_password)
        .await
        .map_err(forbid_not_found)?;

    Ok(Json(EmailMessageResponse {
        email: email.to_string(),
        message: "Password updated".to_string(),
    }))
}

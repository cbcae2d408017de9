//! API request/response models for authentication.
//!
//! Request bodies are HTML forms. Fields are optional at the type level so that handlers can
//! answer a missing field with a precise 400 instead of a generic extractor rejection.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// The non-empty field value, or a 400 `"<name> missing"`.
pub fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::BadRequest {
            message: format!("{name} missing"),
        })
}

/// `email` + `password` form used by registration and both login routes
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request to issue a password reset token
#[derive(Debug, Default, Deserialize)]
pub struct ResetTokenForm {
    pub email: Option<String>,
}

/// Request to set a new password with a reset token
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePasswordForm {
    pub email: Option<String>,
    pub reset_token: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessageResponse {
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailResponse {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetTokenResponse {
    pub email: String,
    pub reset_token: String,
}

/// JSON body plus a `Set-Cookie` header.
pub struct WithCookie<T> {
    pub body: T,
    pub cookie: String,
}

impl<T: Serialize> IntoResponse for WithCookie<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)], Json(self.body)).into_response()
    }
}

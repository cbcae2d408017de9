//! Probe routes. All three are excluded from authentication by default.

use axum::Json;
use serde_json::{Value, json};

use crate::errors::Error;

pub async fn status() -> Json<Value> {
    Json(json!({"status": "OK"}))
}

pub async fn unauthorized() -> Result<Json<Value>, Error> {
    Err(Error::Unauthenticated { message: None })
}

pub async fn forbidden() -> Result<Json<Value>, Error> {
    Err(Error::Forbidden { message: None })
}

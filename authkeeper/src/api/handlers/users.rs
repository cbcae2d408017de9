use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserResponse},
    db::models::users::UserFilter,
    errors::Error,
};

/// The authenticated caller's account.
#[tracing::instrument(skip_all)]
pub async fn get_current_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let user = state
        .identity
        .users()
        .find_one(&UserFilter::by_id(current_user.id))
        .await?
        .ok_or_else(|| Error::NotFound {
            message: "User not found".to_string(),
        })?;
    Ok(Json(UserResponse::from(user)))
}

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppError,
    handlers::AppJson,
    models::user::{AccessToken, Credentials},
    AppState,
};

/// Trims the email so the stored value is the one that was checked.
fn normalize(credentials: Credentials) -> Result<Credentials, AppError> {
    let email = credentials.email.trim().to_owned();
    if email.is_empty() {
        return Err(AppError::BadRequest("email should not be empty".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(AppError::BadRequest(
            "password should not be empty".to_string(),
        ));
    }
    Ok(Credentials {
        email,
        password: credentials.password,
    })
}

pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<(StatusCode, Json<AccessToken>), AppError> {
    let token = state.auth.register_user(normalize(payload)?).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

pub async fn signin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<Json<AccessToken>, AppError> {
    let token = state.auth.authenticate_user(normalize(payload)?).await?;
    Ok(Json(token))
}

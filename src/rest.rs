use axum::{routing::post, Router};

use crate::{handlers::auth, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .with_state(state)
}

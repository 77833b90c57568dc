pub mod auth;

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` body extractor whose rejections use the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

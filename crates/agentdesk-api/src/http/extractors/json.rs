//! JSON body extractor whose rejection is a 400 `VALIDATION_ERROR`.

use axum::extract::FromRequest;

use crate::http::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

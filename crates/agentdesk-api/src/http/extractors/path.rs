//! Path parameter extractor.

use axum::extract::FromRequestParts;

use crate::http::error::AppError;

/// Path extractor whose rejection is a 400 `VALIDATION_ERROR`, e.g. for
/// `/agents/abc`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

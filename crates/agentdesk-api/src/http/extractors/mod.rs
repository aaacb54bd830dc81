//! Request extractors with rejections mapped onto [`AppError`](crate::http::error::AppError).

pub mod json;
pub mod path;
pub mod query;

//! Query parameter extractors for list endpoints.

use agentdesk_types::config::ServerConfig;
use agentdesk_types::page::PageRequest;
use axum::extract::FromRequestParts;
use serde::Deserialize;

use crate::http::error::AppError;

/// Query string extractor whose rejection is a 400 `VALIDATION_ERROR`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `?page=&per_page=` on every list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// Resolve against the server limits; `default_per_page` differs for logs.
    pub fn resolve(&self, default_per_page: u32, config: &ServerConfig) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(default_per_page),
            config.max_per_page,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_and_clamps() {
        let config = ServerConfig::default();
        let query = PageQuery::default();
        assert_eq!(query.resolve(10, &config), PageRequest { page: 1, per_page: 10 });

        let query = PageQuery {
            page: Some(0),
            per_page: Some(10_000),
        };
        assert_eq!(query.resolve(20, &config), PageRequest { page: 1, per_page: 100 });
    }
}

//! Response shapes shared by the list endpoints.

use agentdesk_types::page::Page;
use serde::Serialize;
use serde_json::{Map, Value};

/// `{<items_key>: [...], total, pages, current_page, per_page}`.
pub fn paginated<T: Serialize>(items_key: &str, page: Page<T>) -> serde_json::Result<Value> {
    let mut body = Map::new();
    body.insert("total".to_string(), Value::from(page.total));
    body.insert("pages".to_string(), Value::from(page.pages()));
    body.insert("current_page".to_string(), Value::from(page.page));
    body.insert("per_page".to_string(), Value::from(page.per_page));
    body.insert(items_key.to_string(), serde_json::to_value(&page.items)?);
    Ok(Value::Object(body))
}

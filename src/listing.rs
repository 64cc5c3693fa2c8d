use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One Marketplace listing as extracted from the search results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MarketplaceItem {
    pub title: String,
    pub price: String,
    pub location: String,
    pub time_posted: String,
}

impl MarketplaceItem {
    pub fn new(
        title: impl Into<String>,
        price: impl Into<String>,
        location: impl Into<String>,
        time_posted: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            location: location.into(),
            time_posted: time_posted.into(),
        }
    }
}

/// The extraction target handed to the agent: `{ "items": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MarketplaceItems {
    pub items: Vec<MarketplaceItem>,
}

/// JSON Schema for [`MarketplaceItems`], in the form sent with an extract call.
pub fn extraction_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(MarketplaceItems);
    // RootSchema only holds maps and strings
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}

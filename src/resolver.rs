//! Turns whatever the extraction agent handed back into a validated list of
//! [`MarketplaceItem`]s, or a failure carrying the raw response for inspection.
//!
//! Strategies are tried in a fixed order regardless of the agent's own
//! `matches_schema` claim:
//!
//! 1. `{ "items": [...] }`
//! 2. the same keyed form, retried once
//! 3. a bare `[...]` of records
//!
//! A single invalid record rejects the whole attempt it belongs to.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationFault;
use crate::listing::MarketplaceItem;

/// Which parse attempt produced a successful outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    KeyedItems,
    KeyedItemsRetry,
    BareSequence,
}

impl Strategy {
    const CHAIN: [Strategy; 3] = [
        Strategy::KeyedItems,
        Strategy::KeyedItemsRetry,
        Strategy::BareSequence,
    ];

    fn attempt(self, candidate: &Value) -> Result<Vec<MarketplaceItem>, ValidationFault> {
        match self {
            Strategy::KeyedItems | Strategy::KeyedItemsRetry => validate_keyed_items(candidate),
            Strategy::BareSequence => validate_sequence(candidate, ""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Success {
        items: Vec<MarketplaceItem>,
        strategy: Strategy,
    },
    Failure {
        raw_response: String,
        error_detail: Option<String>,
    },
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }

    pub fn items(&self) -> Option<&[MarketplaceItem]> {
        match self {
            ParseOutcome::Success { items, .. } => Some(items),
            ParseOutcome::Failure { .. } => None,
        }
    }
}

/// Resolve an extraction result into a [`ParseOutcome`].
///
/// The agent's schema-matched hint is accepted for parity with its response
/// but never short-circuits validation. `None` means the agent produced no
/// parsed payload at all.
///
/// A failure only carries detail when the payload was a list whose records
/// did not validate; any other shape fails without one.
pub fn resolve(candidate: Option<&Value>, _schema_matched_hint: bool, raw_text: &str) -> ParseOutcome {
    let Some(candidate) = candidate else {
        return ParseOutcome::Failure {
            raw_response: raw_text.to_string(),
            error_detail: None,
        };
    };

    let mut last_fault = None;
    for strategy in Strategy::CHAIN {
        match strategy.attempt(candidate) {
            Ok(items) => return ParseOutcome::Success { items, strategy },
            Err(fault) => {
                log::debug!("{strategy:?} rejected the payload: {fault}");
                last_fault = Some(fault);
            }
        }
    }

    let error_detail = match last_fault {
        Some(fault @ ValidationFault::Schema { .. }) => Some(fault.to_string()),
        _ => None,
    };
    ParseOutcome::Failure {
        raw_response: raw_text.to_string(),
        error_detail,
    }
}

fn validate_keyed_items(candidate: &Value) -> Result<Vec<MarketplaceItem>, ValidationFault> {
    let Value::Object(map) = candidate else {
        return Err(ValidationFault::Structure {
            expected: "an object with an `items` array",
            found: kind_of(candidate),
        });
    };
    let items = map.get("items").ok_or_else(|| ValidationFault::Schema {
        path: "items".to_string(),
        message: "field required".to_string(),
    })?;
    if !items.is_array() {
        return Err(ValidationFault::Schema {
            path: "items".to_string(),
            message: format!("expected an array, got {}", kind_of(items)),
        });
    }
    validate_sequence(items, "items")
}

fn validate_sequence(candidate: &Value, prefix: &str) -> Result<Vec<MarketplaceItem>, ValidationFault> {
    let Value::Array(elements) = candidate else {
        return Err(ValidationFault::Structure {
            expected: "an array of records",
            found: kind_of(candidate),
        });
    };
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| validate_record(element, &format!("{prefix}[{index}]")))
        .collect()
}

fn validate_record(element: &Value, path: &str) -> Result<MarketplaceItem, ValidationFault> {
    // serde would happily read a struct out of a 4-element array
    if !element.is_object() {
        return Err(ValidationFault::Schema {
            path: path.to_string(),
            message: format!("expected an object, got {}", kind_of(element)),
        });
    }
    MarketplaceItem::deserialize(element).map_err(|err| ValidationFault::Schema {
        path: path.to_string(),
        message: err.to_string(),
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

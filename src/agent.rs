use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use crate::error::Result;
use crate::stagehand::{ActResponseEvent, ExtractResponseEvent, Stagehand};

/// What an extraction call hands back, before any local validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionResponse {
    /// The agent's own belief that `parsed_response` fits the schema.
    pub matches_schema: bool,
    pub parsed_response: Option<Value>,
    pub response: String,
}

impl ExtractionResponse {
    /// Builds a response from the final extract payload.
    ///
    /// A string payload holding JSON text is parsed; any other string stays a
    /// JSON string. `null` counts as no parsed payload.
    pub fn from_payload(payload: Value, matches_schema: bool) -> Self {
        let response = match &payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let parsed_response = match payload {
            Value::Null => None,
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Null) => None,
                Ok(parsed) => Some(parsed),
                Err(_) => Some(Value::String(text)),
            },
            other => Some(other),
        };
        Self { matches_schema, parsed_response, response }
    }
}

/// The browser-automation collaborator the scout drives.
#[async_trait]
pub trait ExtractionAgent: Send {
    /// Performs one natural-language action and reports whether the agent
    /// considered it successful.
    async fn act(&mut self, instruction: &str) -> Result<bool>;

    async fn extract(&mut self, instruction: &str, schema: Value) -> Result<ExtractionResponse>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl ExtractionAgent for Stagehand {
    async fn act(&mut self, instruction: &str) -> Result<bool> {
        let mut stream = Stagehand::act(self, instruction).await?;
        let mut success = false;
        while let Some(item) = stream.next().await {
            match item?.event {
                Some(ActResponseEvent::Log(line)) => log::debug!("[act] {}", line.message),
                Some(ActResponseEvent::Success(s)) => success = s,
                None => {}
            }
        }
        Ok(success)
    }

    async fn extract(&mut self, instruction: &str, schema: Value) -> Result<ExtractionResponse> {
        let mut stream = Stagehand::extract(self, instruction, schema).await?;
        let mut response = ExtractionResponse::default();
        while let Some(item) = stream.next().await {
            match item?.event {
                Some(ExtractResponseEvent::Log(line)) => log::debug!("[extract] {}", line.message),
                Some(ExtractResponseEvent::Data { json, validated }) => {
                    response = ExtractionResponse::from_payload(json, validated);
                }
                None => {}
            }
        }
        Ok(response)
    }

    async fn close(&mut self) -> Result<()> {
        self.end().await
    }
}

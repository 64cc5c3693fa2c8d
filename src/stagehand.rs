use async_trait::async_trait;
use eventsource_client::{Client as SseClient, ClientBuilder, ReconnectOptions, SSE};
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{Result, ScoutError};

pub const DEFAULT_API_URL: &str = "https://api.stagehand.browserbase.com/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-5-nano";

// =============================================================================
// Native Response Types
// =============================================================================

/// Log line from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Events that can occur during act
#[derive(Debug, Clone, PartialEq)]
pub enum ActResponseEvent {
    Log(LogLine),
    Success(bool),
}

/// Response from act operation
#[derive(Debug, Clone, PartialEq)]
pub struct ActResponse {
    pub event: Option<ActResponseEvent>,
}

/// Events that can occur during extract
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractResponseEvent {
    Log(LogLine),
    /// `validated` is set when the payload arrived as a finished system event,
    /// i.e. after the server ran its own schema check.
    Data {
        json: serde_json::Value,
        validated: bool,
    },
}

/// Response from extract operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractResponse {
    pub event: Option<ExtractResponseEvent>,
}

pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

// =============================================================================
// Configuration Types
// =============================================================================

/// Model configuration object for API - uses camelCase field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelObj {
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Env {
    #[default]
    Local,
    Browserbase,
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Env::Local => write!(f, "LOCAL"),
            Env::Browserbase => write!(f, "BROWSERBASE"),
        }
    }
}

impl std::str::FromStr for Env {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Env::Local),
            "browserbase" => Ok(Env::Browserbase),
            other => Err(ScoutError::config(format!(
                "unknown environment '{other}', expected 'local' or 'browserbase'"
            ))),
        }
    }
}

/// User-facing model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Model {
    String(String),
    Config {
        model_name: String,
        api_key: Option<String>,
        base_url: Option<String>,
    },
}

impl Model {
    pub fn name(&self) -> &str {
        match self {
            Model::String(s) => s,
            Model::Config { model_name, .. } => model_name,
        }
    }
}

impl From<Model> for ModelObj {
    fn from(m: Model) -> Self {
        match m {
            Model::String(model_name) => ModelObj { model_name, api_key: None, base_url: None },
            Model::Config { model_name, api_key, base_url } => ModelObj { model_name, api_key, base_url },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBrowserLaunchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub env: Env,
    pub model: Option<Model>,
    pub local_browser_launch_options: Option<LocalBrowserLaunchOptions>,
    pub system_prompt: Option<String>,
    pub dom_settle_timeout_ms: Option<u32>,
    pub act_timeout_ms: Option<u32>,
    pub verbose: Option<i32>,
}

/// Keys sent with every request. Browserbase keys are only needed for
/// [`Env::Browserbase`] sessions.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub model_api_key: String,
    pub browserbase_api_key: Option<String>,
    pub browserbase_project_id: Option<String>,
}

/// Transport selection for connecting to Stagehand API
#[derive(Debug, Clone, PartialEq)]
pub enum TransportChoice {
    /// REST + SSE transport
    Rest(String),
}

// =============================================================================
// Transport Abstraction Layer
// =============================================================================

/// Transport trait for Stagehand API communication
#[async_trait]
pub trait Transport: Send + Sync {
    /// Starts a browser session and returns its id.
    async fn start(&mut self, opts: SessionOptions) -> Result<String>;
    async fn act(&mut self, session_id: &str, instruction: String, model: Option<Model>, timeout: Option<u32>) -> Result<EventStream<ActResponse>>;
    async fn extract(&mut self, session_id: &str, instruction: String, schema: serde_json::Value, model: Option<Model>, timeout: Option<u32>) -> Result<EventStream<ExtractResponse>>;
    async fn end(&mut self, session_id: &str) -> Result<()>;
}

// =============================================================================
// Stream frame decoding
// =============================================================================

/// One decoded SSE payload, before it is mapped onto an operation's events.
#[derive(Debug, Clone, PartialEq)]
enum StreamFrame {
    Log(LogLine),
    Finished(serde_json::Value),
    /// Payload without a `type` tag; the whole body is the result.
    Bare(serde_json::Value),
    Ignored,
}

impl StreamFrame {
    fn decode(json_value: serde_json::Value) -> Result<Self> {
        let Some(event_type) = json_value["type"].as_str() else {
            return Ok(StreamFrame::Bare(json_value));
        };
        match event_type {
            "system" => match json_value["data"]["status"].as_str() {
                Some("finished") => Ok(StreamFrame::Finished(json_value["data"]["result"].clone())),
                Some("error") => Err(ScoutError::api(
                    json_value["data"]["error"].as_str().unwrap_or("Unknown error"),
                )),
                _ => Ok(StreamFrame::Ignored),
            },
            "log" => {
                let data = &json_value["data"];
                Ok(StreamFrame::Log(LogLine {
                    message: data["message"].as_str().unwrap_or("").to_string(),
                    status: data["status"].as_str().map(|s| s.to_string()),
                }))
            }
            _ => Ok(StreamFrame::Ignored),
        }
    }

    /// Whether the server is done with this operation.
    fn is_terminal(json_value: &serde_json::Value) -> bool {
        json_value["type"].as_str() == Some("system")
            && matches!(json_value["data"]["status"].as_str(), Some("finished" | "error"))
    }
}

fn decode_act_event(json_value: serde_json::Value) -> Result<ActResponse> {
    let event = match StreamFrame::decode(json_value)? {
        StreamFrame::Log(log) => Some(ActResponseEvent::Log(log)),
        StreamFrame::Finished(result) => {
            Some(ActResponseEvent::Success(result["success"].as_bool().unwrap_or(true)))
        }
        StreamFrame::Bare(body) => Some(ActResponseEvent::Success(body["success"].as_bool().unwrap_or(true))),
        StreamFrame::Ignored => None,
    };
    Ok(ActResponse { event })
}

fn decode_extract_event(json_value: serde_json::Value) -> Result<ExtractResponse> {
    let event = match StreamFrame::decode(json_value)? {
        StreamFrame::Log(log) => Some(ExtractResponseEvent::Log(log)),
        StreamFrame::Finished(json) => Some(ExtractResponseEvent::Data { json, validated: true }),
        StreamFrame::Bare(json) => Some(ExtractResponseEvent::Data { json, validated: false }),
        StreamFrame::Ignored => None,
    };
    Ok(ExtractResponse { event })
}

// =============================================================================
// REST Transport Implementation
// =============================================================================

pub struct RestTransport {
    base_url: String,
    credentials: Credentials,
    client: Arc<Client>,
}

impl RestTransport {
    pub fn new(base_url: String, credentials: Credentials) -> Result<Self> {
        if credentials.model_api_key.is_empty() {
            return Err(ScoutError::MissingApiKey(
                "MODEL_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client: Arc::new(Client::new()),
        })
    }

    fn headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers = vec![
            ("x-model-api-key", self.credentials.model_api_key.as_str()),
            ("x-language", "typescript"),
            ("x-sdk-version", "3.0.0"),
            ("Content-Type", "application/json"),
        ];
        if let Some(key) = &self.credentials.browserbase_api_key {
            headers.push(("x-bb-api-key", key.as_str()));
        }
        if let Some(project) = &self.credentials.browserbase_project_id {
            headers.push(("x-bb-project-id", project.as_str()));
        }
        headers
    }

    async fn post_json(&self, path: &str, body: serde_json::Value, stream: bool) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).header("x-stream-response", stream.to_string());
        for (name, value) in self.headers() {
            request = request.header(name, value);
        }
        let response = request.json(&body).send().await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn execute_stream(&self, path: &str, body: serde_json::Value) -> Result<EventStream<serde_json::Value>> {
        let url = format!("{}{}", self.base_url, path);

        let mut client_builder = ClientBuilder::for_url(&url)?.header("x-stream-response", "true")?;
        for (name, value) in self.headers() {
            client_builder = client_builder.header(name, value)?;
        }
        let sse_client = client_builder
            .method(reqwest::Method::POST.to_string())
            .body(body.to_string())
            .reconnect(ReconnectOptions::reconnect(false).build())
            .build();
        let (tx, rx) = tokio::sync::mpsc::channel(100);

        tokio::spawn(async move {
            let mut stream = sse_client.stream();
            while let Some(event) = stream.next().await {
                match event {
                    Ok(SSE::Event(e)) => match serde_json::from_str::<serde_json::Value>(&e.data) {
                        Ok(event_data) => {
                            let terminal = StreamFrame::is_terminal(&event_data);
                            if tx.send(Ok(event_data)).await.is_err() || terminal {
                                break;
                            }
                        }
                        Err(_) => {
                            let _ = tx.send(Err(ScoutError::api(format!("Failed to parse SSE event: {}", e.data)))).await;
                        }
                    },
                    Ok(_) => {}
                    Err(eventsource_client::Error::Eof) => break,
                    Err(e) => {
                        let _ = tx.send(Err(ScoutError::Transport(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartPayload<'a> {
    model_name: &'a str,
    env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_browser_launch_options: Option<&'a LocalBrowserLaunchOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dom_settle_timeout_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<&'a String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    act_timeout_ms: Option<u32>,
}

impl<'a> StartPayload<'a> {
    fn from_options(opts: &'a SessionOptions) -> Self {
        StartPayload {
            model_name: opts.model.as_ref().map(Model::name).unwrap_or(DEFAULT_MODEL),
            env: opts.env.to_string(),
            local_browser_launch_options: match opts.env {
                Env::Local => opts.local_browser_launch_options.as_ref(),
                Env::Browserbase => None,
            },
            dom_settle_timeout_ms: opts.dom_settle_timeout_ms,
            verbose: opts.verbose.map(|v| v.to_string()),
            system_prompt: opts.system_prompt.as_ref(),
            act_timeout_ms: opts.act_timeout_ms,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ModelObj>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u32>,
}

impl OperationOptions {
    fn build(model: Option<Model>, timeout: Option<u32>) -> Option<Self> {
        if model.is_none() && timeout.is_none() {
            return None;
        }
        Some(OperationOptions { model: model.map(ModelObj::from), timeout })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActPayload {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OperationOptions>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OperationOptions>,
}

#[async_trait]
impl Transport for RestTransport {
    async fn start(&mut self, opts: SessionOptions) -> Result<String> {
        if opts.env == Env::Browserbase {
            if self.credentials.browserbase_api_key.is_none() {
                return Err(ScoutError::MissingApiKey("BROWSERBASE_API_KEY".to_string()));
            }
            if self.credentials.browserbase_project_id.is_none() {
                return Err(ScoutError::MissingApiKey("BROWSERBASE_PROJECT_ID".to_string()));
            }
        }

        let body = serde_json::to_value(StartPayload::from_options(&opts))?;

        // Start uses a regular HTTP POST, not SSE streaming
        let json_value = self.post_json("/sessions/start", body, false).await?;
        session_id_from_start(&json_value)
    }

    async fn act(&mut self, session_id: &str, instruction: String, model: Option<Model>, timeout: Option<u32>) -> Result<EventStream<ActResponse>> {
        let payload = ActPayload {
            input: instruction,
            options: OperationOptions::build(model, timeout),
        };
        let body = serde_json::to_value(payload)?;
        let json_stream = self.execute_stream(&format!("/sessions/{}/act", session_id), body).await?;
        Ok(Box::pin(json_stream.map(|item| item.and_then(decode_act_event))))
    }

    async fn extract(&mut self, session_id: &str, instruction: String, schema: serde_json::Value, model: Option<Model>, timeout: Option<u32>) -> Result<EventStream<ExtractResponse>> {
        let payload = ExtractPayload {
            instruction: if instruction.is_empty() { None } else { Some(instruction) },
            schema: if schema.is_null() { None } else { Some(schema) },
            options: OperationOptions::build(model, timeout),
        };
        let body = serde_json::to_value(payload)?;
        let json_stream = self.execute_stream(&format!("/sessions/{}/extract", session_id), body).await?;
        Ok(Box::pin(json_stream.map(|item| item.and_then(decode_extract_event))))
    }

    async fn end(&mut self, session_id: &str) -> Result<()> {
        self.post_json(&format!("/sessions/{}/end", session_id), serde_json::json!({}), false).await?;
        Ok(())
    }
}

fn session_id_from_start(json_value: &serde_json::Value) -> Result<String> {
    if !json_value["success"].as_bool().unwrap_or(false) {
        return Err(ScoutError::api(json_value["error"].as_str().unwrap_or("Unknown error")));
    }
    if !json_value["data"]["available"].as_bool().unwrap_or(false) {
        return Err(ScoutError::api("Stagehand API not available for this account"));
    }
    match json_value["data"]["sessionId"].as_str() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ScoutError::api("Start response did not include a session ID.")),
    }
}

// =============================================================================
// The Stagehand Client
// =============================================================================

pub struct Stagehand {
    transport: Box<dyn Transport + Send + Sync>,
    session_id: Option<String>,
    model: Option<Model>,
    act_timeout_ms: Option<u32>,
}

impl Stagehand {
    pub async fn connect(transport_choice: TransportChoice, credentials: Credentials) -> Result<Self> {
        let transport: Box<dyn Transport + Send + Sync> = match transport_choice {
            TransportChoice::Rest(base_url) => Box::new(RestTransport::new(base_url, credentials)?),
        };
        Ok(Self::with_transport(transport))
    }

    pub fn with_transport(transport: Box<dyn Transport + Send + Sync>) -> Self {
        Self { transport, session_id: None, model: None, act_timeout_ms: None }
    }

    pub async fn start(&mut self, opts: SessionOptions) -> Result<()> {
        self.model = opts.model.clone();
        self.act_timeout_ms = opts.act_timeout_ms;
        let session_id = self.transport.start(opts).await?;
        log::info!("Stagehand session started: {session_id}");
        self.session_id = Some(session_id);
        Ok(())
    }

    pub async fn act(&mut self, instruction: impl Into<String>) -> Result<EventStream<ActResponse>> {
        let session_id = self.require_session()?;
        self.transport.act(&session_id, instruction.into(), self.model.clone(), self.act_timeout_ms).await
    }

    pub async fn extract(&mut self, instruction: impl Into<String>, schema: serde_json::Value) -> Result<EventStream<ExtractResponse>> {
        let session_id = self.require_session()?;
        self.transport.extract(&session_id, instruction.into(), schema, self.model.clone(), self.act_timeout_ms).await
    }

    /// Ends the session. The client can be started again afterwards.
    pub async fn end(&mut self) -> Result<()> {
        let session_id = self.require_session()?;
        self.transport.end(&session_id).await?;
        self.session_id = None;
        Ok(())
    }

    /// Returns the session ID if started
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn require_session(&self) -> Result<String> {
        self.session_id.clone().ok_or_else(|| ScoutError::api("Session not initialized"))
    }
}

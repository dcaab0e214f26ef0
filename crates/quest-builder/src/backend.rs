//! Quest Builder Backend client.
//!
//! [`QuestBackend`] is the contract the session controller and the quest
//! library need from the backend. [`HttpBackend`] implements it over
//! HTTP/JSON with reqwest.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::BuilderConfig;
use crate::error::BuilderError;
use crate::schema::{ChatRequest, ChatResponse, ErrorBody, ExistingQuest};

pub const CHAT_PATH: &str = "/api/builder/chat";
pub const EXISTING_QUESTS_PATH: &str = "/api/quests/existing";
pub const LOAD_SAMPLE_QUESTS_PATH: &str = "/api/quests/load_yaml_quests";

/// The three backend operations the core depends on.
pub trait QuestBackend {
    /// Sends one chat turn. The backend assigns the session id on the first
    /// call and may renew it on any later one.
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, BuilderError>> + Send;

    /// Lists approved quests from the library.
    fn existing_quests(
        &self,
    ) -> impl Future<Output = Result<Vec<ExistingQuest>, BuilderError>> + Send;

    /// Asks the backend to seed its sample quests.
    fn load_sample_quests(&self) -> impl Future<Output = Result<(), BuilderError>> + Send;
}

/// reqwest-backed [`QuestBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BuilderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BuilderError::Config(format!("failed to build HTTP client: {}", err)))?;
        Ok(HttpBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &BuilderConfig) -> Result<Self, BuilderError> {
        Self::new(&config.backend_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_err(&self, err: reqwest::Error) -> BuilderError {
        if err.is_timeout() {
            BuilderError::Timeout(self.timeout)
        } else {
            BuilderError::Transport(err.to_string())
        }
    }

    /// Reads the body, mapping non-success statuses to [`BuilderError::Status`].
    async fn read_body(&self, response: reqwest::Response) -> Result<String, BuilderError> {
        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|err| self.transport_err(err))?;

        if !status.is_success() {
            return Err(BuilderError::Status {
                status: status.as_u16(),
                detail: error_detail(&body_text),
            });
        }
        Ok(body_text)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BuilderError> {
        let body_text = self.read_body(response).await?;
        serde_json::from_str(&body_text).map_err(|err| BuilderError::Decode(err.to_string()))
    }
}

impl QuestBackend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BuilderError> {
        tracing::debug!(
            session_id = request.session_id.as_deref().unwrap_or("<new>"),
            "POST {}",
            CHAT_PATH
        );
        let response = self
            .client
            .post(self.endpoint(CHAT_PATH))
            .json(request)
            .send()
            .await
            .map_err(|err| self.transport_err(err))?;
        self.read_json(response).await
    }

    async fn existing_quests(&self) -> Result<Vec<ExistingQuest>, BuilderError> {
        let response = self
            .client
            .get(self.endpoint(EXISTING_QUESTS_PATH))
            .send()
            .await
            .map_err(|err| self.transport_err(err))?;
        self.read_json(response).await
    }

    async fn load_sample_quests(&self) -> Result<(), BuilderError> {
        let response = self
            .client
            .post(self.endpoint(LOAD_SAMPLE_QUESTS_PATH))
            .send()
            .await
            .map_err(|err| self.transport_err(err))?;
        self.read_body(response).await.map(|_| ())
    }
}

/// Extracts `detail` from an error body, falling back to the raw text.
fn error_detail(body_text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body_text) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
        }) => detail,
        Ok(ErrorBody {
            detail: Some(other),
        }) => other.to_string(),
        _ => body_text.trim().to_string(),
    }
}

//! Session controller: one conversation with the quest builder backend.
//!
//! [`SessionController`] owns the transcript, the backend session id and the
//! current stage, and runs the send/receive cycle:
//!
//! ```text
//! Idle --begin_send--> AwaitingReply --apply_reply / apply_failure--> Idle
//! ```
//!
//! While a reply is pending every further send is rejected (not queued), so
//! two responses can never race to overwrite the graph. The user message is
//! appended before the request goes out and is never rolled back.

use std::time::Duration;

use quest_core::reconcile::parse_snapshot;
use quest_core::QuestWorkspace;

use crate::backend::QuestBackend;
use crate::config::{BuilderConfig, DEFAULT_TIMEOUT_SECS};
use crate::error::BuilderError;
use crate::schema::{ChatMessage, ChatRequest, ChatResponse};

/// Greeting shown when a new session starts. Generated locally, never sent
/// to the backend.
pub const GREETING: &str =
    "Привет! Давай создадим квест для твоего ребенка. Расскажи, чему ты хочешь его научить?";

/// Assistant turn substituted for any failed round trip.
pub const APOLOGY: &str = "Извини, произошла ошибка. Попробуй еще раз.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
}

/// Why a send did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still pending")]
    AwaitingReply,
}

/// Result of one [`SessionController::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was appended and no request was made.
    Rejected(SendRejected),
    /// The backend replied. `graph_updated` is true when a well-formed
    /// snapshot was applied to the workspace.
    Replied { graph_updated: bool },
    /// The round trip failed and the apology was appended.
    Failed { retryable: bool },
}

#[derive(Debug, Clone)]
pub struct SessionController {
    user_id: String,
    session_id: Option<String>,
    stage: String,
    transcript: Vec<ChatMessage>,
    input: String,
    state: SessionState,
    request_timeout: Duration,
}

impl SessionController {
    /// Starts a fresh session: no session id yet, greeting in the transcript.
    pub fn new(user_id: impl Into<String>) -> Self {
        let mut controller = Self::empty(user_id.into(), None);
        controller.transcript.push(ChatMessage::assistant(GREETING));
        controller
    }

    /// Continues a session the backend already knows. No greeting is added,
    /// so a resumed conversation is not greeted twice.
    pub fn resume(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::empty(user_id.into(), Some(session_id.into()))
    }

    /// Builds a controller from config, resuming `session_id` when given.
    pub fn from_config(config: &BuilderConfig, session_id: Option<String>) -> Self {
        let controller = match session_id {
            Some(id) => Self::resume(config.user_id.clone(), id),
            None => Self::new(config.user_id.clone()),
        };
        controller.with_timeout(config.request_timeout)
    }

    fn empty(user_id: String, session_id: Option<String>) -> Self {
        SessionController {
            user_id,
            session_id,
            stage: String::new(),
            transcript: Vec::new(),
            input: String::new(),
            state: SessionState::Idle,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Last stage reported by the backend; empty before the first reply.
    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state == SessionState::AwaitingReply
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    // -----------------------------------------------------------------------
    // Send cycle
    // -----------------------------------------------------------------------

    /// Starts a turn: appends the user message, clears the input buffer and
    /// enters `AwaitingReply`. Returns the request to send.
    ///
    /// Rejected without any change when the trimmed text is empty or a reply
    /// is pending.
    pub fn begin_send(&mut self, text: &str) -> Result<ChatRequest, SendRejected> {
        if self.state == SessionState::AwaitingReply {
            return Err(SendRejected::AwaitingReply);
        }
        if text.trim().is_empty() {
            return Err(SendRejected::EmptyMessage);
        }

        self.transcript.push(ChatMessage::user(text));
        self.input.clear();
        self.state = SessionState::AwaitingReply;
        tracing::debug!("session state: Idle -> AwaitingReply");

        Ok(ChatRequest {
            user_id: self.user_id.clone(),
            message: text.to_string(),
            session_id: self.session_id.clone(),
        })
    }

    /// Applies a backend reply. Returns `true` if the graph was updated.
    ///
    /// A missing or malformed graph payload leaves the workspace untouched.
    /// Ignored unless a reply is pending.
    pub fn apply_reply(&mut self, response: ChatResponse, workspace: &mut QuestWorkspace) -> bool {
        if self.state != SessionState::AwaitingReply {
            tracing::warn!(
                "ignoring reply for session {}: no request pending",
                response.session_id
            );
            return false;
        }
        self.transcript.push(ChatMessage::assistant(response.ai_response));

        if self.session_id.as_deref() != Some(response.session_id.as_str()) {
            tracing::info!("adopting session id {}", response.session_id);
        }
        self.session_id = Some(response.session_id);
        self.stage = response.stage;

        let graph_updated = match response.graph.as_ref().and_then(parse_snapshot) {
            Some(graph) => match workspace.apply_snapshot(graph) {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!("graph snapshot not applied: {}", err);
                    false
                }
            },
            None => false,
        };

        self.state = SessionState::Idle;
        tracing::debug!(stage = %self.stage, graph_updated, "session state: AwaitingReply -> Idle");
        graph_updated
    }

    /// Records a failed round trip: logs the error and appends the apology.
    /// Ignored unless a reply is pending.
    pub fn apply_failure(&mut self, err: &BuilderError) {
        if self.state != SessionState::AwaitingReply {
            tracing::warn!("ignoring failure with no request pending: {}", err);
            return;
        }
        tracing::error!("chat turn failed: {}", err);
        self.transcript.push(ChatMessage::assistant(APOLOGY));
        self.state = SessionState::Idle;
    }

    /// Runs one full chat turn against `backend`.
    ///
    /// The backend call is bounded by the request timeout; expiry counts as
    /// a retryable failure and returns the session to `Idle`.
    pub async fn send<B: QuestBackend>(
        &mut self,
        backend: &B,
        text: &str,
        workspace: &mut QuestWorkspace,
    ) -> SendOutcome {
        let request = match self.begin_send(text) {
            Ok(request) => request,
            Err(reason) => {
                tracing::debug!("send rejected: {}", reason);
                return SendOutcome::Rejected(reason);
            }
        };

        let result = match tokio::time::timeout(self.request_timeout, backend.chat(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(BuilderError::Timeout(self.request_timeout)),
        };

        match result {
            Ok(response) => SendOutcome::Replied {
                graph_updated: self.apply_reply(response, workspace),
            },
            Err(err) => {
                let retryable = err.is_retryable();
                self.apply_failure(&err);
                SendOutcome::Failed { retryable }
            }
        }
    }

    /// Sends the current input buffer.
    pub async fn submit<B: QuestBackend>(
        &mut self,
        backend: &B,
        workspace: &mut QuestWorkspace,
    ) -> SendOutcome {
        let text = self.input.clone();
        self.send(backend, &text, workspace).await
    }
}

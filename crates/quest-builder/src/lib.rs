//! Quest builder client: session controller, backend client and quest
//! library on top of `quest-core`.
//!
//! A [`SessionController`] drives one conversation with the Quest Builder
//! Backend through any [`QuestBackend`] (the HTTP one is [`HttpBackend`]) and
//! feeds graph snapshots into a [`quest_core::QuestWorkspace`].

pub mod backend;
pub mod config;
pub mod error;
pub mod library;
pub mod schema;
pub mod session;

pub use backend::{HttpBackend, QuestBackend};
pub use config::BuilderConfig;
pub use error::BuilderError;
pub use library::QuestLibrary;
pub use schema::{ChatMessage, ChatRequest, ChatResponse, ChatRole, Difficulty, ExistingQuest};
pub use session::{SendOutcome, SendRejected, SessionController, SessionState};

//! Quest library client: browse approved quests and load one into the
//! workspace.
//!
//! Load failures never propagate into the session. They become a banner
//! message the library view shows above an empty list.

use quest_core::QuestWorkspace;

use crate::backend::QuestBackend;
use crate::error::BuilderError;
use crate::schema::ExistingQuest;

/// Banner used when listing failed and the backend gave no explanation.
pub const LOAD_FAILED_BANNER: &str = "Ошибка загрузки квестов";
/// Banner used when seeding the sample quests failed.
pub const SEED_FAILED_BANNER: &str = "Ошибка загрузки YAML квестов";

#[derive(Debug, Clone, Default)]
pub struct QuestLibrary {
    quests: Vec<ExistingQuest>,
    banner: Option<String>,
}

impl QuestLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quests(&self) -> &[ExistingQuest] {
        &self.quests
    }

    /// Message to show instead of (or above) the list, if the last request
    /// failed.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Fetches the quest list. On failure the list is emptied and the banner
    /// set.
    pub async fn load<B: QuestBackend>(&mut self, backend: &B) -> &[ExistingQuest] {
        self.banner = None;
        match backend.existing_quests().await {
            Ok(quests) => {
                tracing::info!("loaded {} quest(s) from library", quests.len());
                self.quests = quests;
            }
            Err(err) => {
                tracing::error!("loading quests failed: {}", err);
                self.quests.clear();
                self.banner = Some(banner_for(&err));
            }
        }
        &self.quests
    }

    /// Seeds the backend's sample quests, then reloads the list.
    pub async fn seed<B: QuestBackend>(&mut self, backend: &B) -> &[ExistingQuest] {
        if let Err(err) = backend.load_sample_quests().await {
            tracing::error!("seeding sample quests failed: {}", err);
            self.banner = Some(SEED_FAILED_BANNER.to_string());
            return &self.quests;
        }
        self.load(backend).await
    }

    /// Loads the graph of a listed quest into the workspace as-is and
    /// returns the quest title.
    pub fn select(
        &self,
        quest_id: &str,
        workspace: &mut QuestWorkspace,
    ) -> Result<String, BuilderError> {
        let quest = self
            .quests
            .iter()
            .find(|q| q.id == quest_id)
            .ok_or_else(|| BuilderError::QuestNotFound(quest_id.to_string()))?;
        workspace.load(quest.graph_structure.clone())?;
        tracing::info!("loaded quest '{}' into workspace", quest.title);
        Ok(quest.title.clone())
    }
}

fn banner_for(err: &BuilderError) -> String {
    err.backend_detail().unwrap_or(LOAD_FAILED_BANNER).to_string()
}

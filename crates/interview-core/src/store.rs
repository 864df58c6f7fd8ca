use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_LATEST_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub level: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub techstack: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub finalized: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read interviews from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse interviews from {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Read-only access to stored interviews.
#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// The user's interviews, newest first. Empty for an empty user id.
    async fn interviews_by_user(&self, user_id: &str) -> Vec<Interview>;

    /// Finalized interviews created by other users, newest first.
    async fn latest_interviews(&self, user_id: &str, limit: usize) -> Vec<Interview>;

    async fn interview_by_id(&self, id: &str) -> Option<Interview>;
}

/// An interview store backed by a JSON array held in memory.
#[derive(Debug, Default)]
pub struct InMemoryInterviewStore {
    interviews: Vec<Interview>,
}

impl InMemoryInterviewStore {
    pub fn new(interviews: Vec<Interview>) -> Self {
        Self { interviews }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let interviews: Vec<Interview> =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        tracing::debug!("loaded {} interviews from {}", interviews.len(), path.display());
        Ok(Self::new(interviews))
    }

    fn newest_first<'a>(interviews: impl Iterator<Item = &'a Interview>) -> Vec<Interview> {
        let mut sorted: Vec<Interview> = interviews.cloned().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted
    }
}

#[async_trait]
impl InterviewStore for InMemoryInterviewStore {
    async fn interviews_by_user(&self, user_id: &str) -> Vec<Interview> {
        if user_id.is_empty() {
            tracing::warn!("interviews_by_user called without a user id");
            return Vec::new();
        }
        Self::newest_first(self.interviews.iter().filter(|i| i.user_id == user_id))
    }

    async fn latest_interviews(&self, user_id: &str, limit: usize) -> Vec<Interview> {
        let mut latest = Self::newest_first(
            self.interviews
                .iter()
                .filter(|i| i.finalized && i.user_id != user_id),
        );
        latest.truncate(limit);
        latest
    }

    async fn interview_by_id(&self, id: &str) -> Option<Interview> {
        self.interviews.iter().find(|i| i.id == id).cloned()
    }
}

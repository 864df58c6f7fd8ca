use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Answers "who is signed in right now".
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>>;
}

/// Identity fixed at startup, e.g. from configuration.
pub struct StaticIdentity {
    user: Option<User>,
}

impl StaticIdentity {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }

    /// Signed in only when both an id and a name are known.
    pub fn from_parts(id: Option<String>, name: Option<String>, email: Option<String>) -> Self {
        let user = match (id, name) {
            (Some(id), Some(name)) if !id.is_empty() => Some(User { id, name, email }),
            _ => None,
        };
        Self { user }
    }
}

#[async_trait]
impl IdentityService for StaticIdentity {
    async fn current_user(&self) -> Result<Option<User>> {
        Ok(self.user.clone())
    }
}

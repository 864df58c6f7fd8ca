use std::fmt;

/// Locations the agent can send the user to once a call is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Feedback { interview_id: String },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Feedback { interview_id } => format!("/interview/{interview_id}/feedback"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

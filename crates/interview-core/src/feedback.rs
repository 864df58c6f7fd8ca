use crate::navigation::Route;
use crate::transcript::Message;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub interview_id: String,
    pub user_id: String,
    pub transcript: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(default)]
    pub feedback_id: Option<String>,
}

// The feedback-generation backend. Kept behind a trait so the state machine
// can be driven against `MockFeedbackService` in tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn create_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse>;
}

/// HTTP client for the feedback-generation service.
pub struct FeedbackClient {
    client: Client,
    base_url: String,
}

impl FeedbackClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/feedback", self.base_url)
    }
}

#[async_trait]
impl FeedbackService for FeedbackClient {
    async fn create_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<FeedbackResponse>()
            .await?;
        Ok(resp)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("missing {0}, cannot submit feedback")]
    MissingIdentifier(&'static str),
    #[error("feedback service rejected the transcript")]
    Rejected,
    #[error("feedback service reported success without a feedback id")]
    MissingFeedbackId,
    #[error("feedback service call failed: {0:#}")]
    Service(anyhow::Error),
}

/// Submits a finished interview's transcript, exactly once per call attempt.
/// Failed submissions are never retried.
#[derive(Clone)]
pub struct FeedbackTrigger {
    service: Arc<dyn FeedbackService>,
}

impl FeedbackTrigger {
    pub fn new(service: Arc<dyn FeedbackService>) -> Self {
        Self { service }
    }

    pub async fn submit(
        &self,
        interview_id: Option<String>,
        user_id: Option<String>,
        transcript: Vec<Message>,
        feedback_id: Option<String>,
    ) -> Result<String, FeedbackError> {
        let interview_id = interview_id
            .filter(|id| !id.is_empty())
            .ok_or(FeedbackError::MissingIdentifier("interview id"))?;
        let user_id = user_id
            .filter(|id| !id.is_empty())
            .ok_or(FeedbackError::MissingIdentifier("user id"))?;

        tracing::info!(
            "submitting {} transcript messages for interview {}",
            transcript.len(),
            interview_id
        );
        let response = self
            .service
            .create_feedback(FeedbackRequest {
                interview_id,
                user_id,
                transcript,
                feedback_id,
            })
            .await
            .map_err(FeedbackError::Service)?;

        match response {
            FeedbackResponse {
                success: true,
                feedback_id: Some(id),
            } => Ok(id),
            FeedbackResponse { success: true, .. } => Err(FeedbackError::MissingFeedbackId),
            FeedbackResponse { success: false, .. } => Err(FeedbackError::Rejected),
        }
    }

    /// Submits and decides where the user goes next: the interview's feedback
    /// page on success, home on any failure.
    pub async fn fire(
        &self,
        interview_id: Option<String>,
        user_id: Option<String>,
        transcript: Vec<Message>,
        feedback_id: Option<String>,
    ) -> Route {
        match self
            .submit(interview_id.clone(), user_id, transcript, feedback_id)
            .await
        {
            Ok(id) => {
                tracing::info!("feedback {} saved", id);
                match interview_id {
                    Some(interview_id) => Route::Feedback { interview_id },
                    None => Route::Home,
                }
            }
            Err(e) => {
                tracing::error!("feedback generation failed: {}", e);
                Route::Home
            }
        }
    }
}

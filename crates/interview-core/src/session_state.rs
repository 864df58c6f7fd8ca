use crate::{
    Command,
    bridge::Signal,
    call_session::{CallSessionService, CallTarget, StartRequest},
    feedback::FeedbackTrigger,
    interviewer::{AssistantConfig, format_questions},
    navigation::Route,
    transcript::{Message, Transcript},
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Inactive,
    Connecting,
    Active,
    Finished,
    Processing,
}

/// Which kind of call the agent runs. Fixed for the lifetime of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Onboarding call that builds an interview; no feedback step.
    Generate,
    /// Scored mock interview that ends with feedback generation.
    Interview,
}

impl FromStr for CallMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generate" => Ok(CallMode::Generate),
            "interview" => Ok(CallMode::Interview),
            other => Err(format!("unknown call mode '{other}', expected generate or interview")),
        }
    }
}

impl fmt::Display for CallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallMode::Generate => f.write_str("generate"),
            CallMode::Interview => f.write_str("interview"),
        }
    }
}

/// Identity context handed to the agent by its host. Read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentProfile {
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub interview_id: Option<String>,
    pub feedback_id: Option<String>,
    pub questions: Vec<String>,
}

/// How calls are opened for each mode.
#[derive(Debug, Clone)]
pub struct CallSettings {
    pub workflow_id: Option<String>,
    pub assistant: AssistantConfig,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            workflow_id: None,
            assistant: AssistantConfig::interviewer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinishedReaction {
    NavigateHome,
    SubmitFeedback(Vec<Message>),
}

/// State of one call attempt.
#[derive(Debug)]
pub struct CallSession {
    status: CallStatus,
    mode: CallMode,
    transcript: Transcript,
    feedback_submitted: bool,
}

impl CallSession {
    pub fn new(mode: CallMode) -> Self {
        Self {
            status: CallStatus::Inactive,
            mode,
            transcript: Transcript::new(),
            feedback_submitted: false,
        }
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn mode(&self) -> CallMode {
        self.mode
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn feedback_submitted(&self) -> bool {
        self.feedback_submitted
    }

    fn begin_attempt(&mut self) {
        self.status = CallStatus::Connecting;
        self.transcript.reset();
        self.feedback_submitted = false;
    }

    /// Consumes the one-shot reaction to `Finished`. Returns `None` when the
    /// call is not finished or the reaction was already taken. In interview
    /// mode with a transcript this is also the only way into `Processing`.
    fn conclude(&mut self) -> Option<FinishedReaction> {
        if self.status != CallStatus::Finished || self.feedback_submitted {
            return None;
        }
        self.feedback_submitted = true;

        match self.mode {
            CallMode::Generate => Some(FinishedReaction::NavigateHome),
            CallMode::Interview if self.transcript.is_empty() => {
                Some(FinishedReaction::NavigateHome)
            }
            CallMode::Interview => {
                self.status = CallStatus::Processing;
                Some(FinishedReaction::SubmitFeedback(self.transcript.to_vec()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Requested,
    Ignored,
    Failed,
}

/// Drives one agent's calls: opens and stops the real-time session, buffers
/// the transcript and reacts once to each finished call.
pub struct CallMachine {
    session: CallSession,
    profile: AgentProfile,
    settings: CallSettings,
    call_service: Arc<dyn CallSessionService>,
    feedback: FeedbackTrigger,
    command_tx: mpsc::Sender<Command>,
    agent_speaking: bool,
    feedback_task: Option<JoinHandle<()>>,
}

impl CallMachine {
    pub fn new(
        mode: CallMode,
        profile: AgentProfile,
        settings: CallSettings,
        call_service: Arc<dyn CallSessionService>,
        feedback: FeedbackTrigger,
        command_tx: mpsc::Sender<Command>,
    ) -> Self {
        Self {
            session: CallSession::new(mode),
            profile,
            settings,
            call_service,
            feedback,
            command_tx,
            agent_speaking: false,
            feedback_task: None,
        }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn status(&self) -> CallStatus {
        self.session.status
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn agent_speaking(&self) -> bool {
        self.agent_speaking
    }

    /// Builds the start request for the configured mode.
    pub fn start_request(&self) -> Result<StartRequest> {
        let mut variable_values = BTreeMap::new();
        let target = match self.session.mode {
            CallMode::Generate => {
                let workflow_id = self
                    .settings
                    .workflow_id
                    .clone()
                    .context("no workflow id configured for generate calls")?;
                if let Some(name) = &self.profile.user_name {
                    variable_values.insert("username".to_string(), name.clone());
                }
                if let Some(id) = &self.profile.user_id {
                    variable_values.insert("userid".to_string(), id.clone());
                }
                CallTarget::Workflow(workflow_id)
            }
            CallMode::Interview => {
                variable_values.insert(
                    "questions".to_string(),
                    format_questions(&self.profile.questions),
                );
                CallTarget::Assistant(self.settings.assistant.clone())
            }
        };
        Ok(StartRequest {
            target,
            variable_values,
        })
    }

    /// User asked for a call. Ignored unless the machine is `Inactive` or
    /// `Finished`.
    pub async fn start(&mut self) -> StartOutcome {
        match self.session.status {
            CallStatus::Inactive | CallStatus::Finished => {}
            status => {
                tracing::debug!("ignoring start while {:?}", status);
                return StartOutcome::Ignored;
            }
        }

        tracing::info!("starting {} call", self.session.mode);
        self.session.begin_attempt();
        self.agent_speaking = false;

        let result = match self.start_request() {
            Ok(request) => self.call_service.start(request).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => StartOutcome::Requested,
            Err(e) => {
                tracing::error!("failed to start call: {:#}", e);
                self.session.status = CallStatus::Inactive;
                StartOutcome::Failed
            }
        }
    }

    /// User asked to hang up. The status only changes once the resulting
    /// call-end event arrives.
    pub async fn disconnect(&mut self) {
        tracing::info!("disconnect requested while {:?}", self.session.status);
        if let Err(e) = self.call_service.stop().await {
            tracing::error!("failed to stop call: {:#}", e);
        }
    }

    pub async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::CallStarted => {
                if self.session.status == CallStatus::Connecting {
                    tracing::info!("call started");
                    self.session.status = CallStatus::Active;
                } else {
                    tracing::debug!("ignoring call-start while {:?}", self.session.status);
                }
            }
            Signal::CallEnded => match self.session.status {
                CallStatus::Connecting | CallStatus::Active => {
                    tracing::info!(
                        "call ended with {} transcript messages",
                        self.session.transcript.len()
                    );
                    self.session.status = CallStatus::Finished;
                    self.agent_speaking = false;
                    self.evaluate_finished().await;
                }
                status => tracing::debug!("ignoring call-end while {:?}", status),
            },
            Signal::FinalMessage(message) => {
                if self.session.feedback_submitted {
                    tracing::warn!(
                        "{} message arrived after the call was concluded; not part of feedback",
                        message.role()
                    );
                }
                tracing::debug!("{}: {}", message.role(), message.content());
                self.session.transcript.append(message);
            }
            Signal::Speaking(speaking) => {
                self.agent_speaking = speaking;
            }
            Signal::SessionError(error) => {
                tracing::error!("call session error: {}", error);
            }
        }
    }

    /// Runs the reaction to a finished call. Safe to call any number of
    /// times; only the first call after a call ends does anything.
    pub async fn evaluate_finished(&mut self) {
        let Some(reaction) = self.session.conclude() else {
            return;
        };

        match reaction {
            FinishedReaction::NavigateHome => {
                if self.session.mode == CallMode::Interview {
                    tracing::warn!("no transcript to generate feedback from");
                }
                self.navigate(Route::Home).await;
            }
            FinishedReaction::SubmitFeedback(transcript) => {
                tracing::info!("generating feedback from {} messages", transcript.len());
                let trigger = self.feedback.clone();
                let command_tx = self.command_tx.clone();
                let profile = self.profile.clone();
                self.feedback_task = Some(tokio::spawn(async move {
                    let route = trigger
                        .fire(
                            profile.interview_id,
                            profile.user_id,
                            transcript,
                            profile.feedback_id,
                        )
                        .await;
                    if let Err(e) = command_tx.send(Command::Navigate(route)).await {
                        tracing::error!("failed to send navigation command: {}", e);
                    }
                }));
            }
        }
    }

    /// Waits for an in-flight feedback submission, if any.
    pub async fn join_feedback(&mut self) {
        if let Some(task) = self.feedback_task.take() {
            if let Err(e) = task.await {
                tracing::error!("feedback task failed: {}", e);
            }
        }
    }

    async fn navigate(&self, route: Route) {
        tracing::info!("navigating to {}", route);
        if let Err(e) = self.command_tx.send(Command::Navigate(route)).await {
            tracing::error!("failed to send navigation command: {}", e);
        }
    }
}

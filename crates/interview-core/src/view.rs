use crate::session_state::{CallMachine, CallStatus};

/// The single call control shown under the avatars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallButton {
    /// Start a call. `busy` while connecting, when the control is disabled.
    Call { busy: bool },
    End,
    GeneratingFeedback,
}

impl CallButton {
    pub fn for_status(status: CallStatus) -> Self {
        match status {
            CallStatus::Processing => CallButton::GeneratingFeedback,
            CallStatus::Active => CallButton::End,
            CallStatus::Connecting => CallButton::Call { busy: true },
            CallStatus::Inactive | CallStatus::Finished => CallButton::Call { busy: false },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallButton::Call { busy: false } => "Call",
            CallButton::Call { busy: true } => ". . .",
            CallButton::End => "End",
            CallButton::GeneratingFeedback => "Generating Feedback...",
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self, CallButton::Call { busy: false } | CallButton::End)
    }
}

/// Read-only snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallView {
    pub status: CallStatus,
    pub call_button: CallButton,
    pub agent_speaking: bool,
    pub user_name: Option<String>,
    pub last_message: Option<String>,
}

impl CallView {
    pub fn of(machine: &CallMachine) -> Self {
        let session = machine.session();
        Self {
            status: session.status(),
            call_button: CallButton::for_status(session.status()),
            agent_speaking: machine.agent_speaking(),
            user_name: machine.profile().user_name.clone(),
            last_message: session.transcript().last_content().map(str::to_string),
        }
    }

    pub fn show_transcript(&self) -> bool {
        self.last_message.is_some()
    }
}

use crate::Command;
use crate::bridge::{EventBridge, Signal, Subscription};
use crate::call_session::CallSessionService;
use crate::feedback::{FeedbackService, FeedbackTrigger};
use crate::navigation::Route;
use crate::session_state::{AgentProfile, CallMachine, CallMode, CallSettings, CallStatus};
use crate::view::CallView;
use std::sync::Arc;
use tokio::sync::mpsc;

// --- User Actions ---

/// What the user can do with the agent's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Call,
    End,
    Quit,
}

// --- Agent ---

/// One mounted interview agent: the call machine plus its event
/// subscription and channels.
///
/// Everything that mutates the machine happens inside [`InterviewAgent::run`],
/// one event at a time. The subscription is torn down when the agent is
/// dropped, whichever way `run` exits.
pub struct InterviewAgent {
    machine: CallMachine,
    signals: mpsc::UnboundedReceiver<Signal>,
    commands: mpsc::Receiver<Command>,
    _subscription: Subscription,
}

impl InterviewAgent {
    pub fn new(
        mode: CallMode,
        profile: AgentProfile,
        settings: CallSettings,
        call_service: Arc<dyn CallSessionService>,
        feedback_service: Arc<dyn FeedbackService>,
    ) -> Self {
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::channel(8);
        let subscription = EventBridge::subscribe(call_service.clone(), signal_tx);
        let machine = CallMachine::new(
            mode,
            profile,
            settings,
            call_service,
            FeedbackTrigger::new(feedback_service),
            command_tx,
        );

        Self {
            machine,
            signals,
            commands,
            _subscription: subscription,
        }
    }

    pub fn view(&self) -> CallView {
        CallView::of(&self.machine)
    }

    /// Runs until the machine navigates away or the user quits. Returns the
    /// navigation target, or `None` if the user left first. A closed action
    /// channel only stops input; a call already under way still finishes.
    ///
    /// `on_view` is called with the initial view and after every change.
    pub async fn run(
        mut self,
        mut actions: mpsc::Receiver<UserAction>,
        mut on_view: impl FnMut(&CallView),
    ) -> Option<Route> {
        let mut last_view = self.view();
        on_view(&last_view);
        let mut actions_open = true;

        loop {
            tokio::select! {
                biased;

                Some(signal) = self.signals.recv() => {
                    self.machine.handle_signal(signal).await;
                }
                Some(command) = self.commands.recv() => match command {
                    Command::Navigate(route) => {
                        self.machine.join_feedback().await;
                        on_view(&self.view());
                        return Some(route);
                    }
                },
                action = actions.recv(), if actions_open => match action {
                    Some(UserAction::Call) => {
                        self.machine.start().await;
                    }
                    Some(UserAction::End) => self.machine.disconnect().await,
                    Some(UserAction::Quit) => {
                        tracing::info!("agent closed while {:?}", self.machine.status());
                        return None;
                    }
                    None => {
                        // No more user input; an open call still runs to its navigation.
                        actions_open = false;
                        if self.machine.status() == CallStatus::Inactive {
                            tracing::info!("no user actions left and no call in progress");
                            return None;
                        }
                        tracing::debug!("user actions closed while {:?}", self.machine.status());
                    }
                },
                else => return None,
            }

            let view = self.view();
            if view != last_view {
                on_view(&view);
                last_view = view;
            }
        }
    }
}

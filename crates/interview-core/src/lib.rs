pub mod agent;
pub mod bridge;
pub mod call_session;
pub mod events;
pub mod feedback;
pub mod identity;
pub mod interviewer;
pub mod navigation;
pub mod session_state;
pub mod store;
pub mod transcript;
pub mod view;

/// Represents commands that the call machine issues to its host.
///
/// The machine decides where the user goes next; the host (web shell, CLI)
/// carries it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the call screen for the given route.
    Navigate(navigation::Route),
}

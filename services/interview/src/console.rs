//! Terminal presentation of the call screen: stdin lines become user actions,
//! view snapshots become status lines.

use interview_core::agent::UserAction;
use interview_core::session_state::CallStatus;
use interview_core::store::Interview;
use interview_core::view::CallView;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub fn parse_action(line: &str) -> Option<UserAction> {
    match line.trim().to_lowercase().as_str() {
        "call" | "c" => Some(UserAction::Call),
        "end" | "e" => Some(UserAction::End),
        "quit" | "q" | "exit" => Some(UserAction::Quit),
        _ => None,
    }
}

fn status_label(status: CallStatus) -> &'static str {
    match status {
        CallStatus::Inactive => "inactive",
        CallStatus::Connecting => "connecting",
        CallStatus::Active => "active",
        CallStatus::Finished => "finished",
        CallStatus::Processing => "processing",
    }
}

pub fn render(view: &CallView) -> String {
    let interviewer = if view.agent_speaking {
        "AI Interviewer (speaking)"
    } else {
        "AI Interviewer"
    };
    let user = view.user_name.as_deref().unwrap_or("You");
    let button = if view.call_button.enabled() {
        format!("[{}]", view.call_button.label())
    } else {
        format!("({})", view.call_button.label())
    };

    let mut out = format!(
        "{interviewer} | {user} | {} {button}",
        status_label(view.status)
    );
    if view.show_transcript() {
        if let Some(message) = &view.last_message {
            out.push_str(&format!("\n  > {message}"));
        }
    }
    out
}

pub fn render_interview(interview: &Interview) -> String {
    let mut line = format!(
        "{}  {} {} ({})  {}",
        interview.id,
        interview.level,
        interview.role,
        interview.kind,
        interview.created_at.format("%Y-%m-%d")
    );
    if !interview.techstack.is_empty() {
        line.push_str(&format!("  [{}]", interview.techstack.join(", ")));
    }
    line
}

/// Forwards recognised stdin commands until stdin closes or the agent stops
/// listening.
pub async fn read_actions(tx: mpsc::Sender<UserAction>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_action(&line) {
                Some(action) => {
                    if tx.send(action).await.is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => println!("unknown command {:?}; use call, end or quit", line.trim()),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::error!("failed to read stdin: {}", e);
                break;
            }
        }
    }
}

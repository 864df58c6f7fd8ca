use serde::{Deserialize, Serialize};
use std::fmt;

/// The speaker of a transcribed utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::System => "system",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

/// Whether the speech service may still revise a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

/// Payload of a `message` event. Only `message_type == "transcript"` carries a
/// transcript; other message types (function calls, status updates, ...) are
/// passed through so the bridge can decide what to drop.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptMessage {
    pub message_type: String,
    pub transcript_type: Option<TranscriptType>,
    pub role: Option<Role>,
    pub transcript: Option<String>,
}

impl TranscriptMessage {
    pub const TRANSCRIPT: &'static str = "transcript";

    pub fn transcript(role: Role, transcript_type: TranscriptType, text: &str) -> Self {
        Self {
            message_type: Self::TRANSCRIPT.to_string(),
            transcript_type: Some(transcript_type),
            role: Some(role),
            transcript: Some(text.to_string()),
        }
    }

    pub fn is_final_transcript(&self) -> bool {
        self.message_type == Self::TRANSCRIPT && self.transcript_type == Some(TranscriptType::Final)
    }
}

/// Provider-independent events emitted by a real-time call session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CallStart,
    CallEnd,
    Message(TranscriptMessage),
    SpeechStart,
    SpeechEnd,
    Error(String),
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::CallStart => EventKind::CallStart,
            SessionEvent::CallEnd => EventKind::CallEnd,
            SessionEvent::Message(_) => EventKind::Message,
            SessionEvent::SpeechStart => EventKind::SpeechStart,
            SessionEvent::SpeechEnd => EventKind::SpeechEnd,
            SessionEvent::Error(_) => EventKind::Error,
        }
    }
}

/// The event kinds a handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CallStart,
    CallEnd,
    Message,
    SpeechStart,
    SpeechEnd,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::CallStart,
        EventKind::CallEnd,
        EventKind::Message,
        EventKind::SpeechStart,
        EventKind::SpeechEnd,
        EventKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CallStart => "call-start",
            EventKind::CallEnd => "call-end",
            EventKind::Message => "message",
            EventKind::SpeechStart => "speech-start",
            EventKind::SpeechEnd => "speech-end",
            EventKind::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_final_transcripts_count_as_final() {
        let final_msg = TranscriptMessage::transcript(Role::User, TranscriptType::Final, "hi");
        let partial = TranscriptMessage::transcript(Role::User, TranscriptType::Partial, "h");
        let other = TranscriptMessage {
            message_type: "function-call".to_string(),
            transcript_type: Some(TranscriptType::Final),
            role: Some(Role::Assistant),
            transcript: None,
        };

        assert!(final_msg.is_final_transcript());
        assert!(!partial.is_final_transcript());
        assert!(!other.is_final_transcript());
    }

    #[test]
    fn every_event_maps_to_its_kind() {
        assert_eq!(SessionEvent::CallStart.kind(), EventKind::CallStart);
        assert_eq!(SessionEvent::Error("x".into()).kind(), EventKind::Error);
        assert_eq!(EventKind::SpeechEnd.as_str(), "speech-end");
    }
}

//! Wire events of the real-time call service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "start")]
    Start(StartCallEvent),
    #[serde(rename = "stop")]
    Stop,
}

/// `start` event. Exactly one of `workflow_id` and `assistant` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assistant: Option<serde_json::Value>,
    #[serde(default)]
    variable_values: BTreeMap<String, String>,
}

impl StartCallEvent {
    pub fn workflow(workflow_id: &str) -> Self {
        Self {
            workflow_id: Some(workflow_id.to_string()),
            assistant: None,
            variable_values: BTreeMap::new(),
        }
    }

    pub fn assistant(assistant: serde_json::Value) -> Self {
        Self {
            workflow_id: None,
            assistant: Some(assistant),
            variable_values: BTreeMap::new(),
        }
    }

    pub fn with_variable_values(mut self, variable_values: BTreeMap<String, String>) -> Self {
        self.variable_values = variable_values;
        self
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn assistant_config(&self) -> Option<&serde_json::Value> {
        self.assistant.as_ref()
    }

    pub fn variable_values(&self) -> &BTreeMap<String, String> {
        &self.variable_values
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Synthesized locally when the socket closes.
    #[serde(rename = "close")]
    Close { reason: Option<String> },
    #[serde(rename = "call-start")]
    CallStart,
    #[serde(rename = "call-end")]
    CallEnd,
    #[serde(rename = "message")]
    Message(MessageEvent),
    #[serde(rename = "speech-start")]
    SpeechStart,
    #[serde(rename = "speech-end")]
    SpeechEnd,
    #[serde(rename = "error")]
    Error(ErrorEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    message: ServerMessage,
}

impl MessageEvent {
    pub fn new(message: ServerMessage) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &ServerMessage {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    System,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    transcript_type: Option<TranscriptType>,
    #[serde(default)]
    role: Option<MessageRole>,
    #[serde(default)]
    transcript: Option<String>,
}

impl ServerMessage {
    pub fn transcript(role: MessageRole, transcript_type: TranscriptType, text: &str) -> Self {
        Self {
            message_type: "transcript".to_string(),
            transcript_type: Some(transcript_type),
            role: Some(role),
            transcript: Some(text.to_string()),
        }
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn transcript_type(&self) -> Option<TranscriptType> {
        self.transcript_type
    }

    pub fn role(&self) -> Option<MessageRole> {
        self.role
    }

    pub fn text(&self) -> Option<&str> {
        self.transcript.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    error: ErrorDetails,
}

impl ErrorEvent {
    pub fn new(error: ErrorDetails) -> Self {
        Self { error }
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl ErrorDetails {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

use serde::{Deserialize, Serialize};

/// Placeholder in the interviewer system prompt that the call service fills
/// from the `questions` variable value.
pub const QUESTIONS_PLACEHOLDER: &str = "{{questions}}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    pub first_message: String,
    pub transcriber: TranscriberConfig,
    pub voice: VoiceConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriberConfig {
    pub provider: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub provider: String,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub speed: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl AssistantConfig {
    /// The fixed interviewer used for interview-mode calls.
    pub fn interviewer() -> Self {
        let system_prompt = format!(
            r#"You are a professional job interviewer conducting a real-time voice interview with a candidate. Your goal is to assess their qualifications, motivation, and fit for the role.

Interview Guidelines:
Follow the structured question flow:
{QUESTIONS_PLACEHOLDER}

Engage naturally and react appropriately:
- Listen actively to responses and acknowledge them before moving forward.
- Ask brief follow-up questions if a response is vague or requires more detail.
- Keep the conversation flowing smoothly while maintaining control.

Be professional, yet warm and welcoming:
- Use official yet friendly language.
- Keep responses concise and to the point, like in a real voice interview.
- Avoid robotic phrasing; sound natural and conversational.

Conclude the interview properly:
- Thank the candidate for their time.
- Inform them that the company will reach out soon with feedback.
- End the conversation on a polite and positive note.

Keep all your responses short and simple. This is a voice conversation, so keep your responses short, like in a real conversation. Don't ramble for too long."#
        );

        Self {
            name: "Interviewer".to_string(),
            first_message: "Hello! Thank you for taking the time to speak with me today. I'm excited to learn more about you and your experience.".to_string(),
            transcriber: TranscriberConfig {
                provider: "deepgram".to_string(),
                model: "nova-2".to_string(),
                language: "en".to_string(),
            },
            voice: VoiceConfig {
                provider: "11labs".to_string(),
                voice_id: "sarah".to_string(),
                stability: 0.4,
                similarity_boost: 0.8,
                speed: 0.9,
                style: 0.5,
                use_speaker_boost: true,
            },
            model: ModelConfig {
                provider: "openai".to_string(),
                model: "gpt-4".to_string(),
                messages: vec![PromptMessage {
                    role: "system".to_string(),
                    content: system_prompt,
                }],
            },
        }
    }
}

/// Renders seed questions as a bulleted, newline-joined list.
pub fn format_questions(questions: &[String]) -> String {
    questions
        .iter()
        .map(|question| format!("- {question}"))
        .collect::<Vec<_>>()
        .join("\n")
}

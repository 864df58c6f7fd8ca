use anyhow::{Context, Result};
use interview_core::interviewer::{AssistantConfig, QUESTIONS_PLACEHOLDER};
use std::fs;
use std::path::Path;

/// Loads the interviewer assistant from `path`, or the built-in interviewer
/// when no path is configured.
pub fn load_assistant(path: Option<&Path>) -> Result<AssistantConfig> {
    let Some(path) = path else {
        return Ok(AssistantConfig::interviewer());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read assistant config: {}", path.display()))?;
    let assistant: AssistantConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse assistant config: {}", path.display()))?;

    let has_placeholder = assistant
        .model
        .messages
        .iter()
        .any(|message| message.content.contains(QUESTIONS_PLACEHOLDER));
    if !has_placeholder {
        tracing::warn!(
            "assistant config {} has no {} placeholder; interview questions will not reach the model",
            path.display(),
            QUESTIONS_PLACEHOLDER
        );
    }

    Ok(assistant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn falls_back_to_builtin_interviewer() -> Result<()> {
        assert_eq!(load_assistant(None)?, AssistantConfig::interviewer());
        Ok(())
    }

    #[test]
    fn loads_assistant_from_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("assistant.json");
        let mut expected = AssistantConfig::interviewer();
        expected.name = "Panel".to_string();
        expected.voice.voice_id = "alex".to_string();
        let mut file = File::create(&path)?;
        write!(file, "{}", serde_json::to_string_pretty(&expected)?)?;

        let assistant = load_assistant(Some(&path))?;

        assert_eq!(assistant, expected);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_assistant(Some(Path::new("nonexistent_assistant_for_testing.json")));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("assistant.json");
        let mut file = File::create(&path)?;
        writeln!(file, "{{\"name\": \"Interviewer\"}}")?;

        let error = load_assistant(Some(&path)).unwrap_err();

        assert!(error.to_string().contains("Failed to parse assistant config"));
        Ok(())
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MentorError, Result};
use crate::types::ExplainFurtherText;

/// Top-level configuration for the Mentor application.
///
/// Loaded from `~/.mentor/config.toml` by default. Each section corresponds
/// to one external collaborator or to the conversation itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl MentorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MentorConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the collaborators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.completion.api_base.trim().is_empty() {
            return Err(MentorError::Config(
                "completion.api_base must not be empty".to_string(),
            ));
        }
        if self.completion.model.trim().is_empty() {
            return Err(MentorError::Config(
                "completion.model must not be empty".to_string(),
            ));
        }
        if self.completion.max_tokens == 0 {
            return Err(MentorError::Config(
                "completion.max_tokens must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(MentorError::Config(format!(
                "completion.temperature must be within 0.0..=2.0, got {}",
                self.completion.temperature
            )));
        }
        if self.image.api_base.trim().is_empty() {
            return Err(MentorError::Config(
                "image.api_base must not be empty".to_string(),
            ));
        }
        if self.image.search_limit == 0 {
            return Err(MentorError::Config(
                "image.search_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Data directory with a leading `~` expanded to the home directory.
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.general.data_dir)
    }
}

/// Expand `~/` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the SQLite document store.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.mentor/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds. 0 keeps the HTTP client's default.
    pub request_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            request_timeout_secs: 0,
        }
    }
}

/// Image search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Whether assistant replies are decorated with an illustration.
    pub enabled: bool,
    /// MediaWiki API endpoint.
    pub api_base: String,
    /// Minimum image width in pixels.
    pub min_width: u32,
    /// Minimum image height in pixels.
    pub min_height: u32,
    /// Number of search hits inspected per query.
    pub search_limit: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://commons.wikimedia.org/w/api.php".to_string(),
            min_width: 800,
            min_height: 600,
            search_limit: 10,
        }
    }
}

/// Speech recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognizer locale, e.g. "en-US".
    pub locale: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
        }
    }
}

/// Default student profile used to render the system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub grade: String,
    pub personality: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            grade: "Grade 7".to_string(),
            personality: "Friendly".to_string(),
        }
    }
}

/// Conversation behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Text surfaced for explain-further replies.
    pub explain_further_text: ExplainFurtherText,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = MentorConfig::default();
        assert_eq!(config.general.data_dir, "~/.mentor/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.max_tokens, 1000);
        assert_eq!(config.completion.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.image.min_width, 800);
        assert_eq!(config.image.min_height, 600);
        assert_eq!(config.image.search_limit, 10);
        assert_eq!(config.speech.locale, "en-US");
        assert_eq!(config.persona.grade, "Grade 7");
        assert_eq!(config.persona.personality, "Friendly");
        assert_eq!(
            config.conversation.explain_further_text,
            ExplainFurtherText::FirstStep
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/custom/data"
log_level = "debug"

[completion]
model = "gpt-4o"
max_tokens = 512
temperature = 0.2

[persona]
grade = "Grade 9"
personality = "Strict"

[conversation]
explain_further_text = "final_answer"
"#;
        let file = create_temp_config(content);
        let config = MentorConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/custom/data");
        assert_eq!(config.completion.model, "gpt-4o");
        assert_eq!(config.completion.max_tokens, 512);
        assert_eq!(config.persona.grade, "Grade 9");
        assert_eq!(
            config.conversation.explain_further_text,
            ExplainFurtherText::FinalAnswer
        );
        // Untouched sections keep defaults
        assert_eq!(config.image.min_width, 800);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[image]
enabled = false
"#;
        let file = create_temp_config(content);
        let config = MentorConfig::load(file.path()).unwrap();
        assert!(!config.image.enabled);
        assert_eq!(config.image.search_limit, 10);
        assert_eq!(config.completion.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[completion\nmodel = ");
        let result = MentorConfig::load(file.path());
        assert!(matches!(result, Err(MentorError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = MentorConfig::load_or_default(Path::new("/nonexistent/mentor.toml"));
        assert_eq!(config.general.data_dir, "~/.mentor/data");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = MentorConfig::default();
        config.persona.personality = "Encouraging".to_string();
        config.save(&path).unwrap();

        let reloaded = MentorConfig::load(&path).unwrap();
        assert_eq!(reloaded.persona.personality, "Encouraging");
        assert_eq!(reloaded.completion.model, config.completion.model);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MentorConfig::default();
        config.completion.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = MentorConfig::default();
        config.completion.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = MentorConfig::default();
        config.completion.api_base = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = MentorConfig::default();
        config.image.search_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        let expanded = expand_home("~/data");
        assert!(expanded.ends_with("data"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}

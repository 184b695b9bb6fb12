//! CLI argument definitions for the Mentor application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mentor_core::types::Mode;

/// Mentor - a step-by-step tutoring assistant.
#[derive(Parser, Debug)]
#[command(name = "mentor", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the chat database.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List chats, oldest first.
    Chats,
    /// Start a new chat and print its id.
    New {
        #[arg(long)]
        title: Option<String>,
    },
    /// Print every message of a chat.
    Show { chat_id: String },
    /// Ask a question in an existing chat.
    Ask {
        chat_id: String,
        prompt: String,
        #[arg(long, value_enum, default_value_t = ModeArg::BulletPoints)]
        mode: ModeArg,
        /// Student grade, e.g. "Grade 8".
        #[arg(long)]
        grade: Option<String>,
        /// Tutor personality, e.g. "Encouraging".
        #[arg(long)]
        personality: Option<String>,
        /// Skip the illustration lookup.
        #[arg(long)]
        no_image: bool,
    },
    /// Re-send the unanswered prompt at the end of a chat.
    Retry {
        chat_id: String,
        #[arg(long, value_enum, default_value_t = ModeArg::BulletPoints)]
        mode: ModeArg,
        /// Skip the illustration lookup.
        #[arg(long)]
        no_image: bool,
    },
    /// One-off free-text completion, not stored in any chat.
    Complete { prompt: String },
    /// Write the default configuration to the config path.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Look up an illustration on Wikimedia Commons.
    Image {
        query: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    BulletPoints,
    ExplainFurther,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::BulletPoints => Mode::BulletPoints,
            ModeArg::ExplainFurther => Mode::ExplainFurther,
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MENTOR_CONFIG env var > ~/.mentor/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MENTOR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Data directory override, if given.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone()
    }

    /// Log filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            if !level.trim().is_empty() {
                return level;
            }
        }
        config_level.to_string()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".mentor").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".mentor").join("config.toml");
    }
    PathBuf::from("config.toml")
}

//! Mentor Speech crate - speech-to-text bridging.
//!
//! The platform recognition engine sits behind [`SpeechRecognizer`] and
//! reports progress as [`SpeechEvent`]s. [`SpeechToText`] folds those events
//! into a listening/transcript state that the UI layer polls.
//!
//! No platform engine ships in this workspace and the `mentor` CLI does not
//! wire one; embedders supply a [`SpeechRecognizer`] implementation.

pub mod mock;
pub mod stt;

use async_trait::async_trait;
use thiserror::Error;

use mentor_core::error::MentorError;

pub use mock::ScriptedRecognizer;
pub use stt::{SpeechState, SpeechToText};

/// Errors raised by a recognition engine.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to start recognition: {0}")]
    Start(String),
    #[error("failed to stop recognition: {0}")]
    Stop(String),
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),
}

impl From<SpeechError> for MentorError {
    fn from(err: SpeechError) -> Self {
        MentorError::Speech(err.to_string())
    }
}

/// Notifications emitted by a recognition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Start,
    Recognized,
    End,
    Error(String),
    PartialResults(Vec<String>),
    Results(Vec<String>),
}

/// A platform speech recognition engine.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn start(&self, locale: &str) -> Result<(), SpeechError>;

    async fn stop(&self) -> Result<(), SpeechError>;

    /// Release engine resources. Further calls are undefined.
    async fn destroy(&self) -> Result<(), SpeechError>;
}

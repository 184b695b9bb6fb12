//! Speech-to-text state driven by recognizer events.
//!
//! Event effects:
//! - Start -> listening
//! - Recognized -> recognized
//! - End -> not listening, not recognized
//! - Error -> error recorded, not listening, not recognized
//! - PartialResults / Results -> transcript replaced by the first value

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use mentor_core::config::SpeechConfig;

use crate::{SpeechEvent, SpeechRecognizer};

/// Snapshot of the recognition state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechState {
    pub is_listening: bool,
    pub is_recognized: bool,
    pub transcript: String,
    pub error: Option<String>,
}

impl SpeechState {
    fn apply(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Start => self.is_listening = true,
            SpeechEvent::Recognized => self.is_recognized = true,
            SpeechEvent::End => {
                self.is_listening = false;
                self.is_recognized = false;
            }
            SpeechEvent::Error(message) => {
                self.error = Some(message);
                self.is_listening = false;
                self.is_recognized = false;
            }
            SpeechEvent::PartialResults(values) | SpeechEvent::Results(values) => {
                if let Some(first) = values.into_iter().next() {
                    self.transcript = first;
                }
            }
        }
    }
}

/// Bridges a [`SpeechRecognizer`] into pollable state.
///
/// Failures never propagate; they land in [`SpeechState::error`].
#[derive(Clone)]
pub struct SpeechToText {
    recognizer: Arc<dyn SpeechRecognizer>,
    locale: String,
    state: Arc<Mutex<SpeechState>>,
}

impl SpeechToText {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self::with_config(recognizer, &SpeechConfig::default())
    }

    pub fn with_config(recognizer: Arc<dyn SpeechRecognizer>, config: &SpeechConfig) -> Self {
        Self {
            recognizer,
            locale: config.locale.clone(),
            state: Arc::new(Mutex::new(SpeechState::default())),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn snapshot(&self) -> SpeechState {
        self.lock().clone()
    }

    pub fn handle_event(&self, event: SpeechEvent) {
        tracing::debug!(?event, "Speech event");
        self.lock().apply(event);
    }

    /// Clear the previous transcript and error, then start the recognizer.
    pub async fn start_listening(&self) {
        {
            let mut state = self.lock();
            state.transcript.clear();
            state.error = None;
        }

        if let Err(e) = self.recognizer.start(&self.locale).await {
            tracing::warn!(locale = %self.locale, error = %e, "Speech recognition failed to start");
            let mut state = self.lock();
            state.error = Some(e.to_string());
            state.is_listening = false;
        }
    }

    pub async fn stop_listening(&self) {
        if let Err(e) = self.recognizer.stop().await {
            tracing::warn!(error = %e, "Speech recognition failed to stop");
            self.lock().error = Some(e.to_string());
        }
    }

    pub async fn destroy(&self) {
        if let Err(e) = self.recognizer.destroy().await {
            tracing::warn!(error = %e, "Speech recognizer failed to shut down");
            self.lock().error = Some(e.to_string());
        }
    }

    /// Apply events until every sender is dropped.
    pub async fn pump(&self, mut events: mpsc::Receiver<SpeechEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        tracing::debug!("Speech event channel closed");
    }

    fn lock(&self) -> MutexGuard<'_, SpeechState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

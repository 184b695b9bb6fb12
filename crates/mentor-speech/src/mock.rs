use std::sync::Mutex;

use async_trait::async_trait;

use crate::{SpeechError, SpeechRecognizer};

#[derive(Default)]
struct Calls {
    started: Vec<String>,
    stops: usize,
    destroyed: bool,
    start_failure: Option<String>,
    stop_failure: Option<String>,
}

/// In-memory recognizer for tests and headless runs.
///
/// Records calls and fails on demand; it never emits events itself.
#[derive(Default)]
pub struct ScriptedRecognizer {
    calls: Mutex<Calls>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `start` fail with `message`.
    pub fn fail_start(&self, message: impl Into<String>) {
        self.with_calls(|c| c.start_failure = Some(message.into()));
    }

    pub fn fail_stop(&self, message: impl Into<String>) {
        self.with_calls(|c| c.stop_failure = Some(message.into()));
    }

    pub fn started_locales(&self) -> Vec<String> {
        self.with_calls(|c| c.started.clone())
    }

    pub fn stop_calls(&self) -> usize {
        self.with_calls(|c| c.stops)
    }

    pub fn is_destroyed(&self) -> bool {
        self.with_calls(|c| c.destroyed)
    }

    fn with_calls<T>(&self, f: impl FnOnce(&mut Calls) -> T) -> T {
        let mut calls = match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut calls)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&self, locale: &str) -> Result<(), SpeechError> {
        self.with_calls(|c| match &c.start_failure {
            Some(message) => Err(SpeechError::Start(message.clone())),
            None => {
                c.started.push(locale.to_string());
                Ok(())
            }
        })
    }

    async fn stop(&self) -> Result<(), SpeechError> {
        self.with_calls(|c| match &c.stop_failure {
            Some(message) => Err(SpeechError::Stop(message.clone())),
            None => {
                c.stops += 1;
                Ok(())
            }
        })
    }

    async fn destroy(&self) -> Result<(), SpeechError> {
        self.with_calls(|c| c.destroyed = true);
        Ok(())
    }
}

//! Per-user practice session.
//!
//! A session owns the test currently waiting for answers. Sessions share
//! nothing with each other, so one backend and one store can serve several
//! learners side by side.

use chrono::{Local, SubsecRound};
use tracing::{info, warn};

use crate::backend::GenerationBackend;
use crate::config::DEFAULT_MAX_ATTEMPTS;
use crate::error::{EngineError, Result};
use crate::pipeline::{evaluate_answers_with, generate_content_with};
use crate::store::PracticeStore;
use crate::types::{GenerationRequest, GenerationResult, TestLog};

pub struct PracticeSession<'a> {
    user: String,
    backend: &'a dyn GenerationBackend,
    store: &'a dyn PracticeStore,
    max_attempts: u32,
    current: Option<GenerationResult>,
}

impl<'a> PracticeSession<'a> {
    pub fn new(
        user: impl Into<String>,
        backend: &'a dyn GenerationBackend,
        store: &'a dyn PracticeStore,
    ) -> Self {
        Self {
            user: user.into(),
            backend,
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            current: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// The generated test waiting for answers, if any.
    pub fn current(&self) -> Option<&GenerationResult> {
        self.current.as_ref()
    }

    /// Generate a new test from the user's word bank and profile.
    ///
    /// Replaces any unanswered test. Returns `None` when every attempt failed.
    pub fn generate(&mut self) -> Result<Option<&GenerationResult>> {
        let words = self.store.load_words(&self.user)?;
        let profile = self.store.profile_or_default(&self.user)?;
        let request = GenerationRequest::from_profile(&words, &profile)?;

        info!(
            user = %self.user,
            words = words.len(),
            age = profile.age,
            lexile_level = profile.lexile_level,
            "generating practice test"
        );

        self.current = generate_content_with(&request, self.backend, self.max_attempts)?;
        if self.current.is_none() {
            warn!(user = %self.user, "could not generate a practice test");
        }
        Ok(self.current.as_ref())
    }

    /// Grade answers to the current test and append the log.
    ///
    /// On success the test is cleared and the saved log returned. When grading
    /// fails the test is kept so the answers can be submitted again.
    pub fn submit(&mut self, answers: &[String]) -> Result<Option<TestLog>> {
        let content = self.current.as_ref().ok_or(EngineError::NoActiveTest)?;

        let Some(evaluation) =
            evaluate_answers_with(&content.questions, answers, self.backend, self.max_attempts)?
        else {
            warn!(user = %self.user, "could not evaluate answers");
            return Ok(None);
        };

        let timestamp = Local::now().naive_local().trunc_subsecs(0);
        let log = TestLog::new(timestamp, content, answers, evaluation);
        self.store.append_log(&self.user, &log)?;
        info!(user = %self.user, score = log.score, "test saved");

        self.current = None;
        Ok(Some(log))
    }

    /// Drop the current test without grading it.
    pub fn discard(&mut self) {
        self.current = None;
    }
}

//! Bounded-retry generation pipeline.
//!
//! One call builds its prompt once, then runs up to `max_attempts` rounds of
//! invoke, extract and validate. Backend errors, parse failures and schema
//! violations each consume an attempt and are logged; once the budget is spent
//! the call yields `None`. Configuration problems are returned as errors before
//! the backend is touched.

use tracing::{debug, info, warn};

use crate::backend::GenerationBackend;
use crate::config::DEFAULT_MAX_ATTEMPTS;
use crate::error::{EngineError, Result};
use crate::extract::extract_json;
use crate::prompt::{build_article_prompt, build_evaluation_prompt, Prompt};
use crate::schema::{ArticleSchema, EvaluationSchema, ResponseSchema};
use crate::types::{EvaluationResult, GenerationRequest, GenerationResult, Question};

/// Invoke, extract and validate with a fixed attempt budget.
pub struct GenerationPipeline<'a, S: ResponseSchema> {
    backend: &'a dyn GenerationBackend,
    schema: S,
    max_attempts: u32,
}

impl<'a, S: ResponseSchema> GenerationPipeline<'a, S> {
    /// Create a pipeline. A zero attempt budget is a configuration error.
    pub fn new(backend: &'a dyn GenerationBackend, schema: S, max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(EngineError::Config(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(Self {
            backend,
            schema,
            max_attempts,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run the prompt until a reply validates or the budget is spent.
    pub fn run(&self, prompt: &Prompt) -> Option<S::Output> {
        let kind = self.schema.name();
        let backend = self.backend.name();

        for attempt in 1..=self.max_attempts {
            debug!(kind, backend, attempt, max_attempts = self.max_attempts, "invoking backend");

            match self.attempt(prompt) {
                Ok(output) => {
                    info!(kind, backend, attempt, "generation succeeded");
                    return Some(output);
                }
                Err(e) => {
                    if let EngineError::ResponseParse(ref failure) = e {
                        debug!(kind, attempt, raw = %failure.raw, "unparseable reply");
                    }
                    warn!(
                        kind,
                        backend,
                        attempt,
                        max_attempts = self.max_attempts,
                        stage = ?e.kind(),
                        error = %e,
                        "attempt failed"
                    );
                }
            }
        }

        warn!(kind, backend, max_attempts = self.max_attempts, "all attempts failed");
        None
    }

    fn attempt(&self, prompt: &Prompt) -> Result<S::Output> {
        let reply = self.backend.generate(&prompt.user, Some(prompt.system))?;
        let value = extract_json(&reply)?;
        self.schema.parse(value)
    }
}

/// Generate an article and five questions with the default attempt budget.
pub fn generate_content(
    words: &[String],
    age: u32,
    lexile_level: u32,
    backend: &dyn GenerationBackend,
) -> Result<Option<GenerationResult>> {
    let request = GenerationRequest::new(words, age, lexile_level)?;
    generate_content_with(&request, backend, DEFAULT_MAX_ATTEMPTS)
}

/// Generate an article and five questions for a prepared request.
pub fn generate_content_with(
    request: &GenerationRequest,
    backend: &dyn GenerationBackend,
    max_attempts: u32,
) -> Result<Option<GenerationResult>> {
    let pipeline = GenerationPipeline::new(backend, ArticleSchema::new()?, max_attempts)?;
    let prompt = build_article_prompt(request);
    Ok(pipeline.run(&prompt))
}

/// Grade the learner's answers with the default attempt budget.
pub fn evaluate_answers(
    questions: &[Question],
    answers: &[String],
    backend: &dyn GenerationBackend,
) -> Result<Option<EvaluationResult>> {
    evaluate_answers_with(questions, answers, backend, DEFAULT_MAX_ATTEMPTS)
}

/// Grade the learner's answers.
///
/// Questions and answers are paired positionally and truncated to the shorter
/// list; at least one pair is required.
pub fn evaluate_answers_with(
    questions: &[Question],
    answers: &[String],
    backend: &dyn GenerationBackend,
    max_attempts: u32,
) -> Result<Option<EvaluationResult>> {
    if questions.is_empty() {
        return Err(EngineError::InvalidInput("no questions to evaluate".into()));
    }
    if answers.is_empty() {
        return Err(EngineError::InvalidInput("no answers to evaluate".into()));
    }

    let pipeline = GenerationPipeline::new(backend, EvaluationSchema::new()?, max_attempts)?;
    let prompt = build_evaluation_prompt(questions, answers);
    Ok(pipeline.run(&prompt))
}

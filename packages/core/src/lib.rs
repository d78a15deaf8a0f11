//! Reading Coach core - personalised reading practice from a learner's word bank.
//!
//! Turns a word list, age and Lexile level into a generated article with five
//! comprehension questions, and grades free-text answers. Every model call goes
//! through the same bounded-retry pipeline: build the prompt, invoke the
//! backend, recover the JSON payload, validate it, retry on failure.
//!
//! # Example
//!
//! ```
//! use readcoach_core::extract::extract_json;
//!
//! let value = extract_json("Sure! Here it is: {\"score\": 90} Hope that helps.")
//!     .expect("payload");
//! assert_eq!(value["score"], 90);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, provider selection and backend configuration
//! - [`types`]: Word bank, profile, questions, results and test logs
//! - [`error`]: Error types and Result alias
//! - [`backend`]: Provider adapters behind the [`GenerationBackend`] trait
//! - [`extract`]: JSON recovery from free-form model output
//! - [`schema`]: Required-shape checks for article and evaluation replies
//! - [`prompt`]: System and user prompt builders
//! - [`pipeline`]: Bounded-retry generation and evaluation
//! - [`store`]: Persistence contract
//! - [`session`]: Per-user practice session

pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod session;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use backend::{create_backend, create_backend_for, GenerationBackend};
pub use config::{ApiConfig, BackendConfig, Provider, ProviderEntry};
pub use error::{EngineError, ErrorKind, ParseFailure, Result};
pub use pipeline::{evaluate_answers, evaluate_answers_with, generate_content, generate_content_with};
pub use session::PracticeSession;
pub use store::PracticeStore;
pub use types::{
    Choice, EvaluationResult, GenerationRequest, GenerationResult, ItemAnalysis, Question,
    QuestionType, TestLog, UserProfile, WordBank,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

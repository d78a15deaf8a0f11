//! Core data types for reading practice.
//!
//! The JSON shapes of [`Question`], [`GenerationResult`] and
//! [`EvaluationResult`] match what the model is asked to return, so the same
//! types serve both the LLM wire format and the persisted test logs.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{DEFAULT_AGE, DEFAULT_LEXILE, MIN_WORDS};
use crate::error::{EngineError, Result};

/// A learner's vocabulary list.
///
/// Uniqueness is case-insensitive; the first spelling added is the one kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bank from stored words without deduplicating them.
    ///
    /// Blank entries are dropped and surrounding whitespace trimmed, matching
    /// the one-word-per-line storage format.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn into_words(self) -> Vec<String> {
        self.words
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, word: &str) -> bool {
        let needle = word.trim().to_lowercase();
        self.words.iter().any(|w| w.to_lowercase() == needle)
    }

    /// Append new words, skipping blanks and anything already present.
    ///
    /// Returns the number of words actually added.
    pub fn add_words<I, S>(&mut self, new_words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self.words.iter().map(|w| w.to_lowercase()).collect();
        let mut added = 0;

        for word in new_words {
            let word = word.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            if seen.insert(word.to_lowercase()) {
                self.words.push(word.to_string());
                added += 1;
            }
        }

        added
    }

    /// Remove case-insensitive duplicates, keeping first occurrences in order.
    ///
    /// Returns the number of words removed.
    pub fn deduplicate(&mut self) -> usize {
        let before = self.words.len();
        let mut seen = HashSet::new();
        self.words.retain(|w| seen.insert(w.to_lowercase()));
        before - self.words.len()
    }
}

/// Learner profile used to pitch article difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u32,
    pub lexile_level: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            lexile_level: DEFAULT_LEXILE,
        }
    }
}

impl UserProfile {
    /// Create a profile, rejecting an age of zero.
    pub fn new(age: u32, lexile_level: u32) -> Result<Self> {
        if age == 0 {
            return Err(EngineError::InvalidInput("age must be a positive integer".into()));
        }
        Ok(Self { age, lexile_level })
    }
}

/// Immutable input for article generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    words: Vec<String>,
    age: u32,
    lexile_level: u32,
}

impl GenerationRequest {
    /// Snapshot the word bank for a generation call.
    ///
    /// Fails with [`EngineError::InsufficientWords`] when fewer than
    /// [`MIN_WORDS`] words are available.
    pub fn new(words: &[String], age: u32, lexile_level: u32) -> Result<Self> {
        let words = WordBank::from_words(words).into_words();
        if words.len() < MIN_WORDS {
            return Err(EngineError::InsufficientWords {
                found: words.len(),
                required: MIN_WORDS,
            });
        }
        Ok(Self {
            words,
            age,
            lexile_level,
        })
    }

    pub fn from_profile(bank: &WordBank, profile: &UserProfile) -> Result<Self> {
        Self::new(bank.words(), profile.age, profile.lexile_level)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn lexile_level(&self) -> u32 {
        self.lexile_level
    }
}

/// Answer letter of a multiple choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = EngineError;

    /// Accepts `"A"`, `"b"`, `"C."` or `"D. the option text"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().map(|c| c.to_ascii_uppercase());
        let rest = chars.as_str();
        if !(rest.is_empty() || rest.starts_with(|c: char| matches!(c, '.' | ')' | ':') || c.is_whitespace())) {
            return Err(EngineError::InvalidInput(format!("not an answer letter: '{s}'")));
        }
        match letter {
            Some('A') => Ok(Self::A),
            Some('B') => Ok(Self::B),
            Some('C') => Ok(Self::C),
            Some('D') => Ok(Self::D),
            _ => Err(EngineError::InvalidInput(format!("not an answer letter: '{s}'"))),
        }
    }
}

fn deserialize_choice<'de, D>(deserializer: D) -> std::result::Result<Choice, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Models sometimes quote booleans; accept `true`, `"True"` and `"false"`.
fn deserialize_flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!("not a boolean: '{other}'"))),
        },
        other => Err(serde::de::Error::custom(format!("not a boolean: {other}"))),
    }
}

/// Accept strings as-is and numbers in their textual form.
fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected text, got {other}"))),
    }
}

/// Kind of question, as named in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    MultipleChoice,
    FillBlank,
    TrueFalse,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::FillBlank => "fill_blank",
            Self::TrueFalse => "true_false",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comprehension question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    MultipleChoice {
        question: String,
        options: Vec<String>,
        #[serde(deserialize_with = "deserialize_choice")]
        correct_answer: Choice,
    },
    FillBlank {
        question: String,
        #[serde(deserialize_with = "deserialize_text")]
        correct_answer: String,
    },
    TrueFalse {
        question: String,
        #[serde(deserialize_with = "deserialize_flexible_bool")]
        correct_answer: bool,
    },
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::MultipleChoice { .. } => QuestionType::MultipleChoice,
            Self::FillBlank { .. } => QuestionType::FillBlank,
            Self::TrueFalse { .. } => QuestionType::TrueFalse,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::MultipleChoice { question, .. }
            | Self::FillBlank { question, .. }
            | Self::TrueFalse { question, .. } => question,
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::MultipleChoice { options, .. } => Some(options),
            _ => None,
        }
    }

    /// The expected answer rendered as text (`A`, `house`, `true`).
    pub fn correct_answer_text(&self) -> String {
        match self {
            Self::MultipleChoice { correct_answer, .. } => correct_answer.to_string(),
            Self::FillBlank { correct_answer, .. } => correct_answer.clone(),
            Self::TrueFalse { correct_answer, .. } => correct_answer.to_string(),
        }
    }
}

/// Article plus questions produced by the content pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub article: String,
    pub questions: Vec<Question>,
}

impl GenerationResult {
    /// Number of questions of the given type.
    pub fn count_of(&self, question_type: QuestionType) -> usize {
        self.questions
            .iter()
            .filter(|q| q.question_type() == question_type)
            .count()
    }
}

/// Grading of a single answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAnalysis {
    pub question_num: u32,
    pub correct: bool,
    pub feedback: String,
}

/// Grading of a whole test produced by the evaluation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: f64,
    pub item_analysis: Vec<ItemAnalysis>,
    pub overall_feedback: String,
    pub suggestions: String,
}

/// Timestamp format used inside persisted logs.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

mod log_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::LOG_TIMESTAMP_FORMAT;

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(LOG_TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, LOG_TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Record of one completed test. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestLog {
    #[serde(with = "log_timestamp")]
    pub timestamp: NaiveDateTime,
    pub article: String,
    pub questions: Vec<Question>,
    pub user_answers: Vec<String>,
    pub score: f64,
    pub item_analysis: Vec<ItemAnalysis>,
    pub overall_feedback: String,
    pub suggestions: String,
}

impl TestLog {
    /// Assemble a log from the generated test, the answers and their grading.
    pub fn new(
        timestamp: NaiveDateTime,
        content: &GenerationResult,
        user_answers: &[String],
        evaluation: EvaluationResult,
    ) -> Self {
        Self {
            timestamp,
            article: content.article.clone(),
            questions: content.questions.clone(),
            user_answers: user_answers.to_vec(),
            score: evaluation.score,
            item_analysis: evaluation.item_analysis,
            overall_feedback: evaluation.overall_feedback,
            suggestions: evaluation.suggestions,
        }
    }
}

//! Test doubles for the backend and persistence contracts.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::json;

use crate::backend::GenerationBackend;
use crate::error::{EngineError, Result};
use crate::store::PracticeStore;
use crate::types::{TestLog, UserProfile, WordBank};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub system_prompt: Option<String>,
}

/// Mock backend. Replays scripted replies in order and records every call.
///
/// Once the script runs out every call fails with an empty-response error.
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(content: &str) -> Self {
        Self::new(vec![Ok(content.to_string())])
    }

    pub fn with_replies(contents: Vec<&str>) -> Self {
        Self::new(contents.into_iter().map(|c| Ok(c.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl GenerationBackend for MockBackend {
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                prompt: prompt.to_string(),
                system_prompt: system_prompt.map(str::to_string),
            });
        }
        let mut replies = self
            .replies
            .lock()
            .map_err(|e| EngineError::LlmResponseFormat {
                provider: "mock".into(),
                message: format!("mock lock poisoned: {e}"),
            })?;
        replies.pop_front().unwrap_or(Err(EngineError::LlmEmptyResponse))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
struct UserData {
    words: WordBank,
    profile: Option<UserProfile>,
    logs: Vec<TestLog>,
}

/// In-memory [`PracticeStore`].
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user<T>(&self, user: &str, f: impl FnOnce(&mut UserData) -> T) -> Result<T> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| EngineError::Storage(format!("memory store lock poisoned: {e}").into()))?;
        Ok(f(users.entry(user.to_string()).or_default()))
    }
}

impl PracticeStore for MemoryStore {
    fn load_words(&self, user: &str) -> Result<WordBank> {
        self.with_user(user, |data| data.words.clone())
    }

    fn save_words(&self, user: &str, words: &WordBank) -> Result<()> {
        self.with_user(user, |data| data.words = words.clone())
    }

    fn load_profile(&self, user: &str) -> Result<Option<UserProfile>> {
        self.with_user(user, |data| data.profile)
    }

    fn save_profile(&self, user: &str, profile: &UserProfile) -> Result<()> {
        self.with_user(user, |data| data.profile = Some(*profile))
    }

    fn append_log(&self, user: &str, log: &TestLog) -> Result<()> {
        self.with_user(user, |data| data.logs.push(log.clone()))
    }

    fn list_logs(&self, user: &str) -> Result<Vec<TestLog>> {
        self.with_user(user, |data| {
            let mut logs = data.logs.clone();
            logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            logs
        })
    }
}

/// A reply that passes the article schema: 2 multiple choice, 2 fill-in-the-blank, 1 true/false.
pub fn valid_article_json() -> String {
    json!({
        "article": "Tom has a small cat. Every morning they walk to the river near the old tree. \
                    The cat likes to watch the fish, and Tom likes to read under the tree.",
        "questions": [
            {
                "type": "multiple_choice",
                "question": "Where do Tom and the cat walk?",
                "options": ["A. To the river", "B. To school", "C. To the shop", "D. To the park"],
                "correct_answer": "A"
            },
            {
                "type": "multiple_choice",
                "question": "What does the cat like to watch?",
                "options": ["A. Birds", "B. Fish", "C. Dogs", "D. Cars"],
                "correct_answer": "B"
            },
            {
                "type": "fill_blank",
                "question": "Tom has a ___ cat.",
                "correct_answer": "small"
            },
            {
                "type": "fill_blank",
                "question": "They walk to the ___ every morning.",
                "correct_answer": "river"
            },
            {
                "type": "true_false",
                "question": "Tom likes to swim in the river.",
                "correct_answer": false
            }
        ]
    })
    .to_string()
}

/// A reply that passes the evaluation schema with a score of 85.
pub fn valid_evaluation_json() -> String {
    json!({
        "score": 85,
        "item_analysis": [
            {"question_num": 1, "correct": true, "feedback": "Correct, they walk to the river."},
            {"question_num": 2, "correct": false, "feedback": "The cat watches the fish."}
        ],
        "overall_feedback": "Good reading, watch the details.",
        "suggestions": "Re-read the second sentence before answering."
    })
    .to_string()
}

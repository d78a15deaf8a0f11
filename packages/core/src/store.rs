//! Persistence contract for learner data.

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::types::{TestLog, UserProfile, WordBank};

/// Storage of word banks, profiles and test logs, keyed by user name.
pub trait PracticeStore {
    /// Load the user's word bank; a user without one has an empty bank.
    fn load_words(&self, user: &str) -> Result<WordBank>;

    /// Replace the user's word bank.
    fn save_words(&self, user: &str, words: &WordBank) -> Result<()>;

    /// Load the saved profile, `None` when nothing usable is stored.
    fn load_profile(&self, user: &str) -> Result<Option<UserProfile>>;

    fn save_profile(&self, user: &str, profile: &UserProfile) -> Result<()>;

    /// Append a completed test. Existing logs are never overwritten.
    fn append_log(&self, user: &str, log: &TestLog) -> Result<()>;

    /// All logs, newest first by (date, time).
    fn list_logs(&self, user: &str) -> Result<Vec<TestLog>>;

    /// Saved profile, or the defaults when none is stored.
    fn profile_or_default(&self, user: &str) -> Result<UserProfile> {
        Ok(self.load_profile(user)?.unwrap_or_default())
    }

    /// `(timestamp, score)` pairs, newest first.
    fn score_history(&self, user: &str) -> Result<Vec<(NaiveDateTime, f64)>> {
        Ok(self
            .list_logs(user)?
            .into_iter()
            .map(|log| (log.timestamp, log.score))
            .collect())
    }
}

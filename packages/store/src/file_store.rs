//! Flat-file implementation of [`PracticeStore`].

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use readcoach_core::types::{TestLog, UserProfile, WordBank};
use readcoach_core::{ApiConfig, PracticeStore};
use regex::Regex;

use crate::config::{
    data_root, validate_user_name, API_KEY_FILE, LOG_DATE_FORMAT, LOG_DIR, LOG_FILE_PREFIX,
    LOG_TIME_FORMAT, USER_INFO_FILE, WORD_BANK_FILE,
};
use crate::error::{Result, StoreError};

/// Separators accepted when importing a word list.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\s]+").expect("valid regex"));

/// Learner data kept as plain files under one root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `READCOACH_HOME`, or `./users`.
    pub fn from_env() -> Self {
        Self::new(data_root(None))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `user`, rejecting names that are not plain directory names.
    pub fn user_dir(&self, user: &str) -> Result<PathBuf> {
        if !validate_user_name(user) {
            return Err(StoreError::InvalidUserName(user.to_string()));
        }
        Ok(self.root.join(user))
    }

    /// Existing users, sorted by name.
    pub fn list_users(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut users: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| validate_user_name(name))
            .collect();
        users.sort();
        Ok(users)
    }

    pub fn user_exists(&self, user: &str) -> bool {
        self.user_dir(user).map(|dir| dir.is_dir()).unwrap_or(false)
    }

    /// Create the directory layout for a new user.
    ///
    /// Returns `false`, touching nothing, when the user already exists.
    pub fn create_user(&self, user: &str) -> Result<bool> {
        let dir = self.user_dir(user)?;
        if dir.exists() {
            return Ok(false);
        }

        let log_dir = dir.join(LOG_DIR);
        fs::create_dir_all(&log_dir).map_err(|e| StoreError::io(&log_dir, e))?;
        for file in [USER_INFO_FILE, API_KEY_FILE, WORD_BANK_FILE] {
            let path = dir.join(file);
            fs::write(&path, "").map_err(|e| StoreError::io(&path, e))?;
        }

        tracing::info!(user, path = %dir.display(), "created user");
        Ok(true)
    }

    /// Directory of an existing user.
    fn existing_user_dir(&self, user: &str) -> Result<PathBuf> {
        let dir = self.user_dir(user)?;
        if !dir.is_dir() {
            return Err(StoreError::UserNotFound(user.to_string()));
        }
        Ok(dir)
    }

    /// Directory of `user`, created on first write.
    fn ensure_user_dir(&self, user: &str) -> Result<PathBuf> {
        let dir = self.user_dir(user)?;
        if !dir.is_dir() {
            self.create_user(user)?;
        }
        Ok(dir)
    }

    pub fn read_words(&self, user: &str) -> Result<WordBank> {
        let path = self.user_dir(user)?.join(WORD_BANK_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(WordBank::from_words(text.lines())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WordBank::new()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    pub fn write_words(&self, user: &str, words: &WordBank) -> Result<()> {
        let path = self.ensure_user_dir(user)?.join(WORD_BANK_FILE);
        let mut text = String::new();
        for word in words.words() {
            text.push_str(word);
            text.push('\n');
        }
        fs::write(&path, text).map_err(|e| StoreError::io(&path, e))
    }

    /// Add words to the user's bank, returning how many were new.
    pub fn add_words<I, S>(&self, user: &str, new_words: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bank = self.read_words(user)?;
        let added = bank.add_words(new_words);
        self.write_words(user, &bank)?;
        tracing::debug!(user, added, total = bank.len(), "added words");
        Ok(added)
    }

    /// Remove duplicate words, returning how many were dropped.
    pub fn deduplicate_words(&self, user: &str) -> Result<usize> {
        let mut bank = self.read_words(user)?;
        let removed = bank.deduplicate();
        self.write_words(user, &bank)?;
        Ok(removed)
    }

    pub fn word_count(&self, user: &str) -> Result<usize> {
        Ok(self.read_words(user)?.len())
    }

    /// Add every word from a text file.
    ///
    /// Words may be separated by newlines, commas, semicolons or whitespace.
    pub fn import_words(&self, user: &str, file: &Path) -> Result<usize> {
        let text = fs::read_to_string(file).map_err(|e| StoreError::io(file, e))?;
        self.add_words(user, parse_word_list(&text))
    }

    pub fn read_profile(&self, user: &str) -> Result<Option<UserProfile>> {
        let path = self.user_dir(user)?.join(USER_INFO_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(parse_profile(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    pub fn write_profile(&self, user: &str, profile: &UserProfile) -> Result<()> {
        let path = self.ensure_user_dir(user)?.join(USER_INFO_FILE);
        fs::write(&path, format_profile(profile)).map_err(|e| StoreError::io(&path, e))
    }

    /// Load the user's provider credentials. A blank file is an empty config.
    pub fn load_api_config(&self, user: &str) -> Result<ApiConfig> {
        let path = self.existing_user_dir(user)?.join(API_KEY_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ApiConfig::new()),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        if text.trim().is_empty() {
            return Ok(ApiConfig::new());
        }
        serde_json::from_str(&text).map_err(|e| StoreError::json(&path, e))
    }

    pub fn save_api_config(&self, user: &str, config: &ApiConfig) -> Result<()> {
        let path = self.ensure_user_dir(user)?.join(API_KEY_FILE);
        let json = serde_json::to_string_pretty(config).map_err(|e| StoreError::json(&path, e))?;
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))
    }

    /// Write a log under `log/<date>/test_<time>.json`.
    ///
    /// A second log in the same second gets a numeric suffix; existing files
    /// are never overwritten. Returns the path written.
    pub fn write_log(&self, user: &str, log: &TestLog) -> Result<PathBuf> {
        let date_dir = self
            .ensure_user_dir(user)?
            .join(LOG_DIR)
            .join(log.timestamp.format(LOG_DATE_FORMAT).to_string());
        fs::create_dir_all(&date_dir).map_err(|e| StoreError::io(&date_dir, e))?;

        let json = serde_json::to_string_pretty(log).map_err(|e| StoreError::json(&date_dir, e))?;
        let time = log.timestamp.format(LOG_TIME_FORMAT).to_string();

        let mut suffix = 1;
        loop {
            let name = if suffix == 1 {
                format!("{LOG_FILE_PREFIX}{time}.json")
            } else {
                format!("{LOG_FILE_PREFIX}{time}_{suffix}.json")
            };
            let path = date_dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())
                        .map_err(|e| StoreError::io(&path, e))?;
                    tracing::debug!(user, path = %path.display(), "wrote test log");
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
    }

    /// All readable logs, newest first. Unreadable files are skipped with a warning.
    pub fn read_logs(&self, user: &str) -> Result<Vec<TestLog>> {
        let log_dir = self.user_dir(user)?.join(LOG_DIR);
        if !log_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut found: Vec<(LogKey, TestLog)> = Vec::new();
        let dates = fs::read_dir(&log_dir).map_err(|e| StoreError::io(&log_dir, e))?;

        for date_entry in dates.filter_map(|e| e.ok()) {
            let date_path = date_entry.path();
            if !date_path.is_dir() {
                continue;
            }
            let date = date_entry.file_name().to_string_lossy().into_owned();

            let files = fs::read_dir(&date_path).map_err(|e| StoreError::io(&date_path, e))?;
            for file_entry in files.filter_map(|e| e.ok()) {
                let path = file_entry.path();
                let Some(key) = log_key(&date, &path) else {
                    continue;
                };
                match read_log_file(&path) {
                    Ok(log) => found.push((key, log)),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable log"),
                }
            }
        }

        found.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(found.into_iter().map(|(_, log)| log).collect())
    }
}

impl PracticeStore for FileStore {
    fn load_words(&self, user: &str) -> readcoach_core::Result<WordBank> {
        Ok(self.read_words(user)?)
    }

    fn save_words(&self, user: &str, words: &WordBank) -> readcoach_core::Result<()> {
        Ok(self.write_words(user, words)?)
    }

    fn load_profile(&self, user: &str) -> readcoach_core::Result<Option<UserProfile>> {
        Ok(self.read_profile(user)?)
    }

    fn save_profile(&self, user: &str, profile: &UserProfile) -> readcoach_core::Result<()> {
        Ok(self.write_profile(user, profile)?)
    }

    fn append_log(&self, user: &str, log: &TestLog) -> readcoach_core::Result<()> {
        self.write_log(user, log)?;
        Ok(())
    }

    fn list_logs(&self, user: &str) -> readcoach_core::Result<Vec<TestLog>> {
        Ok(self.read_logs(user)?)
    }
}

/// Sort key of a log file: (date, time, collision suffix).
type LogKey = (String, String, u32);

fn log_key(date: &str, path: &Path) -> Option<LogKey> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_prefix(LOG_FILE_PREFIX)?;
    let (time, suffix) = match rest.split_once('_') {
        Some((time, suffix)) => (time, suffix.parse().ok()?),
        None => (rest, 1),
    };
    Some((date.to_string(), time.to_string(), suffix))
}

fn read_log_file(path: &Path) -> Result<TestLog> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| StoreError::json(path, e))
}

/// Split imported text into words.
pub fn parse_word_list(text: &str) -> Vec<String> {
    WORD_SEPARATOR
        .split(text)
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `key: value` lines. Unknown keys and malformed values are ignored.
///
/// Returns `None` when neither field is usable; a missing field takes its default.
fn parse_profile(text: &str) -> Option<UserProfile> {
    let mut age = None;
    let mut lexile_level = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "age" => age = value.parse::<u32>().ok().filter(|a| *a > 0),
            "lexile_level" => lexile_level = value.parse::<u32>().ok(),
            _ => {}
        }
    }

    if age.is_none() && lexile_level.is_none() {
        return None;
    }
    let defaults = UserProfile::default();
    Some(UserProfile {
        age: age.unwrap_or(defaults.age),
        lexile_level: lexile_level.unwrap_or(defaults.lexile_level),
    })
}

fn format_profile(profile: &UserProfile) -> String {
    format!(
        "age: {}\nlexile_level: {}\n",
        profile.age, profile.lexile_level
    )
}

//! Data directory layout.
//!
//! ```text
//! <root>/<user>/
//!     user_info.txt        age: N / lexile_level: N
//!     api_key.txt          {"provider": {"api_key": ..., "models": [...]}}
//!     word_bank.txt        one word per line
//!     log/<YYYY-MM-DD>/test_<HH-MM-SS>.json
//! ```

use std::path::PathBuf;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "READCOACH_HOME";

/// Data root used when neither a flag nor the environment names one.
pub const DEFAULT_DATA_DIR: &str = "users";

pub const USER_INFO_FILE: &str = "user_info.txt";
pub const API_KEY_FILE: &str = "api_key.txt";
pub const WORD_BANK_FILE: &str = "word_bank.txt";
pub const LOG_DIR: &str = "log";

/// Directory name format for a day of logs.
pub const LOG_DATE_FORMAT: &str = "%Y-%m-%d";

/// File stem time format for a single log.
pub const LOG_TIME_FORMAT: &str = "%H-%M-%S";

pub const LOG_FILE_PREFIX: &str = "test_";

/// Resolve the data root: explicit path, then `READCOACH_HOME`, then `./users`.
pub fn data_root(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::var_os(DATA_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Validate a user name for use as a directory name.
pub fn validate_user_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

//! Reading Coach store - flat-file persistence for learner data.
//!
//! Each learner is a directory under the data root holding a profile, provider
//! credentials, a word bank and dated JSON test logs. [`FileStore`] implements
//! the core [`PracticeStore`](readcoach_core::PracticeStore) contract on top of
//! this layout.
//!
//! - [`config`]: Directory layout and data root resolution
//! - [`error`]: Error types and Result alias
//! - [`file_store`]: The store itself
//! - [`report`]: Markdown rendering of test logs

pub mod config;
pub mod error;
pub mod file_store;
pub mod report;

pub use config::data_root;
pub use error::{Result, StoreError};
pub use file_store::{parse_word_list, FileStore};
pub use report::{format_log, format_summary};

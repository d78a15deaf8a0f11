//! Reading Coach CLI - personalised reading practice in the terminal.
//!
//! - [`cli`]: Argument parsing and command dispatch
//! - [`practice`]: Interactive generate, answer and grade loop
//! - [`error`]: Error types and Result alias

pub mod cli;
pub mod error;
pub mod practice;

pub use error::{CliError, Result};

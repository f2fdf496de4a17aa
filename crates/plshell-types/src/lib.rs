//! Foundation types for plshell.
//!
//! This crate holds the types shared by every plshell crate: the error
//! taxonomy and the shell configuration.

pub mod config;
pub mod error;

pub use config::ShellConfig;
pub use error::{Result, ShellError};

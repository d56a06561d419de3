//! ambit CLI library.
//!
//! This crate provides the command-line interface for checking event drafts
//! against a calendar.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;

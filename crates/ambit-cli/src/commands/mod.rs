//! CLI subcommand implementations.

pub mod agenda;
pub mod batch;
pub mod check;
pub mod util;

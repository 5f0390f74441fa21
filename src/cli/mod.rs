//! CLI module - argument parsing and subcommand handlers

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, RunArgs};

//! Shellstream - line streaming over a child process's stdout.

pub mod config;
pub mod display;
pub mod shell;

//! Colored terminal output for the demo driver.

use std::io::{self, Write};

use owo_colors::OwoColorize;

/// Format a received line for display, without its line ending.
#[must_use]
pub fn format_line(index: usize, line: &str, raw_mode: bool) -> String {
    let content = line.trim_end_matches(['\n', '\r']);
    if raw_mode {
        format!("Got line: {content}")
    } else {
        format!("{} {}", format!("[{index}]").dimmed(), content)
    }
}

/// Print a received line.
pub fn print_line(index: usize, line: &str, raw_mode: bool) {
    if raw_mode {
        println!("{}", format_line(index, line, true));
    } else {
        println!("{} {}", "Got line:".green().bold(), format_line(index, line, false));
    }
    let _ = io::stdout().flush();
}

/// Print a note that a reply was written to the child.
pub fn print_reply(reply: &str) {
    println!("{} {}", "[REPLY]".cyan().bold(), reply.dimmed());
    let _ = io::stdout().flush();
}

/// Print the child's exit status.
pub fn print_exit(status: Option<std::process::ExitStatus>) {
    match status {
        Some(status) if status.success() => {
            println!("{} {}", "[EXIT]".blue().bold(), status);
        }
        Some(status) => println!("{} {}", "[EXIT]".red().bold(), status),
        None => println!("{} {}", "[EXIT]".yellow().bold(), "unknown".dimmed()),
    }
    let _ = io::stdout().flush();
}

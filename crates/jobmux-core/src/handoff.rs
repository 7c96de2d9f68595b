//! Terminal hand-off: run an interactive program in the foreground and wait
//! for it to exit.
//!
//! Used for `tmux attach`, the editor, and the diff tool. The child inherits
//! stdin/stdout/stderr, so it owns the terminal until it exits, after which
//! control comes back to the caller with its exit code.

use anyhow::{Context, Result};
use std::process::Command;

/// Run `program` with `args` in the foreground and return its exit code
///
/// A child killed by a signal reports exit code 1.
pub fn hand_off<S: AsRef<std::ffi::OsStr>>(program: &str, args: &[S]) -> Result<i32> {
    tracing::debug!(program, "handing terminal to child process");
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute {}", program))?;
    Ok(status.code().unwrap_or(1))
}

/// Split an editor setting like `code --wait` into program and leading args
pub fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

//! Session lifecycle: create, replace, kill, and view a job's session.
//!
//! The manager never talks to tmux or the process table directly. It goes
//! through two capabilities, [`SessionControl`] and [`ProcessControl`], so that
//! tests can swap in the recording fakes.

mod manager;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcesses, FakeSessions, SessionCall};

pub use manager::{JobListing, KillReport, RunOptions, RunReport, SessionLifecycleManager};

use anyhow::Result;
use std::path::Path;

/// A live OS process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    /// Full command line
    pub cmdline: String,
}

impl ProcessEntry {
    /// Parse a `pgrep -a` line: `<pid> <command line>`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (pid, cmdline) = line.split_once(' ').unwrap_or((line, ""));
        Some(Self {
            pid: pid.parse().ok()?,
            cmdline: cmdline.trim().to_string(),
        })
    }
}

/// Terminal multiplexer sessions and windows
pub trait SessionControl {
    /// Names of all live sessions
    fn list_sessions(&self) -> Result<Vec<String>>;

    /// Whether a session with exactly this name exists
    fn has_session(&self, name: &str) -> Result<bool> {
        Ok(self.list_sessions()?.iter().any(|s| s == name))
    }

    /// Create a detached session whose first window is `window_name`.
    /// Returns the pane target of that window.
    fn new_session(&self, name: &str, cwd: &Path, window_name: &str) -> Result<String>;

    /// Add a window to a session. Returns the new pane target.
    fn new_window(&self, session: &str, window_name: &str, cwd: &Path) -> Result<String>;

    /// Type `command` into a pane and press Enter
    fn send_command(&self, target: &str, command: &str) -> Result<()>;

    /// Terminate a session and everything running in it
    fn kill_session(&self, name: &str) -> Result<()>;

    /// Give the terminal to the session until the user detaches.
    /// Returns the exit code of the attaching client.
    fn attach(&self, name: &str) -> Result<i32>;
}

/// OS process lookup and termination, restricted to the invoking user
pub trait ProcessControl {
    /// Processes whose full command line matches `pattern`
    fn find(&self, pattern: &str) -> Result<Vec<ProcessEntry>>;

    /// Signal every process whose full command line matches `pattern`
    fn kill_matching(&self, pattern: &str) -> Result<()>;
}

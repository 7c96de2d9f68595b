use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::{Command, Output};

use crate::handoff::hand_off;
use crate::lifecycle::SessionControl;

/// Regex pattern for validating tmux pane targets (session:window.pane)
static TARGET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^:\s]+:\d+\.\d+$").expect("Invalid TARGET_PATTERN regex"));

/// Format tmux prints for a newly created pane
const TARGET_FORMAT: &str = "#{session_name}:#{window_index}.#{pane_index}";

/// Validate a pane target before sending keys to it.
/// Only `session:window.pane` as printed by tmux is accepted (e.g. "sweep:3.0").
fn validate_target(target: &str) -> Result<()> {
    if !TARGET_PATTERN.is_match(target) {
        bail!("Invalid tmux target format: {}", target);
    }
    Ok(())
}

/// Exact-match session target; a bare name would also match by prefix
fn exact(session: &str) -> String {
    format!("={}", session)
}

/// Errors tmux reports when no server is running, which just means no sessions
fn is_no_server(stderr: &str) -> bool {
    stderr.contains("no server running") || stderr.contains("error connecting to")
}

/// Text for `send-keys -l`.
///
/// tmux reads a trailing `;` on any argument as a command separator, even a
/// literal one; `\;` is its escape for a plain semicolon.
fn literal_keys(command: &str) -> String {
    match command.strip_suffix(';') {
        Some(head) => format!("{}\\;", head),
        None => command.to_string(),
    }
}

/// Arguments that put the terminal into `session`
fn attach_args(session: &str, inside_tmux: bool) -> Vec<String> {
    let verb = if inside_tmux {
        "switch-client"
    } else {
        "attach-session"
    };
    vec![verb.to_string(), "-t".to_string(), exact(session)]
}

/// Session capability backed by the tmux binary
pub struct TmuxClient {
    /// tmux executable
    program: String,
}

impl TmuxClient {
    /// Creates a client using `tmux` from PATH
    pub fn new() -> Self {
        Self::with_program("tmux")
    }

    /// Creates a client using a specific tmux executable
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Check if tmux can be executed
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-V")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(?args, "tmux");
        Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute tmux {}", args.first().unwrap_or(&"")))
    }

    /// Run a tmux command, failing on a non-zero exit
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "tmux {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionControl for TmuxClient {
    fn list_sessions(&self) -> Result<Vec<String>> {
        let output = self.output(&["list-sessions", "-F", "#{session_name}"])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_no_server(&stderr) {
                return Ok(Vec::new());
            }
            bail!("tmux list-sessions failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(|s| s.to_string()).collect())
    }

    fn has_session(&self, name: &str) -> Result<bool> {
        // exits 1 both for "no such session" and "no server"
        let output = self.output(&["has-session", "-t", &exact(name)])?;
        Ok(output.status.success())
    }

    fn new_session(&self, name: &str, cwd: &Path, window_name: &str) -> Result<String> {
        let cwd = cwd.to_string_lossy();
        let target = self.run(&[
            "new-session",
            "-d",
            "-s",
            name,
            "-n",
            window_name,
            "-c",
            &cwd,
            "-P",
            "-F",
            TARGET_FORMAT,
        ])?;
        validate_target(&target)?;
        Ok(target)
    }

    fn new_window(&self, session: &str, window_name: &str, cwd: &Path) -> Result<String> {
        let cwd = cwd.to_string_lossy();
        // `=session:` picks the next free window index of that exact session
        let session_target = format!("{}:", exact(session));
        let target = self.run(&[
            "new-window",
            "-d",
            "-t",
            &session_target,
            "-n",
            window_name,
            "-c",
            &cwd,
            "-P",
            "-F",
            TARGET_FORMAT,
        ])?;
        validate_target(&target)?;
        Ok(target)
    }

    fn send_command(&self, target: &str, command: &str) -> Result<()> {
        validate_target(target)?;
        // Send the command as literal text, then press Enter
        let keys = literal_keys(command);
        self.run(&["send-keys", "-t", target, "-l", "--", &keys])?;
        self.run(&["send-keys", "-t", target, "Enter"])?;
        Ok(())
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        self.run(&["kill-session", "-t", &exact(name)])?;
        Ok(())
    }

    fn attach(&self, name: &str) -> Result<i32> {
        let inside_tmux = std::env::var_os("TMUX").is_some_and(|v| !v.is_empty());
        let args = attach_args(name, inside_tmux);
        if inside_tmux {
            // switch-client returns immediately; the current client moves over
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            self.run(&args)?;
            return Ok(0);
        }
        hand_off(&self.program, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert_eq!(TmuxClient::new().program, "tmux");
        assert_eq!(TmuxClient::with_program("/opt/tmux").program, "/opt/tmux");
    }

    #[test]
    fn test_validate_target_valid() {
        assert!(validate_target("main:0.0").is_ok());
        assert!(validate_target("my-session:1.2").is_ok());
        assert!(validate_target("lr_sweep:10.0").is_ok());
        assert!(validate_target("abc123:99.99").is_ok());
    }

    #[test]
    fn test_validate_target_invalid() {
        assert!(validate_target("").is_err());
        assert!(validate_target("main").is_err());
        assert!(validate_target("main:0").is_err());
        assert!(validate_target("main:low.high").is_err());
        assert!(validate_target("; rm -rf /").is_err());
        assert!(validate_target("main:0.0; echo pwned").is_err());
        assert!(validate_target("main:0.0\necho evil").is_err());
    }

    #[test]
    fn test_exact_target() {
        assert_eq!(exact("sweep"), "=sweep");
    }

    #[test]
    fn test_literal_keys_keep_trailing_semicolon() {
        assert_eq!(literal_keys("python main.py"), "python main.py");
        assert_eq!(literal_keys("echo a; echo b"), "echo a; echo b");
        assert_eq!(literal_keys("sleep 1;"), r"sleep 1\;");
        // tmux turns the final `\;` back into `;`, leaving the shell's `\;`
        assert_eq!(
            literal_keys(r"find . -exec rm {} \;"),
            r"find . -exec rm {} \\;"
        );
    }

    #[test]
    fn test_attach_args() {
        assert_eq!(
            attach_args("sweep", false),
            vec!["attach-session", "-t", "=sweep"]
        );
        assert_eq!(
            attach_args("sweep", true),
            vec!["switch-client", "-t", "=sweep"]
        );
    }

    #[test]
    fn test_no_server_detection() {
        assert!(is_no_server("no server running on /tmp/tmux-1000/default"));
        assert!(is_no_server(
            "error connecting to /tmp/tmux-1000/default (No such file or directory)"
        ));
        assert!(!is_no_server("unknown option -- x"));
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let client = TmuxClient::with_program("definitely-not-tmux-jm");
        assert!(!client.is_available());
        assert!(client.list_sessions().is_err());
        assert!(client.has_session("sweep").is_err());
    }
}

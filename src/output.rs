use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::io::IsTerminal;

use jobmux_core::lifecycle::JobListing;

pub mod codes {
    /// Job with a live session
    pub const ACTIVE: u8 = 71;
    /// Job without a session
    pub const INACTIVE: u8 = 167;
}

const RESET: &str = "\x1b[0m";

/// `NO_COLOR` (non-empty) disables colour, otherwise only when stdout is a TTY
pub fn should_colorize() -> bool {
    if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

fn paint(text: &str, code: u8, colorize: bool) -> String {
    if colorize {
        format!("{}{}{}", fg256(code), text, RESET)
    } else {
        text.to_string()
    }
}

/// One `ls` entry: timestamp and name, then the description indented below
pub fn format_listing(job: &JobListing, colorize: bool) -> String {
    let modified: DateTime<Utc> = job.modified.into();
    let code = if job.active {
        codes::ACTIVE
    } else {
        codes::INACTIVE
    };
    let mut line = format!(
        "{} {}",
        modified.format("[%b %d %H:%M:%S]"),
        paint(&job.name, code, colorize)
    );
    if let Some(description) = &job.description {
        let _ = write!(line, "\n    {}", description);
    }
    line
}

pub fn render_listing(jobs: &[JobListing], colorize: bool) -> String {
    let mut buf = String::new();
    for job in jobs {
        let _ = writeln!(buf, "{}", format_listing(job, colorize));
    }
    buf
}

//! Production capabilities: tmux for sessions, pgrep/pkill for processes.

mod client;
mod process;

pub use client::TmuxClient;
pub use process::PgrepProcesses;

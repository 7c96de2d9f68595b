//! Recording fakes for the session and process capabilities

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use parking_lot::Mutex;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ProcessControl, ProcessEntry, SessionControl};

/// Recorded session call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    ListSessions,
    HasSession {
        name: String,
    },
    NewSession {
        name: String,
        cwd: PathBuf,
        window: String,
    },
    NewWindow {
        session: String,
        window: String,
        cwd: PathBuf,
    },
    SendCommand {
        target: String,
        command: String,
    },
    KillSession {
        name: String,
    },
    Attach {
        name: String,
    },
}

#[derive(Debug, Clone, Default)]
struct FakeWindow {
    name: String,
    commands: Vec<String>,
}

#[derive(Default)]
struct FakeSessionState {
    sessions: IndexMap<String, Vec<FakeWindow>>,
    calls: Vec<SessionCall>,
    attached: Vec<String>,
}

/// In-memory stand-in for tmux
#[derive(Clone, Default)]
pub struct FakeSessions {
    inner: Arc<Mutex<FakeSessionState>>,
}

impl FakeSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a session is already running
    pub fn add_live_session(&self, name: &str) {
        self.inner.lock().sessions.insert(
            name.to_string(),
            vec![FakeWindow {
                name: "0".to_string(),
                commands: Vec::new(),
            }],
        );
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SessionCall> {
        self.inner.lock().calls.clone()
    }

    /// Window names of a session in creation order
    pub fn window_names(&self, session: &str) -> Vec<String> {
        self.inner
            .lock()
            .sessions
            .get(session)
            .map(|windows| windows.iter().map(|w| w.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Commands sent to the first window with this name
    pub fn commands(&self, session: &str, window: &str) -> Vec<String> {
        self.inner
            .lock()
            .sessions
            .get(session)
            .and_then(|windows| windows.iter().find(|w| w.name == window))
            .map(|w| w.commands.clone())
            .unwrap_or_default()
    }

    /// Sessions attached to, in order
    pub fn attached(&self) -> Vec<String> {
        self.inner.lock().attached.clone()
    }
}

impl SessionControl for FakeSessions {
    fn list_sessions(&self) -> Result<Vec<String>> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::ListSessions);
        Ok(state.sessions.keys().cloned().collect())
    }

    fn has_session(&self, name: &str) -> Result<bool> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::HasSession {
            name: name.to_string(),
        });
        Ok(state.sessions.contains_key(name))
    }

    fn new_session(&self, name: &str, cwd: &Path, window_name: &str) -> Result<String> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::NewSession {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
            window: window_name.to_string(),
        });
        if state.sessions.contains_key(name) {
            bail!("duplicate session: {}", name);
        }
        state.sessions.insert(
            name.to_string(),
            vec![FakeWindow {
                name: window_name.to_string(),
                commands: Vec::new(),
            }],
        );
        Ok(format!("{}:0.0", name))
    }

    fn new_window(&self, session: &str, window_name: &str, cwd: &Path) -> Result<String> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::NewWindow {
            session: session.to_string(),
            window: window_name.to_string(),
            cwd: cwd.to_path_buf(),
        });
        let windows = state
            .sessions
            .get_mut(session)
            .with_context(|| format!("can't find session: {}", session))?;
        windows.push(FakeWindow {
            name: window_name.to_string(),
            commands: Vec::new(),
        });
        Ok(format!("{}:{}.0", session, windows.len() - 1))
    }

    fn send_command(&self, target: &str, command: &str) -> Result<()> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::SendCommand {
            target: target.to_string(),
            command: command.to_string(),
        });
        let (session, window_pane) = target.split_once(':').context("bad target")?;
        let index: usize = window_pane
            .split_once('.')
            .and_then(|(w, _)| w.parse().ok())
            .context("bad target")?;
        let window = state
            .sessions
            .get_mut(session)
            .and_then(|windows| windows.get_mut(index))
            .with_context(|| format!("can't find target: {}", target))?;
        window.commands.push(command.to_string());
        Ok(())
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::KillSession {
            name: name.to_string(),
        });
        state.sessions.shift_remove(name);
        Ok(())
    }

    fn attach(&self, name: &str) -> Result<i32> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::Attach {
            name: name.to_string(),
        });
        if !state.sessions.contains_key(name) {
            bail!("can't find session: {}", name);
        }
        state.attached.push(name.to_string());
        Ok(0)
    }
}

#[derive(Default)]
struct FakeProcessState {
    processes: Vec<ProcessEntry>,
    kills: Vec<String>,
}

/// In-memory stand-in for pgrep/pkill
#[derive(Clone, Default)]
pub struct FakeProcesses {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a running process
    pub fn spawn(&self, pid: u32, cmdline: &str) {
        self.inner.lock().processes.push(ProcessEntry {
            pid,
            cmdline: cmdline.to_string(),
        });
    }

    /// Pids still running
    pub fn pids(&self) -> Vec<u32> {
        self.inner.lock().processes.iter().map(|p| p.pid).collect()
    }

    /// Patterns passed to `kill_matching`
    pub fn kills(&self) -> Vec<String> {
        self.inner.lock().kills.clone()
    }
}

impl ProcessControl for FakeProcesses {
    fn find(&self, pattern: &str) -> Result<Vec<ProcessEntry>> {
        let re = Regex::new(pattern)?;
        Ok(self
            .inner
            .lock()
            .processes
            .iter()
            .filter(|p| re.is_match(&p.cmdline))
            .cloned()
            .collect())
    }

    fn kill_matching(&self, pattern: &str) -> Result<()> {
        let re = Regex::new(pattern)?;
        let mut state = self.inner.lock();
        state.kills.push(pattern.to_string());
        state.processes.retain(|p| !re.is_match(&p.cmdline));
        Ok(())
    }
}

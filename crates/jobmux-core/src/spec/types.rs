use indexmap::IndexMap;

use crate::error::SpecErrorKind;

/// Where a window's command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// `raw`: the command is the literal text of the line
    Raw,
    /// `run`: composed from params, run with the interpreter
    Run,
    /// `vprof`: composed from params, run under the profiler
    Vprof,
}

/// One named window of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Window name (the run name for `run`/`vprof`)
    pub name: String,
    /// Command typed into the window, `None` for an empty interactive window
    pub command: Option<String>,
    /// Provenance of the command
    pub kind: WindowKind,
}

/// Parsed contents of one job file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSpec {
    /// Job name, also the session name
    pub job_name: String,
    /// `#` comment on the first line, if any
    pub description: Option<String>,
    /// param name -> variant name -> fragment
    pub parameters: IndexMap<String, IndexMap<String, String>>,
    /// `shared(<key>)` fragments in first-insertion order
    pub shared_local: IndexMap<String, String>,
    /// Every `shared` fragment, each prefixed with a space
    pub shared_global: String,
    /// Windows in declaration order
    pub windows: Vec<Window>,
}

impl JobSpec {
    /// Create an empty spec for a job
    pub fn new(job_name: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            ..Self::default()
        }
    }

    /// Look up a window by name
    pub fn window(&self, name: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.name == name)
    }

    /// Windows that will receive a command
    pub fn command_count(&self) -> usize {
        self.windows.iter().filter(|w| w.command.is_some()).count()
    }

    /// Shared args appended to every composed command: the `shared(<key>)`
    /// values joined by spaces, then the accumulated `shared` fragments
    pub fn shared_args(&self) -> String {
        let mut shared = String::new();
        let local: Vec<&str> = self.shared_local.values().map(String::as_str).collect();
        if !local.is_empty() {
            shared.push(' ');
            shared.push_str(&local.join(" "));
        }
        shared.push_str(&self.shared_global);
        shared
    }

    pub(crate) fn add_param(
        &mut self,
        param: &str,
        variant: &str,
        fragment: &str,
    ) -> Result<(), SpecErrorKind> {
        let variants = self.parameters.entry(param.to_string()).or_default();
        if variants.contains_key(variant) {
            return Err(SpecErrorKind::DuplicateVariant {
                param: param.to_string(),
                variant: variant.to_string(),
            });
        }
        variants.insert(variant.to_string(), fragment.to_string());
        Ok(())
    }

    pub(crate) fn add_window(&mut self, window: Window) -> Result<(), SpecErrorKind> {
        if self.window(&window.name).is_some() {
            return Err(SpecErrorKind::DuplicateWindow(window.name));
        }
        // tmux resolves `session:name` targets by prefix, so a window starting
        // with the session name is ambiguous
        if window.name.starts_with(&self.job_name) {
            return Err(SpecErrorKind::WindowShadowsJob {
                window: window.name,
                job: self.job_name.clone(),
            });
        }
        self.windows.push(window);
        Ok(())
    }
}

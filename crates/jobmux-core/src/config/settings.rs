use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Launch parameterized jobs as tmux sessions",
    infer_subcommands = true
)]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding jobs/ and trash/
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Subcommand (any unique prefix works, e.g. `ru` for `run`)
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a new job file and open it in the editor
    New { job: String },
    /// Open an existing job file in the editor
    Edit { job: String },
    /// Launch a job as a tmux session and attach to it
    Run {
        /// Job name, unique prefix, or N for the Nth most recently modified job
        job: String,
        /// Kill the job's existing session and processes first
        #[arg(short, long)]
        force: bool,
        /// Only launch the first window, then attach (smoke test)
        #[arg(long)]
        first: bool,
    },
    /// List jobs, oldest first, marking the running ones
    Ls,
    /// Compare two job files in the diff tool
    Diff { first: String, second: String },
    /// Rename a job file
    Mv { from: String, to: String },
    /// Kill a job's session and every process tagged with it
    Kill { job: String },
    /// Attach to a running job's session
    View { job: String },
    /// Copy a job file and open the copy in the editor
    Cp { from: String, to: String },
    /// Kill a job and move its file to the trash
    Del { job: String },
    /// Print the path of a job file
    File { job: String },
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding jobs/ and trash/ (default: parent of the executable's bin/)
    #[serde(default)]
    pub root_dir: Option<PathBuf>,

    /// Start directory of every session window (default: current directory)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Name of the first window, which shows the job file
    #[serde(default = "default_info_window")]
    pub info_window: String,

    /// How `run`/`vprof` commands are built
    #[serde(default)]
    pub launch: LaunchSettings,

    /// External editor and diff tool
    #[serde(default)]
    pub editor: EditorSettings,
}

fn default_info_window() -> String {
    "info".to_string()
}

/// Command-line template settings for composed windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSettings {
    /// Script every `run`/`vprof` invokes
    #[serde(default = "default_base_cmd")]
    pub base_cmd: String,

    /// Interpreter for `run` windows
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Profiler for `vprof` windows
    #[serde(default = "default_profiler")]
    pub profiler: String,

    /// Output file passed to the profiler
    #[serde(default = "default_profile_output")]
    pub profile_output: String,
}

fn default_base_cmd() -> String {
    "main.py".to_string()
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_profiler() -> String {
    "vprof".to_string()
}

fn default_profile_output() -> String {
    "profile.json".to_string()
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            base_cmd: default_base_cmd(),
            interpreter: default_interpreter(),
            profiler: default_profiler(),
            profile_output: default_profile_output(),
        }
    }
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Editor for new/edit/cp (default: $VISUAL, then $EDITOR, then vim)
    #[serde(default)]
    pub editor: Option<String>,

    /// Tool for `diff`
    #[serde(default = "default_diff_tool")]
    pub diff_tool: String,
}

fn default_diff_tool() -> String {
    "vimdiff".to_string()
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            editor: None,
            diff_tool: default_diff_tool(),
        }
    }
}

impl EditorSettings {
    /// Editor to launch, falling back to the environment
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vim".to_string())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_dir: None,
            work_dir: None,
            info_window: default_info_window(),
            launch: LaunchSettings::default(),
            editor: EditorSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::load_file(p);
            }
            tracing::warn!("config file {:?} not found, using defaults", p);
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("jobmux/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/jobmux/config.toml")),
            dirs::home_dir().map(|p| p.join(".jobmux.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(root) = &cli.root {
            self.root_dir = Some(root.clone());
        }
    }

    /// Validate and normalize settings values
    ///
    /// Empty strings would produce broken command lines, so they fall back to defaults.
    pub fn validate(&mut self) {
        fn or_default(value: &mut String, default: fn() -> String) {
            if value.trim().is_empty() {
                *value = default();
            }
        }

        or_default(&mut self.info_window, default_info_window);
        or_default(&mut self.launch.base_cmd, default_base_cmd);
        or_default(&mut self.launch.interpreter, default_interpreter);
        or_default(&mut self.launch.profiler, default_profiler);
        or_default(&mut self.launch.profile_output, default_profile_output);
        or_default(&mut self.editor.diff_tool, default_diff_tool);
    }

    /// Directory holding jobs/ and trash/
    pub fn resolve_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root_dir {
            return Ok(root.clone());
        }
        // <root>/bin/jobmux
        let exe = std::env::current_exe().context("Failed to locate the jobmux executable")?;
        exe.parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .with_context(|| format!("Executable {:?} has no root directory", exe))
    }

    /// Start directory for session windows
    pub fn resolve_work_dir(&self) -> Result<PathBuf> {
        match &self.work_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to read current directory"),
        }
    }
}

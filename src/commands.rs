use anyhow::{bail, Context, Result};
use chrono::Local;
use std::ffi::OsString;
use std::path::Path;

use jobmux_core::config::{Command, Settings};
use jobmux_core::handoff::{hand_off, split_command};
use jobmux_core::spec::LaunchTemplate;
use jobmux_core::tmux::{PgrepProcesses, TmuxClient};
use jobmux_core::{JobRegistry, RunOptions, SessionLifecycleManager};

use crate::output;

/// Everything a subcommand needs, wired to the real tmux and process table
pub struct App {
    settings: Settings,
    manager: SessionLifecycleManager<TmuxClient, PgrepProcesses>,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let root = settings.resolve_root()?;
        let registry = JobRegistry::under_root(&root);
        registry.ensure_dirs()?;
        tracing::debug!("jobs in {}", registry.jobs_dir().display());

        let tmux = TmuxClient::new();
        if !tmux.is_available() {
            bail!("tmux not found in PATH");
        }

        let template = LaunchTemplate::new(&settings.launch, Local::now());
        let manager = SessionLifecycleManager::new(
            tmux,
            PgrepProcesses::new(),
            registry,
            template,
            settings.resolve_work_dir()?,
        )
        .with_info_window(&settings.info_window);

        Ok(Self { settings, manager })
    }

    fn registry(&self) -> &JobRegistry {
        self.manager.registry()
    }

    /// Run a subcommand, returning the process exit status
    pub fn dispatch(&self, command: &Command) -> Result<i32> {
        match command {
            Command::New { job } => {
                let path = self.registry().fresh_path(job)?;
                self.open_editor(&[path.as_path()])
            }
            Command::Edit { job } => {
                let name = self.registry().resolve(job)?;
                let path = self.registry().path(&name);
                self.open_editor(&[path.as_path()])
            }
            Command::Run { job, force, first } => {
                let options = RunOptions {
                    force: *force,
                    first_only: *first,
                };
                let report = self.manager.run(job, options)?;
                Ok(report.attach_status)
            }
            Command::Ls => {
                let listing = self.manager.list()?;
                print!(
                    "{}",
                    output::render_listing(&listing, output::should_colorize())
                );
                Ok(0)
            }
            Command::Diff { first, second } => {
                let first = self.registry().path(&self.registry().resolve(first)?);
                let second = self.registry().path(&self.registry().resolve(second)?);
                self.open_with(
                    &self.settings.editor.diff_tool,
                    &[first.as_path(), second.as_path()],
                )
            }
            Command::Mv { from, to } => {
                let name = self.registry().resolve(from)?;
                let path = self.registry().rename(&name, to)?;
                tracing::warn!(
                    "running sessions of `{}` keep the old name; kill it before relaunching",
                    name
                );
                println!("{} -> {}", name, path.display());
                Ok(0)
            }
            Command::Kill { job } => {
                self.manager.kill(job)?;
                Ok(0)
            }
            Command::View { job } => Ok(self.manager.view(job)?),
            Command::Cp { from, to } => {
                let name = self.registry().resolve(from)?;
                let path = self.registry().copy(&name, to)?;
                self.open_editor(&[path.as_path()])
            }
            Command::Del { job } => {
                let trashed = self.manager.del(job)?;
                println!("moved to {}", trashed.display());
                Ok(0)
            }
            Command::File { job } => {
                let name = self.registry().resolve(job)?;
                println!("{}", self.registry().path(&name).display());
                Ok(0)
            }
        }
    }

    fn open_editor(&self, paths: &[&Path]) -> Result<i32> {
        let editor = self.settings.editor.editor_command();
        self.open_with(&editor, paths)
    }

    /// Hand the terminal to `command` (which may carry its own flags) on `paths`
    fn open_with(&self, command: &str, paths: &[&Path]) -> Result<i32> {
        let (program, flags) =
            split_command(command).with_context(|| format!("Empty command: {:?}", command))?;
        let mut args: Vec<OsString> = flags.into_iter().map(OsString::from).collect();
        args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
        hand_off(program, &args)
    }
}

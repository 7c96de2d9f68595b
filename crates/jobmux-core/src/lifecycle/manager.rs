use std::path::PathBuf;
use std::time::SystemTime;

use super::{ProcessControl, ProcessEntry, SessionControl};
use crate::error::JobError;
use crate::registry::{read_description, validate_session_name, JobRegistry};
use crate::spec::{parse_job, JobSpec, LaunchTemplate};
use crate::tag::tag_pattern;

/// Flags for [`SessionLifecycleManager::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Replace a live session instead of failing
    pub force: bool,
    /// Stop after the first window and attach right away
    pub first_only: bool,
}

/// What `run` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub job_name: String,
    /// Names of the windows created after the info window
    pub windows: Vec<String>,
    /// Whether a live session was killed first
    pub replaced: Option<KillReport>,
    /// Exit code of the attach hand-off
    pub attach_status: i32,
}

/// What `kill` found and terminated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillReport {
    pub session_killed: bool,
    /// Tagged processes found before the bulk kill
    pub processes: Vec<ProcessEntry>,
}

impl KillReport {
    /// Nothing was running
    pub fn is_noop(&self) -> bool {
        !self.session_killed && self.processes.is_empty()
    }
}

/// One row of `ls`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    pub name: String,
    pub modified: SystemTime,
    /// A session with the job's name is live
    pub active: bool,
    pub description: Option<String>,
}

/// Orchestrates a job's session and processes.
///
/// Holds every collaborator it needs; nothing is read from globals. Each
/// destructive step is preceded by an existence check, but the
/// check-then-act sequence is not atomic across concurrent invocations.
pub struct SessionLifecycleManager<S, P> {
    sessions: S,
    processes: P,
    registry: JobRegistry,
    template: LaunchTemplate,
    work_dir: PathBuf,
    info_window: String,
}

impl<S: SessionControl, P: ProcessControl> SessionLifecycleManager<S, P> {
    pub fn new(
        sessions: S,
        processes: P,
        registry: JobRegistry,
        template: LaunchTemplate,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            sessions,
            processes,
            registry,
            template,
            work_dir,
            info_window: "info".to_string(),
        }
    }

    /// Use a different name for the initial window
    pub fn with_info_window(mut self, name: &str) -> Self {
        self.info_window = name.to_string();
        self
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn processes(&self) -> &P {
        &self.processes
    }

    /// Parse a job without launching anything
    pub fn load(&self, job_name: &str) -> Result<JobSpec, JobError> {
        let text = self.registry.read(job_name)?;
        parse_job(job_name, &text, &self.template).map_err(|source| JobError::Spec {
            job: job_name.to_string(),
            source,
        })
    }

    /// Launch a job as a new session, then attach to it.
    ///
    /// The job file is parsed completely before anything is touched, so a
    /// malformed file never kills a running session.
    pub fn run(&self, identifier: &str, options: RunOptions) -> Result<RunReport, JobError> {
        let job_name = self.registry.resolve(identifier)?;
        validate_session_name(&job_name)?;
        let spec = self.load(&job_name)?;

        let replaced = if self.sessions.has_session(&job_name)? {
            if !options.force {
                return Err(JobError::SessionConflict { job: job_name });
            }
            Some(self.kill_job(&job_name)?)
        } else {
            None
        };

        tracing::info!(
            "launching session: {} ({} commands)",
            job_name,
            spec.command_count()
        );
        let info_target =
            self.sessions
                .new_session(&job_name, &self.work_dir, &self.info_window)?;
        let job_path = self.registry.path(&job_name);
        self.sessions.send_command(
            &info_target,
            &format!("cat {}", shell_quote(&job_path.to_string_lossy())),
        )?;

        let mut windows = Vec::new();
        for window in &spec.windows {
            match &window.command {
                Some(cmd) => tracing::info!("* launching window {}: {}", window.name, cmd),
                None => tracing::info!("* launching window {}", window.name),
            }
            let target = self
                .sessions
                .new_window(&job_name, &window.name, &self.work_dir)?;
            if let Some(cmd) = &window.command {
                self.sessions.send_command(&target, cmd)?;
            }
            windows.push(window.name.clone());
            if options.first_only {
                break;
            }
        }

        let attach_status = self.sessions.attach(&job_name)?;
        Ok(RunReport {
            job_name,
            windows,
            replaced,
            attach_status,
        })
    }

    /// Kill the session and tagged processes of the job named by `identifier`
    pub fn kill(&self, identifier: &str) -> Result<KillReport, JobError> {
        let job_name = self.registry.resolve(identifier)?;
        self.kill_job(&job_name)
    }

    /// Kill a job's session and every process carrying its tag.
    ///
    /// Idempotent: with no session and no tagged process this does nothing.
    /// Processes are killed with one user-restricted pattern kill, never by pid.
    pub fn kill_job(&self, job_name: &str) -> Result<KillReport, JobError> {
        let mut report = KillReport::default();

        if self.sessions.has_session(job_name)? {
            tracing::info!("killing session {}", job_name);
            self.sessions.kill_session(job_name)?;
            report.session_killed = true;
        }

        let pattern = tag_pattern(job_name);
        report.processes = self.processes.find(&pattern)?;
        for process in &report.processes {
            tracing::info!("killing process {}: {}", process.pid, process.cmdline);
        }
        if !report.processes.is_empty() {
            self.processes.kill_matching(&pattern)?;
        }

        if report.is_noop() {
            tracing::debug!(job = job_name, "nothing to kill");
        }
        Ok(report)
    }

    /// Attach to a job's live session
    pub fn view(&self, identifier: &str) -> Result<i32, JobError> {
        let job_name = self.registry.resolve(identifier)?;
        if !self.sessions.has_session(&job_name)? {
            return Err(JobError::NotFound {
                kind: "session",
                name: job_name,
            });
        }
        Ok(self.sessions.attach(&job_name)?)
    }

    /// Kill a job, then move its file to the trash
    pub fn del(&self, identifier: &str) -> Result<PathBuf, JobError> {
        let job_name = self.registry.resolve(identifier)?;
        self.kill_job(&job_name)?;
        let trashed = self.registry.trash(&job_name)?;
        tracing::debug!("moved {} -> {}", job_name, trashed.display());
        Ok(trashed)
    }

    /// All jobs, oldest first, with their active state and description
    pub fn list(&self) -> Result<Vec<JobListing>, JobError> {
        let live = self.sessions.list_sessions()?;
        self.registry
            .entries()?
            .into_iter()
            .map(|entry| {
                Ok(JobListing {
                    active: live.contains(&entry.name),
                    description: read_description(&entry.path)?,
                    name: entry.name,
                    modified: entry.modified,
                })
            })
            .collect()
    }
}

/// Single-quote a string for the shell
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

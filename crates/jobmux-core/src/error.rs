//! Error types shared by every jobmux-core component.

use std::path::PathBuf;

use thiserror::Error;

/// Why a job file failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecErrorKind {
    /// First token of the line is not a known directive
    #[error("unrecognized command `{0}`")]
    UnknownDirective(String),

    /// `param` was given fewer than a name and a variant
    #[error("`param` needs a name and a variant")]
    MissingParamArgs,

    /// The same `(param, variant)` pair was declared twice
    #[error("param variant `{param}={variant}` already exists")]
    DuplicateVariant { param: String, variant: String },

    /// `raw` was given no window name
    #[error("missing window name for `raw`")]
    MissingWindowName,

    /// `shared(...)` keyword without a closing paren or with an empty key
    #[error("malformed shared key in `{0}`, expected `shared(<key>)`")]
    MalformedSharedKey(String),

    /// A window with this name was already registered
    #[error("window name used twice: {0}")]
    DuplicateWindow(String),

    /// Window names may not start with the job (session) name
    #[error("window name `{window}` starts with job name `{job}`, which tmux can't tell apart")]
    WindowShadowsJob { window: String, job: String },

    /// A `run`/`vprof` argument is not exactly `param=variant`
    #[error("expected `param=variant` but got `{0}`")]
    MalformedSelection(String),

    /// `run`/`vprof` referenced a param never declared with `param`
    #[error("unknown param `{param}` in `{token}` (declare it with `param` first)")]
    UnknownParam { param: String, token: String },

    /// `run`/`vprof` referenced a variant the param doesn't have
    #[error("unknown variant `{variant}` of param `{param}` in `{token}`")]
    UnknownVariant {
        param: String,
        variant: String,
        token: String,
    },

    /// `run`/`vprof` with no `param=variant` arguments
    #[error("`{0}` needs at least one `param=variant` argument")]
    EmptySelection(&'static str),
}

/// A parse failure, pinned to the line that caused it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_no}: {kind}\n    {line}")]
pub struct SpecError {
    /// 1-based line number
    pub line_no: usize,
    /// Raw text of the offending line
    pub line: String,
    /// What went wrong
    pub kind: SpecErrorKind,
}

impl SpecError {
    pub fn new(line_no: usize, line: &str, kind: SpecErrorKind) -> Self {
        Self {
            line_no,
            line: line.to_string(),
            kind,
        }
    }
}

/// Error type for registry and lifecycle operations
#[derive(Debug, Error)]
pub enum JobError {
    /// The job file is malformed
    #[error("error parsing job `{job}`, {source}")]
    Spec {
        job: String,
        #[source]
        source: SpecError,
    },

    /// A job, session or rank that an operation requires does not exist
    #[error("can't find {kind} `{name}`")]
    NotFound { kind: &'static str, name: String },

    /// A prefix matched more than one job
    #[error("job name `{query}` matches multiple jobs: {}", .candidates.join(", "))]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },

    /// The job already has a live session and `--force` was not given
    #[error("`{job}` is already running, add `--force` to kill it")]
    SessionConflict { job: String },

    /// A job file that must be new already exists
    #[error("job `{0}` already exists")]
    AlreadyExists(String),

    /// A new job name can't be used as a file and session name
    #[error("invalid job name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Reading or moving a job file failed
    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tmux or process command failed
    #[error("command failed: {0:#}")]
    Command(#[from] anyhow::Error),
}

impl JobError {
    /// Shorthand for a missing job
    pub fn job_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: "job",
            name: name.to_string(),
        }
    }

    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

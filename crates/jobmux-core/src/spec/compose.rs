//! Variant composer: turns `run`/`vprof` selections into a window name and a
//! full command line.

use chrono::{DateTime, Local};
use indexmap::IndexMap;

use super::directive::Selection;
use super::types::WindowKind;
use crate::config::LaunchSettings;
use crate::error::SpecErrorKind;
use crate::tag::process_tag;

/// Timestamp format of the `job_info=` argument
const LAUNCH_TIME_FORMAT: &str = "%m-%d.%H-%M-%S";

/// How a composed command is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Plain interpreter invocation
    Run,
    /// Wrapped in the profiler
    Vprof,
}

impl From<LaunchMode> for WindowKind {
    fn from(mode: LaunchMode) -> Self {
        match mode {
            LaunchMode::Run => WindowKind::Run,
            LaunchMode::Vprof => WindowKind::Vprof,
        }
    }
}

/// Result of composing one `run`/`vprof` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    /// Variant names joined by `.`, also the window name
    pub run_name: String,
    /// Param fragments followed by shared args
    pub expanded: String,
    /// Final command typed into the window
    pub command: String,
}

/// Everything about the surrounding command line that is fixed for one launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTemplate {
    pub base_cmd: String,
    pub interpreter: String,
    pub profiler: String,
    pub profile_output: String,
    /// Invocation time, shared by every window of one launch
    pub launched_at: String,
}

impl LaunchTemplate {
    /// Build a template from settings and the invocation time
    pub fn new(settings: &LaunchSettings, now: DateTime<Local>) -> Self {
        Self {
            base_cmd: settings.base_cmd.clone(),
            interpreter: settings.interpreter.clone(),
            profiler: settings.profiler.clone(),
            profile_output: settings.profile_output.clone(),
            launched_at: now.format(LAUNCH_TIME_FORMAT).to_string(),
        }
    }

    /// Wrap expanded args with the job-identifying context
    pub fn wrap(&self, job_name: &str, run_name: &str, expanded: &str, mode: LaunchMode) -> String {
        let inner = format!(
            "{base} job_name={job} run_name={run} {tag}{expanded} job_info={at}.{job}.{run}",
            base = self.base_cmd,
            job = job_name,
            run = run_name,
            tag = process_tag(job_name),
            at = self.launched_at,
        );
        match mode {
            LaunchMode::Run => format!("{} {}", self.interpreter, inner),
            LaunchMode::Vprof => format!(
                "{} -c cp \"{}\" --output-file {}",
                self.profiler,
                inner.replace('"', "\\\""),
                self.profile_output
            ),
        }
    }
}

impl Default for LaunchTemplate {
    fn default() -> Self {
        let settings = LaunchSettings::default();
        Self {
            base_cmd: settings.base_cmd,
            interpreter: settings.interpreter,
            profiler: settings.profiler,
            profile_output: settings.profile_output,
            launched_at: "01-01.00-00-00".to_string(),
        }
    }
}

/// Resolve selections against the param table.
///
/// Returns the run name and the fragments, each prefixed with one space.
pub fn resolve_variants(
    parameters: &IndexMap<String, IndexMap<String, String>>,
    selections: &[Selection],
) -> Result<(String, String), SpecErrorKind> {
    let mut fragments = String::new();
    let mut variants = Vec::with_capacity(selections.len());

    for selection in selections {
        let declared = parameters
            .get(&selection.param)
            .ok_or_else(|| SpecErrorKind::UnknownParam {
                param: selection.param.clone(),
                token: selection.token(),
            })?;
        let fragment =
            declared
                .get(&selection.variant)
                .ok_or_else(|| SpecErrorKind::UnknownVariant {
                    param: selection.param.clone(),
                    variant: selection.variant.clone(),
                    token: selection.token(),
                })?;
        fragments.push(' ');
        fragments.push_str(fragment);
        variants.push(selection.variant.as_str());
    }

    Ok((variants.join("."), fragments))
}

/// Compose a `run`/`vprof` line of `spec` into a window name and command
pub fn compose(
    spec: &super::JobSpec,
    selections: &[Selection],
    mode: LaunchMode,
    template: &LaunchTemplate,
) -> Result<Composed, SpecErrorKind> {
    let (run_name, fragments) = resolve_variants(&spec.parameters, selections)?;
    let expanded = format!("{}{}", fragments, spec.shared_args());
    let command = template.wrap(&spec.job_name, &run_name, &expanded, mode);
    Ok(Composed {
        run_name,
        expanded,
        command,
    })
}

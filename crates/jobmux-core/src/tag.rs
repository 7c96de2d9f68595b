//! Process tags: the marker that ties a running OS process back to its job.
//!
//! Every `run`/`vprof` command carries `job_id=<job>___jobid___` as one of its
//! arguments. Nothing else is stored; `kill` finds a job's processes by looking
//! for this substring in their full command lines.

/// Trailing sentinel so that `job_id=foo` never matches `job_id=foobar`
const TAG_SUFFIX: &str = "___jobid___";

/// Build the process tag for a job
pub fn process_tag(job_name: &str) -> String {
    format!("job_id={}{}", job_name, TAG_SUFFIX)
}

/// Pattern for `pgrep -f`/`pkill -f` that matches the tag literally
pub fn tag_pattern(job_name: &str) -> String {
    regex::escape(&process_tag(job_name))
}

use anyhow::{bail, Context, Result};
use std::process::{Command, Output};

use crate::lifecycle::{ProcessControl, ProcessEntry};

/// Exit status pgrep/pkill use for "no process matched"
const NO_MATCH: i32 = 1;

/// Process capability backed by procps `pgrep`/`pkill`.
///
/// Both are restricted with `-u` to the invoking user's processes and match
/// against the full command line (`-f`).
pub struct PgrepProcesses {
    uid: u32,
}

impl PgrepProcesses {
    /// Restrict to the real uid of this process
    pub fn new() -> Self {
        Self::for_uid(nix::unistd::getuid().as_raw())
    }

    /// Restrict to a specific uid
    pub fn for_uid(uid: u32) -> Self {
        Self { uid }
    }

    fn invoke(&self, program: &str, extra: &[&str], pattern: &str) -> Result<Option<Output>> {
        let uid = self.uid.to_string();
        let mut args = vec!["-u", uid.as_str()];
        args.extend_from_slice(extra);
        args.extend_from_slice(&["-f", "--", pattern]);
        tracing::debug!(program, ?args, "process lookup");

        let output = Command::new(program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to execute {}", program))?;

        match output.status.code() {
            Some(0) => Ok(Some(output)),
            Some(NO_MATCH) => Ok(None),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!("{} failed: {}", program, stderr.trim());
            }
        }
    }
}

impl Default for PgrepProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for PgrepProcesses {
    fn find(&self, pattern: &str) -> Result<Vec<ProcessEntry>> {
        let Some(output) = self.invoke("pgrep", &["-a"], pattern)? else {
            return Ok(Vec::new());
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().filter_map(ProcessEntry::parse).collect())
    }

    fn kill_matching(&self, pattern: &str) -> Result<()> {
        // processes may have exited since `find`, which pkill reports as no match
        self.invoke("pkill", &[], pattern)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::tag_pattern;

    #[test]
    fn test_uses_real_uid() {
        let procs = PgrepProcesses::new();
        assert_eq!(procs.uid, nix::unistd::getuid().as_raw());
        assert_eq!(PgrepProcesses::for_uid(42).uid, 42);
    }

    #[test]
    fn test_find_nothing_for_unused_tag() {
        let procs = PgrepProcesses::new();
        // pgrep may be missing in minimal environments
        if let Ok(found) = procs.find(&tag_pattern("no-such-job-jm-4f2a")) {
            assert!(found.is_empty());
        }
    }
}

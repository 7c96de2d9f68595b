//! Job registry: the jobs directory, one file per job.
//!
//! Jobs are ordered by modification time, oldest first, which is also the
//! order `ls` prints them in. A job can be named by its exact name, a unique
//! prefix, or a number `N` meaning the Nth most recently modified job.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::JobError;
use crate::spec::description;

/// Names usable as both a file name and a tmux session name
static JOB_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid JOB_NAME_PATTERN regex"));

/// One job file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Jobs directory plus the trash directory deleted jobs move to
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs_dir: PathBuf,
    trash_dir: PathBuf,
}

impl JobRegistry {
    pub fn new(jobs_dir: impl Into<PathBuf>, trash_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
            trash_dir: trash_dir.into(),
        }
    }

    /// Registry using `<root>/jobs` and `<root>/trash`
    pub fn under_root(root: &Path) -> Self {
        Self::new(root.join("jobs"), root.join("trash"))
    }

    /// Create the jobs and trash directories if missing
    pub fn ensure_dirs(&self) -> Result<(), JobError> {
        for dir in [&self.jobs_dir, &self.trash_dir] {
            fs::create_dir_all(dir).map_err(|e| JobError::io("Failed to create", dir, e))?;
        }
        Ok(())
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    pub fn trash_dir(&self) -> &Path {
        &self.trash_dir
    }

    /// Path a job's file has (or would have)
    pub fn path(&self, name: &str) -> PathBuf {
        self.jobs_dir.join(name)
    }

    /// All job files, oldest first
    pub fn entries(&self) -> Result<Vec<JobEntry>, JobError> {
        let dir = fs::read_dir(&self.jobs_dir)
            .map_err(|e| JobError::io("Failed to read jobs directory", &self.jobs_dir, e))?;

        let mut entries: Vec<JobEntry> = dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                Some(JobEntry {
                    name: entry.file_name().into_string().ok()?,
                    path: entry.path(),
                    modified: metadata.modified().ok()?,
                })
            })
            .collect();

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Resolve a job identifier to an existing job name
    pub fn resolve(&self, identifier: &str) -> Result<String, JobError> {
        let names: Vec<String> = self.entries()?.into_iter().map(|e| e.name).collect();
        resolve_among(identifier, &names)
    }

    /// Path for a job that must not exist yet
    pub fn fresh_path(&self, name: &str) -> Result<PathBuf, JobError> {
        validate_name(name)?;
        let path = self.path(name);
        if path.exists() {
            return Err(JobError::AlreadyExists(name.to_string()));
        }
        Ok(path)
    }

    /// Read a job file
    pub fn read(&self, name: &str) -> Result<String, JobError> {
        let path = self.path(name);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => JobError::job_not_found(name),
            _ => JobError::io("Failed to read job file", path, e),
        })
    }

    /// Rename job `from` to the new name `to`
    pub fn rename(&self, from: &str, to: &str) -> Result<PathBuf, JobError> {
        let source = self.existing_path(from)?;
        let dest = self.fresh_path(to)?;
        fs::rename(&source, &dest).map_err(|e| JobError::io("Failed to rename", &source, e))?;
        Ok(dest)
    }

    /// Copy job `from` to the new name `to`
    pub fn copy(&self, from: &str, to: &str) -> Result<PathBuf, JobError> {
        let source = self.existing_path(from)?;
        let dest = self.fresh_path(to)?;
        fs::copy(&source, &dest).map_err(|e| JobError::io("Failed to copy", &source, e))?;
        Ok(dest)
    }

    /// Move a job file into the trash, replacing any trashed job of the same name
    pub fn trash(&self, name: &str) -> Result<PathBuf, JobError> {
        let source = self.existing_path(name)?;
        let dest = self.trash_dir.join(name);
        fs::rename(&source, &dest).map_err(|e| JobError::io("Failed to trash", &source, e))?;
        Ok(dest)
    }

    fn existing_path(&self, name: &str) -> Result<PathBuf, JobError> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(JobError::job_not_found(name));
        }
        Ok(path)
    }
}

const NAME_CHARS_REASON: &str = "only letters, digits, `-` and `_` are allowed";

/// Check that an existing job's name survives as a tmux session name.
///
/// tmux rewrites `.` and `:` in session names, after which the session can
/// no longer be found under the job's name.
pub fn validate_session_name(name: &str) -> Result<(), JobError> {
    if JOB_NAME_PATTERN.is_match(name) {
        return Ok(());
    }
    Err(JobError::InvalidName {
        name: name.to_string(),
        reason: NAME_CHARS_REASON,
    })
}

/// Check that a new job name works as a file and tmux session name
pub fn validate_name(name: &str) -> Result<(), JobError> {
    validate_session_name(name)?;
    if is_rank(name) {
        return Err(JobError::InvalidName {
            name: name.to_string(),
            reason: "purely numeric names are read as `Nth most recent`",
        });
    }
    Ok(())
}

fn is_rank(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.chars().all(|c| c.is_ascii_digit())
}

/// Resolve `identifier` against job names sorted oldest first.
///
/// `N` picks the Nth most recent, then an exact name wins, then a unique prefix.
pub fn resolve_among(identifier: &str, names: &[String]) -> Result<String, JobError> {
    if is_rank(identifier) {
        return identifier
            .parse::<usize>()
            .ok()
            .filter(|&rank| rank >= 1 && rank <= names.len())
            .map(|rank| names[names.len() - rank].clone())
            .ok_or_else(|| JobError::NotFound {
                kind: "job ranked",
                name: identifier.to_string(),
            });
    }

    if names.iter().any(|n| n == identifier) {
        return Ok(identifier.to_string());
    }

    let matches: Vec<&String> = names.iter().filter(|n| n.starts_with(identifier)).collect();
    match matches.as_slice() {
        [] => Err(JobError::job_not_found(identifier)),
        [only] => Ok((*only).clone()),
        _ => Err(JobError::Ambiguous {
            query: identifier.to_string(),
            candidates: matches.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// Description of a job file, read from its first line only
pub fn read_description(path: &Path) -> Result<Option<String>, JobError> {
    let file = fs::File::open(path).map_err(|e| JobError::io("Failed to open", path, e))?;
    let mut first = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut first)
        .map_err(|e| JobError::io("Failed to read", path, e))?;
    Ok(description(&String::from_utf8_lossy(&first)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Registry in a temp dir with files written at the given mtimes (seconds)
    fn registry_with(jobs: &[(&str, u64)]) -> (tempfile::TempDir, JobRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = JobRegistry::under_root(dir.path());
        registry.ensure_dirs().unwrap();
        for (name, mtime) in jobs {
            let path = registry.path(name);
            fs::write(&path, format!("# job {name}\nraw w ls\n")).unwrap();
            let file = fs::File::options().write(true).open(&path).unwrap();
            file.set_modified(UNIX_EPOCH + Duration::from_secs(*mtime)).unwrap();
        }
        (dir, registry)
    }

    #[test]
    fn test_resolve_by_rank_exact_and_prefix() {
        let (_dir, registry) = registry_with(&[("c", 3), ("a", 1), ("b", 2)]);
        assert_eq!(registry.resolve("1").unwrap(), "c");
        assert_eq!(registry.resolve("3").unwrap(), "a");
        assert_eq!(registry.resolve("b").unwrap(), "b");
        assert!(matches!(
            registry.resolve("4"),
            Err(JobError::NotFound { .. })
        ));
        assert!(matches!(
            registry.resolve("0"),
            Err(JobError::NotFound { .. })
        ));
    }

    #[test]
    fn test_entries_sorted_oldest_first() {
        let (_dir, registry) = registry_with(&[("new", 30), ("old", 10), ("mid", 20)]);
        let order: Vec<String> = registry.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(order, names(&["old", "mid", "new"]));
    }

    #[test]
    fn test_resolve_prefix_cases() {
        let jobs = names(&["sweep", "swap", "lr", "lr_big"]);
        assert_eq!(resolve_among("swe", &jobs).unwrap(), "sweep");
        // exact match wins over being a prefix of another name
        assert_eq!(resolve_among("lr", &jobs).unwrap(), "lr");
        assert!(matches!(
            resolve_among("zzz", &jobs),
            Err(JobError::NotFound { .. })
        ));
        match resolve_among("sw", &jobs) {
            Err(JobError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, names(&["sweep", "swap"]))
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_rank_overflow_is_not_found() {
        let jobs = names(&["a"]);
        assert!(matches!(
            resolve_among("99999999999999999999999", &jobs),
            Err(JobError::NotFound { .. })
        ));
    }

    #[test]
    fn test_validate_session_name() {
        assert!(validate_session_name("sweep_v2").is_ok());
        // ranks resolve to existing files, so digits alone are fine here
        assert!(validate_session_name("42").is_ok());
        for bad in ["sweep.v2", "a:b", "with space", ""] {
            assert!(
                matches!(
                    validate_session_name(bad),
                    Err(JobError::InvalidName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("lr-sweep_2").is_ok());
        for bad in ["", "a.b", "a/b", "a:b", "with space", "42"] {
            assert!(
                matches!(validate_name(bad), Err(JobError::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_fresh_path_rejects_existing() {
        let (_dir, registry) = registry_with(&[("a", 1)]);
        assert!(matches!(
            registry.fresh_path("a"),
            Err(JobError::AlreadyExists(_))
        ));
        assert_eq!(registry.fresh_path("b").unwrap(), registry.path("b"));
    }

    #[test]
    fn test_rename_copy_and_trash() {
        let (_dir, registry) = registry_with(&[("a", 1)]);

        let copied = registry.copy("a", "b").unwrap();
        assert!(copied.is_file());
        assert!(registry.path("a").is_file());

        registry.rename("b", "c").unwrap();
        assert!(!registry.path("b").exists());
        assert!(registry.path("c").is_file());

        let trashed = registry.trash("a").unwrap();
        assert_eq!(trashed, registry.trash_dir().join("a"));
        assert!(trashed.is_file());
        assert!(!registry.path("a").exists());

        assert!(matches!(
            registry.trash("a"),
            Err(JobError::NotFound { .. })
        ));
    }

    #[test]
    fn test_read_missing_job() {
        let (_dir, registry) = registry_with(&[]);
        assert!(matches!(registry.read("ghost"), Err(JobError::NotFound { .. })));
    }

    #[test]
    fn test_read_description_first_line_only() {
        let (_dir, registry) = registry_with(&[("a", 1)]);
        assert_eq!(
            read_description(&registry.path("a")).unwrap(),
            Some("job a".to_string())
        );

        let path = registry.path("binary");
        fs::write(&path, b"# caf\xff sweep\n# second\n").unwrap();
        assert_eq!(
            read_description(&path).unwrap(),
            Some("caf\u{fffd} sweep".to_string())
        );

        fs::write(&path, "raw w ls\n").unwrap();
        assert_eq!(read_description(&path).unwrap(), None);
    }
}

//! End-to-end: job files on disk -> parsed spec -> session windows -> kill.

use std::fs;
use std::path::PathBuf;

use jobmux_core::lifecycle::{FakeProcesses, FakeSessions};
use jobmux_core::spec::LaunchTemplate;
use jobmux_core::tag::process_tag;
use jobmux_core::{JobError, JobRegistry, RunOptions, SessionControl, SessionLifecycleManager};

fn setup(
    jobs: &[(&str, &str)],
) -> (
    tempfile::TempDir,
    SessionLifecycleManager<FakeSessions, FakeProcesses>,
) {
    let dir = tempfile::tempdir().unwrap();
    let registry = JobRegistry::under_root(dir.path());
    registry.ensure_dirs().unwrap();
    for (name, text) in jobs {
        fs::write(registry.path(name), text).unwrap();
    }
    let manager = SessionLifecycleManager::new(
        FakeSessions::new(),
        FakeProcesses::new(),
        registry,
        LaunchTemplate::default(),
        PathBuf::from("/work"),
    );
    (dir, manager)
}

const SWEEP: &str = "# nightly sweep
param lr low lr=0.01
param lr high lr=0.1
shared(data) --data /d
shared --epochs 3
raw tb tensorboard --logdir runs
run lr=low
vprof lr=high
";

#[test]
fn test_run_then_kill_round_trip() {
    let (_dir, manager) = setup(&[("nightly", SWEEP)]);

    let report = manager.run("nightly", RunOptions::default()).unwrap();
    assert_eq!(report.windows, vec!["tb", "low", "high"]);

    let sessions = manager.sessions();
    let low = sessions.commands("nightly", "low").remove(0);
    let high = sessions.commands("nightly", "high").remove(0);
    assert!(low.starts_with("python main.py job_name=nightly run_name=low"));
    let lr = low.find("lr=0.01").unwrap();
    let data = low.find("--data /d").unwrap();
    let epochs = low.find("--epochs 3").unwrap();
    assert!(lr < data && data < epochs);
    assert!(high.starts_with("vprof -c cp \""));

    // pretend every composed command is now a running process
    let processes = manager.processes();
    processes.spawn(10, &low);
    processes.spawn(11, &high);
    processes.spawn(99, &format!("python main.py {}", process_tag("other")));

    // a second run without --force is refused
    assert!(matches!(
        manager.run("n", RunOptions::default()),
        Err(JobError::SessionConflict { .. })
    ));

    let killed = manager.kill("nightly").unwrap();
    assert!(killed.session_killed);
    assert_eq!(killed.processes.len(), 2);
    assert_eq!(processes.pids(), vec![99]);
    assert!(sessions.list_sessions().unwrap().is_empty());

    // and killing again is a no-op
    assert!(manager.kill("nightly").unwrap().is_noop());
}

#[test]
fn test_listing_reads_descriptions_and_activity() {
    let (_dir, manager) = setup(&[("nightly", SWEEP), ("adhoc", "raw sh\n")]);
    manager.run("adhoc", RunOptions::default()).unwrap();

    let listing = manager.list().unwrap();
    let adhoc = listing.iter().find(|j| j.name == "adhoc").unwrap();
    let nightly = listing.iter().find(|j| j.name == "nightly").unwrap();
    assert!(adhoc.active);
    assert_eq!(adhoc.description, None);
    assert!(!nightly.active);
    assert_eq!(nightly.description.as_deref(), Some("nightly sweep"));
}

#[test]
fn test_parse_errors_name_job_and_line() {
    let (_dir, manager) = setup(&[("broken", "param p v1 a\nparam p v1 b\n")]);
    let err = manager.run("broken", RunOptions::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("`broken`"), "{message}");
    assert!(message.contains("line 2"), "{message}");
    assert!(message.contains("param p v1 b"), "{message}");
    assert!(manager.sessions().list_sessions().unwrap().is_empty());
}

#[test]
fn test_job_file_with_dot_is_never_launched() {
    let (_dir, manager) = setup(&[("sweep.v2", SWEEP)]);
    assert!(matches!(
        manager.run("sweep.v2", RunOptions::default()),
        Err(JobError::InvalidName { .. })
    ));
    assert!(manager.sessions().list_sessions().unwrap().is_empty());
}

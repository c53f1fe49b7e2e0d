//! End-to-end supervisor tests against real child processes.
//!
//! Unix-only: they exercise process-group termination and /bin/sh.

#![cfg(unix)]

use gridbench_core::BenchError;
use gridbench_exec::{CommandInvocation, ProcessRegistry, Supervisor};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn supervisor() -> (Supervisor, Arc<ProcessRegistry>) {
    let registry = Arc::new(ProcessRegistry::new());
    (Supervisor::new(Arc::clone(&registry)), registry)
}

fn sh(script: &str, cwd: &std::path::Path, timeout: Duration) -> CommandInvocation {
    CommandInvocation::new("sh", cwd, timeout).args(["-c", script])
}

#[tokio::test]
async fn success_captures_stdout() {
    let (sup, registry) = supervisor();
    let dir = tempfile::tempdir().unwrap();

    let out = sup
        .run(sh("printf 'hello\\nworld\\n'", dir.path(), Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(out, "hello\nworld\n");
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn nonzero_exit_carries_stderr_and_code() {
    let (sup, registry) = supervisor();
    let dir = tempfile::tempdir().unwrap();

    let err = sup
        .run(sh(
            "echo ignored; echo 'compile error' >&2; exit 3",
            dir.path(),
            Duration::from_secs(5),
        ))
        .await
        .unwrap_err();

    match err {
        BenchError::ProcessFailed { code, message } => {
            assert_eq!(code, Some(3));
            assert_eq!(message, "compile error");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn missing_executable_is_spawn_error() {
    let (sup, _) = supervisor();
    let dir = tempfile::tempdir().unwrap();

    let err = sup
        .run(CommandInvocation::new(
            "gridbench-no-such-binary",
            dir.path(),
            Duration::from_secs(5),
        ))
        .await
        .unwrap_err();

    match err {
        BenchError::Spawn { not_found, .. } => assert!(not_found),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn deadline_fires_without_polling_the_full_timeout() {
    let (sup, registry) = supervisor();
    let dir = tempfile::tempdir().unwrap();

    let started = Instant::now();
    let err = sup
        .run(sh("sleep 30", dir.path(), Duration::from_millis(200)))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        BenchError::Timeout { timeout } => assert_eq!(timeout, Duration::from_millis(200)),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn timeout_kills_the_whole_process_group() {
    let (sup, _) = supervisor();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("survivor");

    // The shell forks a background child that would create the marker after
    // the timeout; a leader-only kill would leave it running.
    let script = "(sleep 0.6 && touch survivor) & sleep 30";
    let err = sup
        .run(sh(script, dir.path(), Duration::from_millis(150)))
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::Timeout { .. }));

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(
        !marker.exists(),
        "background descendant survived the group kill"
    );
}

#[tokio::test]
async fn output_ceiling_forces_overflow_even_for_clean_exit() {
    let (sup, _) = supervisor();
    let sup = sup.with_output_limit(64 * 1024);
    let dir = tempfile::tempdir().unwrap();

    // Would exit 0 given unlimited output.
    let err = sup
        .run(sh(
            "head -c 262144 /dev/zero",
            dir.path(),
            Duration::from_secs(10),
        ))
        .await
        .unwrap_err();

    match err {
        BenchError::OutputOverflow { captured, limit } => {
            assert_eq!(limit, 64 * 1024);
            assert!(captured > limit);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn stderr_counts_toward_the_ceiling() {
    let (sup, _) = supervisor();
    let sup = sup.with_output_limit(16 * 1024);
    let dir = tempfile::tempdir().unwrap();

    let err = sup
        .run(sh(
            "head -c 65536 /dev/zero 1>&2",
            dir.path(),
            Duration::from_secs(10),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::OutputOverflow { .. }));
}

#[tokio::test]
async fn sequential_runs_reuse_one_registry() {
    let (sup, registry) = supervisor();
    let dir = tempfile::tempdir().unwrap();

    for _ in 0..3 {
        sup.run(sh("true", dir.path(), Duration::from_secs(5)))
            .await
            .unwrap();
    }
    assert_eq!(registry.active_count(), 0);
}

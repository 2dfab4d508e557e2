#![cfg(unix)]

mod common;
use crate::common::{init_tracing, lines_from, stub, supervisor, terminal_lines, with_timeout};

use std::sync::Arc;

use scriptrunner::errors::LaunchError;
use scriptrunner::exec::{Origin, RunOutcome, ScriptJob};

#[tokio::test]
async fn successful_script_ends_with_success_line() {
    init_tracing();
    let sup = supervisor();
    let script = stub::hello();

    let mut handle = sup.start(script.job()).expect("start hello");
    let outcome = with_timeout(handle.wait()).await;

    assert_eq!(outcome, RunOutcome::Success);
    let lines = sup.sink().lines();
    assert!(lines[0].starts_with("Executing "), "got {lines:?}");
    assert!(lines[0].ends_with("with interpreter: sh"), "got {lines:?}");
    assert_eq!(lines_from(sup.sink(), Origin::Stdout), vec!["hello"]);
    assert_eq!(sup.sink().last().as_deref(), Some("Script completed successfully."));
    assert!(!sup.is_running());
    assert!(!sup.sink().is_busy());
    assert_eq!(sup.exit_code(), Some(0));
}

#[tokio::test]
async fn failing_script_reports_its_exit_code() {
    init_tracing();
    let sup = supervisor();
    let script = stub::exit_with(3);

    let mut handle = sup.start(script.job()).expect("start");
    let outcome = with_timeout(handle.wait()).await;

    assert_eq!(outcome, RunOutcome::Failed(3));
    assert_eq!(
        sup.sink().last().as_deref(),
        Some("Script exited with error code: 3")
    );
    assert_eq!(terminal_lines(sup.sink()), 1);
    assert_eq!(sup.exit_code(), Some(3));
    assert_eq!(sup.last_outcome(), Some(RunOutcome::Failed(3)));
}

#[tokio::test]
async fn second_start_is_rejected_while_running() {
    init_tracing();
    let sup = supervisor();
    let slow = stub::sleeper(1);
    let other = stub::hello();

    let mut handle = sup.start(slow.job()).expect("first start");
    let before = sup.sink().len();

    let err = sup.start(other.job()).unwrap_err();
    assert!(err.is_already_running(), "got {err:?}");
    // The rejected start must not disturb the running job's log.
    assert!(sup.sink().len() >= before);
    assert!(sup.is_running());

    let outcome = with_timeout(handle.wait()).await;
    assert_eq!(outcome, RunOutcome::Success);
    assert!(lines_from(sup.sink(), Origin::Stdout).contains(&"woke up".to_string()));
    assert!(!sup.sink().lines().iter().any(|l| l == "hello"));
}

#[tokio::test]
async fn next_start_after_completion_resets_the_log() {
    init_tracing();
    let sup = supervisor();
    let first = stub::exit_with(2);
    let second = stub::hello();

    let mut handle = sup.start(first.job()).expect("first");
    with_timeout(handle.wait()).await;
    let mut handle = sup.start(second.job()).expect("second");
    with_timeout(handle.wait()).await;

    let lines = sup.sink().lines();
    assert!(!lines.iter().any(|l| l.contains("error code")), "got {lines:?}");
    assert_eq!(terminal_lines(sup.sink()), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_admit_exactly_one() {
    init_tracing();
    let sup = supervisor();
    let script = Arc::new(stub::sleeper(1));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let sup = sup.clone();
        let job = script.job();
        tasks.push(tokio::spawn(async move { sup.start(job) }));
    }

    let mut handles = Vec::new();
    let mut rejected = 0;
    for task in tasks {
        match task.await.expect("start task") {
            Ok(handle) => handles.push(handle),
            Err(LaunchError::AlreadyRunning { .. }) => rejected += 1,
            Err(other) => panic!("unexpected launch error: {other}"),
        }
    }
    assert_eq!(handles.len(), 1);
    assert_eq!(rejected, 7);

    with_timeout(handles[0].wait()).await;
    assert_eq!(terminal_lines(sup.sink()), 1);
}

#[tokio::test]
async fn per_stream_order_is_preserved() {
    init_tracing();
    let sup = supervisor();
    let script = stub::numbered(300);

    let mut handle = sup.start(script.job()).expect("start");
    with_timeout(handle.wait()).await;

    let expected_out: Vec<String> = (0..300).map(|i| format!("out {i}")).collect();
    let expected_err: Vec<String> = (0..300).map(|i| format!("err {i}")).collect();
    assert_eq!(lines_from(sup.sink(), Origin::Stdout), expected_out);
    assert_eq!(lines_from(sup.sink(), Origin::Stderr), expected_err);
    assert_eq!(sup.sink().last().as_deref(), Some("Script completed successfully."));
}

#[tokio::test]
async fn arguments_reach_the_child_as_one_json_line() {
    init_tracing();
    let sup = supervisor();
    let script = stub::echo_stdin();

    let mut handle = sup
        .start(script.job_with_args(["5.4.0-release", "C:/UE 5"]))
        .expect("start");
    with_timeout(handle.wait()).await;

    let payload = r#"["5.4.0-release","C:/UE 5"]"#;
    assert_eq!(lines_from(sup.sink(), Origin::Stdout), vec![payload]);
    assert!(
        sup.sink()
            .lines()
            .contains(&format!("Input data sent: {payload}"))
    );
}

#[tokio::test]
async fn no_arguments_means_no_input_line() {
    init_tracing();
    let sup = supervisor();
    let script = stub::echo_stdin();

    let mut handle = sup.start(script.job()).expect("start");
    with_timeout(handle.wait()).await;

    // `read` hits EOF straight away and prints an empty line.
    assert_eq!(lines_from(sup.sink(), Origin::Stdout), vec![""]);
    assert!(!sup.sink().lines().iter().any(|l| l.starts_with("Input data sent")));
}

#[tokio::test]
async fn child_closing_stdin_does_not_abort_the_run() {
    init_tracing();
    let sup = supervisor();
    let script = stub::ignores_stdin();

    // Larger than a pipe buffer so the write cannot complete unread.
    let big = "x".repeat(256 * 1024);
    let mut handle = sup.start(script.job_with_args([big])).expect("start");
    let outcome = with_timeout(handle.wait()).await;

    assert_eq!(outcome, RunOutcome::Success);
    let lines = sup.sink().lines();
    assert!(
        lines.iter().any(|l| l.starts_with("Failed to send input data:")),
        "got {:?}",
        lines.iter().map(|l| l.chars().take(60).collect::<String>()).collect::<Vec<_>>()
    );
    assert!(lines.contains(&"ignored input".to_string()));
    assert_eq!(sup.sink().last().as_deref(), Some("Script completed successfully."));
}

#[tokio::test]
async fn missing_interpreter_is_reported_and_leaves_supervisor_idle() {
    init_tracing();
    let sup = supervisor();
    let script = stub::hello();
    let job = ScriptJob::new("hello", script.path()).with_interpreter("definitely-not-an-interpreter");

    let err = sup.start(job).unwrap_err();
    assert!(matches!(err, LaunchError::NotFound { .. }), "got {err:?}");

    let last = sup.sink().last().unwrap_or_default();
    assert!(last.starts_with("Error running script:"), "got {last}");
    assert!(!sup.is_running());
    assert!(!sup.sink().is_busy());

    // The slot is free again.
    let mut handle = sup.start(script.job()).expect("start after failure");
    assert_eq!(with_timeout(handle.wait()).await, RunOutcome::Success);
}

#[tokio::test]
async fn missing_script_file_is_reported() {
    init_tracing();
    let sup = supervisor();
    let dir = tempfile::tempdir().unwrap();
    let job = ScriptJob::new("gone", dir.path().join("gone.sh")).with_interpreter("sh");

    let err = sup.start(job).unwrap_err();
    assert!(matches!(err, LaunchError::ScriptMissing { .. }), "got {err:?}");
    assert!(
        sup.sink()
            .last()
            .is_some_and(|l| l.starts_with("Error running script:"))
    );
    assert!(!sup.is_running());
}

#[tokio::test]
async fn detached_grandchild_does_not_hang_the_job() {
    init_tracing();
    let sup = supervisor();
    let script = stub::StubScript::new("detach", "sleep 30 &\necho parent done\n");

    let mut handle = sup.start(script.job()).expect("start");
    let outcome = with_timeout(handle.wait()).await;

    assert_eq!(outcome, RunOutcome::Success);
    assert!(sup.sink().lines().contains(&"parent done".to_string()));
    assert_eq!(sup.sink().last().as_deref(), Some("Script completed successfully."));
}

#[tokio::test]
async fn launch_failure_clears_the_previous_result() {
    init_tracing();
    let sup = supervisor();
    let script = stub::hello();

    let mut handle = sup.start(script.job()).expect("start hello");
    with_timeout(handle.wait()).await;
    assert_eq!(sup.exit_code(), Some(0));

    let missing = ScriptJob::new("gone", script.dir().join("gone.sh")).with_interpreter("sh");
    let err = sup.start(missing).unwrap_err();
    assert!(matches!(err, LaunchError::ScriptMissing { .. }), "got {err:?}");

    assert_eq!(sup.exit_code(), None);
    assert_eq!(sup.last_outcome(), None);
    assert_eq!(terminal_lines(sup.sink()), 1);
}

#[tokio::test]
async fn killed_by_signal_reports_negative_signal_number() {
    init_tracing();
    let sup = supervisor();
    let script = stub::StubScript::new("self_kill", "echo going down\nkill -9 $$\necho unreachable\n");

    let mut handle = sup.start(script.job()).expect("start");
    let outcome = with_timeout(handle.wait()).await;

    assert_eq!(outcome, RunOutcome::Failed(-9));
    assert_eq!(
        sup.sink().last().as_deref(),
        Some("Script exited with error code: -9")
    );
    assert_eq!(sup.exit_code(), Some(-9));
    assert!(!sup.sink().lines().iter().any(|l| l == "unreachable"));
}

#[tokio::test]
async fn child_starts_in_the_job_working_dir() {
    init_tracing();
    let sup = supervisor();
    let script = stub::StubScript::new("where", "pwd -P\n");
    let workdir = tempfile::tempdir().unwrap();

    let mut handle = sup
        .start(script.job().with_working_dir(workdir.path()))
        .expect("start");
    with_timeout(handle.wait()).await;

    let printed = lines_from(sup.sink(), Origin::Stdout);
    let expected = workdir.path().canonicalize().unwrap();
    assert_eq!(printed, vec![expected.to_string_lossy().into_owned()]);
}

//! Interruption scenarios: a stop request mid-capture must end the read
//! loop promptly and still produce a complete, valid recording with a
//! trailing exit event.
//!
//! Kept in its own test binary because the stop flag is process-global;
//! the guard serializes the tests so one test's stop request cannot leak
//! into another's recording.

use agent_recorder::cast;
use agent_recorder::pty::PtySize;
use agent_recorder::recorder::{request_stop, RecordOptions, Session};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

static STOP_FLAG_GUARD: Mutex<()> = Mutex::new(());

fn options(output: PathBuf) -> RecordOptions {
    RecordOptions {
        output,
        title: "Interrupted".to_string(),
        size: PtySize::default(),
        idle_limit: 2.0,
        shell: "/bin/sh".to_string(),
        extra_env: Vec::new(),
    }
}

#[test]
fn test_interrupted_recording_is_still_saved_complete() {
    let _guard = STOP_FLAG_GUARD.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("interrupted.cast");
    let mut session = Session::new(options(output.clone()));

    // Request the stop once the command has had time to emit its first line
    let stopper = std::thread::spawn(|| {
        std::thread::sleep(Duration::from_millis(600));
        request_stop();
    });

    // Without interruption this would run for 30 seconds
    let code = session
        .record("echo started; sleep 30; echo never")
        .expect("interrupted record should still complete");
    stopper.join().unwrap();

    // Killed child reports a nonzero status
    assert_ne!(code, 0);
    session.save().expect("interrupted session must be saved");

    let contents = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines.len() >= 3, "header + output + exit, got {:?}", lines);

    // Output captured before the interrupt is preserved
    assert!(contents.contains("started"));
    assert!(!contents.contains("never"));

    // Still a valid file with a single trailing exit event
    let meta = cast::inspect_file(&output).expect("file should be valid");
    assert_eq!(meta.version, 3);
    let last: serde_json::Value = serde_json::from_str(lines.last().unwrap()).unwrap();
    assert_eq!(last[1], "x");
}

#[test]
fn test_stop_interrupts_continuous_output() {
    let _guard = STOP_FLAG_GUARD.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("chatty.cast");
    let mut session = Session::new(options(output.clone()));

    let stopper = std::thread::spawn(|| {
        std::thread::sleep(Duration::from_millis(500));
        request_stop();
    });

    // The child emits faster than the poll interval, so the output channel
    // is never empty; the stop must be observed between reads regardless
    let started = Instant::now();
    let code = session
        .record("while true; do echo x; sleep 0.01; done")
        .expect("interrupted record should still complete");
    let elapsed = started.elapsed();
    stopper.join().unwrap();

    assert!(
        elapsed < Duration::from_secs(5),
        "record() should return promptly after the stop request, took {:?}",
        elapsed
    );
    assert_ne!(code, 0);

    // The capture up to the stop is saved and well-formed
    session.save().expect("interrupted session must be saved");
    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.contains("x\r\n"));
    let meta = cast::inspect_file(&output).expect("file should be valid");
    assert_eq!(meta.version, 3);
    let last: serde_json::Value =
        serde_json::from_str(contents.lines().last().unwrap()).unwrap();
    assert_eq!(last[1], "x");
}

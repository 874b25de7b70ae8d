//! Session lifecycle: spawn the command, capture its output, reap, save.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::cast::{
    self, CastEnv, CastError, CastStats, EventKind, Header, TermInfo, FORMAT_VERSION,
};
use crate::pty::{PtyError, PtyHost, PtySize};
use crate::recorder::timing::{cap_intervals, RawEvent};

/// How long each poll of the output channel may block
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Maximum bytes consumed per read from the PTY
const READ_CHUNK: usize = 4096;

/// Global flag for handling Ctrl+C across the application
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Request that the active recording stop at its next poll.
pub fn request_stop() {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Check if a stop has been requested.
pub fn interrupted() -> bool {
    STOP_REQUESTED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup. The recording loop polls
/// the flag between reads, so an interrupted session is still reaped and
/// saved rather than discarded.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        request_stop();
        eprintln!("\nReceived Ctrl+C, stopping recording...");
    })
}

/// Configuration for one recording session
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub output: PathBuf,
    pub title: String,
    pub size: PtySize,
    /// Maximum interval recorded between consecutive events, in seconds
    pub idle_limit: f64,
    /// Shell used to run the command (`<shell> -c <command>`)
    pub shell: String,
    /// Extra environment for the child (e.g. proxy configuration)
    pub extra_env: Vec<(String, String)>,
}

/// A single recording: owns the child process for its lifetime and
/// accumulates the captured event timeline.
pub struct Session {
    options: RecordOptions,
    raw: Vec<RawEvent>,
    /// Monotonic reference point for event timestamps
    start: Instant,
    /// Wall-clock session start, recorded in the header
    timestamp: u64,
}

impl Session {
    pub fn new(options: RecordOptions) -> Self {
        Self {
            options,
            raw: Vec::new(),
            start: Instant::now(),
            timestamp: unix_now(),
        }
    }

    /// Run the command under a PTY and capture its output until it exits or
    /// a stop is requested.
    ///
    /// The controller-side reader moves to a background thread doing blocking
    /// reads; this loop polls the channel with a bounded timeout so it stays
    /// responsive to interruption. Events are appended in read-completion
    /// order, and a single exit event is appended last after the child is
    /// reaped. Returns the child's exit code.
    ///
    /// Setup failures (`DeviceUnavailable`, geometry, spawn) abort before any
    /// event is captured; read errors after startup end the capture as if the
    /// child had closed its terminal.
    pub fn record(&mut self, command: &str) -> Result<u32, PtyError> {
        // Each recording starts un-interrupted
        STOP_REQUESTED.store(false, Ordering::SeqCst);

        let host = PtyHost::spawn(
            &self.options.shell,
            command,
            self.options.size,
            &self.options.extra_env,
        )?;
        self.start = Instant::now();
        self.timestamp = unix_now();

        let (mut reader, mut host) = host.split();
        let (tx, rx) = mpsc::channel::<Vec<u8>>();

        // Detached: the thread ends on EOF or read error, and at the latest
        // when the process exits
        let _reader_thread = thread::spawn(move || {
            let mut buf = [0u8; READ_CHUNK];
            loop {
                match reader.read(&mut buf) {
                    // Zero-length read: the child closed its end
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // Treat as closure; everything captured so far is kept
                        log::warn!("PTY read failed, ending capture: {}", e);
                        break;
                    }
                }
            }
        });

        let mut was_interrupted = false;
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => self.push_output(&chunk),
                Err(RecvTimeoutError::Timeout) => {}
                // Reader thread finished: child output is fully consumed
                Err(RecvTimeoutError::Disconnected) => break,
            }
            // Checked on every iteration: a child emitting output faster
            // than the poll interval keeps the channel non-empty, and the
            // stop request must still be observed between reads
            if interrupted() {
                was_interrupted = true;
                break;
            }
        }

        if was_interrupted {
            if let Ok(None) = host.try_wait() {
                let _ = host.kill();
            }
        }

        let status = host.wait()?;

        // Pick up output that raced the shutdown
        while let Ok(chunk) = rx.recv_timeout(POLL_INTERVAL) {
            self.push_output(&chunk);
        }

        let exit_code = status.exit_code();
        self.push_raw(EventKind::Exit, exit_code.to_string());
        Ok(exit_code)
    }

    /// Flush the captured timeline to the output file.
    ///
    /// Runs the timing model over the raw events and writes header plus
    /// events in one atomic flush. On failure the captured events remain in
    /// memory, so `save` can be retried without re-running the command.
    pub fn save(&self) -> Result<CastStats, CastError> {
        let header = Header {
            version: FORMAT_VERSION,
            term: TermInfo {
                cols: self.options.size.cols,
                rows: self.options.size.rows,
                term_type: "xterm-256color".to_string(),
            },
            timestamp: self.timestamp,
            title: self.options.title.clone(),
            idle_time_limit: self.options.idle_limit,
            env: CastEnv {
                shell: self.options.shell.clone(),
            },
        };
        let events = cap_intervals(&self.raw, self.options.idle_limit);
        cast::write_file(&self.options.output, &header, &events)
    }

    pub fn output_path(&self) -> &Path {
        &self.options.output
    }

    /// Raw events captured so far (session-relative timestamps)
    pub fn events(&self) -> &[RawEvent] {
        &self.raw
    }

    fn push_output(&mut self, chunk: &[u8]) {
        // Best-effort decoding: a UTF-8 sequence split across two reads
        // degrades to replacement characters instead of failing the capture
        let data = String::from_utf8_lossy(chunk).into_owned();
        self.push_raw(EventKind::Output, data);
    }

    fn push_raw(&mut self, kind: EventKind, data: String) {
        self.raw.push(RawEvent {
            time: self.start.elapsed().as_secs_f64(),
            kind,
            data,
        });
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(output: PathBuf) -> RecordOptions {
        RecordOptions {
            output,
            title: "Test Session".to_string(),
            size: PtySize::default(),
            idle_limit: 2.0,
            shell: "/bin/sh".to_string(),
            extra_env: Vec::new(),
        }
    }

    #[test]
    fn test_record_appends_single_trailing_exit_event() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(options(dir.path().join("t.cast")));
        let code = session.record("echo hi").expect("record should succeed");
        assert_eq!(code, 0);

        let exits: Vec<_> = session
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::Exit)
            .collect();
        assert_eq!(exits.len(), 1);
        assert_eq!(session.events().last().unwrap().kind, EventKind::Exit);
    }

    #[test]
    fn test_record_captures_output_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(options(dir.path().join("t.cast")));
        session.record("echo hello").expect("record should succeed");

        let output: String = session
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::Output)
            .map(|e| e.data.as_str())
            .collect();
        assert!(output.contains("hello"), "captured: {:?}", output);
    }

    #[test]
    fn test_record_propagates_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(options(dir.path().join("t.cast")));
        let code = session.record("exit 2").expect("record should succeed");
        assert_eq!(code, 2);
        assert_eq!(session.events().last().unwrap().data, "2");
    }

    #[test]
    fn test_spawn_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("t.cast");
        let mut opts = options(output.clone());
        opts.shell = "/nonexistent/shell".to_string();
        let mut session = Session::new(opts);
        let result = session.record("echo hi");
        assert!(result.is_err());
        assert!(!output.exists(), "setup failure must not create a file");
    }

    #[test]
    fn test_save_writes_header_and_events() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("t.cast");
        let mut session = Session::new(options(output.clone()));
        session.record("echo hi").expect("record should succeed");
        let stats = session.save().expect("save should succeed");

        assert!(output.exists());
        assert_eq!(stats.events, session.events().len());
        let contents = std::fs::read_to_string(&output).unwrap();
        let first = contents.lines().next().unwrap();
        let header: Header = serde_json::from_str(first).unwrap();
        assert_eq!(header.version, FORMAT_VERSION);
        assert_eq!(header.title, "Test Session");
    }
}

//! Capture-proxy wrapper - manages a mitmdump process for wrapped agent runs.
//!
//! The proxy itself is an external collaborator: this module only starts it,
//! hands out the environment variables that point a child process at it, and
//! shuts it down again. What the agent does with the proxy (or whether it
//! honors it at all) is the agent's business.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

pub const DEFAULT_PROXY_PORT: u16 = 8080;

/// Time given to mitmdump to bind its port before we declare it started
const STARTUP_GRACE: Duration = Duration::from_millis(1000);
/// How long to wait after SIGTERM before escalating to SIGKILL
const STOP_TERM_TIMEOUT: Duration = Duration::from_secs(5);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the capture proxy
#[derive(Debug, Clone)]
pub struct ProxyOptions {
    pub port: u16,
    /// Flow dump destination (mitmdump `-w`)
    pub log_file: PathBuf,
    pub verbose: bool,
}

/// Errors from proxy lifecycle management
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(
        "mitmproxy is not installed.\n\nInstall it with:\n\n    brew install mitmproxy\n\nor:\n\n    pip install mitmproxy"
    )]
    NotInstalled,
    #[error("Failed to start mitmproxy: {0}")]
    StartFailed(std::io::Error),
    #[error("Proxy process died during startup (is port {0} already in use?)")]
    DiedOnStartup(u16),
    #[error("Failed to stop proxy: {0}")]
    StopFailed(std::io::Error),
}

/// A running mitmdump process
pub struct ProxyWrapper {
    child: Child,
    options: ProxyOptions,
}

impl ProxyWrapper {
    /// Check if mitmdump is available on PATH
    pub fn check_installed() -> bool {
        Command::new("mitmdump")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Start mitmdump, dumping captured flows to the configured log file.
    pub fn start(options: ProxyOptions) -> Result<Self, ProxyError> {
        if !Self::check_installed() {
            return Err(ProxyError::NotInstalled);
        }

        let mut cmd = Command::new("mitmdump");
        cmd.arg("--listen-port")
            .arg(options.port.to_string())
            .arg("--quiet")
            .arg("-w")
            .arg(&options.log_file);
        if options.verbose {
            log::debug!("Starting mitmdump on port {}", options.port);
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = cmd.spawn().map_err(ProxyError::StartFailed)?;

        // Give the proxy a moment to start up, then make sure it survived
        std::thread::sleep(STARTUP_GRACE);
        if let Ok(Some(_)) = child.try_wait() {
            return Err(ProxyError::DiedOnStartup(options.port));
        }

        Ok(Self { child, options })
    }

    /// Environment variables that route a child process through the proxy
    pub fn proxy_env(&self) -> Vec<(String, String)> {
        proxy_env_for_port(self.options.port)
    }

    pub fn log_file(&self) -> &Path {
        &self.options.log_file
    }

    /// Stop the proxy: SIGTERM first so it can flush its flow dump, SIGKILL
    /// after a bounded wait.
    pub fn stop(mut self) -> Result<(), ProxyError> {
        terminate(&mut self.child);

        let deadline = Instant::now() + STOP_TERM_TIMEOUT;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return Ok(()),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        self.child.kill().map_err(ProxyError::StopFailed)?;
                        let _ = self.child.wait();
                        return Ok(());
                    }
                    std::thread::sleep(STOP_POLL_INTERVAL);
                }
                Err(e) => return Err(ProxyError::StopFailed(e)),
            }
        }
    }
}

impl Drop for ProxyWrapper {
    fn drop(&mut self) {
        // Ensure the proxy is terminated if stop() was never called
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Build the proxy environment for a given port.
///
/// Both upper- and lowercase variants are set; different agents read
/// different ones. `NODE_TLS_REJECT_UNAUTHORIZED` is needed for node-based
/// agents to accept the proxy's interception certificate.
pub fn proxy_env_for_port(port: u16) -> Vec<(String, String)> {
    let url = format!("http://localhost:{}", port);
    vec![
        ("HTTP_PROXY".to_string(), url.clone()),
        ("HTTPS_PROXY".to_string(), url.clone()),
        ("http_proxy".to_string(), url.clone()),
        ("https_proxy".to_string(), url),
        ("NODE_TLS_REJECT_UNAUTHORIZED".to_string(), "0".to_string()),
    ]
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
}

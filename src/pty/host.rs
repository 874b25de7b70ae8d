//! PTY host implementation - spawns the recorded command and reads its output

use portable_pty::{Child, CommandBuilder, ExitStatus, MasterPty, native_pty_system};
use std::io::Read;

use super::error::PtyError;
use super::size::PtySize;

/// PTY host that manages a recorded child process.
///
/// This is the narrow handle over the platform's PTY and process primitives:
/// spawn, read, reap, terminate. Everything else in the recorder works
/// against this surface, so unsupported platforms fail fast at `spawn`.
pub struct PtyHost {
    /// The PTY controller handle
    master: Box<dyn MasterPty + Send>,
    /// Child process handle
    child: Box<dyn Child + Send + Sync>,
    /// Reader for child output
    reader: Box<dyn Read + Send>,
}

impl PtyHost {
    /// Spawn `<shell> -c <command>` under a fresh PTY.
    ///
    /// The PTY is opened at `size`; the child gets `TERM=xterm-256color`
    /// plus any `extra_env` entries (used to point agents at the capture
    /// proxy). The follower end is owned by the child, the controller end
    /// stays readable in the parent.
    ///
    /// # Errors
    /// * [`PtyError::DeviceUnavailable`] - the platform could not allocate a PTY
    /// * [`PtyError::SpawnFailed`] - the command could not be started
    pub fn spawn(
        shell: &str,
        command: &str,
        size: PtySize,
        extra_env: &[(String, String)],
    ) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(size.into())
            .map_err(|e| PtyError::DeviceUnavailable(e.into()))?;

        // The same geometry is recorded verbatim in the output header; a
        // device that cannot take it is a setup failure, not a warning
        pair.master
            .resize(size.into())
            .map_err(|e| PtyError::GeometryFailed(e.into()))?;

        let mut cmd = CommandBuilder::new(shell);
        cmd.arg("-c");
        cmd.arg(command);
        cmd.env("TERM", "xterm-256color");
        for (key, value) in extra_env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::SpawnFailed(e.into()))?;

        // The child has duplicated the follower end; drop ours so a closed
        // child is observed as EOF on the controller.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::ReaderFailed(e.into()))?;

        Ok(Self {
            master: pair.master,
            child,
            reader,
        })
    }

    /// Read available bytes from the child's output
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, PtyError> {
        Ok(self.reader.read(buf)?)
    }

    /// Check if the child process has exited
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, PtyError> {
        Ok(self.child.try_wait()?)
    }

    /// Block until the child exits and reap it
    pub fn wait(&mut self) -> Result<ExitStatus, PtyError> {
        Ok(self.child.wait()?)
    }

    /// Kill the child process
    pub fn kill(&mut self) -> Result<(), PtyError> {
        Ok(self.child.kill()?)
    }

    /// Split into a reader and the rest, for multi-threaded use.
    /// The reader can be moved to a background thread while the main loop
    /// handles polling and process management.
    pub fn split(self) -> (Box<dyn Read + Send>, PtyHostSplit) {
        (
            self.reader,
            PtyHostSplit {
                master: self.master,
                child: self.child,
            },
        )
    }
}

/// A version of PtyHost with the reader separated out for multi-threaded use
pub struct PtyHostSplit {
    /// The PTY controller handle (kept alive until the recording ends)
    #[allow(dead_code)]
    master: Box<dyn MasterPty + Send>,
    /// Child process handle
    child: Box<dyn Child + Send + Sync>,
}

impl PtyHostSplit {
    /// Check if the child process has exited
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, PtyError> {
        Ok(self.child.try_wait()?)
    }

    /// Block until the child exits and reap it
    pub fn wait(&mut self) -> Result<ExitStatus, PtyError> {
        Ok(self.child.wait()?)
    }

    /// Kill the child process
    pub fn kill(&mut self) -> Result<(), PtyError> {
        Ok(self.child.kill()?)
    }
}

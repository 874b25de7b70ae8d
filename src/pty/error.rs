//! PTY error types

/// Error type for PTY operations
#[derive(Debug)]
pub enum PtyError {
    /// The platform could not allocate a PTY pair
    DeviceUnavailable(Box<dyn std::error::Error + Send + Sync>),
    /// Failed to apply terminal geometry to the PTY
    GeometryFailed(Box<dyn std::error::Error + Send + Sync>),
    /// Failed to spawn the child command
    SpawnFailed(Box<dyn std::error::Error + Send + Sync>),
    /// Failed to get reader from PTY
    ReaderFailed(Box<dyn std::error::Error + Send + Sync>),
    /// PTY I/O error
    IoError(std::io::Error),
}

impl std::fmt::Display for PtyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PtyError::DeviceUnavailable(e) => {
                write!(f, "Failed to allocate PTY (allocation phase): {}", e)
            }
            PtyError::GeometryFailed(e) => {
                write!(f, "Failed to apply terminal geometry (allocation phase): {}", e)
            }
            PtyError::SpawnFailed(e) => write!(f, "Failed to spawn command (spawn phase): {}", e),
            PtyError::ReaderFailed(e) => write!(f, "Failed to get PTY reader: {}", e),
            PtyError::IoError(e) => write!(f, "PTY I/O error: {}", e),
        }
    }
}

impl std::error::Error for PtyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PtyError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PtyError {
    fn from(err: std::io::Error) -> Self {
        PtyError::IoError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_unavailable_names_allocation_phase() {
        let err = PtyError::DeviceUnavailable("no pty support".into());
        let msg = format!("{}", err);
        assert!(msg.contains("allocation phase"));
        assert!(msg.contains("no pty support"));
    }

    #[test]
    fn test_spawn_failed_names_spawn_phase() {
        let err = PtyError::SpawnFailed("exec failed".into());
        let msg = format!("{}", err);
        assert!(msg.contains("spawn phase"));
    }
}

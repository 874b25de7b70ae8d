//! PTY size configuration

use portable_pty::PtySize as PortablePtySize;

/// Terminal size configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    pub rows: u16,
    pub cols: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl Default for PtySize {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl PtySize {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }

    /// Probe the invoking terminal's size.
    ///
    /// Queried once at session start so the rest of the recorder works from
    /// an explicit value instead of re-reading ambient terminal state.
    /// Returns `None` when stdout is not a terminal or the platform has no
    /// window-size ioctl.
    #[cfg(unix)]
    pub fn probe() -> Option<Self> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
        if rc == 0 && ws.ws_row > 0 && ws.ws_col > 0 {
            Some(Self::new(ws.ws_row, ws.ws_col))
        } else {
            None
        }
    }

    #[cfg(not(unix))]
    pub fn probe() -> Option<Self> {
        None
    }
}

impl From<PtySize> for PortablePtySize {
    fn from(size: PtySize) -> Self {
        PortablePtySize {
            rows: size.rows,
            cols: size.cols,
            pixel_width: size.pixel_width,
            pixel_height: size.pixel_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pty_size_default() {
        let size = PtySize::default();
        assert_eq!(size.rows, 24);
        assert_eq!(size.cols, 80);
    }

    #[test]
    fn test_pty_size_new() {
        let size = PtySize::new(50, 120);
        assert_eq!(size.rows, 50);
        assert_eq!(size.cols, 120);
        assert_eq!(size.pixel_width, 0);
        assert_eq!(size.pixel_height, 0);
    }

    #[test]
    fn test_probe_does_not_panic() {
        // May be None in CI (no controlling terminal), Some locally
        let _ = PtySize::probe();
    }
}

//! ViscaCamera struct: a transport plus the protocol's fixed wait intervals.

use std::time::Duration;

use tracing::warn;

use super::link::Transport;

/// Fixed waits used by the position and motion services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Settle after parameter-set commands (moves, preset save, preset speed).
    pub command_settle: Duration,
    /// Settle after recall/home, long enough for motion to begin.
    pub motion_settle: Duration,
    /// Pause between pan/tilt inquiry attempts.
    pub retry_backoff: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            command_settle: Duration::from_millis(200),
            motion_settle: Duration::from_millis(500),
            retry_backoff: Duration::from_millis(200),
        }
    }
}

impl Timing {
    /// No waiting at all; for simulated cameras.
    pub fn immediate() -> Self {
        Self {
            command_settle: Duration::ZERO,
            motion_settle: Duration::ZERO,
            retry_backoff: Duration::ZERO,
        }
    }
}

/// A camera driven over a single transport.
///
/// Position inquiries live in `position.rs`, motion commands in `motion.rs`.
pub struct ViscaCamera<T: Transport> {
    pub(crate) link: T,
    pub(crate) timing: Timing,
}

impl<T: Transport> ViscaCamera<T> {
    pub fn new(link: T) -> Self {
        Self::with_timing(link, Timing::default())
    }

    pub fn with_timing(link: T, timing: Timing) -> Self {
        Self { link, timing }
    }

    pub fn link(&self) -> &T {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut T {
        &mut self.link
    }

    pub fn into_inner(self) -> T {
        self.link
    }

    /// Block for `wait`, then discard whatever the camera sent meanwhile.
    pub fn wait_and_drain(&mut self, wait: Duration) {
        pause(wait);
        self.drain_quietly();
    }

    /// Drain, logging instead of failing; the next exchange reports a dead link.
    pub(crate) fn drain_quietly(&mut self) {
        if let Err(e) = self.link.drain() {
            warn!("Drain failed: {e}");
        }
    }
}

/// Blocking sleep on the calling thread.
pub(crate) fn pause(wait: Duration) {
    if !wait.is_zero() {
        std::thread::sleep(wait);
    }
}

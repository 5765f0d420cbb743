//! Position inquiries with bounded retry.

use tracing::{debug, warn};

use super::client::{ViscaCamera, pause};
use super::link::Transport;
use super::protocol::{Command, Inquiry, decode_pan_tilt, decode_single};
use super::types::{FOCUS_REPLY_LEN, PAN_TILT_REPLY_LEN, ZOOM_REPLY_LEN};
use crate::error::Result;
use crate::models::Position;

/// Total pan/tilt inquiry attempts before giving up.
pub const PAN_TILT_ATTEMPTS: usize = 3;

impl<T: Transport> ViscaCamera<T> {
    /// Query the current position.
    ///
    /// Pan/tilt is retried up to [`PAN_TILT_ATTEMPTS`] times; zoom and focus
    /// are asked once. Fields whose inquiry failed are left unset. Never fails.
    pub fn query_position(&mut self, capture_focus: bool) -> Position {
        let mut position = Position::default();

        if let Some((pan, tilt)) = self.query_pan_tilt() {
            position.pan = Some(pan);
            position.tilt = Some(tilt);
        }

        match self.query_single(Inquiry::Zoom, ZOOM_REPLY_LEN) {
            Ok(zoom) => position.zoom = Some(zoom),
            Err(e) => warn!("Zoom inquiry failed: {e}"),
        }

        if capture_focus {
            match self.query_single(Inquiry::Focus, FOCUS_REPLY_LEN) {
                Ok(focus) => position.focus = Some(focus),
                Err(e) => warn!("Focus inquiry failed: {e}"),
            }
        }

        debug!("Position: {position}");
        position
    }

    /// Pan/tilt with a fixed backoff between attempts.
    fn query_pan_tilt(&mut self) -> Option<(u16, u16)> {
        for attempt in 1..=PAN_TILT_ATTEMPTS {
            let result = self
                .inquire(Inquiry::PanTilt, PAN_TILT_REPLY_LEN)
                .and_then(|reply| decode_pan_tilt(&reply).map_err(Into::into));

            match result {
                Ok(pan_tilt) => return Some(pan_tilt),
                Err(e) if attempt < PAN_TILT_ATTEMPTS => {
                    warn!("Pan/Tilt inquiry attempt {attempt} failed ({e}), retrying...");
                    pause(self.timing.retry_backoff);
                }
                Err(e) => {
                    warn!("Pan/Tilt inquiry failed after {PAN_TILT_ATTEMPTS} attempts: {e}");
                }
            }
        }
        None
    }

    fn query_single(&mut self, inquiry: Inquiry, min_len: usize) -> Result<u16> {
        let reply = self.inquire(inquiry, min_len)?;
        Ok(decode_single(&reply, min_len)?)
    }

    /// Drain, then send one inquiry and return the raw reply.
    fn inquire(&mut self, inquiry: Inquiry, expected_len: usize) -> Result<Vec<u8>> {
        self.link.drain()?;
        Ok(self.link.exchange(&Command::Inquiry(inquiry), expected_len)?)
    }
}

//! Motion and preset commands.
//!
//! Each command is sent, followed by a fixed settle delay and a drain. The
//! delay lets motion begin; it does not mean the move has finished.

use std::time::Duration;

use tracing::{info, warn};

use super::client::{ViscaCamera, pause};
use super::link::Transport;
use super::protocol::{Command, ReplyKind, classify};
use super::types::{MAX_PRESET_SPEED, RECV_BUFFER_SIZE};
use crate::error::{AppError, Result};
use crate::models::preset::validate_preset;

impl<T: Transport> ViscaCamera<T> {
    /// Move zoom to an absolute encoder value.
    pub fn move_zoom_absolute(&mut self, zoom: u16) -> Result<()> {
        info!("Setting zoom to {zoom:04X}...");
        self.send_and_settle(Command::ZoomAbsolute(zoom), self.timing.command_settle)
    }

    /// Move pan/tilt to absolute encoder values.
    ///
    /// Speeds go to the camera as given (pan 0x01-0x18, tilt 0x01-0x14).
    pub fn move_pan_tilt_absolute(&mut self, pan: u16, tilt: u16, pan_speed: u8, tilt_speed: u8) -> Result<()> {
        info!("Setting pan/tilt to {pan:04X}/{tilt:04X} at speed {pan_speed:02X}/{tilt_speed:02X}...");
        let command = Command::PanTiltAbsolute {
            pan,
            tilt,
            pan_speed,
            tilt_speed,
        };
        self.send_and_settle(command, self.timing.command_settle)
    }

    /// Store the current position in `preset`.
    ///
    /// Numbers outside 0-254 are rejected without sending anything.
    pub fn save_preset(&mut self, preset: i32) -> Result<()> {
        let preset = validate_preset(preset)?;
        info!("Saving preset {preset}...");
        self.send_and_settle(Command::PresetSave(preset), self.timing.command_settle)
    }

    /// Start moving to a stored preset.
    pub fn recall_preset(&mut self, preset: i32) -> Result<()> {
        let preset = validate_preset(preset)?;
        info!("Recalling preset {preset}...");
        self.send_and_settle(Command::PresetRecall(preset), self.timing.motion_settle)
    }

    /// Start moving to the HOME position.
    pub fn go_home(&mut self) -> Result<()> {
        info!("Moving to HOME position...");
        self.send_and_settle(Command::Home, self.timing.motion_settle)
    }

    /// Set preset recall speed to the device maximum.
    pub fn set_max_preset_speed(&mut self) -> Result<()> {
        info!("Setting preset speed to maximum...");
        self.send_and_settle(Command::MaxPresetSpeed(MAX_PRESET_SPEED), self.timing.command_settle)
    }

    /// Send, wait `settle`, drain; then report what the first reply said.
    ///
    /// The settle and drain happen even when the exchange failed.
    fn send_and_settle(&mut self, command: Command, settle: Duration) -> Result<()> {
        let exchanged = self.link.exchange(&command, RECV_BUFFER_SIZE);
        pause(settle);
        self.drain_quietly();

        let reply = exchanged?;
        match classify(&reply) {
            kind @ ReplyKind::Error { code, .. } => {
                warn!("Camera rejected {command:?}: {kind}");
                Err(AppError::Device(format!("{kind} ({code:#04X})")))
            }
            ReplyKind::Malformed => {
                warn!("Unrecognised reply to {command:?}: {reply:02X?}");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use crate::testing::{Event, ScriptedCamera};
    use crate::visca::Timing;
    use crate::visca::types::TERMINATOR;

    fn camera() -> ViscaCamera<ScriptedCamera> {
        ViscaCamera::with_timing(ScriptedCamera::new(Position::new(0, 0, 0)), Timing::immediate())
    }

    #[test]
    fn test_save_preset_valid_numbers() {
        for n in [0, 1, 89, 254] {
            let mut cam = camera();
            cam.save_preset(n).unwrap();

            let sent = cam.link().sent();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0][5] as i32, n);
            assert_eq!(*sent[0].last().unwrap(), TERMINATOR);
        }
    }

    #[test]
    fn test_save_preset_out_of_range_sends_nothing() {
        for n in [255, -1] {
            let mut cam = camera();
            let err = cam.save_preset(n).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert!(cam.link().events.is_empty());
        }
    }

    #[test]
    fn test_command_followed_by_drain() {
        let mut cam = camera();
        cam.recall_preset(3).unwrap();
        assert_eq!(
            cam.link().events,
            vec![Event::Send(Command::PresetRecall(3).encode()), Event::Drain]
        );
    }

    #[test]
    fn test_absolute_moves_update_camera() {
        let mut cam = camera();
        cam.move_zoom_absolute(0x4000).unwrap();
        cam.move_pan_tilt_absolute(0x8A3C, 0x05F4, 0x18, 0x14).unwrap();
        assert_eq!(cam.link().position, Position::new(0x8A3C, 0x05F4, 0x4000));
    }

    #[test]
    fn test_device_error_reply_is_reported() {
        let mut sim = ScriptedCamera::new(Position::new(0, 0, 0));
        sim.reject_saves = true;
        let mut cam = ViscaCamera::with_timing(sim, Timing::immediate());

        let err = cam.save_preset(10).unwrap_err();
        assert!(matches!(err, AppError::Device(ref msg) if msg.contains("Command not executable")));
        // still drained after the rejection
        assert_eq!(cam.link().events.last(), Some(&Event::Drain));
    }

    #[test]
    fn test_home_and_speed_commands() {
        let mut cam = camera();
        cam.set_max_preset_speed().unwrap();
        cam.go_home().unwrap();
        assert_eq!(
            cam.link().sent(),
            vec![vec![0x81, 0x01, 0x06, 0x01, 0x18, 0xFF], vec![0x81, 0x01, 0x06, 0x04, 0xFF]]
        );
    }
}

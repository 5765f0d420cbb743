//! Preset restore: replay a saved table onto a camera.
//!
//! Each entry is driven to with absolute moves, given the settle interval,
//! then stored with a preset save. Position is never read back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::RestoreConfig;
use crate::models::PresetTable;
use crate::models::preset::{preset_key, validate_preset};
use crate::visca::types::{PAN_SPEED_MAX, TILT_SPEED_MAX};
use crate::visca::{Transport, ViscaCamera};

/// Restore run parameters.
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Wait for the camera to reach each position before saving it.
    pub settle: Duration,
    pub pan_speed: u8,
    pub tilt_speed: u8,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(10),
            pan_speed: PAN_SPEED_MAX,
            tilt_speed: TILT_SPEED_MAX,
        }
    }
}

impl From<&RestoreConfig> for RestoreOptions {
    fn from(config: &RestoreConfig) -> Self {
        Self {
            settle: Duration::from_secs(config.settle_secs),
            ..Default::default()
        }
    }
}

/// Result of a restore run.
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub restored: usize,
    /// Presets not restored: invalid number, incomplete data, or a failed save.
    pub skipped: Vec<i32>,
    pub cancelled: bool,
    pub duration_secs: f64,
}

impl RestoreReport {
    /// Get summary message.
    pub fn summary(&self) -> String {
        let base = format!(
            "Restored: {}, Skipped: {} (took {:.1}s)",
            self.restored,
            self.skipped.len(),
            self.duration_secs
        );
        if self.cancelled { format!("{base} - cancelled") } else { base }
    }
}

/// Write every entry of `table` back to the camera, in table order.
pub fn restore_presets<T: Transport>(
    camera: &mut ViscaCamera<T>,
    table: &PresetTable,
    options: &RestoreOptions,
    cancel: &AtomicBool,
) -> RestoreReport {
    let start = Instant::now();
    let mut report = RestoreReport::default();
    let pan_speed = options.pan_speed.clamp(1, PAN_SPEED_MAX);
    let tilt_speed = options.tilt_speed.clamp(1, TILT_SPEED_MAX);

    for (preset, position) in table.iter() {
        if cancel.load(Ordering::Relaxed) {
            info!("Restore cancelled before {}", preset_key(preset));
            report.cancelled = true;
            break;
        }

        info!("Restoring {} ({position})", preset_key(preset));

        if let Err(e) = validate_preset(preset) {
            warn!("{e}. Skipping.");
            report.skipped.push(preset);
            continue;
        }

        let Some((pan, tilt, zoom)) = position.restorable() else {
            warn!(
                "Incomplete position data for {} (missing {}). Skipping.",
                preset_key(preset),
                position.missing_required().join(", ")
            );
            report.skipped.push(preset);
            continue;
        };

        if let Err(e) = camera.move_zoom_absolute(zoom) {
            warn!("Zoom move for preset {preset} failed: {e}");
        }
        if let Err(e) = camera.move_pan_tilt_absolute(pan, tilt, pan_speed, tilt_speed) {
            warn!("Pan/tilt move for preset {preset} failed: {e}");
        }

        info!("Waiting {:?} for camera to reach position...", options.settle);
        camera.wait_and_drain(options.settle);

        match camera.save_preset(preset) {
            Ok(()) => {
                info!("Restored preset {preset}");
                report.restored += 1;
            }
            Err(e) => {
                warn!("Failed to save preset {preset}: {e}");
                report.skipped.push(preset);
            }
        }
    }

    report.duration_secs = start.elapsed().as_secs_f64();
    info!("Restore finished. {}", report.summary());
    report
}

//! Preset capture: scan a preset range and record where each preset points.
//!
//! The camera never says "this preset is empty". Instead each preset is
//! recalled from HOME and probed after a short delay: if the camera is still
//! exactly at HOME, the slot is treated as unoccupied. A preset whose stored
//! position happens to equal HOME is therefore reported as empty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::CaptureConfig;
use crate::models::preset::is_reserved;
use crate::models::{Position, PresetTable};
use crate::visca::{Transport, ViscaCamera};

/// Capture run parameters.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// First preset to scan (inclusive).
    pub start: u8,
    /// Last preset to scan (inclusive).
    pub end: u8,
    /// Wait for a full mechanical move to finish.
    pub settle: Duration,
    /// Wait before checking whether a recalled preset moved the camera.
    pub probe_delay: Duration,
    pub capture_focus: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            start: 1,
            end: 89,
            settle: Duration::from_secs(10),
            probe_delay: Duration::from_secs(1),
            capture_focus: false,
        }
    }
}

impl From<&CaptureConfig> for CaptureOptions {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            start: config.start_preset,
            end: config.end_preset,
            settle: Duration::from_secs(config.settle_secs),
            probe_delay: Duration::from_secs(config.probe_delay_secs),
            capture_focus: config.capture_focus,
        }
    }
}

impl CaptureOptions {
    /// Presets to scan, reserved 90-99 left out.
    pub fn presets(&self) -> impl Iterator<Item = i32> {
        (i32::from(self.start)..=i32::from(self.end)).filter(|n| !is_reserved(*n))
    }
}

/// Result of a capture run.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub home: Position,
    pub table: PresetTable,
    /// Presets that looked unoccupied.
    pub skipped: Vec<i32>,
    /// Presets whose probe came back without pan/tilt, so existence is unknown.
    pub unreadable: Vec<i32>,
    /// Stopped early on request.
    pub cancelled: bool,
    /// Why the scan was aborted, if it was.
    pub error: Option<String>,
    pub duration_secs: f64,
}

impl CaptureReport {
    pub fn occupied(&self) -> usize {
        self.table.len()
    }

    /// Get summary message.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Captured: {}, Skipped: {}, Unreadable: {} (took {:.1}s)",
            self.occupied(),
            self.skipped.len(),
            self.unreadable.len(),
            self.duration_secs
        );
        if let Some(error) = &self.error {
            summary.push_str(&format!(" - aborted: {error}"));
        } else if self.cancelled {
            summary.push_str(" - cancelled");
        }
        summary
    }
}

/// Scan `options.start..=options.end` and build a preset table.
///
/// Individual command or inquiry failures are logged and the scan moves on;
/// `cancel` is checked before each preset. A HOME reading without pan/tilt
/// aborts the scan with `error` set, since nothing can be compared against it.
pub fn capture_presets<T: Transport>(
    camera: &mut ViscaCamera<T>,
    options: &CaptureOptions,
    cancel: &AtomicBool,
) -> CaptureReport {
    let start = Instant::now();

    if let Err(e) = camera.set_max_preset_speed() {
        warn!("Failed to set preset speed: {e}");
    }
    go_home(camera, options.settle);

    let home = camera.query_position(options.capture_focus);
    let mut report = CaptureReport {
        home,
        table: PresetTable::new(),
        skipped: Vec::new(),
        unreadable: Vec::new(),
        cancelled: false,
        error: None,
        duration_secs: 0.0,
    };

    if !home.has_pan_tilt() {
        let message = format!("HOME position is missing pan/tilt ({home}); cannot tell empty presets apart");
        error!("{message}");
        report.error = Some(message);
        report.duration_secs = start.elapsed().as_secs_f64();
        return report;
    }
    info!("HOME position captured: {home}");

    for preset in options.presets() {
        if cancel.load(Ordering::Relaxed) {
            info!("Capture cancelled before preset {preset}");
            report.cancelled = true;
            break;
        }

        if let Err(e) = camera.recall_preset(preset) {
            warn!("Recall of preset {preset} failed: {e}");
        }

        info!("Waiting {:?} to check if preset {preset} exists...", options.probe_delay);
        camera.wait_and_drain(options.probe_delay);
        let probe = camera.query_position(options.capture_focus);

        if !probe.has_pan_tilt() {
            warn!("Pan/tilt unavailable while probing preset {preset} ({probe}). Skipping.");
            report.unreadable.push(preset);
            // the recall may still be moving the camera
            go_home(camera, options.settle);
            continue;
        }

        if probe == home {
            info!("Preset {preset} appears to not exist (still at HOME). Skipping.");
            report.skipped.push(preset);
            continue;
        }

        info!(
            "Preset {preset} exists. Waiting {:?} for movement to complete...",
            options.settle
        );
        camera.wait_and_drain(options.settle);

        let position = camera.query_position(options.capture_focus);
        info!("Captured preset {preset}: {position}");
        report.table.insert(preset, position);

        // every probe starts from HOME
        go_home(camera, options.settle);
    }

    report.duration_secs = start.elapsed().as_secs_f64();
    info!("Capture finished. {}", report.summary());
    report
}

fn go_home<T: Transport>(camera: &mut ViscaCamera<T>, settle: Duration) {
    if let Err(e) = camera.go_home() {
        warn!("HOME command failed: {e}");
    }
    info!("Waiting {settle:?} for HOME movement to complete...");
    camera.wait_and_drain(settle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, ScriptedCamera};
    use crate::visca::{Command, Inquiry, Timing};

    const HOME: Position = Position {
        pan: Some(0x0000),
        tilt: Some(0x0000),
        zoom: Some(0x0000),
        focus: None,
    };

    fn options(start: u8, end: u8) -> CaptureOptions {
        CaptureOptions {
            start,
            end,
            settle: Duration::ZERO,
            probe_delay: Duration::ZERO,
            capture_focus: false,
        }
    }

    fn run(sim: ScriptedCamera, opts: &CaptureOptions) -> (CaptureReport, ScriptedCamera) {
        let mut camera = ViscaCamera::with_timing(sim, Timing::immediate());
        let report = capture_presets(&mut camera, opts, &AtomicBool::new(false));
        (report, camera.into_inner())
    }

    #[test]
    fn test_presets_skip_reserved_range() {
        let presets: Vec<i32> = options(88, 101).presets().collect();
        assert_eq!(presets, vec![88, 89, 100, 101]);
    }

    #[test]
    fn test_camera_that_never_moves_yields_empty_table() {
        let (report, sim) = run(ScriptedCamera::new(HOME), &options(85, 101));

        assert!(report.table.is_empty());
        assert_eq!(report.skipped, vec![85, 86, 87, 88, 89, 100, 101]);
        assert_eq!(report.occupied(), 0);
        assert!(!report.cancelled);
        // reserved presets are never recalled
        for n in 90..=99u8 {
            assert_eq!(sim.sent_count(&Command::PresetRecall(n)), 0);
        }
        // no extra HOME trips for empty slots
        assert_eq!(sim.sent_count(&Command::Home), 1);
    }

    #[test]
    fn test_only_moving_preset_is_captured_after_settle() {
        let target = Position::new(0x8A3C, 0x05F4, 0x4000);
        let moving = Position::new(0x0100, 0x0010, 0x1000);
        let mut sim = ScriptedCamera::new(HOME).with_preset(42, target);
        sim.transit.insert(42, moving);

        let (report, sim) = run(sim, &options(40, 45));

        assert_eq!(report.table.len(), 1);
        assert_eq!(report.table.get(42), Some(&target));
        assert_eq!(report.skipped, vec![40, 41, 43, 44, 45]);
        // initial trip plus the return after preset 42
        assert_eq!(sim.sent_count(&Command::Home), 2);
    }

    #[test]
    fn test_return_home_before_next_probe() {
        let sim = ScriptedCamera::new(HOME)
            .with_preset(1, Position::new(0x0010, 0x0020, 0x0030))
            .with_preset(2, Position::new(0x0040, 0x0050, 0x0060));

        let (report, sim) = run(sim, &options(1, 3));
        assert_eq!(report.table.presets(), vec![1, 2]);
        assert_eq!(report.skipped, vec![3]);

        let sent = sim.sent();
        let index_of = |command: Command| sent.iter().rposition(|c| *c == command.encode()).unwrap();
        let recall_1 = sent.iter().position(|c| *c == Command::PresetRecall(1).encode()).unwrap();
        let recall_2 = index_of(Command::PresetRecall(2));
        let home_between = sent[recall_1..recall_2].iter().any(|c| *c == Command::Home.encode());
        assert!(home_between, "camera not sent HOME between presets 1 and 2");
    }

    #[test]
    fn test_preset_at_home_is_reported_empty() {
        let sim = ScriptedCamera::new(HOME).with_preset(7, HOME);
        let (report, _) = run(sim, &options(7, 7));
        assert!(report.table.is_empty());
        assert_eq!(report.skipped, vec![7]);
    }

    #[test]
    fn test_inquiries_drained_first() {
        let sim = ScriptedCamera::new(HOME).with_preset(2, Position::new(3, 3, 3));
        let (_, sim) = run(sim, &options(1, 3));

        let inquiries = [
            Command::Inquiry(Inquiry::PanTilt).encode(),
            Command::Inquiry(Inquiry::Zoom).encode(),
        ];
        for (i, event) in sim.events.iter().enumerate() {
            if let Event::Send(bytes) = event {
                if inquiries.contains(bytes) {
                    assert_eq!(sim.events[i - 1], Event::Drain);
                }
            }
        }
    }

    #[test]
    fn test_cancel_stops_between_presets() {
        let mut camera = ViscaCamera::with_timing(ScriptedCamera::new(HOME), Timing::immediate());
        let report = capture_presets(&mut camera, &options(1, 10), &AtomicBool::new(true));

        assert!(report.cancelled);
        assert!(report.skipped.is_empty());
        assert_eq!(camera.link().sent_count(&Command::PresetRecall(1)), 0);
    }

    #[test]
    fn test_home_without_pan_tilt_aborts_scan() {
        let mut sim = ScriptedCamera::new(HOME);
        sim.fail_pan_tilt = 3;

        let (report, sim) = run(sim, &options(5, 5));

        assert!(report.error.is_some());
        assert!(!report.home.has_pan_tilt());
        assert!(report.table.is_empty());
        assert!(report.skipped.is_empty());
        assert!(report.unreadable.is_empty());
        assert_eq!(sim.sent_count(&Command::PresetRecall(5)), 0);
        assert!(report.summary().contains("aborted"));
    }

    #[test]
    fn test_home_read_on_last_attempt_still_scans() {
        let mut sim = ScriptedCamera::new(HOME);
        sim.fail_pan_tilt = 2;

        let (report, _) = run(sim, &options(5, 5));

        assert!(report.error.is_none());
        assert_eq!(report.skipped, vec![5]);
    }

    #[test]
    fn test_probe_without_pan_tilt_is_unreadable() {
        let target = Position::new(0x0100, 0x0200, 0x0300);
        let mut sim = ScriptedCamera::new(HOME).with_preset(5, target);
        sim.transit.insert(
            5,
            Position {
                zoom: Some(0x0300),
                ..Default::default()
            },
        );

        let (report, sim) = run(sim, &options(4, 6));

        assert!(report.error.is_none());
        assert!(report.table.is_empty());
        assert_eq!(report.unreadable, vec![5]);
        assert_eq!(report.skipped, vec![4, 6]);
        // back to HOME before probing preset 6
        let sent = sim.sent();
        let recall_5 = sent.iter().position(|c| *c == Command::PresetRecall(5).encode()).unwrap();
        let recall_6 = sent.iter().position(|c| *c == Command::PresetRecall(6).encode()).unwrap();
        assert!(sent[recall_5..recall_6].contains(&Command::Home.encode()));
    }

    #[test]
    fn test_focus_captured_when_requested() {
        let home = HOME.with_focus(0x0200);
        let target = Position::new(5, 6, 7).with_focus(0x0300);
        let sim = ScriptedCamera::new(home).with_preset(9, target);

        let mut opts = options(9, 9);
        opts.capture_focus = true;
        let (report, _) = run(sim, &opts);

        assert_eq!(report.home, home);
        assert_eq!(report.table.get(9), Some(&target));
    }
}

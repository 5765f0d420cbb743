//! Periodic command replay.
//!
//! Sends a fixed list of commands round-robin, one per tick, until shutdown.
//! Every send takes the link lock for its whole drain/exchange pair, so the
//! replay never interleaves with another user of the same link.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::visca::protocol::hex_string;
use crate::visca::types::RECV_BUFFER_SIZE;
use crate::visca::{Command, DriveDirection, ReplyKind, Transport, classify};

/// A labelled command in the replay cycle.
#[derive(Debug, Clone)]
pub struct ReplayStep {
    pub label: String,
    pub command: Command,
}

impl ReplayStep {
    pub fn new(label: &str, command: Command) -> Self {
        Self {
            label: label.to_string(),
            command,
        }
    }
}

/// Pan left at medium speed, then stop.
pub fn default_cycle() -> Vec<ReplayStep> {
    vec![
        ReplayStep::new(
            "Pan Left",
            Command::PanTiltDrive {
                pan_speed: 0x08,
                tilt_speed: 0x08,
                direction: DriveDirection::Left,
            },
        ),
        ReplayStep::new(
            "Stop Pan/Tilt",
            Command::PanTiltDrive {
                pan_speed: 0x08,
                tilt_speed: 0x08,
                direction: DriveDirection::Stop,
            },
        ),
    ]
}

/// Drain, send one step, and classify the reply. Runs on a blocking thread.
fn send_step<T: Transport>(link: &Mutex<T>, step: &ReplayStep) -> Result<ReplyKind> {
    let mut link = link.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    link.drain()?;
    let reply = link.exchange(&step.command, RECV_BUFFER_SIZE)?;
    Ok(classify(&reply))
}

/// Run the cycle every `interval` until `shutdown` turns true or its sender is dropped.
///
/// Returns the number of commands sent. Failed sends are logged and the cycle continues.
pub async fn run_replay<T>(
    link: Arc<Mutex<T>>,
    steps: Vec<ReplayStep>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<usize>
where
    T: Transport + Send + 'static,
{
    if steps.is_empty() {
        warn!("No commands in replay list");
        return Ok(0);
    }

    info!("Started command replay ({} commands, every {interval:?})", steps.len());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut index = 0;
    let mut sent = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let step = steps[index].clone();
        index = (index + 1) % steps.len();

        info!("Sending: {} ({})", step.label, hex_string(&step.command.encode()));
        let shared = Arc::clone(&link);
        let label = step.label.clone();
        match tokio::task::spawn_blocking(move || send_step(&shared, &step)).await? {
            Ok(kind @ ReplyKind::Error { .. }) => warn!("{label}: {kind}"),
            Ok(kind) => debug!("{label}: {kind}"),
            Err(e) => warn!("{label} failed: {e}"),
        }
        sent += 1;
    }

    info!("Command replay stopped after {sent} commands");
    Ok(sent)
}

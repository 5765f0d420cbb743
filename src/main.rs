//! visca-presets - capture and restore PTZ camera presets over VISCA/IP.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use visca_presets as app;

use app::capture::{CaptureOptions, capture_presets};
use app::config::{AppConfig, CameraConfig, ConfigLoadResult, RECOMMENDED_SETTLE_SECS};
use app::models::PresetTable;
use app::replay::{default_cycle, run_replay};
use app::restore::{RestoreOptions, restore_presets};
use app::visca::{TcpLink, ViscaCamera};

/// Capture and restore PTZ camera presets over VISCA/IP.
#[derive(Parser)]
#[command(name = "visca-presets", version)]
struct Cli {
    /// Config file (default: config.toml beside the executable, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Camera host name or IP address
    #[arg(long, global = true)]
    host: Option<String>,

    /// Camera TCP port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a preset range and save every occupied preset's position
    Capture {
        /// Starting preset (1-89, 100-149, 152-254)
        #[arg(long)]
        start: Option<u8>,
        /// Ending preset (1-89, 100-149, 152-254)
        #[arg(long)]
        end: Option<u8>,
        /// Seconds to wait for camera movement
        #[arg(long)]
        settle_secs: Option<u64>,
        /// Seconds before checking whether a preset exists
        #[arg(long)]
        probe_delay_secs: Option<u64>,
        /// Capture focus position as well
        #[arg(long)]
        focus: bool,
        /// Output JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write saved preset positions back to the camera
    Restore {
        /// Input JSON file
        #[arg(long)]
        input: Option<PathBuf>,
        /// Seconds to wait for the camera to reach each position
        #[arg(long)]
        settle_secs: Option<u64>,
    },
    /// Print the current pan/tilt/zoom (and optionally focus) position
    Position {
        #[arg(long)]
        focus: bool,
    },
    /// Move to the HOME position
    Home,
    /// Recall a preset
    Recall {
        #[arg(allow_negative_numbers = true)]
        preset: i32,
    },
    /// Save the current position as a preset
    Save {
        #[arg(allow_negative_numbers = true)]
        preset: i32,
    },
    /// Send the pan-left/stop cycle repeatedly until Ctrl+C
    Replay {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file.as_deref())?;

    tracing::info!("visca-presets starting...");
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Capture {
            start,
            end,
            settle_secs,
            probe_delay_secs,
            focus,
            output,
        } => {
            let capture = &mut config.capture;
            capture.start_preset = start.unwrap_or(capture.start_preset);
            capture.end_preset = end.unwrap_or(capture.end_preset);
            capture.settle_secs = settle_secs.unwrap_or(capture.settle_secs);
            capture.probe_delay_secs = probe_delay_secs.unwrap_or(capture.probe_delay_secs);
            capture.capture_focus |= focus;
            if let Some(output) = output {
                capture.output = output;
            }
            config.validate().context("Invalid capture settings")?;
            run_capture(config).await
        }
        Commands::Restore { input, settle_secs } => {
            if let Some(input) = input {
                config.restore.input = input;
            }
            config.restore.settle_secs = settle_secs.unwrap_or(config.restore.settle_secs);
            run_restore(config).await
        }
        Commands::Position { focus } => {
            let position = with_camera(config.camera, move |camera| camera.query_position(focus)).await?;
            println!("{position}");
            Ok(())
        }
        Commands::Home => Ok(with_camera(config.camera, |camera| camera.go_home()).await??),
        Commands::Recall { preset } => Ok(with_camera(config.camera, move |camera| camera.recall_preset(preset)).await??),
        Commands::Save { preset } => Ok(with_camera(config.camera, move |camera| camera.save_preset(preset)).await??),
        Commands::Replay { interval_secs } => {
            let interval = interval_secs.unwrap_or(config.replay.interval_secs).max(1);
            run_command_replay(config.camera, Duration::from_secs(interval)).await
        }
    }
}

/// Console logging, plus a non-blocking file writer when requested.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().context("Log file path has no file name")?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Load the config file (defaults when missing) and apply connection overrides.
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    tracing::info!("Config path: {:?}", path);

    let mut config = match AppConfig::try_load(&path) {
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded successfully");
            config
        }
        ConfigLoadResult::Missing => {
            tracing::info!("Config missing, using defaults");
            AppConfig::default()
        }
        ConfigLoadResult::Invalid(e) => bail!("Config invalid ({}): {e}", path.display()),
    };

    if let Some(host) = &cli.host {
        config.camera.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.camera.port = port;
    }
    config.validate().context("Invalid settings")?;
    Ok(config)
}

fn open_camera(camera: &CameraConfig) -> anyhow::Result<ViscaCamera<TcpLink>> {
    let link = TcpLink::open(&camera.host, camera.port, Duration::from_secs(camera.timeout_secs))
        .with_context(|| format!("Could not reach camera at {}:{}", camera.host, camera.port))?;
    Ok(ViscaCamera::new(link))
}

/// Connect, run `job` on a blocking thread, disconnect.
async fn with_camera<R, F>(camera: CameraConfig, job: F) -> anyhow::Result<R>
where
    R: Send + 'static,
    F: FnOnce(&mut ViscaCamera<TcpLink>) -> R + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<R> {
        let mut visca = open_camera(&camera)?;
        let result = job(&mut visca);
        visca.link_mut().disconnect();
        Ok(result)
    })
    .await??;
    Ok(result)
}

/// Run `job` on a blocking thread; Ctrl+C raises its cancel flag.
async fn run_cancellable<R, F>(job: F) -> anyhow::Result<R>
where
    R: Send + 'static,
    F: FnOnce(Arc<AtomicBool>) -> R + Send + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let mut handle = tokio::task::spawn_blocking(move || job(flag));

    tokio::select! {
        result = &mut handle => return Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Operation cancelled by user, stopping after the current preset...");
            cancel.store(true, Ordering::Relaxed);
        }
    }
    Ok(handle.await?)
}

async fn run_capture(config: AppConfig) -> anyhow::Result<()> {
    let options = CaptureOptions::from(&config.capture);
    let output = config.capture.output.clone();
    if config.capture.settle_secs < RECOMMENDED_SETTLE_SECS {
        tracing::warn!(
            "Settle time below {RECOMMENDED_SETTLE_SECS}s may cause incomplete movements and wrong captures"
        );
    }
    tracing::info!(
        "Capturing presets {}-{} ({})",
        options.start,
        options.end,
        if options.capture_focus { "with focus" } else { "pan/tilt/zoom only" }
    );

    let camera = config.camera;
    let report = run_cancellable(move |cancel| -> anyhow::Result<_> {
        let mut visca = open_camera(&camera)?;
        let report = capture_presets(&mut visca, &options, &cancel);
        visca.link_mut().disconnect();
        Ok(report)
    })
    .await??;

    if let Some(error) = &report.error {
        bail!("Capture aborted: {error}");
    }

    report.table.save(&output).with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Saved {} preset positions to {}", report.occupied(), output.display());
    if !report.skipped.is_empty() {
        println!("Skipped {} non-existent presets: {:?}", report.skipped.len(), report.skipped);
    }
    if !report.unreadable.is_empty() {
        println!("Could not read pan/tilt for presets: {:?}", report.unreadable);
    }
    println!("{}", report.summary());
    Ok(())
}

async fn run_restore(config: AppConfig) -> anyhow::Result<()> {
    let input = config.restore.input.clone();
    if !input.exists() {
        bail!("{} not found. Run `capture` first to create the preset file.", input.display());
    }
    let table = PresetTable::load(&input).with_context(|| format!("Error reading {}", input.display()))?;
    println!("Loaded {} presets from {}", table.len(), input.display());

    let options = RestoreOptions::from(&config.restore);
    let camera = config.camera;
    let report = run_cancellable(move |cancel| -> anyhow::Result<_> {
        let mut visca = open_camera(&camera)?;
        let report = restore_presets(&mut visca, &table, &options, &cancel);
        visca.link_mut().disconnect();
        Ok(report)
    })
    .await??;

    if !report.skipped.is_empty() {
        println!("Skipped presets: {:?}", report.skipped);
    }
    println!("{}", report.summary());
    Ok(())
}

async fn run_command_replay(camera: CameraConfig, interval: Duration) -> anyhow::Result<()> {
    let link = tokio::task::spawn_blocking(move || {
        TcpLink::open(&camera.host, camera.port, Duration::from_secs(camera.timeout_secs))
    })
    .await??;
    let link = Arc::new(Mutex::new(link));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let replay = tokio::spawn(run_replay(Arc::clone(&link), default_cycle(), interval, shutdown_rx));
    println!("Sending commands every {interval:?}. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Stopping command replay...");
    let _ = shutdown_tx.send(true);
    let sent = replay.await??;

    link.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).disconnect();
    println!("Stopped after {sent} commands");
    Ok(())
}

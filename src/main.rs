//! macro-recorder
//!
//! Records keyboard and mouse input into scripts and replays them.
//! F9 starts, pauses and resumes playback, F10 stops it, F11 toggles recording.

mod app;
mod capture;
mod config;
mod control;
mod data;
mod error;
mod input;
mod logging;
mod playback;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use app::{App, AppCommand};
use capture::{CaptureFilter, EventCapture};
use config::Config;
use control::HotkeyDispatcher;
use data::Script;
use input::{RdevSink, RdevSource};
use playback::{LoopMode, PlaybackEngine};

/// Command line options
#[derive(Debug, Default)]
struct Args {
    script: Option<PathBuf>,
    loop_mode: Option<LoopMode>,
    help: bool,
}

fn main() -> Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e:#}");
            print_help();
            std::process::exit(2);
        }
    };

    if args.help {
        print_help();
        return Ok(());
    }

    let _log_guard = logging::init_logging()?;
    info!("macro-recorder starting...");

    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.config_path());

    let script = match &args.script {
        Some(path) if path.exists() => {
            let script = Script::load(path)
                .with_context(|| format!("Failed to load script {:?}", path))?;
            info!("Loaded {} ({} actions) from {:?}", script.name, script.len(), path);
            script
        }
        Some(path) => {
            info!("{:?} does not exist yet, recordings will be saved there", path);
            Script::default()
        }
        None => Script::default(),
    };
    let loop_mode = args.loop_mode.unwrap_or_else(|| config.default_loop_mode());

    let runtime = tokio::runtime::Runtime::new()?;
    let _enter = runtime.enter();

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    let control_keys = config.control_keys();
    let _hotkeys = match HotkeyDispatcher::new(control_keys)
        .spawn(Box::new(RdevSource::new()), cmd_tx.clone())
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to listen for control keys: {:#}", e);
            warn!("Input hooks may need accessibility permission or an X11 session");
            std::process::exit(1);
        }
    };

    let filter = CaptureFilter {
        keyboard: config.capture.capture_keyboard,
        mouse_buttons: config.capture.capture_mouse_click,
    };
    let capture = EventCapture::new(Box::new(RdevSource::new()), control_keys, filter, action_tx);
    let playback = PlaybackEngine::new(Arc::new(RdevSink::new()), runtime.handle().clone());

    let app = App::new(
        script,
        args.script.clone(),
        config,
        loop_mode,
        capture,
        playback,
        cmd_rx,
        action_rx,
    );

    let ctrl_c_tx = cmd_tx.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        let _ = ctrl_c_tx.send(AppCommand::Shutdown);
    })?;

    info!("Press Ctrl+C to exit...");
    if let Err(e) = runtime.block_on(app.run()) {
        error!("Application error: {:#}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "-c" | "--count" => {
                let value = args.next().context("--count needs a value")?;
                let count: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid run count: {value}"))?;
                if count == 0 {
                    bail!("--count must be at least 1");
                }
                parsed.loop_mode = Some(LoopMode::Count(count));
            }
            "-d" | "--duration-ms" => {
                let value = args.next().context("--duration-ms needs a value")?;
                let ms: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid duration: {value}"))?;
                parsed.loop_mode = Some(LoopMode::Duration(Duration::from_millis(ms)));
            }
            flag if flag.starts_with('-') => bail!("Unknown option: {flag}"),
            path => {
                if parsed.script.is_some() {
                    bail!("Only one script path may be given");
                }
                parsed.script = Some(PathBuf::from(path));
            }
        }
    }

    Ok(parsed)
}

fn print_help() {
    println!("macro-recorder - Record and replay keyboard and mouse input");
    println!();
    println!("USAGE:");
    println!("    macro-recorder [OPTIONS] [SCRIPT]");
    println!();
    println!("ARGS:");
    println!("    SCRIPT                 Script to play; recordings are saved here (.json or .mpk)");
    println!();
    println!("OPTIONS:");
    println!("    -c, --count N          Replay the script N times");
    println!("    -d, --duration-ms MS   Keep replaying until MS milliseconds have passed");
    println!("    -h, --help             Print this help message");
    println!();
    println!("CONTROLS:");
    println!("    F9     Start playback, or pause/resume it");
    println!("    F10    Stop playback");
    println!("    F11    Start/stop recording");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG                  Set log level (e.g., debug, info, warn)");
    println!("    MACRO_RECORDER_LOG_PATH   Directory for log files");
}

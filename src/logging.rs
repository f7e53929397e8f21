use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_BASENAME: &str = "macro-recorder.log";
const LOG_DIR_ENV: &str = "MACRO_RECORDER_LOG_PATH";
const LOG_RETENTION_DAYS: u64 = 7;

#[cfg(target_os = "macos")]
const OSLOG_SUBSYSTEM: &str = "dev.macro-recorder";

/// Install stderr and daily-rolling file logging. Keep the guard alive for
/// the life of the process so buffered lines get flushed.
pub fn init_logging() -> Result<WorkerGuard> {
    let log_dir = resolve_log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

    let pruned = prune_old_logs(&log_dir, Duration::from_secs(60 * 60 * 24 * LOG_RETENTION_DAYS));

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_BASENAME));

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr));

    #[cfg(target_os = "macos")]
    let registry = registry.with(tracing_oslog::OsLogger::new(OSLOG_SUBSYSTEM, "default"));

    registry
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(dir = ?log_dir, pruned, "Logging initialized");
    Ok(guard)
}

fn resolve_log_dir() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var(LOG_DIR_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let proj_dirs = ProjectDirs::from("dev", "macro-recorder", "recorder")
        .context("Failed to determine project directories for log path")?;

    let base = proj_dirs
        .state_dir()
        .unwrap_or_else(|| proj_dirs.data_local_dir());
    Ok(base.join("logs"))
}

/// Delete our rolled log files last modified more than `max_age` ago.
/// Returns how many were removed.
fn prune_old_logs(log_dir: &Path, max_age: Duration) -> usize {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return 0;
    };
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return 0;
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_log_file(path))
        .filter(|path| {
            std::fs::metadata(path)
                .and_then(|meta| meta.modified())
                .is_ok_and(|modified| modified < cutoff)
        })
        .filter(|path| std::fs::remove_file(path).is_ok())
        .count()
}

fn is_log_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_BASENAME))
}

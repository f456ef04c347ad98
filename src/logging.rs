use std::{fs::OpenOptions, io, path::Path};

use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

pub const LOG_FILE_NAME: &str = "futures_trading_bot.log";

/// Keeps the non-blocking file writer alive; logging stops once this is dropped.
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Sends everything at `info` and above (or `RUST_LOG`) to
/// `<log_dir>/futures_trading_bot.log`, and warnings to stderr unless `verbose`.
pub fn init_tracing(log_dir: &Path, verbose: bool) -> io::Result<LogGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))?;
    let (file_writer, file_guard) = non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_level),
        )
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    Ok(LogGuard { _file: file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_log_file_in_directory() {
        let dir = std::env::temp_dir().join(format!("futures-bot-logs-{}", std::process::id()));
        let guard = init_tracing(&dir, false).unwrap();
        tracing::info!("log file smoke test");
        drop(guard);

        assert!(dir.join(LOG_FILE_NAME).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}

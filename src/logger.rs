use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::errors::AppError;

/// Set up application logging based on configuration
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must be kept alive for file logging to flush.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, AppError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    match config.log_file_path() {
        None => {
            // When no file path is specified, log only to stderr
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish();

            tracing::subscriber::set_global_default(subscriber).map_err(|e| {
                AppError::Logging {
                    reason: e.to_string(),
                }
            })?;

            Ok(None)
        }
        Some(path) => {
            let (file_writer, guard) = create_file_logger(path)?;

            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(file_writer)
                .with_ansi(false)
                .finish();

            tracing::subscriber::set_global_default(subscriber).map_err(|e| {
                AppError::Logging {
                    reason: e.to_string(),
                }
            })?;

            Ok(Some(guard))
        }
    }
}

// Create file logger (no rotation)
fn create_file_logger(path: &str) -> Result<(NonBlocking, WorkerGuard), AppError> {
    let log_path = std::path::PathBuf::from(path);
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    std::fs::create_dir_all(&log_dir).map_err(|e| AppError::Logging {
        reason: format!("cannot create log directory {}: {}", log_dir.display(), e),
    })?;

    let log_file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("pr-watcher.log"));

    let file_appender = tracing_appender::rolling::never(&log_dir, log_file_name);
    Ok(tracing_appender::non_blocking(file_appender))
}

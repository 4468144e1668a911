//! Logging configuration with file-based output and size-based rotation.
//!
//! Writes logs to `~/.config/acsched/acsched.log` (or platform equivalent)
//! with 5 MB size-based rotation. Set `DEBUG_LOGGING=1` to enable debug
//! output for acsched crates.

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize logging with dual output (file + stderr).
///
/// Returns a `WorkerGuard` that must be held for the lifetime of the program
/// so buffered log lines are flushed on shutdown. Falls back to stderr-only
/// logging when the log file cannot be created.
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let Some(log_dir) = dirs::config_dir().map(|config| config.join("acsched")) else {
        init_stderr_only(debug_logging);
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        // No subscriber yet, so this can't go through tracing.
        eprintln!(
            "Failed to create log directory {:?}: {}, using stderr only",
            log_dir, e
        );
        init_stderr_only(debug_logging);
        return None;
    }

    let log_path = log_dir.join("acsched.log");
    let file_appender = match BasicRollingFileAppender::new(
        &log_path,
        RollingConditionBasic::new().max_size(5 * 1024 * 1024),
        1,
    ) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to create log file at {:?}: {}", log_path, e);
            init_stderr_only(debug_logging);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    // stdout belongs to the REPL
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(filter(debug_logging))
        .init();

    tracing::info!(
        log_file = ?log_path,
        debug_logging,
        "acsched logging initialized"
    );

    Some(guard)
}

fn init_stderr_only(debug_logging: bool) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter(debug_logging))
        .init();

    tracing::info!(debug_logging, "acsched logging initialized (stderr only)");
}

fn filter(debug_logging: bool) -> EnvFilter {
    if debug_logging {
        EnvFilter::new("info,acsched=debug,acsched_core=debug")
    } else {
        EnvFilter::new("info")
    }
}

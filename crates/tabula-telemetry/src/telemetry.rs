use std::io::Write;
use std::sync::Mutex;

use log::debug;

use crate::error::{TelemetryError, TelemetryResult};

pub const DEFAULT_LOG_FILTER: &str = "info";

enum TelemetryStatus {
    Uninitialized,
    Initialized,
    Failed,
    Finalized,
}

static TELEMETRY_STATUS: Mutex<TelemetryStatus> = Mutex::new(TelemetryStatus::Uninitialized);

pub struct LogOptions<'a> {
    /// The filter used when `RUST_LOG` is not set, e.g. `info` or `tabula_table_http=debug`.
    pub default_filter: &'a str,
}

impl Default for LogOptions<'_> {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_LOG_FILTER,
        }
    }
}

/// Installs the global logger. The logger can only be installed once per process.
pub fn init_telemetry(options: LogOptions) -> TelemetryResult<()> {
    let mut status = TELEMETRY_STATUS
        .lock()
        .map_err(|e| TelemetryError::internal(e.to_string()))?;

    match *status {
        TelemetryStatus::Uninitialized => match init_logs(&options) {
            Ok(()) => {
                debug!("logging initialized");
                *status = TelemetryStatus::Initialized;
                Ok(())
            }
            Err(e) => {
                *status = TelemetryStatus::Failed;
                Err(e)
            }
        },
        TelemetryStatus::Initialized => {
            Err(TelemetryError::internal("telemetry already initialized"))
        }
        TelemetryStatus::Failed => Err(TelemetryError::internal(
            "telemetry failed to initialize previously",
        )),
        TelemetryStatus::Finalized => Err(TelemetryError::internal(
            "telemetry has been finalized and cannot be re-initialized",
        )),
    }
}

fn init_logs(options: &LogOptions) -> TelemetryResult<()> {
    if options.default_filter.trim().is_empty() {
        return Err(TelemetryError::invalid("default log filter must not be empty"));
    }
    let env = env_logger::Env::default().default_filter_or(options.default_filter);
    let logger = env_logger::Builder::from_env(env)
        .format(move |buf, record| {
            let level = record.level();
            let target = record.target();
            let style = buf.default_level_style(level);
            let timestamp = buf.timestamp();
            let args = record.args();
            writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
        })
        .build();
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(logger)).map_err(|e| TelemetryError::internal(e.to_string()))?;
    log::set_max_level(max_level);
    Ok(())
}

pub fn shutdown_telemetry() {
    if let Ok(mut status) = TELEMETRY_STATUS.lock() {
        if let TelemetryStatus::Initialized = *status {
            debug!("shutting down logging");
            log::logger().flush();
            *status = TelemetryStatus::Finalized;
        }
    }
}

//! Logging for the bridge and its developer binary.
//!
//! Two sinks are installed by [`init`]:
//! - a JSONL file under `<data dir>/prefs-bridge/logs/prefs-bridge.jsonl`
//!   for tooling
//! - compact text on stderr for whoever runs the binary
//!
//! ```rust,ignore
//! let _guard = prefs_bridge::logging::init(); // keep alive until exit
//! tracing::info!(path = "/get/all", "Calling host");
//! ```
//!
//! A file line looks like:
//! ```json
//! {"timestamp":"2026-10-18T10:30:45.123Z","level":"DEBUG","target":"prefs_bridge::logging","fields":{"message":"Request __jp3 resolved","event_type":"bridge_request","request_id":"__jp3","path":"/get/all","outcome":"resolved","duration_ms":4}}
//! ```
//!
//! Request settlements, pushes and [`log`] lines are also kept in a small ring
//! buffer so a diagnostics view can show the latest bridge traffic without
//! reading the file ([`get_recent_logs`]).

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, OnceLock};

use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static EVENT_BUFFER: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
const MAX_EVENTS: usize = 50;
const LOG_FILE_NAME: &str = "prefs-bridge.jsonl";

static TEST_LOGGING: Once = Once::new();

/// Flushes the JSONL writer when dropped.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

fn event_buffer() -> &'static Mutex<VecDeque<String>> {
    EVENT_BUFFER.get_or_init(|| Mutex::new(VecDeque::with_capacity(MAX_EVENTS)))
}

/// Install the file and stderr sinks. Falls back to stderr only when the
/// log file cannot be opened. `RUST_LOG` overrides the `info` default.
pub fn init() -> LoggingGuard {
    init_in(&get_log_dir())
}

/// [`init`] with the JSONL file placed in `log_dir`.
pub fn init_in(log_dir: &Path) -> LoggingGuard {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("[prefs-bridge] cannot create log dir {}: {}", log_dir.display(), e);
    }
    let log_path = log_dir.join(LOG_FILE_NAME);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let (file_writer, file_guard) = match OpenOptions::new().create(true).append(true).open(&log_path)
    {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        Err(e) => {
            eprintln!("[prefs-bridge] cannot open {}: {}", log_path.display(), e);
            (None, None)
        }
    };

    // None disables the layer, so both outcomes share one subscriber type
    let jsonl_layer = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(fmt::time::UtcTime::new(Rfc3339))
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_span_events(FmtSpan::NONE)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(jsonl_layer)
        .with(stderr_layer)
        .try_init();

    tracing::debug!(
        log_path = %log_path.display(),
        file_sink = file_guard.is_some(),
        "Logging ready"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

impl LoggingGuard {
    /// Whether the JSONL file sink is active
    pub fn has_file_sink(&self) -> bool {
        self._file_guard.is_some()
    }
}

/// Install a stderr-only subscriber once per test binary.
///
/// Honors `RUST_LOG`; silent by default so test output stays readable.
pub fn init_for_tests() {
    TEST_LOGGING.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_test_writer().compact())
            .try_init();
    });
}

fn get_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("prefs-bridge").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("prefs-bridge-logs"))
}

/// Where [`init`] writes JSONL
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Log a line under `category` and keep it in the display buffer.
///
/// Prefer tracing macros with structured fields; this is for short
/// human-readable status lines such as the binary's progress.
pub fn log(category: &str, message: &str) {
    add_to_buffer(category, message);
    tracing::info!(category = category, "{}", message);
}

fn add_to_buffer(category: &str, message: &str) {
    if let Ok(mut buf) = event_buffer().lock() {
        if buf.len() >= MAX_EVENTS {
            buf.pop_front();
        }
        buf.push_back(format!("[{}] {}", category, message));
    }
}

/// Latest buffered lines, oldest first
pub fn get_recent_logs() -> Vec<String> {
    event_buffer()
        .lock()
        .map(|buf| buf.iter().cloned().collect())
        .unwrap_or_default()
}

/// Log the settlement of a bridge request
pub fn log_request_event(request_id: &str, path: &str, outcome: &str, duration_ms: u64) {
    add_to_buffer(
        "BRIDGE",
        &format!("{} {} {} ({}ms)", request_id, path, outcome, duration_ms),
    );

    tracing::debug!(
        event_type = "bridge_request",
        request_id = request_id,
        path = path,
        outcome = outcome,
        duration_ms = duration_ms,
        "Request {} {}",
        request_id,
        outcome
    );
}

/// Log a push notification and whether a named handler consumed it
pub fn log_notification(event_name: &str, handled_by: Option<&str>) {
    let msg = match handled_by {
        Some(name) => format!("{} -> {}", event_name, name),
        None => format!("{} (no pending handler)", event_name),
    };
    add_to_buffer("PUSH", &msg);

    tracing::debug!(
        event_type = "push_notification",
        event_name = event_name,
        handled_by = handled_by,
        "{}",
        msg
    );
}

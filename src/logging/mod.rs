//! Log sink: console echo plus an append-only text file
//!
//! Lines are emitted as `tracing` events into a subscriber owned by the
//! `Logger` handle, never a process-wide default. A `Logger` can only be
//! obtained from [`Logger::open`], so there is no way to log before the
//! target file has been resolved.

use crate::types::SyncError;
use console::style;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn from_tracing(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warning,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Info => "Info",
            Level::Warning => "Warning",
            Level::Error => "Error",
        };
        f.write_str(name)
    }
}

/// `[Level] YYYY-MM-DD HH:MM:SS message`, styled when the writer takes ANSI
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = Level::from_tracing(*event.metadata().level());
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if writer.has_ansi_escapes() {
            let tag = style(format!("[{}]", level)).force_styling(true);
            let tag = match level {
                Level::Info => tag.cyan(),
                Level::Warning => tag.yellow(),
                Level::Error => tag.red().bold(),
            };
            write!(writer, "{} {} ", tag, style(timestamp).force_styling(true).dim())?;
        } else {
            write!(writer, "[{}] {} ", level, timestamp)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Cloneable handle to the shared log sink
#[derive(Clone)]
pub struct Logger {
    path: PathBuf,
    echo_console: bool,
    dispatch: Dispatch,
    // Keeps console and file in the same line order across threads
    order: Arc<Mutex<()>>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("path", &self.path)
            .field("echo_console", &self.echo_console)
            .finish()
    }
}

impl Logger {
    /// Open (or create) the log file for appending.
    ///
    /// The parent directory is created when missing.
    pub fn open(path: impl AsRef<Path>, echo_console: bool) -> Result<Self, SyncError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SyncError::Config("Log file path is empty".to_string()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::Config(format!(
                    "Cannot create log directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                SyncError::Config(format!("Cannot open log file {}: {}", path.display(), e))
            })?;

        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        let console_layer = echo_console.then(|| {
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_ansi(console::colors_enabled())
                .with_writer(std::io::stdout)
        });

        let subscriber = tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer);

        Ok(Self {
            path: path.to_path_buf(),
            echo_console,
            dispatch: Dispatch::new(subscriber),
            order: Arc::new(Mutex::new(())),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one line to every output of this logger.
    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        let message = message.as_ref();
        let _order = self.order.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        tracing::dispatcher::with_default(&self.dispatch, || match level {
            Level::Info => tracing::info!("{}", message),
            Level::Warning => tracing::warn!("{}", message),
            Level::Error => tracing::error!("{}", message),
        });
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message);
    }
}

//! Append-only log file.
//!
//! Every record is one line: `2025-09-14 10:21:03,512 - INFO - message`.
//! `RUST_LOG` overrides the default `info` filter.

use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::{FmtContext, layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "file_organizer.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log file path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Cannot open log file: {0}")]
    Appender(#[from] InitError),
    #[error("Logging is already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// `timestamp - LEVEL - message fields`
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global subscriber writing to `log_file`.
///
/// The file is created if needed and appended to. Keep the returned guard
/// alive until exit; dropping it flushes pending records.
pub fn init(log_file: &Path, verbose: bool) -> Result<WorkerGuard, LoggingError> {
    let file_name = log_file
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(log_file.to_path_buf()))?;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_directive = if verbose { "info,dirsort=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            layer()
                .with_writer(writer)
                .with_ansi(false)
                .event_format(LogLineFormat),
        )
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_line_has_timestamp_level_and_message() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .event_format(LogLineFormat)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Moved: a.txt -> Documents/a.txt");
            tracing::error!("Failed to move b.txt: denied");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parts: Vec<_> = lines[0].splitn(3, " - ").collect();
        assert_eq!(parts.len(), 3);
        assert!(chrono::NaiveDateTime::parse_from_str(parts[0], "%Y-%m-%d %H:%M:%S,%3f").is_ok());
        assert_eq!(parts[1], "INFO");
        assert_eq!(parts[2], "Moved: a.txt -> Documents/a.txt");
        assert!(lines[1].contains(" - ERROR - Failed to move b.txt: denied"));
    }

    #[test]
    fn test_rejects_path_without_file_name() {
        let result = init(Path::new("/"), false);
        assert!(matches!(result, Err(LoggingError::InvalidPath(_))));
    }
}

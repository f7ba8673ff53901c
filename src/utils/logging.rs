use anyhow::Result;
use chrono::Local;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::config::LoggingConfig;
use crate::utils::app_paths::AppPaths;

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// A log entry with timestamp and message
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    /// Parse one line of compact fmt output: `LEVEL target: message`
    pub fn parse_compact(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let levels = [
            ("TRACE ", Level::TRACE),
            ("DEBUG ", Level::DEBUG),
            ("INFO ", Level::INFO),
            ("WARN ", Level::WARN),
            ("ERROR ", Level::ERROR),
        ];
        let Some((level, rest)) = levels
            .iter()
            .find_map(|(prefix, level)| line.strip_prefix(prefix).map(|rest| (*level, rest.trim_start())))
        else {
            return Some(Self::new(Level::INFO, "general", line.to_string()));
        };

        let (target, message) = match rest.split_once(':') {
            Some((target, message)) if !target.contains(' ') => (target, message.trim()),
            _ => ("general", rest),
        };
        Some(Self::new(level, target, message.to_string()))
    }

    /// Format for display in the log view
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

/// Thread-safe ring buffer for log entries
#[derive(Clone, Default)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.lock();
        if entries.len() >= MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.lock();
        entries.iter().rev().take(count).rev().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Append-only log file, timestamped per session
#[derive(Clone)]
pub struct LogFile {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl LogFile {
    pub fn create_in(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("cur-workbench_{}.log", timestamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        #[cfg(unix)]
        {
            let latest = dir.join("latest.log");
            let _ = std::fs::remove_file(&latest);
            let _ = std::os::unix::fs::symlink(&path, &latest);
        }

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn append(&self, entry: &LogEntry) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", entry.format_for_display());
            let _ = file.flush();
        }
    }
}

/// Writer that sends every formatted line to the ring buffer and, when
/// configured, to the log file
#[derive(Clone)]
pub struct TeeWriter {
    buffer: LogRingBuffer,
    file: Option<LogFile>,
}

impl TeeWriter {
    pub fn new(buffer: LogRingBuffer, file: Option<LogFile>) -> Self {
        Self { buffer, file }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = std::str::from_utf8(buf) {
            for line in text.lines() {
                if let Some(entry) = LogEntry::parse_compact(line) {
                    if let Some(file) = &self.file {
                        file.append(&entry);
                    }
                    self.buffer.push(entry);
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for TeeWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Global log buffer accessible throughout the application
static LOG_BUFFER: OnceLock<LogRingBuffer> = OnceLock::new();

/// Get the global log buffer
pub fn get_log_buffer() -> Option<LogRingBuffer> {
    LOG_BUFFER.get().cloned()
}

/// What `init_tracing` set up
pub struct LoggingHandle {
    pub buffer: LogRingBuffer,
    pub log_path: Option<PathBuf>,
}

/// Install the global subscriber: env filter (`RUST_LOG` first, then the
/// configured level) and a compact fmt layer into the ring buffer and
/// optional file. Calling it twice keeps the first subscriber.
pub fn init_tracing(config: &LoggingConfig) -> LoggingHandle {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let buffer = LOG_BUFFER.get_or_init(LogRingBuffer::new).clone();

    let file = if config.log_to_file {
        match AppPaths::log_dir().and_then(LogFile::create_in) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Warning: could not open log file: {}", e);
                None
            }
        }
    } else {
        None
    };
    let log_path = file.as_ref().map(|f| f.path().clone());

    let fmt_layer = fmt::layer()
        .with_writer(TeeWriter::new(buffer.clone(), file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time()
        .compact();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(target: "workbench", "Logging initialized");
    }

    LoggingHandle { buffer, log_path }
}

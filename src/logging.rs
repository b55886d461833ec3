//! Logging setup.
//!
//! Events go to two sinks: stderr (coloured) and `<directory>/logs.log`,
//! which is rotated once it would grow past the configured size. Panics are
//! additionally appended to `<directory>/errors.log`.
//!
//! [`init`] returns a [`LogHandle`] that callers pass around explicitly. Its
//! [`LogHandle::flush`] must be called before exiting on a failure path so
//! every log line is on disk when the process ends.

use crate::config::LoggingConfig;
use crate::constants::{ERROR_LOG_FILE_NAME, LOG_FILE_NAME};
use crate::errors::{AppError, AppResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

struct RotatingFile {
    path: PathBuf,
    file: File,
    size: u64,
    max_size: u64,
    max_files: usize,
}

impl RotatingFile {
    fn open(path: PathBuf, max_size: u64, max_files: usize) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            size,
            max_size,
            max_files,
        })
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Shifts `logs.log.N-1` to `logs.log.N` (dropping the oldest), moves the
    /// active file to `logs.log.1` and starts an empty one.
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        match fs::remove_file(self.rotated_path(self.max_files)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        for index in (1..self.max_files).rev() {
            let from = self.rotated_path(index);
            if from.exists() {
                fs::rename(&from, self.rotated_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.rotated_path(1))?;

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.size = 0;
        Ok(())
    }

    fn write_record(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.size > 0 && self.size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.size += buf.len() as u64;
        Ok(())
    }
}

/// Size-rotated log file shared between the subscriber and the [`LogHandle`].
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RotatingFileWriter {
    /// Opens (or creates) `path` in append mode.
    pub fn open(path: impl Into<PathBuf>, max_size: u64, max_files: usize) -> AppResult<Self> {
        let path = path.into();
        let file = RotatingFile::open(path.clone(), max_size, max_files.max(1)).map_err(|e| {
            AppError::Io(format!("Failed to open log file {}: {e}", path.display()))
        })?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, RotatingFile>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Handle on the process log sinks, created once by [`init`].
#[derive(Clone)]
pub struct LogHandle {
    file: RotatingFileWriter,
}

impl LogHandle {
    pub fn new(file: RotatingFileWriter) -> Self {
        Self { file }
    }

    /// Blocks until every buffered write has reached the log file on disk.
    pub fn flush(&self) -> AppResult<()> {
        let guard = self
            .file
            .lock()
            .map_err(|e| AppError::Io(format!("Failed to flush log file: {e}")))?;
        let mut file = &guard.file;
        file.flush()
            .and_then(|_| file.sync_all())
            .map_err(|e| AppError::Io(format!("Failed to flush log file: {e}")))
    }

    pub fn file_writer(&self) -> RotatingFileWriter {
        self.file.clone()
    }
}

/// Builds the filter: `RUST_LOG` when set, otherwise the configured level.
fn build_filter(level: &str) -> AppResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| AppError::Config(format!("Invalid logging.level '{level}': {e}"))),
    }
}

/// Assembles the console and file layers without installing them.
pub fn build_subscriber(
    config: &LoggingConfig,
    handle: &LogHandle,
) -> AppResult<impl Subscriber + Send + Sync> {
    let filter = build_filter(&config.level)?;
    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(handle.file_writer()),
        ))
}

/// Creates the log directory, installs the global subscriber and the panic
/// hook, and returns the handle used to flush before exit.
///
/// # Errors
///
/// Returns `Io` if the directory or log file cannot be created and `Config`
/// if the level directive is invalid or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> AppResult<LogHandle> {
    fs::create_dir_all(&config.directory).map_err(|e| {
        AppError::Io(format!(
            "Failed to create log directory {}: {e}",
            config.directory.display()
        ))
    })?;

    let writer = RotatingFileWriter::open(
        config.directory.join(LOG_FILE_NAME),
        config.max_file_size,
        config.max_files,
    )?;
    let handle = LogHandle::new(writer);

    build_subscriber(config, &handle)?
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to install logger: {e}")))?;

    install_panic_hook(config.directory.join(ERROR_LOG_FILE_NAME));
    Ok(handle)
}

/// Appends panic details to the error log, then defers to the previous hook.
fn install_panic_hook(error_log: PathBuf) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = append_panic_record(&error_log, &info.to_string());
        previous(info);
    }));
}

fn append_panic_record(path: &Path, message: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "{} PANIC {message}",
        chrono::Utc::now().to_rfc3339()
    )?;
    file.sync_all()
}

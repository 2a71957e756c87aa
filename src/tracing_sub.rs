use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;

static LOG_FILE: OnceLock<Arc<Mutex<File>>> = OnceLock::new();

/// Writes to the configured log file, or nowhere. The terminal belongs to the
/// UI while it runs, so stderr is never used.
pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    File(Arc<Mutex<File>>),
    Sink(io::Sink),
}

impl DelegatingWriter {
    fn new() -> Self {
        match LOG_FILE.get() {
            Some(file) => DelegatingWriter {
                inner: DelegatingInner::File(Arc::clone(file)),
            },
            None => DelegatingWriter {
                inner: DelegatingInner::Sink(io::sink()),
            },
        }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            DelegatingInner::File(file) => file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .write(buf),
            DelegatingInner::Sink(sink) => sink.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            DelegatingInner::File(file) => file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .flush(),
            DelegatingInner::Sink(sink) => sink.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize the global subscriber, appending to `log_file` when given.
/// Safe to call multiple times; later calls leave the first subscriber in place.
pub fn init_default(log_file: Option<&Path>) -> io::Result<()> {
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let _ = LOG_FILE.set(Arc::new(Mutex::new(file)));
    }
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(SubscriberMakeWriter)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
    Ok(())
}

//! Bridge between the `log` facade and the session write gate.
//!
//! Handlers are bound to a stream identity, not a stream object. Emission
//! resolves the identity at call time, so records written while a session is
//! active pass through its gate like any direct write, handlers registered
//! mid-session are intercepted too, and nothing needs restoring afterwards:
//! the binding itself never changes.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use once_cell::sync::Lazy;

use crate::core::redirect::{stderr, stdout, RoutedWriter};

/// Where a [`StreamHandler`] sends its records.
pub enum HandlerTarget {
    /// The process stdout, routed through an active session.
    Stdout,
    /// The process stderr, routed through an active session.
    Stderr,
    /// An arbitrary writer, never routed.
    Writer(Box<dyn Write + Send>),
}

/// One log sink: a target plus a level filter.
pub struct StreamHandler {
    target: HandlerTarget,
    level: LevelFilter,
}

impl StreamHandler {
    pub fn stdout() -> Self {
        Self {
            target: HandlerTarget::Stdout,
            level: LevelFilter::Trace,
        }
    }

    pub fn stderr() -> Self {
        Self {
            target: HandlerTarget::Stderr,
            level: LevelFilter::Trace,
        }
    }

    pub fn writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            target: HandlerTarget::Writer(writer),
            level: LevelFilter::Trace,
        }
    }

    /// Drop records above `level` for this handler only.
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    fn accepts(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn emit(&mut self, record: &Record<'_>) {
        if !self.accepts(record.metadata()) {
            return;
        }
        let line = format!("{}\n", record.args());
        match &mut self.target {
            HandlerTarget::Stdout => route(stdout(), &line),
            HandlerTarget::Stderr => route(stderr(), &line),
            HandlerTarget::Writer(writer) => {
                let _ = writer.write_all(line.as_bytes());
                let _ = writer.flush();
            }
        }
    }
}

fn route(writer: RoutedWriter, line: &str) {
    writer.write_text(line);
}

/// A `log::Log` implementation over a runtime-mutable handler list.
///
/// Install once with [`try_init`], then attach handlers with
/// [`add_handler`] at any point, including while a session is running.
pub struct ConsoleLogger {
    handlers: Mutex<Vec<StreamHandler>>,
}

static LOGGER: Lazy<ConsoleLogger> = Lazy::new(|| ConsoleLogger {
    handlers: Mutex::new(Vec::new()),
});

impl ConsoleLogger {
    fn handlers(&self) -> std::sync::MutexGuard<'_, Vec<StreamHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.handlers()
            .iter()
            .any(|handler| handler.accepts(metadata))
    }

    fn log(&self, record: &Record<'_>) {
        for handler in self.handlers().iter_mut() {
            handler.emit(record);
        }
    }

    fn flush(&self) {
        for handler in self.handlers().iter_mut() {
            if let HandlerTarget::Writer(writer) = &mut handler.target {
                let _ = writer.flush();
            }
        }
    }
}

/// Install the console logger as the global `log` backend.
///
/// Fails if another logger is already installed. Safe to call repeatedly
/// from tests; only the first call can succeed.
pub fn try_init() -> Result<(), SetLoggerError> {
    log::set_logger(&*LOGGER).map(|()| log::set_max_level(LevelFilter::Trace))
}

/// Attach a handler. Takes effect for the next emitted record.
pub fn add_handler(handler: StreamHandler) {
    LOGGER.handlers().push(handler);
}

/// Detach every handler.
pub fn clear_handlers() {
    LOGGER.handlers().clear();
}

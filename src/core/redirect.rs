//! Process-global stream redirection.
//!
//! A session installs itself into a single process-wide slot; routed writers
//! and log handlers resolve the slot at write time. The slot is a borrowed
//! global resource with single-owner discipline: installing over an active
//! session is an error, and the guard clears the slot exactly once no matter
//! how the session ends.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::core::session::{SessionError, SessionShared};
use crate::core::stream::StreamId;

static ACTIVE_SESSION: Lazy<Mutex<Option<Arc<SessionShared>>>> = Lazy::new(|| Mutex::new(None));

/// Install `shared` as the process-wide write target.
///
/// Fails when another session is already installed. The returned guard
/// uninstalls on drop.
pub(crate) fn install(shared: Arc<SessionShared>) -> Result<RedirectGuard, SessionError> {
    let mut slot = ACTIVE_SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(SessionError::AlreadyActive);
    }
    *slot = Some(shared);
    Ok(RedirectGuard { _private: () })
}

/// The currently installed session, if any.
pub(crate) fn current() -> Option<Arc<SessionShared>> {
    ACTIVE_SESSION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Clears the redirect slot on drop. Owned by the active session.
#[derive(Debug)]
pub(crate) struct RedirectGuard {
    _private: (),
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        ACTIVE_SESSION
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Writer handle for one of the console streams.
///
/// Resolution happens per write: while a session is active the bytes go
/// through its gate (clearing any pending spinner frame first); otherwise
/// they go straight to the real stream. Obtain handles from
/// [`stdout`](crate::stdout) and [`stderr`](crate::stderr).
#[derive(Debug, Clone, Copy)]
pub struct RoutedWriter {
    id: StreamId,
}

/// A writer for standard output that respects the active spinner session.
pub fn stdout() -> RoutedWriter {
    RoutedWriter {
        id: StreamId::Stdout,
    }
}

/// A writer for standard error that respects the active spinner session.
pub fn stderr() -> RoutedWriter {
    RoutedWriter {
        id: StreamId::Stderr,
    }
}

impl RoutedWriter {
    pub(crate) fn write_text(&self, text: &str) {
        match current() {
            Some(shared) => shared.write(self.id, text),
            None => {
                let _ = self.real_write(text.as_bytes());
            }
        }
    }

    fn real_write(&self, buf: &[u8]) -> io::Result<()> {
        match self.id {
            StreamId::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(buf)?;
                out.flush()
            }
            StreamId::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(buf)?;
                err.flush()
            }
        }
    }
}

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Console output is text; tolerate invalid UTF-8 rather than erroring.
        let text = String::from_utf8_lossy(buf);
        self.write_text(&text);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match current() {
            Some(shared) => {
                shared.lock_gate().flush(self.id);
                Ok(())
            }
            None => match self.id {
                StreamId::Stdout => io::stdout().flush(),
                StreamId::Stderr => io::stderr().flush(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    // Serializes every test that touches the process-global slot, across
    // modules of this crate.
    static LOCK: std::sync::OnceLock<Mutex<()>> = std::sync::OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{current, install, stdout, test_lock};
    use crate::core::gate::OutputGate;
    use crate::core::session::{SessionError, SessionShared};
    use crate::core::stream::ConsoleStream;

    struct Capture {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl ConsoleStream for Capture {
        fn write_str(&mut self, data: &str) {
            self.buffer
                .lock()
                .expect("capture lock poisoned")
                .extend_from_slice(data.as_bytes());
        }

        fn flush(&mut self) {}

        fn is_terminal(&self) -> bool {
            false
        }
    }

    fn shared_with_capture() -> (Arc<SessionShared>, Arc<Mutex<Vec<u8>>>) {
        let out = Arc::new(Mutex::new(Vec::new()));
        let err = Arc::new(Mutex::new(Vec::new()));
        let gate = OutputGate::new(
            Box::new(Capture {
                buffer: Arc::clone(&out),
            }),
            Box::new(Capture { buffer: err }),
            String::new(),
        );
        (Arc::new(SessionShared::new(gate)), out)
    }

    #[test]
    fn install_rejects_a_second_session() {
        let _lock = test_lock();
        let (first, _) = shared_with_capture();
        let (second, _) = shared_with_capture();

        let guard = install(first).expect("first install failed");
        let err = install(second).expect_err("second install succeeded");
        assert!(matches!(err, SessionError::AlreadyActive));

        drop(guard);
        assert!(current().is_none());
    }

    #[test]
    fn routed_writer_reaches_the_installed_session() {
        let _lock = test_lock();
        let (shared, out) = shared_with_capture();
        let guard = install(shared).expect("install failed");

        use std::io::Write;
        writeln!(stdout(), "through the gate").expect("routed write failed");

        drop(guard);
        let captured = out.lock().expect("capture lock poisoned").clone();
        assert_eq!(captured, b"through the gate\n");
        assert!(current().is_none());
    }

    #[test]
    fn guard_uninstalls_exactly_once() {
        let _lock = test_lock();
        let (shared, _) = shared_with_capture();
        let guard = install(Arc::clone(&shared)).expect("install failed");
        assert!(current().is_some());
        drop(guard);
        assert!(current().is_none());

        // The slot is free again for a fresh session.
        let guard = install(shared).expect("reinstall failed");
        assert!(current().is_some());
        drop(guard);
    }
}

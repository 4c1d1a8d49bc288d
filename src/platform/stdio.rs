//! Process-backed console streams.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use crate::core::stream::ConsoleStream;

#[derive(Debug, Clone, Copy)]
enum StdTarget {
    Out,
    Err,
}

/// A [`ConsoleStream`] over the real process stdout or stderr.
///
/// Writes are best-effort: after the first hard I/O error the stream latches
/// off instead of failing the session. With `SPINGATE_WRITE_LOG` set, every
/// write is also appended to that file for replaying exactly what a session
/// put on the wire; logging stops after the first tee failure.
pub struct ProcessStream {
    target: StdTarget,
    write_failed: bool,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
}

impl ProcessStream {
    pub fn stdout() -> Self {
        Self::new(StdTarget::Out)
    }

    pub fn stderr() -> Self {
        Self::new(StdTarget::Err)
    }

    fn new(target: StdTarget) -> Self {
        let write_log_path = match env::var_os("SPINGATE_WRITE_LOG") {
            Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
            _ => None,
        };
        Self {
            target,
            write_failed: false,
            write_log_path,
            write_log_failed: false,
        }
    }

    fn tee_to_write_log(&mut self, data: &str) {
        if self.write_log_failed {
            return;
        }
        if let Some(path) = self.write_log_path.as_ref() {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if result.is_err() {
                self.write_log_failed = true;
            }
        }
    }
}

impl ConsoleStream for ProcessStream {
    fn write_str(&mut self, data: &str) {
        if data.is_empty() || self.write_failed {
            return;
        }
        let result = match self.target {
            StdTarget::Out => io::stdout().lock().write_all(data.as_bytes()),
            StdTarget::Err => io::stderr().lock().write_all(data.as_bytes()),
        };
        if result.is_err() {
            self.write_failed = true;
            return;
        }
        self.tee_to_write_log(data);
    }

    fn flush(&mut self) {
        let _ = match self.target {
            StdTarget::Out => io::stdout().flush(),
            StdTarget::Err => io::stderr().flush(),
        };
    }

    fn is_terminal(&self) -> bool {
        match self.target {
            StdTarget::Out => io::stdout().is_terminal(),
            StdTarget::Err => io::stderr().is_terminal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::ProcessStream;
    use crate::core::stream::ConsoleStream;

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    #[test]
    fn write_log_tee_appends_and_latches_on_failure() {
        let _lock = env_lock();
        let dir = std::env::temp_dir().join(format!("spingate-tee-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("write.log");

        std::env::set_var("SPINGATE_WRITE_LOG", &path);
        let mut stream = ProcessStream::stdout();
        std::env::remove_var("SPINGATE_WRITE_LOG");

        stream.tee_to_write_log("one");
        stream.tee_to_write_log("two");
        let contents = std::fs::read_to_string(&path).expect("read write log");
        assert_eq!(contents, "onetwo");

        // Point the tee somewhere unwritable; the first failure latches it off.
        stream.write_log_path = Some(dir.join("missing").join("write.log"));
        stream.tee_to_write_log("three");
        assert!(stream.write_log_failed);
        stream.tee_to_write_log("four");
        let contents = std::fs::read_to_string(&path).expect("read write log");
        assert_eq!(contents, "onetwo");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_write_is_ignored() {
        let mut stream = ProcessStream::stderr();
        stream.write_str("");
        assert!(!stream.write_failed);
    }
}

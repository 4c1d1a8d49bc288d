#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use spingate::ConsoleStream;

/// In-memory console stream; the buffer stays readable after the session
/// takes ownership of the stream.
pub struct CaptureStream {
    buffer: Arc<Mutex<Vec<u8>>>,
    terminal: bool,
}

impl ConsoleStream for CaptureStream {
    fn write_str(&mut self, data: &str) {
        self.buffer
            .lock()
            .expect("capture lock poisoned")
            .extend_from_slice(data.as_bytes());
    }

    fn flush(&mut self) {}

    fn is_terminal(&self) -> bool {
        self.terminal
    }
}

pub fn capture(terminal: bool) -> (Box<CaptureStream>, Arc<Mutex<Vec<u8>>>) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    (
        Box::new(CaptureStream {
            buffer: Arc::clone(&buffer),
            terminal,
        }),
        buffer,
    )
}

pub fn text(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(buffer.lock().expect("capture lock poisoned").clone())
        .expect("capture not utf-8")
}

/// Sessions install process-global state; tests in one binary must not
/// overlap.
pub fn session_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

//! Console stream trait and stream identities.

/// Names one of the two real console streams a session shadows.
///
/// Identity matching happens at write time: a routed writer or log handler
/// bound to `Stdout` reaches the session proxy while a session is active and
/// the real stream otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamId {
    Stdout,
    Stderr,
}

/// Minimal interface over a real console stream.
///
/// The process-backed implementation lives in `platform::stdio`. Tests inject
/// capture streams to observe the exact byte sequence a session emits.
pub trait ConsoleStream: Send {
    /// Write `data` to the stream. Implementations are best-effort: a stream
    /// that fails must not panic the session.
    fn write_str(&mut self, data: &str);

    /// Flush any buffered output.
    fn flush(&mut self);

    /// Whether the stream is attached to an interactive terminal.
    fn is_terminal(&self) -> bool;
}

//! The single write gate over the real console streams.
//!
//! Invariant: while a session exists, every byte that reaches a real stream
//! flows through a method on `OutputGate`, and the gate is only reachable
//! through the session mutex. The spinner thread and every proxied writer
//! therefore serialize on one lock, and no write can land mid-frame.

use unicode_width::UnicodeWidthStr;

use crate::core::stream::{ConsoleStream, StreamId};

pub(crate) const HIDE_CURSOR: &str = "\x1b[?25l";
pub(crate) const SHOW_CURSOR: &str = "\x1b[?25h";

pub(crate) struct OutputGate {
    stdout: Box<dyn ConsoleStream>,
    stderr: Box<dyn ConsoleStream>,
    prefix: String,
    clear_width: usize,
    cursor_at_start: bool,
    frames_enabled: bool,
}

impl OutputGate {
    pub(crate) fn new(
        stdout: Box<dyn ConsoleStream>,
        stderr: Box<dyn ConsoleStream>,
        prefix: String,
    ) -> Self {
        // Two extra columns cover the glyph itself, which may be double-width.
        let clear_width = UnicodeWidthStr::width(prefix.as_str()) + 2;
        Self {
            stdout,
            stderr,
            prefix,
            clear_width,
            cursor_at_start: true,
            frames_enabled: false,
        }
    }

    /// True when the current terminal line is clean: the only thing on it is
    /// a spinner frame, or nothing at all. Painting is safe exactly then.
    pub(crate) fn cursor_at_start(&self) -> bool {
        self.cursor_at_start
    }

    pub(crate) fn frames_enabled(&self) -> bool {
        self.frames_enabled
    }

    /// Enable or disable frame painting and clearing. Disabled outside a
    /// session and whenever stdout is not an interactive terminal, so
    /// redirected output never sees `\r` sequences.
    pub(crate) fn set_frames_enabled(&mut self, enabled: bool) {
        self.frames_enabled = enabled;
    }

    pub(crate) fn stdout_is_terminal(&self) -> bool {
        self.stdout.is_terminal()
    }

    /// Write caller text to the stream named by `id`.
    ///
    /// Clears a pending spinner frame first when the line is clean, then
    /// writes `text` verbatim and records whether the line ended clean. A
    /// write never appears mid-frame because the caller holds the gate lock
    /// for the whole operation.
    pub(crate) fn write(&mut self, id: StreamId, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.cursor_at_start && self.frames_enabled {
            self.clear_frame();
        }
        let stream = self.stream_mut(id);
        stream.write_str(text);
        stream.flush();
        self.cursor_at_start = text.ends_with('\n');
    }

    pub(crate) fn flush(&mut self, id: StreamId) {
        self.stream_mut(id).flush();
    }

    /// Paint one spinner frame at the start of the current line.
    ///
    /// Callers must have checked `cursor_at_start` under the same lock.
    pub(crate) fn paint(&mut self, frame: &str) {
        let line = format!("\r{}{}", self.prefix, frame);
        self.stdout.write_str(&line);
        self.stdout.flush();
    }

    /// Overwrite the last painted frame with spaces and return to column 0.
    pub(crate) fn clear_frame(&mut self) {
        let clear = format!("\r{}\r", " ".repeat(self.clear_width));
        self.stdout.write_str(&clear);
        self.stdout.flush();
    }

    /// Emit a control sequence on stdout without touching the line state.
    pub(crate) fn write_control(&mut self, sequence: &str) {
        self.stdout.write_str(sequence);
        self.stdout.flush();
    }

    fn stream_mut(&mut self, id: StreamId) -> &mut Box<dyn ConsoleStream> {
        match id {
            StreamId::Stdout => &mut self.stdout,
            StreamId::Stderr => &mut self.stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::OutputGate;
    use crate::core::stream::{ConsoleStream, StreamId};

    struct SharedCapture {
        buffer: Arc<Mutex<Vec<u8>>>,
        terminal: bool,
    }

    impl ConsoleStream for SharedCapture {
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

    fn gate_with_captures(prefix: &str) -> (OutputGate, Arc<Mutex<Vec<u8>>>, Arc<Mutex<Vec<u8>>>) {
        let out = Arc::new(Mutex::new(Vec::new()));
        let err = Arc::new(Mutex::new(Vec::new()));
        let gate = OutputGate::new(
            Box::new(SharedCapture {
                buffer: Arc::clone(&out),
                terminal: true,
            }),
            Box::new(SharedCapture {
                buffer: Arc::clone(&err),
                terminal: true,
            }),
            prefix.to_string(),
        );
        (gate, out, err)
    }

    fn text(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().expect("capture lock poisoned").clone())
            .expect("capture not utf-8")
    }

    #[test]
    fn write_tracks_trailing_newline() {
        let (mut gate, _out, _err) = gate_with_captures("");
        assert!(gate.cursor_at_start());

        gate.write(StreamId::Stdout, "partial");
        assert!(!gate.cursor_at_start());

        gate.write(StreamId::Stdout, " line\n");
        assert!(gate.cursor_at_start());

        gate.write(StreamId::Stdout, "a\nb\nc");
        assert!(!gate.cursor_at_start());
    }

    #[test]
    fn empty_write_is_a_no_op() {
        let (mut gate, out, _err) = gate_with_captures("Loading ");
        gate.set_frames_enabled(true);
        gate.write(StreamId::Stdout, "");
        assert!(text(&out).is_empty());
        assert!(gate.cursor_at_start());
    }

    #[test]
    fn clean_line_is_cleared_before_user_text() {
        let (mut gate, out, _err) = gate_with_captures("Loading ");
        gate.set_frames_enabled(true);
        gate.paint("|");
        gate.write(StreamId::Stdout, "hello\n");

        // "Loading " is 8 columns, plus 2 for the glyph.
        let expected = format!("\rLoading |\r{}\rhello\n", " ".repeat(10));
        assert_eq!(text(&out), expected);
    }

    #[test]
    fn dirty_line_is_not_cleared() {
        let (mut gate, out, _err) = gate_with_captures("Loading ");
        gate.set_frames_enabled(true);
        gate.write(StreamId::Stdout, "partial");
        gate.write(StreamId::Stdout, " more\n");
        assert!(!text(&out).contains('\r'));
    }

    #[test]
    fn stderr_write_clears_the_stdout_frame() {
        let (mut gate, out, err) = gate_with_captures("");
        gate.set_frames_enabled(true);
        gate.paint("|");
        gate.write(StreamId::Stderr, "oops\n");

        assert!(text(&out).ends_with("\r  \r"), "stdout: {:?}", text(&out));
        assert_eq!(text(&err), "oops\n");
    }

    #[test]
    fn frames_disabled_suppresses_clear_sequences() {
        let (mut gate, out, _err) = gate_with_captures("Loading ");
        gate.write(StreamId::Stdout, "hello\n");
        gate.write(StreamId::Stdout, "world\n");
        assert_eq!(text(&out), "hello\nworld\n");
    }

    #[test]
    fn clear_width_uses_display_columns() {
        // "漢" is one char but two columns wide.
        let (mut gate, out, _err) = gate_with_captures("漢 ");
        gate.set_frames_enabled(true);
        gate.paint("|");
        gate.write(StreamId::Stdout, "x\n");
        let expected = format!("\r漢 |\r{}\rx\n", " ".repeat(5));
        assert_eq!(text(&out), expected);
    }
}

//! Session configuration.

use std::env;
use std::time::Duration;

use crate::core::frames::FrameSet;

/// Options for one spinner session.
///
/// All fields are validated at build time; a config handed to a session is
/// final. The builder methods consume and return `self`:
///
/// ```
/// use spingate::SpinnerConfig;
///
/// let config = SpinnerConfig::new()
///     .start("Loading")
///     .end("Done");
/// ```
#[derive(Debug, Clone)]
pub struct SpinnerConfig {
    pub(crate) start: Option<String>,
    pub(crate) end: Option<String>,
    pub(crate) loaded: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) frames: FrameSet,
    pub(crate) interval: Duration,
    pub(crate) hide_cursor: bool,
    pub(crate) cleanup_on_signal: bool,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            loaded: None,
            error: None,
            frames: FrameSet::default(),
            interval: Duration::from_millis(100),
            hide_cursor: true,
            cleanup_on_signal: false,
        }
    }
}

impl SpinnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label painted before the spinner glyph.
    pub fn start(mut self, label: impl Into<String>) -> Self {
        self.start = Some(label.into());
        self
    }

    /// Message printed after a successful run.
    pub fn end(mut self, message: impl Into<String>) -> Self {
        self.end = Some(message.into());
        self
    }

    /// Fallback success message used when no `end` message is set.
    pub fn loaded(mut self, message: impl Into<String>) -> Self {
        self.loaded = Some(message.into());
        self
    }

    /// Message printed when the work fails. Setting this makes the session
    /// report failures instead of propagating them.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn frames(mut self, frames: FrameSet) -> Self {
        self.frames = frames;
        self
    }

    /// Shorthand for [`FrameSet::from_glyphs`].
    pub fn frames_str(mut self, glyphs: &str) -> Self {
        self.frames = FrameSet::from_glyphs(glyphs);
        self
    }

    /// Frame period.
    ///
    /// # Panics
    ///
    /// Panics on a zero interval; the render loop must sleep between frames.
    pub fn interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "spinner interval must be non-zero");
        self.interval = interval;
        self
    }

    /// Hide the terminal cursor while the spinner runs. Only takes effect
    /// when stdout is an interactive terminal.
    pub fn hide_cursor(mut self, hide: bool) -> Self {
        self.hide_cursor = hide;
        self
    }

    /// Also restore the cursor when the process is killed by SIGINT or
    /// SIGTERM mid-session. Off by default; it spawns a signal-watcher
    /// thread for the session's duration.
    pub fn cleanup_on_signal(mut self, enabled: bool) -> Self {
        self.cleanup_on_signal = enabled;
        self
    }

    /// The success message: `end` when present, else `loaded`.
    pub(crate) fn done_text(&self) -> Option<&str> {
        self.end.as_deref().or(self.loaded.as_deref())
    }
}

/// Environment switches, read once per session activation.
#[derive(Debug, Clone)]
pub(crate) struct EnvConfig {
    /// `SPINGATE_DISABLE=1`: suppress the render thread and cursor escapes.
    /// Proxying and terminal messages still work, so CI logs stay clean
    /// without code changes.
    pub(crate) disable: bool,
}

impl EnvConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            disable: env_flag("SPINGATE_DISABLE"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

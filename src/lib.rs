//! Console spinner sessions with a single write gate.
//!
//! Invariant: while a session is active, every byte that reaches the real
//! stdout or stderr flows through the session's gate lock. The spinner
//! thread, direct writes through [`stdout`]/[`stderr`], and `log` records
//! emitted through [`logging`] all serialize on that one lock, so user text
//! never lands mid-frame and redirected output never contains spinner
//! artifacts.
//!
//! # Quick start
//!
//! ```no_run
//! use spingate::{spin, SpinnerConfig};
//!
//! let answer = spin(
//!     SpinnerConfig::new().start("Thinking").end("Done"),
//!     || {
//!         // Slow work; anything it prints via spingate::stdout() or the
//!         // log facade stays legible while the spinner runs.
//!         42
//!     },
//! );
//! assert_eq!(answer, 42);
//! ```
//!
//! Fallible work goes through [`Session::run`], which either reports the
//! failure (when an `error` message is configured) or propagates the exact
//! error value to the caller.
//!
//! Sessions do not nest: activating a second session while one is running
//! panics. One session per process at a time.

use std::convert::Infallible;

pub mod config;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;

/// Session options builder.
pub use crate::config::SpinnerConfig;

/// Spinner glyph sequences.
pub use crate::core::frames::FrameSet;

/// Session-aware writer handles for the console streams.
pub use crate::core::redirect::{stderr, stdout, RoutedWriter};

/// Session controller and outcomes.
pub use crate::core::session::{Outcome, Session, SessionError};

/// Stream seam for injecting test streams.
pub use crate::core::stream::{ConsoleStream, StreamId};

/// Process-backed streams and crash cleanup.
pub use crate::platform::hooks::{install_signal_cleanup, SignalCleanupGuard};
pub use crate::platform::stdio::ProcessStream;

/// Run infallible `work` with a spinner, returning its value.
///
/// Convenience wrapper over [`Session::run`] for work that cannot fail.
///
/// # Panics
///
/// Panics if another session is already active in this process.
pub fn spin<T, F>(config: SpinnerConfig, work: F) -> T
where
    F: FnOnce() -> T,
{
    match Session::new(config).run(|| Ok::<T, Infallible>(work())) {
        Ok(Outcome::Completed(value)) => value,
        Ok(Outcome::Reported(never)) | Err(never) => match never {},
    }
}

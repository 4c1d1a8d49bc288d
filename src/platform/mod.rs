//! Platform integrations: real process streams and crash cleanup.

pub mod hooks;
pub mod stdio;

pub use hooks::{install_signal_cleanup, SignalCleanupGuard};
pub use stdio::ProcessStream;

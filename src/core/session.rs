//! Session controller: setup, the wrapped call, and guaranteed teardown.

use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error as ThisError;

use crate::config::{EnvConfig, SpinnerConfig};
use crate::core::gate::{OutputGate, HIDE_CURSOR, SHOW_CURSOR};
use crate::core::redirect::{self, RedirectGuard};
use crate::core::stream::{ConsoleStream, StreamId};
use crate::platform::hooks::{self, PanicCleanupGuard, SignalCleanupGuard};
use crate::platform::stdio::ProcessStream;
use crate::render::RenderLoop;

#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("a spinner session is already active in this process")]
    AlreadyActive,
}

/// How a session's wrapped work ended when it did not propagate.
#[derive(Debug)]
pub enum Outcome<T, E> {
    /// The work returned a value. Any configured done message was printed.
    Completed(T),
    /// The work failed and the failure was reported through the configured
    /// error message. The error is returned for inspection instead of
    /// propagating.
    Reported(E),
}

impl<T, E> Outcome<T, E> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Reported(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Completed(value) => Ok(value),
            Outcome::Reported(error) => Err(error),
        }
    }
}

/// State shared between the caller's thread, the render loop, and every
/// proxied writer: the gate behind its mutex, and the stop flag.
pub(crate) struct SessionShared {
    gate: Mutex<OutputGate>,
    pub(crate) stop: AtomicBool,
}

impl SessionShared {
    pub(crate) fn new(gate: OutputGate) -> Self {
        Self {
            gate: Mutex::new(gate),
            stop: AtomicBool::new(false),
        }
    }

    /// Lock the gate, recovering from poisoning. Teardown and proxied writes
    /// must keep working even after a panic on some other thread.
    pub(crate) fn lock_gate(&self) -> MutexGuard<'_, OutputGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self, id: StreamId, text: &str) {
        self.lock_gate().write(id, text);
    }
}

/// One spinner session around one unit of work.
///
/// Built from a [`SpinnerConfig`], run once with [`Session::run`], and gone
/// afterwards. Streams default to the process stdout/stderr; tests inject
/// capture streams through [`Session::with_streams`].
pub struct Session {
    config: SpinnerConfig,
    shared: Arc<SessionShared>,
}

impl Session {
    pub fn new(config: SpinnerConfig) -> Self {
        Self::with_streams(
            config,
            Box::new(ProcessStream::stdout()),
            Box::new(ProcessStream::stderr()),
        )
    }

    pub fn with_streams(
        config: SpinnerConfig,
        stdout: Box<dyn ConsoleStream>,
        stderr: Box<dyn ConsoleStream>,
    ) -> Self {
        let prefix = config
            .start
            .as_ref()
            .map(|label| format!("{label} "))
            .unwrap_or_default();
        let gate = OutputGate::new(stdout, stderr, prefix);
        Self {
            config,
            shared: Arc::new(SessionShared::new(gate)),
        }
    }

    /// Run `work` with the spinner active, then tear everything down and
    /// print the configured terminal message.
    ///
    /// On `Ok`, returns [`Outcome::Completed`]. On `Err` with an `error`
    /// message configured, prints the message and the failure's diagnostic
    /// chain and returns [`Outcome::Reported`]; without one, the identical
    /// error value propagates as `Err`. Teardown runs on every path,
    /// including unwinding panics, which are never swallowed.
    ///
    /// # Panics
    ///
    /// Panics if another session is already active in this process. Nested
    /// sessions are rejected rather than composed.
    pub fn run<T, E, F>(self, work: F) -> Result<Outcome<T, E>, E>
    where
        E: Error,
        F: FnOnce() -> Result<T, E>,
    {
        let active = self.activate();
        let result = work();
        active.finish(result)
    }

    fn activate(self) -> ActiveSession {
        let Session { config, shared } = self;
        let env = EnvConfig::from_env();

        // Reject nesting before any terminal state changes.
        let redirect = redirect::install(Arc::clone(&shared)).unwrap_or_else(|err| panic!("{err}"));

        let interactive = shared.lock_gate().stdout_is_terminal() && !env.disable;
        let hide = config.hide_cursor && interactive;

        let mut panic_guard = None;
        let mut signal_guard = None;
        if hide {
            shared.lock_gate().write_control(HIDE_CURSOR);
            panic_guard = Some(hooks::install_panic_cleanup(hooks::show_cursor_best_effort));
            if config.cleanup_on_signal {
                signal_guard = Some(hooks::install_signal_cleanup(
                    hooks::show_cursor_best_effort,
                ));
            }
        }

        let mut render = None;
        if interactive {
            shared.lock_gate().set_frames_enabled(true);
            render = Some(RenderLoop::spawn(
                Arc::clone(&shared),
                config.frames.clone(),
                config.interval,
            ));
        }

        ActiveSession {
            shared,
            done_text: config.done_text().map(str::to_string),
            error_text: config.error.clone(),
            hide,
            render,
            redirect: Some(redirect),
            panic_guard,
            signal_guard,
            finished: false,
        }
    }
}

/// A running session. Dropping it tears the terminal state down; `finish`
/// additionally prints the configured terminal message.
struct ActiveSession {
    shared: Arc<SessionShared>,
    done_text: Option<String>,
    error_text: Option<String>,
    hide: bool,
    render: Option<RenderLoop>,
    redirect: Option<RedirectGuard>,
    panic_guard: Option<PanicCleanupGuard>,
    signal_guard: Option<SignalCleanupGuard>,
    finished: bool,
}

impl ActiveSession {
    fn finish<T, E>(mut self, result: Result<T, E>) -> Result<Outcome<T, E>, E>
    where
        E: Error,
    {
        self.shutdown();
        match result {
            Ok(value) => {
                if let Some(done) = self.done_text.take() {
                    self.shared.write(StreamId::Stdout, &format!("{done}\n"));
                }
                Ok(Outcome::Completed(value))
            }
            Err(error) => match self.error_text.take() {
                Some(message) => {
                    self.shared.write(StreamId::Stdout, &format!("{message}\n"));
                    self.shared
                        .write(StreamId::Stderr, &render_error_chain(&error));
                    Ok(Outcome::Reported(error))
                }
                None => Err(error),
            },
        }
    }

    /// Restore every piece of terminal state, exactly once.
    ///
    /// Each step is independent: a failure in one must not skip the rest, so
    /// nothing here propagates and every lock recovers from poisoning.
    fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        // Stop and join the render loop; only then is the trailing frame
        // removable deterministically.
        if let Some(mut render) = self.render.take() {
            render.stop();
        }

        {
            let mut gate = self.shared.lock_gate();
            if gate.cursor_at_start() {
                if gate.frames_enabled() {
                    gate.clear_frame();
                }
            } else {
                // A partial user line is on screen; the final message needs
                // its own line.
                gate.write(StreamId::Stdout, "\n");
            }
            gate.set_frames_enabled(false);
        }

        // Uninstall the redirect before the final message so it goes to the
        // restored streams.
        self.redirect.take();

        if self.hide {
            self.shared.lock_gate().write_control(SHOW_CURSOR);
        }

        self.signal_guard.take();
        self.panic_guard.take();
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Message and cause chain for a reported failure, one line per link.
fn render_error_chain<E: Error>(error: &E) -> String {
    let mut detail = format!("Error: {error}\n");
    let mut source = error.source();
    while let Some(cause) = source {
        detail.push_str(&format!("Caused by: {cause}\n"));
        source = cause.source();
    }
    detail
}

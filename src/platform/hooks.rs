//! Crash-path cleanup: cursor restoration on panic and, opt-in, on signals.
//!
//! Cleanup writers here are intentionally best-effort: they never panic,
//! never block, and never touch the session lock, which may be held or
//! poisoned at crash time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once, PoisonError};

use crate::core::gate::SHOW_CURSOR;

type Cleanup = Arc<dyn Fn() + Send + Sync>;

struct ActiveCleanup {
    cleanup: Cleanup,
    ran: Arc<AtomicBool>,
    token: u64,
}

static CLEANUP_SLOT: Mutex<Option<ActiveCleanup>> = Mutex::new(None);
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
static HOOK_INIT: Once = Once::new();

fn slot() -> std::sync::MutexGuard<'static, Option<ActiveCleanup>> {
    CLEANUP_SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_active_cleanup() {
    if let Some(active) = slot().as_ref() {
        if !active.ran.swap(true, Ordering::SeqCst) {
            (active.cleanup)();
        }
    }
}

/// Register `cleanup` to run once if the process panics.
///
/// The process panic hook is wrapped a single time for the whole program; it
/// consults the current registration and then delegates to the hook that was
/// installed before ours, so existing panic output is preserved. The guard
/// deregisters on drop. One registration at a time; sessions do not nest, so
/// a second install replaces the first.
pub(crate) fn install_panic_cleanup<F>(cleanup: F) -> PanicCleanupGuard
where
    F: Fn() + Send + Sync + 'static,
{
    HOOK_INIT.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            run_active_cleanup();
            previous(info);
        }));
    });

    let token = NEXT_TOKEN.fetch_add(1, Ordering::SeqCst);
    *slot() = Some(ActiveCleanup {
        cleanup: Arc::new(cleanup),
        ran: Arc::new(AtomicBool::new(false)),
        token,
    });
    PanicCleanupGuard { token }
}

pub(crate) struct PanicCleanupGuard {
    token: u64,
}

impl Drop for PanicCleanupGuard {
    fn drop(&mut self) {
        let mut slot = slot();
        if slot.as_ref().map(|active| active.token) == Some(self.token) {
            slot.take();
        }
    }
}

/// Best-effort cursor-show for crash paths.
///
/// Targets the controlling TTY directly: the cursor was only hidden when
/// stdout was an interactive terminal, and `/dev/tty` reaches it even if the
/// crash handler runs with the session gate unavailable.
pub(crate) fn show_cursor_best_effort() {
    HookStream::new().write_best_effort(SHOW_CURSOR);
}

#[cfg(unix)]
struct HookStream {
    fd: libc::c_int,
    owns_fd: bool,
}

#[cfg(unix)]
impl HookStream {
    fn new() -> Self {
        // Non-blocking so crash cleanup can never hang on a full pipe.
        let flags = libc::O_WRONLY | libc::O_NONBLOCK | libc::O_NOCTTY | libc::O_CLOEXEC;
        let fd = unsafe { libc::open(c"/dev/tty".as_ptr(), flags) };
        if fd >= 0 {
            Self { fd, owns_fd: true }
        } else {
            Self {
                fd: -1,
                owns_fd: false,
            }
        }
    }

    fn write_best_effort(&self, data: &str) {
        if self.fd < 0 || data.is_empty() {
            return;
        }
        let bytes = data.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            let remaining = &bytes[written..];
            let result = unsafe {
                libc::write(
                    self.fd,
                    remaining.as_ptr() as *const libc::c_void,
                    remaining.len(),
                )
            };
            if result > 0 {
                written = written.saturating_add(result as usize);
                continue;
            }
            if result == 0 {
                break;
            }
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            // WouldBlock or anything else: drop the rest rather than spin.
            break;
        }
    }
}

#[cfg(unix)]
impl Drop for HookStream {
    fn drop(&mut self) {
        if self.owns_fd {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

#[cfg(not(unix))]
struct HookStream;

#[cfg(not(unix))]
impl HookStream {
    fn new() -> Self {
        Self
    }

    fn write_best_effort(&self, _data: &str) {}
}

/// Run `cleanup` once if the process receives SIGINT or SIGTERM, then let
/// the default disposition terminate the process as it would have.
///
/// Opt-in via [`SpinnerConfig::cleanup_on_signal`]; it spawns a watcher
/// thread that lives until the guard drops.
///
/// [`SpinnerConfig::cleanup_on_signal`]: crate::SpinnerConfig::cleanup_on_signal
#[cfg(unix)]
pub fn install_signal_cleanup<F>(cleanup: F) -> SignalCleanupGuard
where
    F: Fn() + Send + Sync + 'static,
{
    use signal_hook::iterator::Signals;

    let cleanup: Cleanup = Arc::new(cleanup);
    let ran = Arc::new(AtomicBool::new(false));
    let mut signals =
        Signals::new([libc::SIGINT, libc::SIGTERM]).expect("failed to register signal handlers");
    let handle = signals.handle();

    let thread = std::thread::spawn(move || {
        for signal in signals.forever() {
            if !ran.swap(true, Ordering::SeqCst) {
                cleanup();
            }
            let _ = signal_hook::low_level::emulate_default_handler(signal);
        }
    });

    SignalCleanupGuard {
        handle: Some(handle),
        thread: Some(thread),
    }
}

#[cfg(unix)]
pub struct SignalCleanupGuard {
    handle: Option<signal_hook::iterator::Handle>,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalCleanupGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(not(unix))]
pub fn install_signal_cleanup<F>(_cleanup: F) -> SignalCleanupGuard
where
    F: Fn() + Send + Sync + 'static,
{
    SignalCleanupGuard {}
}

#[cfg(not(unix))]
pub struct SignalCleanupGuard {}

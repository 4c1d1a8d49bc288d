//! Background render loop for the spinner.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::frames::FrameSet;
use crate::core::session::SessionShared;

/// Owns the spinner thread. The controller stops it with [`RenderLoop::stop`]
/// before removing the trailing frame; dropping it stops it too.
pub(crate) struct RenderLoop {
    shared: Arc<SessionShared>,
    thread: Option<JoinHandle<()>>,
}

impl RenderLoop {
    /// Spawn the render thread.
    ///
    /// Each iteration checks the stop flag, paints one frame under the gate
    /// lock when the line is clean, then sleeps for `interval`. Worst-case
    /// shutdown latency is one interval. The frame advances only when a
    /// frame was actually painted.
    pub(crate) fn spawn(
        shared: Arc<SessionShared>,
        frames: FrameSet,
        interval: Duration,
    ) -> Self {
        let loop_shared = Arc::clone(&shared);
        let thread = thread::spawn(move || {
            let mut tick = 0usize;
            while !loop_shared.stop.load(Ordering::SeqCst) {
                {
                    let mut gate = loop_shared.lock_gate();
                    if gate.cursor_at_start() {
                        gate.paint(frames.get(tick));
                        tick = tick.wrapping_add(1);
                    }
                }
                thread::sleep(interval);
            }
        });
        Self {
            shared,
            thread: Some(thread),
        }
    }

    /// Signal the thread and wait for it to observe the flag.
    ///
    /// No ordering holds between the signal and the last painted frame; the
    /// controller clears the line after this returns.
    pub(crate) fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

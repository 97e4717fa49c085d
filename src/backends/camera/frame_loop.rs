// SPDX-License-Identifier: GPL-3.0-only

//! Preview frame loop thread
//!
//! Streaming drivers block in their dequeue call, so the preview loop runs
//! on its own thread and publishes decoded frames into a [`LatestFrame`]
//! slot that the UI and the photo path read from.

use super::types::CameraFrame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// What the loop body wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Single-slot mailbox holding the newest frame
///
/// Older frames are simply replaced; nothing queues up if the reader is slow.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    slot: Arc<Mutex<Option<Arc<CameraFrame>>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: CameraFrame) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(Arc::new(frame));
        }
    }

    pub fn get(&self) -> Option<Arc<CameraFrame>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

/// Handle to a running frame loop thread
///
/// Dropping the handle stops the loop and joins the thread.
pub struct FrameLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl FrameLoop {
    /// Spawn a loop thread
    ///
    /// `init_fn` runs once on the new thread and builds per-thread state
    /// (e.g. a driver stream that must not cross threads). `start` waits for
    /// it: if it fails the thread exits without calling `step_fn` and the
    /// error is returned here.
    pub fn start<S, E, I, F>(name: &str, init_fn: I, mut step_fn: F) -> Result<Self, E>
    where
        S: 'static,
        E: std::fmt::Display + Send + 'static,
        I: FnOnce() -> Result<S, E> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), E>>(1);

        info!(name = %name, "Starting frame loop");

        let thread_handle = thread::spawn(move || {
            let mut state = match init_fn() {
                Ok(s) => {
                    let _ = ready_tx.send(Ok(()));
                    s
                }
                Err(e) => {
                    warn!(name = %thread_name, error = %e, "Frame loop initialization failed");
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            while !thread_stop.load(Ordering::SeqCst) {
                if step_fn(&mut state) == LoopAction::Stop {
                    debug!(name = %thread_name, "Frame loop requested stop");
                    break;
                }
            }

            info!(name = %thread_name, "Frame loop thread exiting");
        });

        let mut frame_loop = Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(frame_loop),
            Ok(Err(e)) => {
                frame_loop.stop();
                Err(e)
            }
            Err(_) => {
                // Sender dropped without a message: init_fn panicked
                match frame_loop.thread_handle.take().map(JoinHandle::join) {
                    Some(Err(payload)) => std::panic::resume_unwind(payload),
                    _ => Ok(frame_loop),
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for frame loop thread");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}

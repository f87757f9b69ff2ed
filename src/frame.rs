// LibriSync - Audible Library Sync for Mobile
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Animation frame fallback scheduler
//!
//! Timer-based stand-in for `requestAnimationFrame` / `cancelAnimationFrame`
//! on hosts without a native frame signal. It is a rate limiter, not vsync:
//! each request fires after
//!
//! ```text
//! delay = max(0, FRAME_INTERVAL_MS - (now - last))
//! last  = now + delay
//! ```
//!
//! and the callback receives `now + delay` as its timestamp.
//!
//! # Shared timeline
//! Schedulers built with [`FrameScheduler::new`] (system clock) share one
//! process-wide "last scheduled time", starting at zero and never reset.
//! [`FrameScheduler::with_clock`] gives a scheduler its own timeline.
//!
//! # Timers
//! Callbacks run on Tokio tasks sleeping on `tokio::time`; cancelling a
//! frame aborts its task.

use crate::error::{PrefsError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Minimum spacing between successive frames, in milliseconds (~60 fps)
pub const FRAME_INTERVAL_MS: i64 = 16;

lazy_static::lazy_static! {
    static ref LAST_FRAME_TIME: Arc<Mutex<i64>> = Arc::new(Mutex::new(0));
}

/// Millisecond wall clock
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Unix-epoch milliseconds from the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Opaque handle for a scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

type PendingFrames = Arc<Mutex<HashMap<u64, AbortHandle>>>;

/// Rate-limited frame callback scheduler
pub struct FrameScheduler {
    clock: Arc<dyn Clock>,
    runtime: Handle,
    last_time: Arc<Mutex<i64>>,
    next_id: AtomicU64,
    pending: PendingFrames,
}

impl FrameScheduler {
    /// Scheduler on the system clock, sharing the process-wide timeline
    pub fn new(runtime: Handle) -> Self {
        Self::build(runtime, Arc::new(SystemClock), Arc::clone(&LAST_FRAME_TIME))
    }

    /// Scheduler bound to the runtime of the calling task
    ///
    /// # Errors
    /// Returns `InvalidState` when called outside a Tokio runtime.
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            PrefsError::InvalidState(format!("No Tokio runtime for frame timers: {}", e))
        })?;
        Ok(Self::new(runtime))
    }

    /// Scheduler with a custom clock and a private timeline starting at zero
    pub fn with_clock(runtime: Handle, clock: Arc<dyn Clock>) -> Self {
        Self::build(runtime, clock, Arc::new(Mutex::new(0)))
    }

    fn build(runtime: Handle, clock: Arc<dyn Clock>, last_time: Arc<Mutex<i64>>) -> Self {
        Self {
            clock,
            runtime,
            last_time,
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `callback(timestamp_ms)` on the next frame slot
    pub fn schedule_frame<F>(&self, callback: F) -> Result<FrameHandle>
    where
        F: FnOnce(i64) + Send + 'static,
    {
        let now = self.clock.now_millis();
        let (delay, fire_at) = {
            let mut last = self
                .last_time
                .lock()
                .map_err(|_| PrefsError::poisoned("frame timeline"))?;
            let delay = (FRAME_INTERVAL_MS - (now - *last)).max(0);
            *last = now + delay;
            (delay, now + delay)
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Hold the pending map while spawning so the task cannot look itself
        // up before it is registered.
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| PrefsError::poisoned("pending frames"))?;

        let registry = Arc::clone(&self.pending);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;

            let still_pending = registry
                .lock()
                .map(|mut frames| frames.remove(&id).is_some())
                .unwrap_or(false);
            if still_pending {
                callback(fire_at);
            }
        });
        pending.insert(id, task.abort_handle());

        log::trace!("Scheduled frame {} in {} ms", id, delay);

        Ok(FrameHandle(id))
    }

    /// Cancel a frame that has not fired yet; no-op otherwise
    pub fn cancel_frame(&self, handle: FrameHandle) {
        let removed = self
            .pending
            .lock()
            .ok()
            .and_then(|mut frames| frames.remove(&handle.0));

        if let Some(task) = removed {
            task.abort();
            log::trace!("Cancelled frame {}", handle.0);
        }
    }

    /// Whether `handle` is still waiting to fire
    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending
            .lock()
            .map(|frames| frames.contains_key(&handle.0))
            .unwrap_or(false)
    }

    /// Number of frames waiting to fire
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|frames| frames.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

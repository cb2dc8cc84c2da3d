// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-shot, cancellable timer used to drive recurring polls.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Holds at most one pending timer task.
///
/// Scheduling replaces (and aborts) whatever was pending. Every scheduled
/// task receives a generation number; a task that starts running calls
/// [`release`](Self::release) with it so that cancelling afterwards never
/// aborts the running task itself.
#[derive(Debug, Default)]
pub struct PollTimer {
    slot: Mutex<Option<Pending>>,
    next_generation: AtomicU64,
}

impl PollTimer {
    /// Creates a timer with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay`, replacing any pending timer.
    ///
    /// Returns the generation handed to `task`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F, Fut>(&self, delay: Duration, task: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task(generation).await;
        });

        let previous = self.slot.lock().replace(Pending { generation, handle });
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        generation
    }

    /// Aborts the pending timer, if any.
    ///
    /// Returns true if a timer was pending.
    pub fn cancel(&self) -> bool {
        let pending = self.slot.lock().take();
        pending.is_some_and(|pending| {
            pending.handle.abort();
            true
        })
    }

    /// Forgets the pending timer if it is still `generation`, without
    /// aborting it.
    ///
    /// Returns false if another timer was scheduled in the meantime.
    pub fn release(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|p| p.generation == generation) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Returns true if a timer is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        if let Some(pending) = self.slot.get_mut().take() {
            pending.handle.abort();
        }
    }
}

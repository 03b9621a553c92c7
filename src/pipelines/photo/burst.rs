// SPDX-License-Identifier: GPL-3.0-only

//! Burst capture pacing
//!
//! While the shutter is held a [`BurstTimer`] ticks at a fixed interval. It
//! does not capture on its own: each tick is handed to a callback (the
//! controller forwards it as a message) tagged with the burst generation, so
//! the main context decides whether the tick still counts.
//!
//! Cancellation is explicit. The timer task selects between the next tick and
//! a cancel signal, checked before every tick; dropping the timer cancels it.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Repeating burst tick source
pub struct BurstTimer {
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl BurstTimer {
    /// Start ticking every `interval`, first tick one interval from now
    ///
    /// `on_tick` returns `false` to stop the timer (e.g. the receiver is gone).
    /// Must be called from within a tokio runtime.
    pub fn start<F>(generation: u64, interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let first = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(first, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => {
                        debug!(generation, ticks, "Burst timer cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        ticks += 1;
                        if !on_tick(generation) {
                            debug!(generation, ticks, "Burst tick receiver closed");
                            break;
                        }
                    }
                }
            }
        });

        debug!(generation, interval_ms = interval.as_millis() as u64, "Burst timer started");

        Self {
            generation,
            cancel: Some(cancel_tx),
            task,
        }
    }

    /// Generation tag carried by every tick of this timer
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the timer task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the timer; no tick fires after the task observes the signal
    pub fn cancel(mut self) {
        self.signal_cancel();
    }

    fn signal_cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for BurstTimer {
    fn drop(&mut self) {
        self.signal_cancel();
    }
}

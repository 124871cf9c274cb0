//! Cancellable periodic background tasks.
//!
//! Used for the restart countdown, timed labels, and camera watching. Every
//! task observes a [`CancelFlag`] before each tick, so cancelling takes effect
//! no later than the next tick.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::state::PlayerId;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Whether both handles refer to the same flag.
    pub fn same(&self, other: &CancelFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Run `step` every `period`, starting immediately.
///
/// Stops when the flag is cancelled, when `step` breaks, or after `max_ticks`
/// ticks. The tick index passed to `step` starts at 0.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    max_ticks: Option<u32>,
    flag: CancelFlag,
    mut step: F,
) -> JoinHandle<()>
where
    F: FnMut(u32) -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = 0u32;
        loop {
            interval.tick().await;
            if flag.is_cancelled() {
                debug!(task = name, tick, "Periodic task cancelled");
                break;
            }
            if max_ticks.is_some_and(|max| tick >= max) {
                break;
            }
            if step(tick).await.is_break() {
                break;
            }
            tick += 1;
        }
    })
}

/// Registry of long-lived tasks that must be cancellable by owner.
#[derive(Default)]
pub struct TaskManager {
    watches: DashMap<PlayerId, CancelFlag>,
    restart: Mutex<Option<CancelFlag>>,
    labels: Mutex<Vec<CancelFlag>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watch task for `player`, cancelling any previous one.
    pub fn start_watch(&self, player: PlayerId, flag: CancelFlag) {
        if let Some(old) = self.watches.insert(player, flag) {
            old.cancel();
        }
    }

    /// Cancel `player`'s watch task. Returns whether one was running.
    pub fn stop_watch(&self, player: &PlayerId) -> bool {
        match self.watches.remove(player) {
            Some((_, flag)) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Deregister a watch task that ended on its own. Only removes the entry
    /// if it still belongs to `flag`; a newer watch stays registered.
    pub fn end_watch(&self, player: &PlayerId, flag: &CancelFlag) {
        self.watches.remove_if(player, |_, current| current.same(flag));
    }

    pub fn is_watching(&self, player: &PlayerId) -> bool {
        self.watches.contains_key(player)
    }

    /// Claim the restart slot. Returns `None` if a restart is already counting down.
    pub fn begin_restart(&self) -> Option<CancelFlag> {
        let mut slot = self.restart.lock();
        if slot.as_ref().is_some_and(|f| !f.is_cancelled()) {
            return None;
        }
        let flag = CancelFlag::new();
        *slot = Some(flag.clone());
        Some(flag)
    }

    pub fn restart_pending(&self) -> bool {
        self.restart
            .lock()
            .as_ref()
            .is_some_and(|f| !f.is_cancelled())
    }

    pub fn track_label(&self, flag: CancelFlag) {
        let mut labels = self.labels.lock();
        labels.retain(|f| !f.is_cancelled());
        labels.push(flag);
    }

    /// Cancel everything; used on shutdown.
    pub fn cancel_all(&self) {
        for entry in self.watches.iter() {
            entry.value().cancel();
        }
        self.watches.clear();
        if let Some(flag) = self.restart.lock().take() {
            flag.cancel();
        }
        for flag in self.labels.lock().drain(..) {
            flag.cancel();
        }
    }
}

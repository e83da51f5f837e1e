//! Outstanding-work accounting for a traversal.
//!
//! Every queued request, running worker and in-flight delivery owns exactly
//! one [`WorkUnit`]. Units are only created by forking a live unit, so the
//! count is raised before new work becomes visible and cannot reach zero
//! while its parent still runs. Dropping a unit lowers the count; the drop
//! that reaches zero wakes [`PendingWork::drained`].

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

#[derive(Debug)]
struct Shared {
    outstanding: AtomicUsize,
    completions: AtomicUsize,
    drained: Notify,
}

#[derive(Debug, Clone)]
pub struct PendingWork {
    shared: Arc<Shared>,
}

#[derive(Debug)]
#[must_use = "dropping a work unit marks it as finished"]
pub struct WorkUnit {
    shared: Arc<Shared>,
}

impl PendingWork {
    /// Start tracking with a single outstanding unit for the root request.
    pub fn start() -> (Self, WorkUnit) {
        let shared = Arc::new(Shared {
            outstanding: AtomicUsize::new(1),
            completions: AtomicUsize::new(0),
            drained: Notify::new(),
        });

        (
            Self {
                shared: Arc::clone(&shared),
            },
            WorkUnit { shared },
        )
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// How many times the count has dropped to zero.
    #[must_use]
    pub fn completions(&self) -> usize {
        self.shared.completions.load(Ordering::Acquire)
    }

    /// Resolves once every unit has been dropped. The wake-up is stored, so
    /// awaiting after the fact still completes.
    pub async fn drained(&self) {
        if self.outstanding() == 0 {
            return;
        }
        self.shared.drained.notified().await;
    }
}

impl WorkUnit {
    /// Account for a new piece of work caused by this one.
    pub fn fork(&self) -> WorkUnit {
        self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        WorkUnit {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for WorkUnit {
    fn drop(&mut self) {
        if self.shared.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.completions.fetch_add(1, Ordering::AcqRel);
            self.shared.drained.notify_one();
        }
    }
}

//! The coordinating loop of a harvest.
//!
//! One dispatcher owns three unbounded queues: directory scans, leaf fetches
//! and delivered records. It spawns a task per request and is the only place
//! that decides completion, which happens when the last [`WorkUnit`] is gone.

use crate::harvest::{
    HarvestConfig, aggregate,
    aggregate::ResultSet,
    fetch,
    pending::{PendingWork, WorkUnit},
    scan,
};
use crate::otp::{CodeGenerator, Record};
use crate::vault::SecretStore;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{Instrument, debug, info, info_span};

/// A key waiting for a worker, together with the unit of work it stands for.
#[derive(Debug)]
pub(crate) struct WorkRequest {
    pub key: String,
    pub unit: WorkUnit,
}

/// A record on its way to the aggregate. The fetch worker's unit travels with
/// it and is released once the dispatcher has stored the record.
#[derive(Debug)]
pub(crate) struct Delivery {
    pub record: Record,
    pub unit: WorkUnit,
}

/// Senders handed to every worker.
#[derive(Debug, Clone)]
pub(crate) struct Channels {
    scan: UnboundedSender<WorkRequest>,
    fetch: UnboundedSender<WorkRequest>,
    delivery: UnboundedSender<Delivery>,
}

impl Channels {
    // A failed send hands the request back inside the error; dropping it
    // releases its unit.
    pub fn submit_scan(&self, key: String, unit: WorkUnit) {
        if self.scan.send(WorkRequest { key, unit }).is_err() {
            debug!("scan queue closed");
        }
    }

    pub fn submit_fetch(&self, key: String, unit: WorkUnit) {
        if self.fetch.send(WorkRequest { key, unit }).is_err() {
            debug!("fetch queue closed");
        }
    }

    pub fn deliver(&self, record: Record, unit: WorkUnit) {
        if self.delivery.send(Delivery { record, unit }).is_err() {
            debug!("delivery queue closed");
        }
    }
}

/// What a single run did, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub scans: usize,
    pub fetches: usize,
    pub delivered: usize,
    pub completions: usize,
}

pub struct Dispatcher<S, G> {
    store: Arc<S>,
    engine: Arc<G>,
    config: Arc<HarvestConfig>,
}

impl<S: SecretStore, G: CodeGenerator> Dispatcher<S, G> {
    #[must_use]
    pub fn new(store: Arc<S>, engine: Arc<G>, config: Arc<HarvestConfig>) -> Self {
        Self {
            store,
            engine,
            config,
        }
    }

    /// Traverse everything below `root_key` and return the sorted records.
    pub async fn run(&self, root_key: &str) -> ResultSet {
        self.run_with_stats(root_key).await.0
    }

    pub async fn run_with_stats(&self, root_key: &str) -> (ResultSet, DispatchStats) {
        let (pending, root) = PendingWork::start();

        let (scan_tx, mut scan_rx) = mpsc::unbounded_channel();
        let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel();
        let (delivery_tx, mut delivery_rx) = mpsc::unbounded_channel();
        let channels = Channels {
            scan: scan_tx,
            fetch: fetch_tx,
            delivery: delivery_tx,
        };

        let root_key = root_key.trim_end_matches('*').to_string();
        info!(root = %root_key, "Starting harvest");
        channels.submit_scan(root_key, root);

        let mut records = Vec::new();
        let mut stats = DispatchStats::default();

        loop {
            tokio::select! {
                Some(request) = scan_rx.recv() => {
                    stats.scans += 1;
                    let span = info_span!("scan", key = %request.key);
                    tokio::spawn(
                        scan::run(Arc::clone(&self.store), channels.clone(), request)
                            .instrument(span),
                    );
                }
                Some(request) = fetch_rx.recv() => {
                    stats.fetches += 1;
                    let span = info_span!("fetch", key = %request.key);
                    tokio::spawn(
                        fetch::run(
                            Arc::clone(&self.store),
                            Arc::clone(&self.engine),
                            Arc::clone(&self.config),
                            channels.clone(),
                            request,
                        )
                        .instrument(span),
                    );
                }
                Some(Delivery { record, unit }) = delivery_rx.recv() => {
                    stats.delivered += 1;
                    records.push(record);
                    drop(unit);
                }
                () = pending.drained() => break,
            }
        }

        stats.completions = pending.completions();
        info!(
            scans = stats.scans,
            fetches = stats.fetches,
            delivered = stats.delivered,
            "Harvest complete"
        );

        (aggregate::finalize(records), stats)
    }
}

/// A child found while scanning a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Scan(String),
    Fetch(String),
}

impl WorkItem {
    /// Children ending in `/` are directories.
    #[must_use]
    pub fn classify(parent: &str, child: &str) -> Self {
        let key = join_key(parent, child);
        if child.ends_with('/') {
            Self::Scan(key)
        } else {
            Self::Fetch(key)
        }
    }
}

/// Join path segments, dropping empty and `.` segments. A leading `/` on the
/// parent is kept.
#[must_use]
pub fn join_key(parent: &str, child: &str) -> String {
    let joined = parent
        .split('/')
        .chain(child.split('/'))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    if parent.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_cleans_separators() {
        assert_eq!(join_key("root/", "a/"), "root/a");
        assert_eq!(join_key("root", "b"), "root/b");
        assert_eq!(join_key("root//a/", "./c"), "root/a/c");
        assert_eq!(join_key("/root", "c"), "/root/c");
        assert_eq!(join_key("", "c"), "c");
    }

    #[test]
    fn classify_uses_trailing_separator() {
        assert_eq!(
            WorkItem::classify("secret/otp", "github/"),
            WorkItem::Scan("secret/otp/github".to_string())
        );
        assert_eq!(
            WorkItem::classify("secret/otp/", "gitlab"),
            WorkItem::Fetch("secret/otp/gitlab".to_string())
        );
    }
}

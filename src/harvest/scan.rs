use crate::harvest::dispatcher::{Channels, WorkItem, WorkRequest};
use crate::vault::{SecretStore, StoreError};
use std::sync::Arc;
use tracing::{debug, error};

/// List one directory and queue its children. Each child gets a unit forked
/// from this worker's unit before it is queued; this worker's unit is
/// released on return.
pub(crate) async fn run<S: SecretStore>(store: Arc<S>, channels: Channels, request: WorkRequest) {
    let WorkRequest { key, unit } = request;

    let children = match store.list(&key).await {
        Ok(children) => children,
        Err(StoreError::NotFound) => {
            error!(key = %key, "There is no key");
            return;
        }
        Err(e) => {
            error!(key = %key, error = %e, "Unable to list keys");
            return;
        }
    };

    debug!(key = %key, children = children.len(), "Listed keys");

    for child in children.iter().filter(|child| !child.is_empty()) {
        match WorkItem::classify(&key, child) {
            WorkItem::Scan(path) => channels.submit_scan(path, unit.fork()),
            WorkItem::Fetch(path) => channels.submit_fetch(path, unit.fork()),
        }
    }
}

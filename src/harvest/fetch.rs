use crate::harvest::{
    HarvestConfig,
    dispatcher::{Channels, WorkRequest},
};
use crate::otp::{CodeGenerator, RecordDraft};
use crate::vault::{SecretStore, StoreError};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Read one leaf and deliver its record, if it yields one. On delivery the
/// unit moves with the record; on every other path it is released here.
pub(crate) async fn run<S: SecretStore, G: CodeGenerator>(
    store: Arc<S>,
    engine: Arc<G>,
    config: Arc<HarvestConfig>,
    channels: Channels,
    request: WorkRequest,
) {
    let WorkRequest { key, unit } = request;

    let fields = match store.read(&key).await {
        Ok(Some(fields)) if !fields.is_empty() => fields,
        Ok(_) => {
            debug!(key = %key, "Key carries no data");
            return;
        }
        Err(StoreError::NotFound) => {
            error!(key = %key, "There is no key");
            return;
        }
        Err(e) => {
            error!(key = %key, error = %e, "Unable to read from key");
            return;
        }
    };

    let (draft, problems) = RecordDraft::from_fields(&key, &fields, &config.secret_field);
    for problem in problems {
        warn!(key = %key, error = %problem, "Unable to parse field");
    }

    let at = config.evaluation_time(draft.period());
    let name = draft.name.clone();

    match draft.into_record(engine.as_ref(), at) {
        Ok(Some(record)) => channels.deliver(record, unit),
        Ok(None) => debug!(key = %key, "No code produced, not an OTP secret"),
        Err(e) => error!(key = %key, name = %name, error = %e, "Unable to generate code"),
    }
}

//! Per-section error taxonomy.
//!
//! Every collector fault is converted to a `CollectError` at the collector
//! boundary; the driver records it and moves on to the next section. Only
//! pre-section environment faults (platform mismatch) abort the run.

use thiserror::Error;

use crate::probe::ProbeError;

#[derive(Debug, Error)]
pub enum CollectError {
    /// The invoking principal lacks rights to query the interface.
    #[error("access denied: {0}")]
    PermissionDenied(String),

    /// The query surface does not exist or did not respond on this host.
    #[error("interface unavailable: {0}")]
    InterfaceUnavailable(String),
}

impl From<ProbeError> for CollectError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Denied { .. } => CollectError::PermissionDenied(err.to_string()),
            ProbeError::Missing(_) | ProbeError::Failed { .. } => {
                CollectError::InterfaceUnavailable(err.to_string())
            }
        }
    }
}

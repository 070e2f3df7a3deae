//! Store error types.

use fleet_api::ApiError;
use thiserror::Error;

/// Failure of a store operation.
///
/// Stores also record the message in their state, so callers that only
/// render state may ignore it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{context}: {source}")]
    Fetch {
        context: &'static str,
        #[source]
        source: ApiError,
    },
}

impl StoreError {
    pub(crate) fn fetch(context: &'static str, source: ApiError) -> Self {
        Self::Fetch { context, source }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

use thiserror::Error;

/// Failure taxonomy for the points layer.
#[derive(Debug, Error)]
pub enum PointsError {
    /// The supplied identifier is not a well-formed UUID. Fatal: callers must
    /// not proceed to any storage lookup with a malformed id.
    #[error("invalid child identifier: {0:?} is not a UUID")]
    InvalidIdentifier(String),

    /// Request-level validation failure (empty reason, zero delta, ...).
    #[error("{0}")]
    Validation(String),

    /// Every data path for the requested figure failed. Surfaced to callers
    /// so a genuine outage stays distinguishable from a legitimate zero
    /// wallet.
    #[error("points backend unavailable while fetching {context}")]
    BackendUnavailable {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// The idempotent award path could not confirm whether the award was
    /// applied. Triggers the plain-insert fallback and is logged as a
    /// warning; the caller still sees a successful award.
    #[error("idempotent award unconfirmed: {0}")]
    AwardUnconfirmed(String),
}

impl PointsError {
    pub(crate) fn backend_unavailable(context: &str, source: anyhow::Error) -> Self {
        Self::BackendUnavailable {
            context: context.to_string(),
            source,
        }
    }
}

pub type PointsResult<T> = Result<T, PointsError>;

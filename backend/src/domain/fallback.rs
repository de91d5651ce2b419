//! Ordered fallback chains over partially-available data sources.
//!
//! Wallet figures can come from more than one place (a precomputed rollup,
//! raw ledger rows, an offer sum). Callers list their sources best-first and
//! the executor returns the first one that answers; a source signalling
//! `Unavailable` hands over to the next. Only when every source has failed
//! does the chain surface `BackendUnavailable`.

use futures::future::BoxFuture;
use log::{info, warn};

use crate::domain::errors::PointsError;

/// Marker for a data source that cannot answer right now.
///
/// Kept distinct from `PointsError` so a strategy cannot accidentally
/// swallow a fatal error: only failures explicitly wrapped in `Unavailable`
/// continue the chain.
pub struct Unavailable(pub anyhow::Error);

pub type StrategyFuture<'a, T> = BoxFuture<'a, Result<T, Unavailable>>;

/// Run each named strategy in order and return the first success.
pub async fn first_resolved<T>(
    what: &str,
    strategies: Vec<(&'static str, StrategyFuture<'_, T>)>,
) -> Result<T, PointsError> {
    let mut failures: Vec<String> = Vec::new();

    for (name, strategy) in strategies {
        match strategy.await {
            Ok(value) => {
                if !failures.is_empty() {
                    info!("resolved {} via fallback source '{}'", what, name);
                }
                return Ok(value);
            }
            Err(Unavailable(source)) => {
                warn!("{} source '{}' unavailable: {:#}", what, name, source);
                failures.push(format!("{}: {:#}", name, source));
            }
        }
    }

    Err(PointsError::BackendUnavailable {
        context: what.to_string(),
        source: anyhow::anyhow!("{}", failures.join("; ")),
    })
}

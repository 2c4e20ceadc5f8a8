//! Catch-and-continue step runner

use std::fmt::Display;
use std::future::Future;

use crate::error::Result;

/// Run one unit of refresh work; on failure log it and return `fallback`.
///
/// Used at every level of the walk so one bad brand, model or year only
/// costs its own branch.
pub async fn isolated<T, Fut>(step: impl Display, fallback: T, work: Fut) -> T
where
    Fut: Future<Output = Result<T>>,
{
    match work.await {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Skipping {}: {}", step, err);
            fallback
        }
    }
}

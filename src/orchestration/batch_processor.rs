//! Sequential batch processing.

use crate::error::{PipelineError, Result};
use std::future::Future;

/// Position of the batch being handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchContext {
    pub index: usize,
    pub total_batches: usize,
    pub size: usize,
}

/// Run `handler` over consecutive slices of at most `batch_size` items.
///
/// Batches are awaited one after the other, in order. The ids returned by
/// every batch are flattened into the result. The first failing batch stops
/// the run and its error is returned unchanged; later batches never start.
pub async fn process_in_batches<'a, T, R, F, Fut>(
    items: &'a [T],
    batch_size: usize,
    mut handler: F,
) -> Result<Vec<R>>
where
    F: FnMut(BatchContext, &'a [T]) -> Fut,
    Fut: Future<Output = Result<Vec<R>>>,
{
    if batch_size == 0 {
        return Err(PipelineError::Validation(
            "batch size must be at least 1".to_string(),
        ));
    }

    let total_batches = items.len().div_ceil(batch_size);
    let mut processed = Vec::with_capacity(items.len());

    for (index, batch) in items.chunks(batch_size).enumerate() {
        let context = BatchContext {
            index,
            total_batches,
            size: batch.len(),
        };
        processed.extend(handler(context, batch).await?);
    }

    Ok(processed)
}

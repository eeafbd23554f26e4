//! Write guards for the Persistence Gateway
//!
//! Every store implementation runs these before touching rows so that a
//! malformed batch fails loudly instead of half-applying.

use crate::constants::batching::MAX_BULK_WRITE;
use crate::error::{PipelineError, Result};
use crate::models::{NewTransactionEmbedding, TransactionPatch};
use uuid::Uuid;

/// Rejects writes larger than [`MAX_BULK_WRITE`]
pub fn validate_bulk_size(operation: &str, len: usize) -> Result<()> {
    if len > MAX_BULK_WRITE {
        return Err(PipelineError::Validation(format!(
            "{operation}: batch size too large: {len} (max: {MAX_BULK_WRITE})"
        )));
    }
    Ok(())
}

pub fn validate_patches(patches: &[TransactionPatch]) -> Result<()> {
    validate_bulk_size("bulk_patch_transactions", patches.len())?;

    for patch in patches {
        if patch.transaction_id.is_nil() {
            return Err(PipelineError::Validation(
                "Invalid transaction id: nil UUID".to_string(),
            ));
        }
        if patch.is_empty() {
            return Err(PipelineError::Validation(format!(
                "Patch for {} has neither merchant_name nor category_slug",
                patch.transaction_id
            )));
        }
        if let Some(merchant) = &patch.merchant_name {
            if merchant.trim().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "Patch for {} has a blank merchant_name",
                    patch.transaction_id
                )));
            }
        }
        if let Some(slug) = &patch.category_slug {
            if slug.trim().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "Patch for {} has a blank category_slug",
                    patch.transaction_id
                )));
            }
        }
    }

    Ok(())
}

pub fn validate_transaction_ids(ids: &[Uuid]) -> Result<()> {
    validate_bulk_size("mark_enriched", ids.len())?;

    if ids.iter().any(Uuid::is_nil) {
        return Err(PipelineError::Validation(
            "Invalid transaction id: nil UUID".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_embeddings(rows: &[NewTransactionEmbedding]) -> Result<()> {
    validate_bulk_size("bulk_insert_embeddings", rows.len())?;

    for row in rows {
        if row.embedding.is_empty() {
            return Err(PipelineError::Validation(format!(
                "Embedding for {} is empty",
                row.transaction_id
            )));
        }
        if row.source_text.trim().is_empty() {
            return Err(PipelineError::Validation(format!(
                "Embedding for {} has blank source text",
                row.transaction_id
            )));
        }
        if row.model.trim().is_empty() {
            return Err(PipelineError::Validation(format!(
                "Embedding for {} has no model identifier",
                row.transaction_id
            )));
        }
    }
    Ok(())
}

//! Text composition.
//!
//! Both stages read the same fields in the same order: counterparty, raw
//! name, free-text description. A field is skipped when it is blank or
//! repeats an earlier one.

use crate::models::{TransactionForEmbedding, TransactionForEnrichment};

const SEPARATOR: &str = " | ";

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Labelled text for the classifier prompt, e.g.
/// `Counterparty: Spotify AB | Raw: SPOTIFY P1234`.
/// Falls back to the raw name when nothing else is available.
pub fn compose_enrichment_text(tx: &TransactionForEnrichment) -> String {
    let counterparty = present(tx.counterparty_name.as_deref());
    let name = present(Some(tx.name.as_str()));
    let description = present(tx.description.as_deref());

    let mut parts = Vec::with_capacity(3);
    if let Some(counterparty) = counterparty {
        parts.push(format!("Counterparty: {counterparty}"));
    }
    if let Some(name) = name.filter(|n| Some(*n) != counterparty) {
        parts.push(format!("Raw: {name}"));
    }
    if let Some(description) =
        description.filter(|d| Some(*d) != counterparty && Some(*d) != name)
    {
        parts.push(format!("Description: {description}"));
    }

    if parts.is_empty() {
        tx.name.clone()
    } else {
        parts.join(SEPARATOR)
    }
}

/// Source text stored alongside the embedding. The cleaned merchant name
/// leads when it adds something. May be empty, in which case the
/// transaction is not embedded.
pub fn compose_embedding_text(tx: &TransactionForEmbedding) -> String {
    let candidates = [
        present(tx.merchant_name.as_deref()),
        present(tx.counterparty_name.as_deref()),
        present(Some(tx.name.as_str())),
        present(tx.description.as_deref()),
    ];

    let mut parts: Vec<&str> = Vec::with_capacity(candidates.len());
    for value in candidates.into_iter().flatten() {
        if !parts.contains(&value) {
            parts.push(value);
        }
    }
    parts.join(SEPARATOR)
}

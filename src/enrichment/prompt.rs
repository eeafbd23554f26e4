//! Classifier prompt for one enrichment batch.

use super::text::compose_enrichment_text;
use crate::models::{CategoryForEnrichment, TransactionForEnrichment};

const PREAMBLE: &str = "You are a personal finance transaction enrichment system.

TASK: For EVERY transaction:
1. Identify the **merchant**:
   - Remove noise like store numbers, IDs, or payment method suffixes.
   - Prefer recognizable brand or merchant names (e.g. \"Starbucks\", \"Amazon\", \"Esselunga\").
   - If no merchant can be confidently identified, return `null`.

2. Assign the **category** (only for transactions marked \"needs category\"):
   - Use ONLY the categories provided in the allowed list.
   - Prefer the most specific (leaf) category that fits.
   - If no clear match, return `null`.

STRICT RULES:
- Never invent new merchants or categories.
- Do not guess if uncertain, prefer `null`.";

/// One prompt enumerating the whole batch, 1-indexed in batch order
pub fn build_enrichment_prompt(
    batch: &[TransactionForEnrichment],
    categories: &[CategoryForEnrichment],
) -> String {
    let needs_categories = batch.iter().any(TransactionForEnrichment::needs_category);

    let mut prompt = String::with_capacity(1024 + batch.len() * 160);
    prompt.push_str(PREAMBLE);

    prompt.push_str("\n\nALLOWED CATEGORIES:\n");
    for category in categories {
        prompt.push_str(&format!("• {} → {}", category.slug, category.name));
        if let Some(parent) = &category.parent_slug {
            prompt.push_str(&format!(" (child of {parent})"));
        }
        if let Some(description) = category.description.as_deref().filter(|d| !d.is_empty()) {
            prompt.push_str(&format!(" — {description}"));
        }
        prompt.push('\n');
    }

    prompt.push_str("\nOUTPUT FORMAT:\nReturn for each transaction:\n");
    prompt.push_str("- merchant: Clean merchant name, or `null` if uncertain.\n");
    if needs_categories {
        prompt.push_str(
            "- category: Best matching category slug from the list above for transactions \
             marked \"needs category\", otherwise `null`.\n",
        );
    } else {
        prompt.push_str("- category: Always `null`, every transaction is already categorized.\n");
    }

    prompt.push_str("\nTransactions to process:\n");
    for (index, tx) in batch.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. Description: \"{}\", Amount: {}, Currency: {}",
            index + 1,
            compose_enrichment_text(tx),
            tx.amount,
            tx.currency
        ));
        if let Some(merchant) = &tx.merchant_name {
            prompt.push_str(&format!(" (Current Merchant: {merchant})"));
        }
        if tx.needs_category() {
            prompt.push_str(" (needs category)");
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nReturn exactly {} results in order, as JSON objects.",
        batch.len()
    ));
    prompt
}

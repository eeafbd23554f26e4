//! # Enrichment Outcomes
//!
//! Every transaction of a processed batch gets exactly one
//! [`EnrichmentOutcome`]. [`OutcomeSummary`] folds the outcomes into the two
//! writes that finish the batch: one bulk patch for `Updated`, one completion
//! mark for everything else. Because [`reconcile`] walks the batch rather
//! than the classifier results, no transaction can fall through.

use crate::database::TransactionStore;
use crate::enrichment::EnrichmentResult;
use crate::error::Result;
use crate::models::{TransactionForEnrichment, TransactionPatch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Classifier returned fewer results than the batch size
    MissingResult,
    /// Result at this position was not a well-formed object
    InvalidResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Updated(TransactionPatch),
    NoOpComplete,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub transaction_id: Uuid,
    pub outcome: EnrichmentOutcome,
}

/// Update rules for one transaction:
/// - merchant: any non-null result overwrites
/// - category: only when currently null and the amount is not income
pub fn derive_outcome(
    transaction: &TransactionForEnrichment,
    result: &EnrichmentResult,
) -> EnrichmentOutcome {
    let category_slug = if transaction.needs_category() && transaction.is_expense_or_zero() {
        result.category.clone()
    } else {
        None
    };

    let patch = TransactionPatch {
        transaction_id: transaction.id,
        merchant_name: result.merchant.clone(),
        category_slug,
    };

    if patch.is_empty() {
        EnrichmentOutcome::NoOpComplete
    } else {
        EnrichmentOutcome::Updated(patch)
    }
}

/// Pair batch transactions with results by position. Extra results are
/// ignored; missing ones become `Skipped(MissingResult)`.
pub fn reconcile(
    batch: &[TransactionForEnrichment],
    results: &[Option<EnrichmentResult>],
) -> Vec<TransactionOutcome> {
    batch
        .iter()
        .enumerate()
        .map(|(position, transaction)| {
            let outcome = match results.get(position) {
                Some(Some(result)) => derive_outcome(transaction, result),
                Some(None) => EnrichmentOutcome::Skipped(SkipReason::InvalidResult),
                None => EnrichmentOutcome::Skipped(SkipReason::MissingResult),
            };
            TransactionOutcome {
                transaction_id: transaction.id,
                outcome,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub patches: Vec<TransactionPatch>,
    /// No-op and skipped transactions, completed without data
    pub completed_without_update: Vec<Uuid>,
    pub no_update_needed: usize,
    pub skipped: usize,
    pub merchant_names_updated: usize,
    pub categories_updated: usize,
}

impl OutcomeSummary {
    pub fn from_outcomes(outcomes: Vec<TransactionOutcome>) -> Self {
        let mut summary = Self::default();
        for TransactionOutcome {
            transaction_id,
            outcome,
        } in outcomes
        {
            match outcome {
                EnrichmentOutcome::Updated(patch) => {
                    summary.merchant_names_updated += usize::from(patch.merchant_name.is_some());
                    summary.categories_updated += usize::from(patch.category_slug.is_some());
                    summary.patches.push(patch);
                }
                EnrichmentOutcome::NoOpComplete => {
                    summary.no_update_needed += 1;
                    summary.completed_without_update.push(transaction_id);
                }
                EnrichmentOutcome::Skipped(_) => {
                    summary.skipped += 1;
                    summary.completed_without_update.push(transaction_id);
                }
            }
        }
        summary
    }

    pub fn updates_applied(&self) -> usize {
        self.patches.len()
    }

    /// Every transaction the summary accounts for, each once
    pub fn transaction_ids(&self) -> Vec<Uuid> {
        self.patches
            .iter()
            .map(|p| p.transaction_id)
            .chain(self.completed_without_update.iter().copied())
            .collect()
    }

    /// Persist the batch: patches first, then the completion mark
    pub async fn apply(&self, store: &dyn TransactionStore, organization_id: Uuid) -> Result<()> {
        store
            .bulk_patch_transactions(organization_id, &self.patches)
            .await?;
        store
            .mark_enriched(organization_id, &self.completed_without_update)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn tx(amount: &str, category: Option<&str>, merchant: Option<&str>) -> TransactionForEnrichment {
        TransactionForEnrichment {
            id: Uuid::new_v4(),
            name: "RAW".to_string(),
            counterparty_name: None,
            description: None,
            amount: BigDecimal::from_str(amount).unwrap(),
            currency: "EUR".to_string(),
            category_slug: category.map(str::to_string),
            merchant_name: merchant.map(str::to_string),
        }
    }

    fn patch_of(outcome: &EnrichmentOutcome) -> &TransactionPatch {
        match outcome {
            EnrichmentOutcome::Updated(patch) => patch,
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    #[test]
    fn test_expense_without_category_gets_category() {
        let expense = tx("-12.50", None, None);
        let outcome = derive_outcome(&expense, &EnrichmentResult::new(Some("Foo"), Some("groceries")));
        let patch = patch_of(&outcome);
        assert_eq!(patch.merchant_name.as_deref(), Some("Foo"));
        assert_eq!(patch.category_slug.as_deref(), Some("groceries"));
    }

    #[test]
    fn test_income_never_categorized() {
        let income = tx("500.00", None, None);
        let outcome = derive_outcome(&income, &EnrichmentResult::new(Some("Foo"), Some("groceries")));
        assert_eq!(patch_of(&outcome).category_slug, None);
    }

    #[test]
    fn test_zero_amount_counts_as_expense() {
        let zero = tx("0.00", None, None);
        let outcome = derive_outcome(&zero, &EnrichmentResult::new(None, Some("fees")));
        assert_eq!(patch_of(&outcome).category_slug.as_deref(), Some("fees"));
    }

    #[test]
    fn test_existing_category_kept_but_merchant_overwritten() {
        let categorized = tx("-5", Some("coffee"), Some("FOO BAR 123"));
        let outcome = derive_outcome(
            &categorized,
            &EnrichmentResult::new(Some("Foo Bar Inc."), Some("groceries")),
        );
        let patch = patch_of(&outcome);
        assert_eq!(patch.merchant_name.as_deref(), Some("Foo Bar Inc."));
        assert_eq!(patch.category_slug, None);
    }

    #[test]
    fn test_empty_result_is_no_op() {
        let outcome = derive_outcome(&tx("-5", None, None), &EnrichmentResult::default());
        assert_eq!(outcome, EnrichmentOutcome::NoOpComplete);
    }

    #[test]
    fn test_reconcile_covers_whole_batch() {
        let batch = vec![tx("-1", None, None), tx("-2", None, None), tx("-3", None, None)];

        let short = reconcile(&batch, &[Some(EnrichmentResult::new(Some("A"), None)), None]);
        assert_eq!(short.len(), 3);
        assert_eq!(short[1].outcome, EnrichmentOutcome::Skipped(SkipReason::InvalidResult));
        assert_eq!(short[2].outcome, EnrichmentOutcome::Skipped(SkipReason::MissingResult));

        let long: Vec<Option<EnrichmentResult>> =
            (0..5).map(|_| Some(EnrichmentResult::default())).collect();
        let outcomes = reconcile(&batch, &long);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes
            .iter()
            .zip(&batch)
            .all(|(o, t)| o.transaction_id == t.id));
    }

    #[test]
    fn test_summary_counts_each_transaction_once() {
        let batch = vec![
            tx("-1", None, None),
            tx("-2", None, None),
            tx("-3", None, None),
            tx("4", None, None),
        ];
        let results = vec![
            Some(EnrichmentResult::new(Some("Spotify"), Some("entertainment"))),
            Some(EnrichmentResult::default()),
            None,
        ];

        let summary = OutcomeSummary::from_outcomes(reconcile(&batch, &results));

        assert_eq!(summary.updates_applied(), 1);
        assert_eq!(summary.no_update_needed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.merchant_names_updated, 1);
        assert_eq!(summary.categories_updated, 1);

        let mut ids = summary.transaction_ids();
        ids.sort();
        let mut expected: Vec<Uuid> = batch.iter().map(|t| t.id).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }
}

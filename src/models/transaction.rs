//! # Transaction Model
//!
//! Bank transactions as seen by the enrichment and embedding stages.
//!
//! ## Database Schema
//!
//! Maps to the `transactions` table:
//! - `id`: Primary key (UUID)
//! - `organization_id`: Owning organization (UUID)
//! - `amount`: Signed NUMERIC(10, 2); negative is an expense, positive is income
//! - `merchant_name` / `category_slug`: Enrichment targets, both nullable
//! - `enrichment_completed`: Flips false → true once per pipeline run, never reset

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full transaction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub counterparty_name: Option<String>,
    pub description: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub merchant_name: Option<String>,
    pub category_slug: Option<String>,
    pub enrichment_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a fresh, not yet enriched transaction
    pub fn new(
        organization_id: Uuid,
        name: impl Into<String>,
        amount: BigDecimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.into(),
            counterparty_name: None,
            description: None,
            amount,
            currency: currency.into(),
            merchant_name: None,
            category_slug: None,
            enrichment_completed: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty_name = Some(counterparty.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant_name = Some(merchant.into());
        self
    }

    pub fn with_category(mut self, slug: impl Into<String>) -> Self {
        self.category_slug = Some(slug.into());
        self
    }

    pub fn for_enrichment(&self) -> TransactionForEnrichment {
        TransactionForEnrichment {
            id: self.id,
            name: self.name.clone(),
            counterparty_name: self.counterparty_name.clone(),
            description: self.description.clone(),
            amount: self.amount.clone(),
            currency: self.currency.clone(),
            category_slug: self.category_slug.clone(),
            merchant_name: self.merchant_name.clone(),
        }
    }

    pub fn for_embedding(&self) -> TransactionForEmbedding {
        TransactionForEmbedding {
            id: self.id,
            name: self.name.clone(),
            counterparty_name: self.counterparty_name.clone(),
            description: self.description.clone(),
            merchant_name: self.merchant_name.clone(),
        }
    }

    /// Apply an enrichment patch the way the bulk write does
    pub fn apply_patch(&mut self, patch: &TransactionPatch) {
        if let Some(merchant) = &patch.merchant_name {
            self.merchant_name = Some(merchant.clone());
        }
        if let Some(slug) = &patch.category_slug {
            self.category_slug = Some(slug.clone());
        }
        self.enrichment_completed = true;
    }
}

/// Projection read by the enrichment stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForEnrichment {
    pub id: Uuid,
    pub name: String,
    pub counterparty_name: Option<String>,
    pub description: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub category_slug: Option<String>,
    pub merchant_name: Option<String>,
}

impl TransactionForEnrichment {
    /// Income is never auto-categorized into an expense category
    pub fn is_expense_or_zero(&self) -> bool {
        self.amount <= BigDecimal::from(0)
    }

    pub fn needs_category(&self) -> bool {
        self.category_slug.is_none()
    }
}

/// Projection read by the embedding stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForEmbedding {
    pub id: Uuid,
    pub name: String,
    pub counterparty_name: Option<String>,
    pub description: Option<String>,
    pub merchant_name: Option<String>,
}

/// Enrichment write for one transaction. Applying it also marks the row enriched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub transaction_id: Uuid,
    pub merchant_name: Option<String>,
    pub category_slug: Option<String>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.merchant_name.is_none() && self.category_slug.is_none()
    }
}

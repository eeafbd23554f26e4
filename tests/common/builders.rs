//! Fixture builders over the in-memory store

use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;
use transaction_enrichment::database::InMemoryTransactionStore;
use transaction_enrichment::models::{CategoryForEnrichment, CategoryType, Transaction};
use uuid::Uuid;

/// Builder for test transactions
pub struct TransactionBuilder {
    organization_id: Uuid,
    name: String,
    amount: String,
    counterparty: Option<String>,
    description: Option<String>,
    merchant: Option<String>,
    category: Option<String>,
    enrichment_completed: bool,
}

impl TransactionBuilder {
    pub fn new(organization_id: Uuid, name: &str) -> Self {
        Self {
            organization_id,
            name: name.to_string(),
            amount: "-10.00".to_string(),
            counterparty: None,
            description: None,
            merchant: None,
            category: None,
            enrichment_completed: false,
        }
    }

    pub fn amount(mut self, amount: &str) -> Self {
        self.amount = amount.to_string();
        self
    }

    pub fn counterparty(mut self, counterparty: &str) -> Self {
        self.counterparty = Some(counterparty.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn merchant(mut self, merchant: &str) -> Self {
        self.merchant = Some(merchant.to_string());
        self
    }

    pub fn category(mut self, slug: &str) -> Self {
        self.category = Some(slug.to_string());
        self
    }

    pub fn completed(mut self) -> Self {
        self.enrichment_completed = true;
        self
    }

    pub fn build(self) -> Transaction {
        let amount = BigDecimal::from_str(&self.amount).expect("valid decimal amount");
        let mut tx = Transaction::new(self.organization_id, self.name, amount, "EUR");
        tx.counterparty_name = self.counterparty;
        tx.description = self.description;
        tx.merchant_name = self.merchant;
        tx.category_slug = self.category;
        tx.enrichment_completed = self.enrichment_completed;
        tx
    }

    pub fn insert(self, store: &InMemoryTransactionStore) -> Uuid {
        store.insert_transaction(self.build())
    }
}

/// Store with a small expense/income whitelist for one organization
pub fn seeded_store(organization_id: Uuid) -> Arc<InMemoryTransactionStore> {
    let store = Arc::new(InMemoryTransactionStore::new());
    for category in default_categories() {
        store.insert_category(organization_id, category);
    }
    store
}

pub fn default_categories() -> Vec<CategoryForEnrichment> {
    vec![
        CategoryForEnrichment::new("groceries", "Groceries", CategoryType::Expense)
            .with_description("Supermarkets and food shops"),
        CategoryForEnrichment::new("entertainment", "Entertainment", CategoryType::Expense),
        CategoryForEnrichment::new("streaming", "Streaming", CategoryType::Expense)
            .with_parent("entertainment"),
        CategoryForEnrichment::new("salary", "Salary", CategoryType::Income),
    ]
}

//! # Category Model
//!
//! Organization categories form the whitelist the classifier must choose from.
//! One level of hierarchy is modelled through `parent_slug`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "transaction_category_type", rename_all = "snake_case")]
pub enum CategoryType {
    Income,
    Expense,
    Savings,
    Investments,
    Transfer,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
            CategoryType::Savings => "savings",
            CategoryType::Investments => "investments",
            CategoryType::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whitelist row as handed to the prompt builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryForEnrichment {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub parent_slug: Option<String>,
}

impl CategoryForEnrichment {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            category_type,
            parent_slug: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent_slug: impl Into<String>) -> Self {
        self.parent_slug = Some(parent_slug.into());
        self
    }
}

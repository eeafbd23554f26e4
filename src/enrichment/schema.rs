//! Output schema for the classifier and validation of what comes back.
//!
//! The schema is sent with the request so the provider constrains its
//! output, and the same whitelist is enforced again on the response since
//! provider-side constraints are not guaranteed.

use crate::error::{PipelineError, Result};
use crate::models::CategoryForEnrichment;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// One validated classifier result
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnrichmentResult {
    pub merchant: Option<String>,
    pub category: Option<String>,
}

impl EnrichmentResult {
    pub fn new(merchant: Option<&str>, category: Option<&str>) -> Self {
        Self {
            merchant: merchant.map(str::to_string),
            category: category.map(str::to_string),
        }
    }
}

/// Classifier output after validation, still positional.
/// `None` marks an item that was not an object of the expected shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedOutput {
    pub results: Vec<Option<EnrichmentResult>>,
    pub whitelist_violations: usize,
}

#[derive(Debug, Clone)]
pub struct EnrichmentSchema {
    slugs: Vec<String>,
    whitelist: HashSet<String>,
}

impl EnrichmentSchema {
    pub fn new(categories: &[CategoryForEnrichment]) -> Self {
        let slugs: Vec<String> = categories.iter().map(|c| c.slug.clone()).collect();
        let whitelist = slugs.iter().cloned().collect();
        Self { slugs, whitelist }
    }

    pub fn allows(&self, slug: &str) -> bool {
        self.whitelist.contains(slug)
    }

    /// OpenAPI-style schema understood by Gemini structured output
    pub fn response_schema(&self) -> Value {
        let mut category = json!({
            "type": "STRING",
            "nullable": true,
            "description": "Category slug from the allowed list, or null"
        });
        // Gemini rejects an empty enum
        if !self.slugs.is_empty() {
            category["enum"] = json!(self.slugs);
        }

        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "merchant": {
                        "type": "STRING",
                        "nullable": true,
                        "description": "Clean merchant name, or null if uncertain"
                    },
                    "category": category
                },
                "required": ["merchant", "category"]
            }
        })
    }

    /// Validate raw classifier output.
    ///
    /// A non-array response fails the whole batch. Individual items degrade:
    /// a malformed item becomes `None`, a blank merchant becomes null, and a
    /// category outside the whitelist becomes null and is counted.
    pub fn validate(&self, output: &Value) -> Result<ValidatedOutput> {
        let items = output.as_array().ok_or_else(|| {
            PipelineError::InvalidClassifierOutput(format!(
                "expected a JSON array, got {}",
                json_type(output)
            ))
        })?;

        let mut validated = ValidatedOutput {
            results: Vec::with_capacity(items.len()),
            whitelist_violations: 0,
        };

        for item in items {
            let result = item
                .as_object()
                .and_then(|fields| self.validate_item(fields, &mut validated.whitelist_violations));
            validated.results.push(result);
        }

        Ok(validated)
    }

    fn validate_item(
        &self,
        fields: &Map<String, Value>,
        whitelist_violations: &mut usize,
    ) -> Option<EnrichmentResult> {
        let merchant = optional_string(fields.get("merchant"))?;
        let category = optional_string(fields.get("category"))?;

        let category = match category {
            Some(slug) if self.allows(&slug) => Some(slug),
            Some(_) => {
                *whitelist_violations += 1;
                None
            }
            None => None,
        };

        Some(EnrichmentResult { merchant, category })
    }
}

/// `Some(None)` for missing, null or blank; `None` for a wrong type
fn optional_string(value: Option<&Value>) -> Option<Option<String>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Some((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

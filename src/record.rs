//! Canonical financial-record schema and the merge that builds one from
//! recovered model output.
//!
//! The schema invariant: every sub-field is present in the serialized document,
//! as an explicit `null` when unknown, and `items` is always an array. The merge
//! takes each known path from the recovered object as-is when present and fills
//! the rest with typed nulls. Amount fields stay raw JSON values because the
//! model may return numbers or currency strings; callers normalize them through
//! [`crate::numeric::parse`] when they need a float.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// How many characters of raw model text the fallback record retains as
/// diagnostic evidence.
const RAW_TEXT_LIMIT: usize = 1000;

/// Coarse contract type classifier, inferred from the file name. The model's
/// own `contract_type` field never overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LoanAgreement,
    SoftwareLicensing,
    Unknown,
}

impl Category {
    /// Case-insensitive keyword scan of a file name. Unmatched names default
    /// to `SoftwareLicensing`, a long-standing behavior kept as documented;
    /// `Unknown` only appears for rows stored without a recognizable category.
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.contains("loan") {
            Category::LoanAgreement
        } else if lower.contains("license") || lower.contains("licensing") || lower.contains("software")
        {
            Category::SoftwareLicensing
        } else {
            Category::SoftwareLicensing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::LoanAgreement => "loan_agreement",
            Category::SoftwareLicensing => "software_licensing",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub contract_type: Category,
    pub summary: Option<String>,
    pub financials: Financials,
    pub raw_extracted_fields: RawExtractedFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Financials {
    pub money_in: MoneyFlow,
    pub money_out: MoneyFlow,
    pub rates: Rates,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoneyFlow {
    pub total_annually: Option<Value>,
    pub total_monthly: Option<Value>,
    pub items: Vec<LineItem>,
}

/// One money-flow line item. The schema templates vary their amount keys
/// (`amount`, `amount_monthly`, `amount_annually`), so anything beyond the
/// three known fields passes through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub label: Option<String>,
    pub amount: Option<Value>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rates {
    pub interest_rate_percent: Option<Value>,
    pub service_fee_percent: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExtractedFields {
    pub found_values: Vec<String>,
}

impl FinancialRecord {
    /// Merge a recovered object over the canonical schema. Present paths are
    /// trusted as-is; absent paths become typed nulls. No deep type validation
    /// happens here.
    pub fn from_recovered(recovered: &Value, category: Category) -> Self {
        FinancialRecord {
            contract_type: category,
            summary: string_at(recovered, "summary"),
            financials: Financials::from_value(recovered.get("financials")),
            raw_extracted_fields: RawExtractedFields::from_value(
                recovered.get("raw_extracted_fields"),
            ),
        }
    }

    /// Fallback record for when no JSON could be recovered: all financial
    /// sub-fields null, with a truncated prefix of the raw model text kept as
    /// the single diagnostic entry. Ingestion always produces a storable
    /// record; recovery failure is never fatal.
    pub fn fallback(category: Category, raw_text: &str) -> Self {
        FinancialRecord {
            contract_type: category,
            summary: None,
            financials: Financials::default(),
            raw_extracted_fields: RawExtractedFields {
                found_values: vec![raw_text.chars().take(RAW_TEXT_LIMIT).collect()],
            },
        }
    }
}

impl Financials {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Financials::default();
        };
        Financials {
            money_in: MoneyFlow::from_value(value.get("money_in")),
            money_out: MoneyFlow::from_value(value.get("money_out")),
            rates: Rates::from_value(value.get("rates")),
            currency: string_at(value, "currency"),
        }
    }
}

impl MoneyFlow {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return MoneyFlow::default();
        };
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(LineItem::from_value).collect())
            .unwrap_or_default();
        MoneyFlow {
            total_annually: raw_at(value, "total_annually"),
            total_monthly: raw_at(value, "total_monthly"),
            items,
        }
    }
}

impl LineItem {
    fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            // Non-object entries survive as a label so nothing is dropped
            return LineItem {
                label: Some(value.to_string()),
                ..LineItem::default()
            };
        };
        let mut extra = Map::new();
        for (key, entry) in obj {
            if !matches!(key.as_str(), "label" | "amount" | "notes") {
                extra.insert(key.clone(), entry.clone());
            }
        }
        LineItem {
            label: string_at(value, "label"),
            amount: raw_at(value, "amount"),
            notes: string_at(value, "notes"),
            extra,
        }
    }
}

impl Rates {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Rates::default();
        };
        Rates {
            interest_rate_percent: raw_at(value, "interest_rate_percent"),
            service_fee_percent: raw_at(value, "service_fee_percent"),
        }
    }
}

impl RawExtractedFields {
    fn from_value(value: Option<&Value>) -> Self {
        let found_values = value
            .and_then(|v| v.get("found_values"))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| match e {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        RawExtractedFields { found_values }
    }
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Take a field as a raw JSON value, treating an explicit `null` as absent.
fn raw_at(value: &Value, key: &str) -> Option<Value> {
    value.get(key).filter(|v| !v.is_null()).cloned()
}

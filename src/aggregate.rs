//! Rolls stored contract rows up into per-category and overall annual totals.
//!
//! Read-only and tolerant: a row with missing or malformed `financials_json`
//! contributes nothing, and amount fields go through the number normalizer so
//! string amounts still count.

use crate::numeric;
use crate::store::StoredContractRow;
use log::debug;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowTotals {
    pub money_in_annual: f64,
    pub money_out_annual: f64,
}

/// Totals for one aggregation run. Categories appear in order of first
/// contribution during the scan; buckets are discovered dynamically, not
/// pre-seeded.
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub by_category: Vec<(String, FlowTotals)>,
    pub overall: FlowTotals,
}

impl AggregateReport {
    pub fn category(&self, name: &str) -> Option<&FlowTotals> {
        self.by_category
            .iter()
            .find(|(cat, _)| cat == name)
            .map(|(_, totals)| totals)
    }

    fn bucket_mut(&mut self, name: &str) -> &mut FlowTotals {
        if let Some(idx) = self.by_category.iter().position(|(cat, _)| cat == name) {
            &mut self.by_category[idx].1
        } else {
            self.by_category.push((name.to_string(), FlowTotals::default()));
            &mut self.by_category.last_mut().unwrap().1
        }
    }
}

/// Accumulate annualized money-in/money-out totals across all rows.
pub fn aggregate(rows: &[StoredContractRow]) -> AggregateReport {
    let mut report = AggregateReport::default();

    for row in rows {
        let Some(raw) = row.financials_json.as_deref() else {
            continue;
        };
        let document: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => {
                debug!(
                    "skipping row {}: malformed financials_json",
                    row.contract_id
                );
                continue;
            }
        };

        let financials = document.get("financials");
        let in_annual = annual_total(financials, "money_in");
        let out_annual = annual_total(financials, "money_out");

        let category = if row.category.trim().is_empty() {
            "unknown"
        } else {
            row.category.as_str()
        };

        let bucket = report.bucket_mut(category);
        bucket.money_in_annual += in_annual;
        bucket.money_out_annual += out_annual;
        report.overall.money_in_annual += in_annual;
        report.overall.money_out_annual += out_annual;
    }

    report
}

fn annual_total(financials: Option<&Value>, flow: &str) -> f64 {
    financials
        .and_then(|f| f.get(flow))
        .and_then(|m| m.get("total_annually"))
        .and_then(numeric::parse)
        .unwrap_or(0.0)
}

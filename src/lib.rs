//! # Contract Financials
//!
//! Ingests PDF contracts, asks a generative-model service to extract
//! structured financial terms (money flowing in vs. out, annualized), persists
//! the results in SQLite, and aggregates totals per contract category.
//!
//! ## Core Concepts
//!
//! - **Recovery**: best-effort extraction of a JSON object from unreliable
//!   free-form model text (prose, markdown fences, trailing commas, Python
//!   literals).
//! - **Canonical record**: every ingested contract becomes a
//!   [`FinancialRecord`] under a fixed schema, with absent fields as explicit
//!   nulls; recovery failure yields a fallback record carrying a raw-text
//!   diagnostic instead of aborting.
//! - **Never block the batch**: model failures degrade to a mock payload,
//!   persist failures are reported per contract, and the loop continues.
//! - **Annualized totals**: aggregation scans all stored rows and accumulates
//!   money-in/money-out per category and overall, tolerant of malformed rows.
//!
//! ## Example
//!
//! ```rust,ignore
//! use contract_financials::*;
//!
//! let store = ContractStore::open("contracts.db".as_ref())?;
//! let client = GeminiClient::from_env()?;
//! let documents = extract_texts_from_folder("./contracts".as_ref())?;
//!
//! let pipeline = ContractIngestionPipeline::new(&client, &store);
//! let report = pipeline.ingest_batch(&documents).await;
//! println!("saved {}, skipped {}", report.saved(), report.skipped());
//!
//! let totals = aggregate(&store.fetch_all()?);
//! ```

pub mod aggregate;
pub mod error;
pub mod extract;
pub mod llm;
pub mod numeric;
pub mod pipeline;
pub mod record;
pub mod recovery;
pub mod store;

pub use aggregate::{aggregate, AggregateReport, FlowTotals};
pub use error::{ContractError, Result};
pub use extract::{extract_texts_from_folder, ContractDocument};
pub use llm::client::{GeminiClient, ModelClient};
pub use pipeline::{BatchReport, ContractIngestionPipeline, ContractOutcome, SkipReason};
pub use record::{Category, FinancialRecord};
pub use store::{ContractStore, NewContract, StoredContractRow};

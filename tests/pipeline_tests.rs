use contract_financials::*;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted model client: pops one canned response per call.
struct MockModel {
    responses: Mutex<VecDeque<Result<String>>>,
}

impl MockModel {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    fn replying<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.as_ref().to_string())).collect())
    }

    fn failing() -> Self {
        Self::new(vec![Err(ContractError::ModelCall(
            "quota exceeded".to_string(),
        ))])
    }
}

impl ModelClient for MockModel {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ContractError::ModelCall("no scripted response".to_string())))
    }
}

fn doc(file_name: &str, text: &str) -> ContractDocument {
    ContractDocument {
        file_name: file_name.to_string(),
        file_path: PathBuf::from(format!("/contracts/{file_name}")),
        text: text.to_string(),
    }
}

fn pipeline<'a>(
    model: &'a MockModel,
    store: &'a ContractStore,
) -> ContractIngestionPipeline<'a, MockModel> {
    ContractIngestionPipeline::new(model, store).with_pacing(Duration::ZERO)
}

fn loan_response(in_annual: u64) -> String {
    format!(
        r#"{{"contract_type": "loan_agreement", "summary": "term loan",
            "financials": {{
                "money_in": {{"total_annually": {in_annual}, "total_monthly": null, "items": []}},
                "money_out": {{"total_annually": 0, "total_monthly": null, "items": []}},
                "rates": {{"interest_rate_percent": "12%", "service_fee_percent": null}},
                "currency": "INR"
            }},
            "raw_extracted_fields": {{"found_values": []}}}}"#
    )
}

#[tokio::test]
async fn ingest_and_aggregate_two_loans() -> anyhow::Result<()> {
    let model = MockModel::replying(&[&loan_response(100_000), &loan_response(50_000)]);
    let store = ContractStore::open_in_memory()?;

    let docs = vec![
        doc("Loan_Agreement_Q1.pdf", "Borrower shall repay the principal..."),
        doc("loan_refinance.pdf", "The lender agrees to advance..."),
    ];
    let batch = pipeline(&model, &store).ingest_batch(&docs).await;
    assert_eq!(batch.saved(), 2);
    assert_eq!(batch.failed(), 0);

    let rows = store.fetch_all()?;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.category == "loan_agreement"));

    let totals = aggregate(&rows);
    assert_eq!(
        totals.category("loan_agreement").unwrap().money_in_annual,
        150_000.0
    );
    assert_eq!(totals.overall.money_in_annual, 150_000.0);
    Ok(())
}

#[tokio::test]
async fn category_comes_from_filename_not_model() -> anyhow::Result<()> {
    // The model claims loan_agreement, but the filename has no loan keyword
    let model = MockModel::replying(&[&loan_response(1_000)]);
    let store = ContractStore::open_in_memory()?;

    let batch = pipeline(&model, &store)
        .ingest_batch(&[doc("report.pdf", "Annual service fees are due...")])
        .await;
    assert_eq!(batch.saved(), 1);

    let rows = store.fetch_all()?;
    // Unmatched filenames fall back to software_licensing, and the model's
    // contract_type never overrides the inferred category
    assert_eq!(rows[0].category, "software_licensing");
    let record: FinancialRecord =
        serde_json::from_str(rows[0].financials_json.as_deref().unwrap())?;
    assert_eq!(record.contract_type, Category::SoftwareLicensing);
    Ok(())
}

#[tokio::test]
async fn model_failure_substitutes_mock_record() -> anyhow::Result<()> {
    let model = MockModel::failing();
    let store = ContractStore::open_in_memory()?;

    let batch = pipeline(&model, &store)
        .ingest_batch(&[doc("loan.pdf", "Principal amount of...")])
        .await;
    assert_eq!(batch.saved(), 1);

    let rows = store.fetch_all()?;
    let record: FinancialRecord =
        serde_json::from_str(rows[0].financials_json.as_deref().unwrap())?;
    assert_eq!(
        record.financials.money_in.total_annually,
        Some(serde_json::json!(100000))
    );
    assert_eq!(record.financials.currency.as_deref(), Some("INR"));
    assert_eq!(
        record.raw_extracted_fields.found_values,
        vec!["Mock values".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn unrecoverable_response_saves_fallback_record() -> anyhow::Result<()> {
    let model = MockModel::replying(&["I'm sorry, I cannot parse this contract."]);
    let store = ContractStore::open_in_memory()?;

    let batch = pipeline(&model, &store)
        .ingest_batch(&[doc("license.pdf", "This licensing agreement...")])
        .await;
    assert_eq!(batch.saved(), 1);

    let rows = store.fetch_all()?;
    let record: FinancialRecord =
        serde_json::from_str(rows[0].financials_json.as_deref().unwrap())?;
    assert!(record.financials.money_in.total_annually.is_none());
    assert_eq!(record.raw_extracted_fields.found_values.len(), 1);
    assert!(record.raw_extracted_fields.found_values[0].starts_with("I'm sorry"));

    // The fallback record contributes zero to every total
    let totals = aggregate(&rows);
    assert_eq!(totals.overall.money_in_annual, 0.0);
    assert_eq!(totals.overall.money_out_annual, 0.0);
    Ok(())
}

#[tokio::test]
async fn blank_text_is_skipped_without_a_storage_write() -> anyhow::Result<()> {
    let model = MockModel::replying(&[&loan_response(500)]);
    let store = ContractStore::open_in_memory()?;

    let docs = vec![
        doc("empty_scan.pdf", "   \n  "),
        doc("loan.pdf", "Borrower shall repay..."),
    ];
    let batch = pipeline(&model, &store).ingest_batch(&docs).await;

    assert_eq!(batch.skipped(), 1);
    assert_eq!(batch.saved(), 1);
    assert!(matches!(
        batch.outcomes[0].1,
        Ok(ContractOutcome::Skipped(SkipReason::EmptyText))
    ));

    let rows = store.fetch_all()?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_name, "loan.pdf");
    Ok(())
}

#[tokio::test]
async fn storage_failure_does_not_halt_the_batch() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join("contract_financials_persist_failure_test");
    std::fs::create_dir_all(&dir)?;
    let db_path = dir.join("contracts.db");
    std::fs::remove_file(&db_path).ok();

    let store = ContractStore::open(&db_path)?;

    // Sabotage one specific insert through a second connection; the store's
    // own connection picks the trigger up on its next statement
    let saboteur = rusqlite::Connection::open(&db_path)?;
    saboteur.execute_batch(
        "CREATE TRIGGER reject_poisoned BEFORE INSERT ON contract
         WHEN NEW.file_name = 'loan_poisoned.pdf'
         BEGIN SELECT RAISE(ABORT, 'simulated disk failure'); END;",
    )?;
    drop(saboteur);

    let model = MockModel::replying(&[&loan_response(1_000), &loan_response(2_000)]);
    let docs = vec![
        doc("loan_poisoned.pdf", "Borrower shall repay..."),
        doc("loan_healthy.pdf", "The lender agrees to advance..."),
    ];
    let batch = pipeline(&model, &store).ingest_batch(&docs).await;

    // The failed contract is reported and the loop still reaches the next one
    assert_eq!(batch.failed(), 1);
    assert_eq!(batch.saved(), 1);
    assert!(batch.outcomes[0].1.is_err());
    assert!(matches!(
        batch.outcomes[1].1,
        Ok(ContractOutcome::Saved { .. })
    ));

    let rows = store.fetch_all()?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_name, "loan_healthy.pdf");

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[tokio::test]
async fn batch_reports_outcomes_as_contracts_complete() -> anyhow::Result<()> {
    let model = MockModel::replying(&[&loan_response(500)]);
    let store = ContractStore::open_in_memory()?;

    let docs = vec![
        doc("loan.pdf", "Borrower shall repay..."),
        doc("empty_scan.pdf", "   "),
    ];

    let mut seen: Vec<(String, bool)> = Vec::new();
    let batch = pipeline(&model, &store)
        .ingest_batch_with(&docs, |doc, outcome| {
            seen.push((
                doc.file_name.clone(),
                matches!(outcome, Ok(ContractOutcome::Saved { .. })),
            ));
        })
        .await;

    // One callback per contract, in input order, matching the final report
    assert_eq!(
        seen,
        vec![
            ("loan.pdf".to_string(), true),
            ("empty_scan.pdf".to_string(), false),
        ]
    );
    assert_eq!(batch.outcomes.len(), 2);
    Ok(())
}

#[tokio::test]
async fn prose_wrapped_response_recovers_inner_object() -> anyhow::Result<()> {
    let wrapped = format!(
        "Here is the extraction you asked for:\n```json\n{}\n```\nLet me know!",
        loan_response(42_000)
    );
    let model = MockModel::replying(&[&wrapped]);
    let store = ContractStore::open_in_memory()?;

    pipeline(&model, &store)
        .ingest_batch(&[doc("loan.pdf", "Principal...")])
        .await;

    let totals = aggregate(&store.fetch_all()?);
    assert_eq!(totals.overall.money_in_annual, 42_000.0);
    Ok(())
}

#[tokio::test]
async fn malformed_stored_row_does_not_poison_the_report() -> anyhow::Result<()> {
    let model = MockModel::replying(&[&loan_response(10_000)]);
    let store = ContractStore::open_in_memory()?;

    pipeline(&model, &store)
        .ingest_batch(&[doc("loan.pdf", "Principal...")])
        .await;

    let mut rows = store.fetch_all()?;
    rows.push(StoredContractRow {
        contract_id: 999,
        file_name: "corrupt.pdf".to_string(),
        file_path: "/contracts/corrupt.pdf".to_string(),
        category: "loan_agreement".to_string(),
        financials_json: Some("not json".to_string()),
        created_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    });

    let totals = aggregate(&rows);
    assert_eq!(totals.overall.money_in_annual, 10_000.0);

    // Same rows, same totals
    let again = aggregate(&rows);
    assert_eq!(
        again.category("loan_agreement").unwrap(),
        totals.category("loan_agreement").unwrap()
    );
    Ok(())
}

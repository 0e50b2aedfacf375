use clap::{Parser, Subcommand};
use contract_financials::{
    aggregate, extract_texts_from_folder, ContractIngestionPipeline, ContractOutcome,
    ContractStore, GeminiClient, Result,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "contract-financials", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract financial terms from every PDF in a folder and store them
    Ingest {
        /// Folder containing PDF contracts
        #[arg(long)]
        folder: PathBuf,

        /// Model name override (defaults to GEMINI_MODEL or the built-in default)
        #[arg(long)]
        model: Option<String>,

        /// SQLite database path
        #[arg(long, env = "CONTRACTS_DB", default_value = "contracts.db")]
        db: PathBuf,
    },
    /// Print per-category and overall annual totals
    Report {
        /// SQLite database path
        #[arg(long, env = "CONTRACTS_DB", default_value = "contracts.db")]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Ingest { folder, model, db } => ingest(folder, model, db).await,
        Command::Report { db } => report(db),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn ingest(folder: PathBuf, model: Option<String>, db: PathBuf) -> Result<()> {
    let mut client = GeminiClient::from_env()?;
    if let Some(model) = model {
        client = client.with_model(model);
    }
    let store = ContractStore::open(&db)?;

    let documents = extract_texts_from_folder(&folder)?;
    if documents.is_empty() {
        println!("No PDFs found in {}. Put them there and try again.", folder.display());
        return Ok(());
    }

    let pipeline = ContractIngestionPipeline::new(&client, &store);
    // Print progress per file as the batch runs, not after it finishes
    let batch = pipeline
        .ingest_batch_with(&documents, |doc, outcome| {
            print_outcome(&doc.file_name, outcome);
        })
        .await;

    println!(
        "\n{} saved, {} skipped, {} failed",
        batch.saved(),
        batch.skipped(),
        batch.failed()
    );

    Ok(())
}

fn print_outcome(file_name: &str, outcome: &Result<ContractOutcome>) {
    match outcome {
        Ok(ContractOutcome::Saved { category, .. }) => {
            println!("saved    {file_name} ({category})");
        }
        Ok(ContractOutcome::Skipped(reason)) => {
            println!("skipped  {file_name} ({reason})");
        }
        Err(e) => {
            println!("failed   {file_name} ({e})");
        }
    }
}

fn report(db: PathBuf) -> Result<()> {
    let store = ContractStore::open(&db)?;
    let rows = store.fetch_all()?;
    let totals = aggregate(&rows);

    println!("=== Totals by category (annual) ===");
    for (category, flow) in &totals.by_category {
        println!(
            "{category}: money_in_annual = {}, money_out_annual = {}",
            flow.money_in_annual, flow.money_out_annual
        );
    }
    println!("\n=== Overall totals (annual) ===");
    println!("money_in_annual = {}", totals.overall.money_in_annual);
    println!("money_out_annual = {}", totals.overall.money_out_annual);

    Ok(())
}

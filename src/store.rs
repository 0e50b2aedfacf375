//! SQLite persistence for ingested contracts.
//!
//! One append-only `contract` table: identity is assigned by the database and
//! rows are never updated after insert. The financial record is stored as a
//! JSON document in `financials_json`.

use crate::error::Result;
use crate::record::{Category, FinancialRecord};
use chrono::NaiveDateTime;
use log::debug;
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS contract (
    contract_id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    category TEXT NOT NULL,
    financials_json TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";

/// A contract about to be persisted, before storage assigns identity.
#[derive(Debug)]
pub struct NewContract<'a> {
    pub file_name: &'a str,
    pub file_path: &'a str,
    pub category: Category,
    pub record: &'a FinancialRecord,
}

/// A persisted contract row. Immutable once written.
#[derive(Debug, Clone)]
pub struct StoredContractRow {
    pub contract_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub category: String,
    pub financials_json: Option<String>,
    pub created_at: NaiveDateTime,
}

pub struct ContractStore {
    conn: Connection,
}

impl ContractStore {
    /// Open or create the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert one contract row and return the storage-assigned id. The
    /// category is normalized (lowercase, spaces to underscores) at write time.
    pub fn insert_contract(&self, contract: &NewContract<'_>) -> Result<i64> {
        let category = normalize_category(contract.category.as_str());
        let financials_json = serde_json::to_string(contract.record)?;

        self.conn.execute(
            "INSERT INTO contract (file_name, file_path, category, financials_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                contract.file_name,
                contract.file_path,
                category,
                financials_json
            ],
        )?;

        let contract_id = self.conn.last_insert_rowid();
        debug!(
            "inserted contract {} ({}) as id {}",
            contract.file_name, category, contract_id
        );
        Ok(contract_id)
    }

    /// Full ordered scan of all contract rows.
    pub fn fetch_all(&self) -> Result<Vec<StoredContractRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT contract_id, file_name, file_path, category, financials_json, created_at
             FROM contract ORDER BY contract_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredContractRow {
                    contract_id: row.get(0)?,
                    file_name: row.get(1)?,
                    file_path: row.get(2)?,
                    category: row.get(3)?,
                    financials_json: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn normalize_category(category: &str) -> String {
    category.to_lowercase().replace(' ', "_")
}

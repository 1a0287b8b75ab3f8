use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{ParsedRow, TxnType};
use crate::parser;
use crate::rules::{self, Candidate};

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn is_duplicate_row(conn: &Connection, row: &ParsedRow, signed_amount: f64) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM transactions WHERE date = ?1 AND amount = ?2 AND description = ?3",
    )?;
    Ok(stmt.exists(rusqlite::params![row.date, signed_amount, row.description])?)
}

#[derive(Debug, Default)]
pub struct ImportOptions<'a> {
    pub bank_account: Option<&'a str>,
    pub starting_balance: Option<f64>,
    pub ending_balance: Option<f64>,
}

#[derive(Debug)]
pub struct ImportResult {
    pub statement_id: Option<i64>,
    pub imported: usize,
    pub skipped: usize,
    pub categorized: usize,
    pub duplicate_file: bool,
    /// True when the parser recognized nothing in the file. A normal outcome,
    /// surfaced to the user as "no data found" rather than an error.
    pub no_data: bool,
}

impl ImportResult {
    fn empty() -> Self {
        ImportResult {
            statement_id: None,
            imported: 0,
            skipped: 0,
            categorized: 0,
            duplicate_file: false,
            no_data: false,
        }
    }
}

/// Import a statement file: parse it, create the statement record with its
/// inferred period, and insert each row as a signed ledger transaction tagged
/// with the statement's id, pre-categorized through the active rule set.
///
/// Whole files are deduplicated by checksum; individual rows by
/// date + amount + description.
pub fn import_statement(
    conn: &Connection,
    file_path: &Path,
    options: &ImportOptions<'_>,
) -> Result<ImportResult> {
    let content = std::fs::read_to_string(file_path)?;
    let checksum = compute_checksum(content.as_bytes());

    {
        let mut stmt = conn.prepare("SELECT 1 FROM statements WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            return Ok(ImportResult {
                duplicate_file: true,
                ..ImportResult::empty()
            });
        }
    }

    let parsed = parser::parse(&content);
    if parsed.rows.is_empty() {
        return Ok(ImportResult {
            no_data: true,
            ..ImportResult::empty()
        });
    }

    conn.execute(
        "INSERT INTO statements (bank_account, filename, start_date, end_date, \
                                 starting_balance, ending_balance, record_count, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            options.bank_account,
            file_path.file_name().and_then(|n| n.to_str()),
            parsed.start_date,
            parsed.end_date,
            options.starting_balance,
            options.ending_balance,
            parsed.rows.len() as i64,
            checksum,
        ],
    )?;
    let statement_id = conn.last_insert_rowid();

    let active_rules = rules::load_active_rules(conn)?;

    let mut imported = 0usize;
    let mut skipped = 0usize;
    let mut categorized = 0usize;
    for row in &parsed.rows {
        let signed_amount = match row.txn_type {
            TxnType::Expense => -row.amount,
            TxnType::Income => row.amount,
        };
        if is_duplicate_row(conn, row, signed_amount)? {
            skipped += 1;
            continue;
        }
        let candidate = Candidate {
            vendor: None,
            description: Some(&row.description),
            txn_type: Some(row.txn_type),
        };
        let category = rules::apply_rules(&candidate, &active_rules);
        if category.is_some() {
            categorized += 1;
        }
        conn.execute(
            "INSERT INTO transactions (date, description, amount, txn_type, category, statement_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.date,
                row.description,
                signed_amount,
                row.txn_type.as_str(),
                category,
                statement_id
            ],
        )?;
        imported += 1;
    }

    Ok(ImportResult {
        statement_id: Some(statement_id),
        imported,
        skipped,
        categorized,
        duplicate_file: false,
        no_data: false,
    })
}

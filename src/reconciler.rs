use chrono::NaiveDate;
use rusqlite::Connection;

use crate::error::{Result, TallyError};
use crate::models::{BankStatement, Transaction, TxnType, BALANCE_EPSILON};

/// Suggested pairs must agree on absolute amount within the balance epsilon
/// and sit within this many calendar days of each other.
const MATCH_WINDOW_DAYS: i64 = 2;

#[derive(Debug)]
pub struct BalanceSummary {
    pub book_ending_balance: f64,
    pub difference: f64,
    pub can_complete: bool,
}

/// Compute the running balance over a statement's tagged transactions and
/// whether the reconciliation is eligible for completion. Amounts are signed
/// (income positive, expense negative).
///
/// Completion requires at least one statement transaction, every one of them
/// reconciled, and a balance difference inside the epsilon. The matcher only
/// reports the boolean; refusing an ineligible completion is the caller's job.
pub fn balance_summary(
    starting_balance: f64,
    statement_ending_balance: f64,
    statement_txns: &[Transaction],
) -> BalanceSummary {
    let book_ending_balance =
        starting_balance + statement_txns.iter().map(|t| t.amount).sum::<f64>();
    let difference = statement_ending_balance - book_ending_balance;
    let can_complete = !statement_txns.is_empty()
        && statement_txns.iter().all(|t| t.is_reconciled)
        && difference.abs() < BALANCE_EPSILON;
    BalanceSummary {
        book_ending_balance,
        difference,
        can_complete,
    }
}

/// Greedy first-match pairing of unreconciled book transactions against a
/// statement's transactions: each book entry takes the earliest-indexed unused
/// statement entry whose absolute amount is within the epsilon and whose date
/// is within two calendar days. Intentionally not an optimal assignment; the
/// order-dependent behavior is part of the contract. Returns index pairs
/// `(book_idx, statement_idx)`.
pub fn suggest_matches(
    book_txns: &[Transaction],
    statement_txns: &[Transaction],
) -> Vec<(usize, usize)> {
    let mut used = vec![false; statement_txns.len()];
    let mut pairs = Vec::new();

    for (book_idx, book) in book_txns.iter().enumerate() {
        let Some(book_date) = parse_date(&book.date) else { continue };
        for (stmt_idx, stmt) in statement_txns.iter().enumerate() {
            if used[stmt_idx] {
                continue;
            }
            if (book.amount.abs() - stmt.amount.abs()).abs() >= BALANCE_EPSILON {
                continue;
            }
            let Some(stmt_date) = parse_date(&stmt.date) else { continue };
            if (book_date - stmt_date).num_days().abs() > MATCH_WINDOW_DAYS {
                continue;
            }
            used[stmt_idx] = true;
            pairs.push((book_idx, stmt_idx));
            break;
        }
    }
    pairs
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Apply a suggestion: mark the book-side transaction reconciled. The
/// statement-side row is the tagged import and is not touched here.
pub fn accept_match(conn: &Connection, txn_id: i64, date: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE transactions SET is_reconciled = 1, reconciled_date = ?1 WHERE id = ?2",
        rusqlite::params![date, txn_id],
    )?;
    if changed == 0 {
        return Err(TallyError::UnknownTransaction(txn_id));
    }
    Ok(())
}

/// Terminal state transition for a statement. Unconditional by contract: the
/// caller gates on `can_complete` before invoking.
pub fn complete(conn: &Connection, statement_id: i64, date: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE statements SET reconciled = 1, reconciled_date = ?1 WHERE id = ?2",
        rusqlite::params![date, statement_id],
    )?;
    if changed == 0 {
        return Err(TallyError::UnknownStatement(statement_id));
    }
    Ok(())
}

pub fn load_statement(conn: &Connection, statement_id: i64) -> Result<BankStatement> {
    conn.query_row(
        "SELECT id, bank_account, filename, start_date, end_date, starting_balance, \
                ending_balance, reconciled, reconciled_date \
         FROM statements WHERE id = ?1",
        [statement_id],
        |row| {
            Ok(BankStatement {
                id: row.get(0)?,
                bank_account: row.get(1)?,
                filename: row.get(2)?,
                start_date: row.get(3)?,
                end_date: row.get(4)?,
                starting_balance: row.get(5)?,
                ending_balance: row.get(6)?,
                reconciled: row.get::<_, i64>(7)? != 0,
                reconciled_date: row.get(8)?,
            })
        },
    )
    .map_err(|_| TallyError::UnknownStatement(statement_id))
}

fn txn_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        vendor: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        txn_type: TxnType::parse(&row.get::<_, String>(5)?).unwrap_or(TxnType::Expense),
        category: row.get(6)?,
        is_reconciled: row.get::<_, i64>(7)? != 0,
        reconciled_date: row.get(8)?,
        statement_id: row.get(9)?,
    })
}

const TXN_COLUMNS: &str = "id, date, vendor, description, amount, txn_type, category, \
                           is_reconciled, reconciled_date, statement_id";

/// Ledger rows tagged to this statement, in stable date-then-id order.
pub fn load_statement_transactions(
    conn: &Connection,
    statement_id: i64,
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TXN_COLUMNS} FROM transactions WHERE statement_id = ?1 ORDER BY date, id"
    ))?;
    let rows = stmt
        .query_map([statement_id], |row| txn_from_row(row))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

/// Unreconciled ledger rows in the statement's date window that are not
/// tagged to it. Same stable ordering; the suggestion algorithm's tie-break
/// is whichever row this query yields first.
pub fn load_unreconciled_book_transactions(
    conn: &Connection,
    statement_id: i64,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TXN_COLUMNS} FROM transactions \
         WHERE is_reconciled = 0 \
           AND (statement_id IS NULL OR statement_id != ?1) \
           AND date >= ?2 AND date <= ?3 \
         ORDER BY date, id"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![statement_id, start_date, end_date],
            |row| txn_from_row(row),
        )?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

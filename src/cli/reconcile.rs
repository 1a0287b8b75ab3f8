use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::models::{BankStatement, Transaction};
use crate::reconciler::{
    accept_match, balance_summary, complete, load_statement, load_statement_transactions,
    load_unreconciled_book_transactions, suggest_matches, BalanceSummary,
};
use crate::settings::db_path;

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn summarize(
    conn: &Connection,
    statement_id: i64,
) -> Result<(BankStatement, Vec<Transaction>, BalanceSummary)> {
    let statement = load_statement(conn, statement_id)?;
    let txns = load_statement_transactions(conn, statement_id)?;
    let ending = statement.ending_balance.ok_or_else(|| {
        TallyError::Other(format!(
            "Statement {statement_id} has no ending balance; record one with \
             `tally reconcile status {statement_id} --ending-balance <amount>`"
        ))
    })?;
    let starting = statement.starting_balance.unwrap_or(0.0);
    let summary = balance_summary(starting, ending, &txns);
    Ok((statement, txns, summary))
}

pub fn status(statement_id: i64, ending_balance: Option<f64>) -> Result<()> {
    let conn = get_connection(&db_path())?;

    if let Some(balance) = ending_balance {
        let changed = conn.execute(
            "UPDATE statements SET ending_balance = ?1 WHERE id = ?2",
            rusqlite::params![balance, statement_id],
        )?;
        if changed == 0 {
            return Err(TallyError::UnknownStatement(statement_id));
        }
    }

    let (statement, txns, summary) = summarize(&conn, statement_id)?;
    let reconciled_count = txns.iter().filter(|t| t.is_reconciled).count();

    println!("Statement #{statement_id} ({})", statement.filename.as_deref().unwrap_or("?"));
    println!("Starting balance:    {}", money(statement.starting_balance.unwrap_or(0.0)));
    println!("Book ending balance: {}", money(summary.book_ending_balance));
    println!("Statement ending:    {}", money(statement.ending_balance.unwrap_or(0.0)));
    println!("Difference:          {}", money(summary.difference));
    println!("Reconciled rows:     {reconciled_count} of {}", txns.len());
    if summary.can_complete {
        println!("{}", "Ready to complete.".green());
    } else {
        println!("{}", "Not ready to complete.".yellow());
    }
    Ok(())
}

pub fn suggest(statement_id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let statement = load_statement(&conn, statement_id)?;

    let (Some(start), Some(end)) = (statement.start_date.as_deref(), statement.end_date.as_deref())
    else {
        return Err(TallyError::Other(format!(
            "Statement {statement_id} has no recorded period; cannot scope suggestions"
        )));
    };

    let statement_txns = load_statement_transactions(&conn, statement_id)?;
    let book_txns = load_unreconciled_book_transactions(&conn, statement_id, start, end)?;
    let pairs = suggest_matches(&book_txns, &statement_txns);

    if pairs.is_empty() {
        println!("No suggested matches.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Book ID", "Date", "Description", "Amount", "Statement Row"]);
    for (book_idx, stmt_idx) in &pairs {
        let book = &book_txns[*book_idx];
        let stmt = &statement_txns[*stmt_idx];
        table.add_row(vec![
            Cell::new(book.id.unwrap_or_default()),
            Cell::new(&book.date),
            Cell::new(book.description.as_deref().unwrap_or("")),
            Cell::new(money(book.amount)),
            Cell::new(format!("#{} on {}", stmt.id.unwrap_or_default(), stmt.date)),
        ]);
    }
    println!("Suggested matches\n{table}");
    println!("Apply with `tally reconcile accept <book-id>`.");
    Ok(())
}

pub fn accept(transaction_id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    accept_match(&conn, transaction_id, &today())?;
    println!("Transaction {transaction_id} marked reconciled.");
    Ok(())
}

pub fn run_complete(statement_id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let (_, _, summary) = summarize(&conn, statement_id)?;

    // The engine reports eligibility; gating the terminal transition is on us.
    if !summary.can_complete {
        return Err(TallyError::Other(format!(
            "Cannot complete: difference is {} and all statement rows must be reconciled",
            money(summary.difference)
        )));
    }

    complete(&conn, statement_id, &today())?;
    println!("{}", format!("Statement {statement_id} reconciled.").green());
    Ok(())
}

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::{db_path, get_data_dir};

pub fn run() -> Result<()> {
    let data_dir = get_data_dir();
    let path = db_path();

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", path.display());

    if !path.exists() {
        println!();
        println!("Database not found. Run `tally init` to set up.");
        return Ok(());
    }

    let conn = get_connection(&path)?;

    let statements: i64 = conn.query_row("SELECT count(*) FROM statements", [], |r| r.get(0))?;
    let transactions: i64 =
        conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
    let uncategorized: i64 = conn.query_row(
        "SELECT count(*) FROM transactions WHERE category IS NULL",
        [],
        |r| r.get(0),
    )?;
    let rules: i64 =
        conn.query_row("SELECT count(*) FROM rules WHERE is_active = 1", [], |r| r.get(0))?;
    let open_invoices: i64 = conn.query_row(
        "SELECT count(*) FROM invoices WHERE status NOT IN ('paid', 'cancelled')",
        [],
        |r| r.get(0),
    )?;
    let outstanding: f64 = conn.query_row(
        "SELECT COALESCE(SUM(balance_due), 0) FROM invoices WHERE status NOT IN ('paid', 'cancelled')",
        [],
        |r| r.get(0),
    )?;

    println!();
    println!("Statements:     {statements}");
    println!("Transactions:   {transactions}");
    println!("Uncategorized:  {uncategorized}");
    println!("Rules:          {rules}");
    println!("Open invoices:  {open_invoices} ({} outstanding)", money(outstanding));
    Ok(())
}

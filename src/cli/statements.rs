use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::db_path;

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare(
        "SELECT id, bank_account, filename, start_date, end_date, ending_balance, reconciled \
         FROM statements ORDER BY start_date, id",
    )?;
    let rows: Vec<(i64, Option<String>, Option<String>, Option<String>, Option<String>, Option<f64>, i64)> =
        stmt.query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Account", "File", "Period", "Ending", "Reconciled"]);
    for (id, account, filename, start, end, ending, reconciled) in rows {
        let period = format!(
            "{} \u{2192} {}",
            start.as_deref().unwrap_or("?"),
            end.as_deref().unwrap_or("?")
        );
        let flag = if reconciled != 0 {
            "yes".green().to_string()
        } else {
            "no".yellow().to_string()
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(account.unwrap_or_default()),
            Cell::new(filename.unwrap_or_default()),
            Cell::new(period),
            Cell::new(ending.map(money).unwrap_or_default()),
            Cell::new(flag),
        ]);
    }
    println!("Statements\n{table}");
    Ok(())
}

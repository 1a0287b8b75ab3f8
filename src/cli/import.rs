use std::path::Path;

use crate::db::get_connection;
use crate::error::Result;
use crate::importer::{import_statement, ImportOptions};
use crate::rules::categorize_uncategorized;
use crate::settings::db_path;

pub fn run(
    file: &str,
    account: Option<&str>,
    starting_balance: Option<f64>,
    ending_balance: Option<f64>,
) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let options = ImportOptions {
        bank_account: account,
        starting_balance,
        ending_balance,
    };
    let result = import_statement(&conn, Path::new(file), &options)?;

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }
    if result.no_data {
        println!("No transaction data found in {file}.");
        return Ok(());
    }

    println!(
        "Statement #{}: {} imported, {} skipped (duplicates), {} pre-categorized",
        result.statement_id.unwrap_or_default(),
        result.imported,
        result.skipped,
        result.categorized
    );

    let catch_up = categorize_uncategorized(&conn)?;
    if catch_up.unmatched > 0 {
        println!("{} transactions still uncategorized", catch_up.unmatched);
    }

    Ok(())
}

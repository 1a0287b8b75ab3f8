use crate::db::get_connection;
use crate::error::Result;
use crate::rules::categorize_uncategorized;
use crate::settings::db_path;

pub fn run() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let outcome = categorize_uncategorized(&conn)?;
    println!(
        "{} categorized, {} still uncategorized",
        outcome.categorized, outcome.unmatched
    );
    Ok(())
}

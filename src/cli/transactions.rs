use crate::db::{category_exists, get_connection};
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::models::TxnType;
use crate::rules::{apply_rules, load_active_rules, Candidate};
use crate::settings::db_path;

/// Manually enter a ledger transaction. The amount is signed: negative for
/// an expense, positive for income. Without an explicit category, the active
/// rule set gets a shot at the vendor/description.
pub fn add(
    date: &str,
    amount: f64,
    vendor: Option<&str>,
    description: Option<&str>,
    category: Option<&str>,
) -> Result<()> {
    if amount == 0.0 {
        return Err(TallyError::Other(
            "Transaction amount must be non-zero".to_string(),
        ));
    }
    let conn = get_connection(&db_path())?;
    let txn_type = if amount < 0.0 { TxnType::Expense } else { TxnType::Income };

    let category = match category {
        Some(c) => {
            if !category_exists(&conn, c)? {
                return Err(TallyError::UnknownCategory(c.to_string()));
            }
            Some(c.to_string())
        }
        None => {
            let rules = load_active_rules(&conn)?;
            apply_rules(
                &Candidate {
                    vendor,
                    description,
                    txn_type: Some(txn_type),
                },
                &rules,
            )
        }
    };

    conn.execute(
        "INSERT INTO transactions (date, vendor, description, amount, txn_type, category) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![date, vendor, description, amount, txn_type.as_str(), category],
    )?;
    println!(
        "Added transaction {}: {date} {} \u{2192} {}",
        conn.last_insert_rowid(),
        money(amount),
        category.as_deref().unwrap_or("uncategorized")
    );
    Ok(())
}

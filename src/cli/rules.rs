use comfy_table::{Cell, Table};

use crate::db::{category_exists, get_connection};
use crate::error::{Result, TallyError};
use crate::models::{AppliesTo, MatchType};
use crate::rules::{learn_rule, upsert_rule};
use crate::settings::db_path;

pub fn add(
    value: &str,
    category: &str,
    match_type: &str,
    applies_to: &str,
    priority: i64,
) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let match_type = MatchType::parse(match_type)
        .ok_or_else(|| TallyError::Other(format!("Unknown match type: {match_type}")))?;
    let applies_to = AppliesTo::parse(applies_to)
        .ok_or_else(|| TallyError::Other(format!("Unknown applies-to value: {applies_to}")))?;
    if !category_exists(&conn, category)? {
        return Err(TallyError::UnknownCategory(category.to_string()));
    }

    let outcome = upsert_rule(&conn, match_type, value, category, applies_to, priority)?;
    if outcome.updated {
        println!("Updated rule {}: '{value}' \u{2192} {category}", outcome.rule_id);
    } else {
        println!("Added rule {}: '{value}' \u{2192} {category}", outcome.rule_id);
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare(
        "SELECT id, match_type, match_value, category, applies_to, priority \
         FROM rules WHERE is_active = 1 ORDER BY priority, created_at DESC",
    )?;
    let rows: Vec<(i64, String, String, String, String, i64)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Match", "Value", "Category", "Applies To", "Priority"]);
    for (id, match_type, value, category, applies_to, priority) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(match_type),
            Cell::new(value),
            Cell::new(category),
            Cell::new(applies_to),
            Cell::new(priority),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}

pub fn disable(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let row: std::result::Result<(String, i64), _> = conn.query_row(
        "SELECT match_value, is_active FROM rules WHERE id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    );

    match row {
        Err(_) => Err(TallyError::Other(format!("No rule with ID {id}"))),
        Ok((_, 0)) => Err(TallyError::Other(format!("Rule {id} is already inactive"))),
        Ok((value, _)) => {
            conn.execute("UPDATE rules SET is_active = 0 WHERE id = ?1", [id])?;
            println!("Disabled rule {id}: '{value}'");
            Ok(())
        }
    }
}

pub fn learn(transaction_id: i64, category: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    if !category_exists(&conn, category)? {
        return Err(TallyError::UnknownCategory(category.to_string()));
    }

    match learn_rule(&conn, transaction_id, category)? {
        Some(outcome) if outcome.updated => {
            println!("Set category and re-taught rule {}", outcome.rule_id)
        }
        Some(outcome) => println!("Set category and added rule {}", outcome.rule_id),
        None => println!("Set category; transaction has no vendor or description to learn from"),
    }
    Ok(())
}

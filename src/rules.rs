use rusqlite::Connection;

use crate::error::{Result, TallyError};
use crate::models::{AppliesTo, CategoryRule, MatchType, TxnType};

/// A transaction-shaped candidate for categorization. Only the fields the
/// rule vocabulary can see.
#[derive(Debug, Default)]
pub struct Candidate<'a> {
    pub vendor: Option<&'a str>,
    pub description: Option<&'a str>,
    pub txn_type: Option<TxnType>,
}

/// Lowercase, trim, and collapse internal whitespace runs. Applied identically
/// to rule match values and candidate fields so comparisons are plain
/// equality/containment.
pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Return the category of the first matching rule, or None.
///
/// Rules are filtered to active ones compatible with the candidate's type
/// (expense when unspecified), then ordered by priority ascending with newer
/// `created_at` breaking ties, so a recent correction outranks an older rule
/// at the same priority.
pub fn apply_rules(candidate: &Candidate, rules: &[CategoryRule]) -> Option<String> {
    let txn_type = candidate.txn_type.unwrap_or(TxnType::Expense);

    let mut eligible: Vec<&CategoryRule> = rules
        .iter()
        .filter(|r| r.is_active && r.applies_to.covers(txn_type))
        .collect();
    eligible.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    let vendor = candidate.vendor.map(normalize);
    let description = candidate.description.map(normalize);

    for rule in eligible {
        let value = normalize(&rule.match_value);
        let hit = match rule.match_type {
            MatchType::VendorExact => vendor.as_deref() == Some(value.as_str()),
            MatchType::VendorContains => {
                vendor.as_deref().is_some_and(|v| v.contains(&value))
            }
            MatchType::DescriptionContains => {
                description.as_deref().is_some_and(|d| d.contains(&value))
            }
        };
        if hit {
            return Some(rule.category.clone());
        }
    }
    None
}

/// A proposed rule derived from a manual category edit. Callers persist it
/// (via [`upsert_rule`]) only on explicit user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSuggestion {
    pub match_type: MatchType,
    pub match_value: String,
    pub category: String,
}

/// Build a rule suggestion from an edited transaction: prefer an exact vendor
/// match, fall back to description containment (truncated to 100 chars).
pub fn suggest_rule(
    vendor: Option<&str>,
    description: Option<&str>,
    category: &str,
) -> Option<RuleSuggestion> {
    let category = category.trim();
    if category.is_empty() {
        return None;
    }
    if let Some(v) = vendor.map(str::trim).filter(|v| !v.is_empty()) {
        return Some(RuleSuggestion {
            match_type: MatchType::VendorExact,
            match_value: v.to_string(),
            category: category.to_string(),
        });
    }
    if let Some(d) = description.map(str::trim).filter(|d| !d.is_empty()) {
        return Some(RuleSuggestion {
            match_type: MatchType::DescriptionContains,
            match_value: d.chars().take(100).collect(),
            category: category.to_string(),
        });
    }
    None
}

pub fn load_active_rules(conn: &Connection) -> Result<Vec<CategoryRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, match_type, match_value, category, applies_to, priority, is_active, created_at \
         FROM rules WHERE is_active = 1",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CategoryRule {
                id: row.get(0)?,
                match_type: MatchType::parse(&row.get::<_, String>(1)?)
                    .unwrap_or(MatchType::DescriptionContains),
                match_value: row.get(2)?,
                category: row.get(3)?,
                applies_to: AppliesTo::parse(&row.get::<_, String>(4)?).unwrap_or(AppliesTo::Both),
                priority: row.get(5)?,
                is_active: row.get::<_, i64>(6)? != 0,
                created_at: row.get(7)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

pub struct UpsertOutcome {
    pub rule_id: i64,
    pub updated: bool,
}

/// Insert a rule, or update the existing rule sharing the same normalized
/// `(match_type, match_value)` key. An update re-targets the category and
/// reactivates the rule; repeated corrections on the same vendor therefore
/// never pile up duplicates.
pub fn upsert_rule(
    conn: &Connection,
    match_type: MatchType,
    match_value: &str,
    category: &str,
    applies_to: AppliesTo,
    priority: i64,
) -> Result<UpsertOutcome> {
    let key = normalize(match_value);

    let mut stmt =
        conn.prepare("SELECT id, match_value FROM rules WHERE match_type = ?1")?;
    let existing: Option<i64> = stmt
        .query_map([match_type.as_str()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .filter_map(|r| r.ok())
        .find(|(_, value)| normalize(value) == key)
        .map(|(id, _)| id);

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE rules SET category = ?1, is_active = 1 WHERE id = ?2",
                rusqlite::params![category, id],
            )?;
            Ok(UpsertOutcome {
                rule_id: id,
                updated: true,
            })
        }
        None => {
            conn.execute(
                "INSERT INTO rules (match_type, match_value, category, applies_to, priority) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    match_type.as_str(),
                    match_value,
                    category,
                    applies_to.as_str(),
                    priority
                ],
            )?;
            Ok(UpsertOutcome {
                rule_id: conn.last_insert_rowid(),
                updated: false,
            })
        }
    }
}

pub struct CategorizeOutcome {
    pub categorized: usize,
    pub unmatched: usize,
}

/// Run the rule set over every transaction that still has no category.
pub fn categorize_uncategorized(conn: &Connection) -> Result<CategorizeOutcome> {
    let rules = load_active_rules(conn)?;

    let mut stmt = conn.prepare(
        "SELECT id, vendor, description, txn_type FROM transactions WHERE category IS NULL",
    )?;
    let pending: Vec<(i64, Option<String>, Option<String>, String)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut categorized = 0usize;
    let mut unmatched = 0usize;
    for (id, vendor, description, txn_type) in &pending {
        let candidate = Candidate {
            vendor: vendor.as_deref(),
            description: description.as_deref(),
            txn_type: TxnType::parse(txn_type),
        };
        match apply_rules(&candidate, &rules) {
            Some(category) => {
                conn.execute(
                    "UPDATE transactions SET category = ?1 WHERE id = ?2",
                    rusqlite::params![category, id],
                )?;
                categorized += 1;
            }
            None => unmatched += 1,
        }
    }

    Ok(CategorizeOutcome {
        categorized,
        unmatched,
    })
}

/// Apply a user's category edit to a transaction and teach a matching rule
/// from it. The explicit CLI invocation stands in for the confirmation step.
pub fn learn_rule(conn: &Connection, txn_id: i64, category: &str) -> Result<Option<UpsertOutcome>> {
    let (vendor, description, txn_type): (Option<String>, Option<String>, String) = conn
        .query_row(
            "SELECT vendor, description, txn_type FROM transactions WHERE id = ?1",
            [txn_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|_| TallyError::UnknownTransaction(txn_id))?;

    conn.execute(
        "UPDATE transactions SET category = ?1 WHERE id = ?2",
        rusqlite::params![category, txn_id],
    )?;

    let Some(suggestion) = suggest_rule(vendor.as_deref(), description.as_deref(), category) else {
        return Ok(None);
    };
    let applies_to = match TxnType::parse(&txn_type) {
        Some(TxnType::Income) => AppliesTo::Income,
        _ => AppliesTo::Expense,
    };
    let outcome = upsert_rule(
        conn,
        suggestion.match_type,
        &suggestion.match_value,
        &suggestion.category,
        applies_to,
        100,
    )?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn rule(
        match_type: MatchType,
        value: &str,
        category: &str,
        priority: i64,
        created_at: &str,
    ) -> CategoryRule {
        CategoryRule {
            id: None,
            match_type,
            match_value: value.to_string(),
            category: category.to_string(),
            applies_to: AppliesTo::Both,
            priority,
            is_active: true,
            created_at: created_at.to_string(),
        }
    }

    fn expense(description: &str) -> Candidate<'_> {
        Candidate {
            vendor: None,
            description: Some(description),
            txn_type: Some(TxnType::Expense),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Starbucks  "), "starbucks");
        assert_eq!(normalize("COFFEE   SHOP\tNo. 5"), "coffee shop no. 5");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_lower_priority_value_wins() {
        let rules = vec![
            rule(MatchType::DescriptionContains, "coffee", "Dining & Coffee", 2, "2024-01-01 00:00:00"),
            rule(MatchType::DescriptionContains, "coffee", "Groceries", 1, "2024-01-01 00:00:00"),
        ];
        assert_eq!(
            apply_rules(&expense("COFFEE SHOP"), &rules).as_deref(),
            Some("Groceries")
        );
    }

    #[test]
    fn test_newer_rule_breaks_priority_tie() {
        let rules = vec![
            rule(MatchType::DescriptionContains, "coffee", "Groceries", 1, "2024-01-01 00:00:00"),
            rule(MatchType::DescriptionContains, "coffee", "Dining & Coffee", 1, "2024-06-01 00:00:00"),
        ];
        assert_eq!(
            apply_rules(&expense("COFFEE SHOP"), &rules).as_deref(),
            Some("Dining & Coffee")
        );
    }

    #[test]
    fn test_vendor_exact_normalizes_both_sides() {
        let rules = vec![rule(
            MatchType::VendorExact,
            " Starbucks ",
            "Dining & Coffee",
            1,
            "2024-01-01 00:00:00",
        )];
        let candidate = Candidate {
            vendor: Some("starbucks"),
            description: None,
            txn_type: Some(TxnType::Expense),
        };
        assert_eq!(apply_rules(&candidate, &rules).as_deref(), Some("Dining & Coffee"));
    }

    #[test]
    fn test_vendor_exact_rejects_partial() {
        let rules = vec![rule(
            MatchType::VendorExact,
            "Starbucks",
            "Dining & Coffee",
            1,
            "2024-01-01 00:00:00",
        )];
        let candidate = Candidate {
            vendor: Some("Starbucks Reserve"),
            description: None,
            txn_type: Some(TxnType::Expense),
        };
        assert_eq!(apply_rules(&candidate, &rules), None);
    }

    #[test]
    fn test_inactive_rule_never_fires() {
        let mut r = rule(
            MatchType::DescriptionContains,
            "coffee",
            "Dining & Coffee",
            1,
            "2024-01-01 00:00:00",
        );
        r.is_active = false;
        assert_eq!(apply_rules(&expense("COFFEE SHOP"), &[r]), None);
    }

    #[test]
    fn test_applies_to_filters_by_type() {
        let mut r = rule(
            MatchType::DescriptionContains,
            "payment",
            "Client Payments",
            1,
            "2024-01-01 00:00:00",
        );
        r.applies_to = AppliesTo::Income;
        // Default candidate type is expense, so an income-only rule is skipped.
        let candidate = Candidate {
            vendor: None,
            description: Some("PAYMENT RECEIVED"),
            txn_type: None,
        };
        assert_eq!(apply_rules(&candidate, &[r.clone()]), None);

        let income = Candidate {
            vendor: None,
            description: Some("PAYMENT RECEIVED"),
            txn_type: Some(TxnType::Income),
        };
        assert_eq!(apply_rules(&income, &[r]).as_deref(), Some("Client Payments"));
    }

    #[test]
    fn test_no_rules_returns_none() {
        assert_eq!(apply_rules(&expense("ANYTHING"), &[]), None);
    }

    #[test]
    fn test_suggest_rule_prefers_vendor() {
        let s = suggest_rule(Some(" Starbucks "), Some("CARD PURCHASE 1234"), "Dining & Coffee")
            .unwrap();
        assert_eq!(s.match_type, MatchType::VendorExact);
        assert_eq!(s.match_value, "Starbucks");
    }

    #[test]
    fn test_suggest_rule_falls_back_to_description() {
        let long = "X".repeat(150);
        let s = suggest_rule(None, Some(&long), "Groceries").unwrap();
        assert_eq!(s.match_type, MatchType::DescriptionContains);
        assert_eq!(s.match_value.chars().count(), 100);
    }

    #[test]
    fn test_suggest_rule_requires_key_and_category() {
        assert!(suggest_rule(None, None, "Groceries").is_none());
        assert!(suggest_rule(Some("Starbucks"), None, "  ").is_none());
        assert!(suggest_rule(Some("  "), Some("  "), "Groceries").is_none());
    }

    fn test_db() -> (tempfile::TempDir, rusqlite::Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_upsert_rule_updates_existing_key() {
        let (_dir, conn) = test_db();
        let first = upsert_rule(
            &conn,
            MatchType::VendorExact,
            "Starbucks",
            "Groceries",
            AppliesTo::Expense,
            100,
        )
        .unwrap();
        assert!(!first.updated);

        // Same key modulo case/whitespace: update, not duplicate.
        let second = upsert_rule(
            &conn,
            MatchType::VendorExact,
            "  STARBUCKS ",
            "Dining & Coffee",
            AppliesTo::Expense,
            100,
        )
        .unwrap();
        assert!(second.updated);
        assert_eq!(second.rule_id, first.rule_id);

        let count: i64 = conn.query_row("SELECT count(*) FROM rules", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
        let category: String = conn
            .query_row("SELECT category FROM rules WHERE id = ?1", [first.rule_id], |r| r.get(0))
            .unwrap();
        assert_eq!(category, "Dining & Coffee");
    }

    #[test]
    fn test_upsert_rule_reactivates() {
        let (_dir, conn) = test_db();
        let first = upsert_rule(
            &conn,
            MatchType::DescriptionContains,
            "netflix",
            "Software & Subscriptions",
            AppliesTo::Expense,
            100,
        )
        .unwrap();
        conn.execute("UPDATE rules SET is_active = 0 WHERE id = ?1", [first.rule_id]).unwrap();

        upsert_rule(
            &conn,
            MatchType::DescriptionContains,
            "NETFLIX",
            "Software & Subscriptions",
            AppliesTo::Expense,
            100,
        )
        .unwrap();
        let active: i64 = conn
            .query_row("SELECT is_active FROM rules WHERE id = ?1", [first.rule_id], |r| r.get(0))
            .unwrap();
        assert_eq!(active, 1);
    }

    #[test]
    fn test_categorize_uncategorized() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO transactions (date, description, amount, txn_type) \
             VALUES ('2024-01-05', 'COFFEE SHOP NO 5', -4.50, 'expense')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO transactions (date, description, amount, txn_type) \
             VALUES ('2024-01-06', 'MYSTERY VENDOR', -9.00, 'expense')",
            [],
        )
        .unwrap();
        upsert_rule(
            &conn,
            MatchType::DescriptionContains,
            "coffee",
            "Dining & Coffee",
            AppliesTo::Expense,
            100,
        )
        .unwrap();

        let outcome = categorize_uncategorized(&conn).unwrap();
        assert_eq!(outcome.categorized, 1);
        assert_eq!(outcome.unmatched, 1);
        let category: Option<String> = conn
            .query_row(
                "SELECT category FROM transactions WHERE description = 'COFFEE SHOP NO 5'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(category.as_deref(), Some("Dining & Coffee"));
    }

    #[test]
    fn test_learn_rule_sets_category_and_upserts() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO transactions (date, vendor, description, amount, txn_type) \
             VALUES ('2024-01-05', 'Starbucks', 'CARD PURCHASE', -4.50, 'expense')",
            [],
        )
        .unwrap();
        let txn_id = conn.last_insert_rowid();

        let outcome = learn_rule(&conn, txn_id, "Dining & Coffee").unwrap().unwrap();
        assert!(!outcome.updated);

        let category: Option<String> = conn
            .query_row("SELECT category FROM transactions WHERE id = ?1", [txn_id], |r| r.get(0))
            .unwrap();
        assert_eq!(category.as_deref(), Some("Dining & Coffee"));

        let (match_type, match_value): (String, String) = conn
            .query_row("SELECT match_type, match_value FROM rules LIMIT 1", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(match_type, "vendor_exact");
        assert_eq!(match_value, "Starbucks");
    }

    #[test]
    fn test_learn_rule_unknown_transaction() {
        let (_dir, conn) = test_db();
        assert!(learn_rule(&conn, 999, "Groceries").is_err());
    }
}

use chrono::NaiveDate;

use crate::models::{ParsedRow, TxnType};

// Header synonym lists, compared against lowercased header cells by substring.
const DATE_COLUMNS: &[&str] = &["date", "posting date", "trans date"];
const DESCRIPTION_COLUMNS: &[&str] = &["description", "memo", "details", "name", "payee"];
const AMOUNT_COLUMNS: &[&str] = &["amount", "transaction amount"];
const DEBIT_COLUMNS: &[&str] = &["debit", "withdrawal"];
const CREDIT_COLUMNS: &[&str] = &["credit", "deposit"];

/// Parsed output of one statement file: normalized rows plus the reporting
/// period inferred from row dates.
#[derive(Debug, Default)]
pub struct StatementImport {
    pub rows: Vec<ParsedRow>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Best-effort parse of a delimited bank export. The first line is treated as
/// a header; columns are resolved by synonym lookup. Malformed rows are
/// skipped, never raised: an unrecognizable file simply yields zero rows, and
/// the caller decides how to tell the user.
pub fn parse(content: &str) -> StatementImport {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = rdr.records();

    let header = match records.next() {
        Some(Ok(record)) => record,
        _ => return StatementImport::default(),
    };
    let headers: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

    let Some(date_idx) = find_column(&headers, DATE_COLUMNS) else {
        // No date column means this is not a recognizable statement.
        return StatementImport::default();
    };
    let desc_idx = find_column(&headers, DESCRIPTION_COLUMNS);
    let amount_idx = find_column(&headers, AMOUNT_COLUMNS);
    let debit_idx = find_column(&headers, DEBIT_COLUMNS);
    let credit_idx = find_column(&headers, CREDIT_COLUMNS);

    let mut rows = Vec::new();
    for result in records {
        let Ok(record) = result else { continue };

        let date = normalize_date(cell(&record, Some(date_idx)));
        if date.len() < 10 {
            continue;
        }

        let description = {
            let d = cell(&record, desc_idx).trim();
            if d.is_empty() { "Unknown".to_string() } else { d.to_string() }
        };

        let (amount, txn_type) = if let Some(idx) = amount_idx {
            let value = parse_amount(cell(&record, Some(idx)));
            let txn_type = if value < 0.0 { TxnType::Expense } else { TxnType::Income };
            (value.abs(), txn_type)
        } else {
            let debit = parse_amount(cell(&record, debit_idx));
            let credit = parse_amount(cell(&record, credit_idx));
            if debit > 0.0 {
                (debit, TxnType::Expense)
            } else if credit > 0.0 {
                (credit, TxnType::Income)
            } else {
                continue;
            }
        };
        if amount <= 0.0 {
            continue;
        }

        rows.push(ParsedRow {
            date,
            description,
            amount,
            txn_type,
        });
    }

    let start_date = rows.iter().map(|r| r.date.as_str()).min().map(str::to_string);
    let end_date = rows.iter().map(|r| r.date.as_str()).max().map(str::to_string);
    StatementImport {
        rows,
        start_date,
        end_date,
    }
}

fn find_column(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| synonyms.iter().any(|syn| h.contains(syn)))
}

fn cell<'a>(record: &'a csv::StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Normalize a date cell to `YYYY-MM-DD`, accepting `MM/DD/YYYY` and
/// `YYYY/MM/DD` alongside the passthrough form. Anything else is returned
/// unchanged and falls to the caller's length check.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() == 3 {
        let converted = if parts[0].len() == 4 {
            ymd(parts[0], parts[1], parts[2])
        } else {
            ymd(parts[2], parts[0], parts[1])
        };
        if let Some(date) = converted {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    raw.to_string()
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// Parse a currency cell, tolerating `$`, thousands separators, quotes, and
/// parenthesized negatives. Unparseable text becomes 0, which downstream
/// drops via the amount-must-be-positive rule.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '"' | '$')).collect();
    let cleaned = cleaned.trim();
    match cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => -inner.trim().parse::<f64>().unwrap_or(0.0),
        None => cleaned.parse().unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), 1234.56);
        assert_eq!(parse_amount("$1,234.56"), 1234.56);
        assert_eq!(parse_amount("  -42.50  "), -42.5);
        assert_eq!(parse_amount("(500.00)"), -500.0);
        assert_eq!(parse_amount("\"(1,250.00)\""), -1250.0);
        assert_eq!(parse_amount("garbage"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2024-01-05"), "2024-01-05");
        assert_eq!(normalize_date("01/05/2024"), "2024-01-05");
        assert_eq!(normalize_date("1/5/2024"), "2024-01-05");
        assert_eq!(normalize_date("2024/01/05"), "2024-01-05");
        assert_eq!(normalize_date(" 01/05/2024 "), "2024-01-05");
        // Unrecognized formats pass through untouched
        assert_eq!(normalize_date("Jan 5"), "Jan 5");
        assert_eq!(normalize_date("02/30/2024"), "02/30/2024");
    }

    #[test]
    fn test_signed_amount_column() {
        let content = "Date,Description,Amount\n\
                       2024-01-05,COFFEE SHOP,-4.50\n\
                       2024-01-06,PAYCHECK,2000.00\n";
        let result = parse(content);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].txn_type, TxnType::Expense);
        assert_eq!(result.rows[0].amount, 4.50);
        assert_eq!(result.rows[1].txn_type, TxnType::Income);
        assert_eq!(result.rows[1].amount, 2000.00);
    }

    #[test]
    fn test_parenthesized_amount_is_expense() {
        let content = "Date,Memo,Amount\n2024-02-01,RENT,(1200.00)\n";
        let result = parse(content);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].txn_type, TxnType::Expense);
        assert_eq!(result.rows[0].amount, 1200.00);
    }

    #[test]
    fn test_debit_credit_columns() {
        let content = "Trans Date,Details,Withdrawal,Deposit\n\
                       01/10/2024,GROCERY MART,55.25,\n\
                       01/11/2024,REFUND,,20.00\n\
                       01/12/2024,NOTHING,,\n";
        let result = parse(content);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].txn_type, TxnType::Expense);
        assert_eq!(result.rows[0].amount, 55.25);
        assert_eq!(result.rows[1].txn_type, TxnType::Income);
        assert_eq!(result.rows[1].amount, 20.00);
    }

    #[test]
    fn test_no_date_column_yields_empty() {
        let content = "Foo,Bar,Baz\n1,2,3\n";
        let result = parse(content);
        assert!(result.rows.is_empty());
        assert!(result.start_date.is_none());
        assert!(result.end_date.is_none());
    }

    #[test]
    fn test_empty_input_yields_empty() {
        assert!(parse("").rows.is_empty());
    }

    #[test]
    fn test_header_synonyms_any_order() {
        let content = "Payee,Posting Date,Transaction Amount\nSTREAMCO,03/01/2024,-15.99\n";
        let result = parse(content);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].description, "STREAMCO");
        assert_eq!(result.rows[0].date, "2024-03-01");
    }

    #[test]
    fn test_blank_description_defaults_to_unknown() {
        let content = "Date,Description,Amount\n2024-01-05,,10.00\n";
        let result = parse(content);
        assert_eq!(result.rows[0].description, "Unknown");
    }

    #[test]
    fn test_malformed_dates_skipped() {
        let content = "Date,Description,Amount\n\
                       bad,SHOULD SKIP,5.00\n\
                       ,ALSO SKIP,5.00\n\
                       2024-01-05,KEPT,5.00\n";
        let result = parse(content);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].description, "KEPT");
    }

    #[test]
    fn test_zero_amount_rows_dropped() {
        let content = "Date,Description,Amount\n\
                       2024-01-05,FREEBIE,0.00\n\
                       2024-01-06,JUNK,not-a-number\n";
        let result = parse(content);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_metadata_min_max_dates() {
        let content = "Date,Description,Amount\n\
                       01/05/2024,COFFEE SHOP,-4.50\n\
                       01/06/2024,PAYCHECK,2000.00\n\
                       01/07/2024,,0.00\n";
        let result = parse(content);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.start_date.as_deref(), Some("2024-01-05"));
        assert_eq!(result.end_date.as_deref(), Some("2024-01-06"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let content = "Date,Description,Amount\n2024-01-05,COFFEE,-4.50\n";
        let first = parse(content);
        let second = parse(content);
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.start_date, second.start_date);
    }
}

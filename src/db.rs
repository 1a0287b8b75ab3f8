use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category_type TEXT NOT NULL,
    is_active INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS statements (
    id INTEGER PRIMARY KEY,
    bank_account TEXT,
    filename TEXT,
    start_date TEXT,
    end_date TEXT,
    starting_balance REAL,
    ending_balance REAL,
    record_count INTEGER,
    checksum TEXT,
    reconciled INTEGER DEFAULT 0,
    reconciled_date TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    vendor TEXT,
    description TEXT,
    amount REAL NOT NULL,
    txn_type TEXT NOT NULL,
    category TEXT,
    is_reconciled INTEGER DEFAULT 0,
    reconciled_date TEXT,
    statement_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (statement_id) REFERENCES statements(id)
);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    match_type TEXT NOT NULL,
    match_value TEXT NOT NULL,
    category TEXT NOT NULL,
    applies_to TEXT DEFAULT 'both',
    priority INTEGER DEFAULT 100,
    is_active INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY,
    client TEXT,
    total REAL NOT NULL,
    amount_paid REAL DEFAULT 0,
    balance_due REAL NOT NULL,
    status TEXT DEFAULT 'draft',
    paid_date TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY,
    invoice_id INTEGER NOT NULL,
    amount REAL NOT NULL,
    date TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (invoice_id) REFERENCES invoices(id)
);
";

// (name, category_type)
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    // Income
    ("Salary & Wages", "income"),
    ("Client Payments", "income"),
    ("Interest Income", "income"),
    ("Refunds", "income"),
    ("Other Income", "income"),
    // Expenses
    ("Rent & Mortgage", "expense"),
    ("Utilities", "expense"),
    ("Groceries", "expense"),
    ("Dining & Coffee", "expense"),
    ("Transportation", "expense"),
    ("Insurance", "expense"),
    ("Software & Subscriptions", "expense"),
    ("Office Supplies", "expense"),
    ("Professional Services", "expense"),
    ("Bank & Merchant Fees", "expense"),
    ("Travel", "expense"),
    ("Health & Medical", "expense"),
    ("Taxes & Licenses", "expense"),
    ("Transfer", "expense"),
    ("Uncategorized", "expense"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for (name, category_type) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, category_type) VALUES (?1, ?2)",
                rusqlite::params![name, category_type],
            )?;
        }
    }
    Ok(())
}

pub fn category_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM categories WHERE name = ?1 AND is_active = 1")?;
    Ok(stmt.exists([name])?)
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("No statement with ID {0}")]
    UnknownStatement(i64),

    #[error("No transaction with ID {0}")]
    UnknownTransaction(i64),

    #[error("No invoice with ID {0}")]
    UnknownInvoice(i64),

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("Payment of {attempted:.2} exceeds balance due of {balance_due:.2}")]
    Overpayment { attempted: f64, balance_due: f64 },

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;

use rusqlite::Connection;

use crate::error::{Result, TallyError};
use crate::models::{Invoice, InvoiceStatus, BALANCE_EPSILON};

/// Bounded optimistic-concurrency retries before reporting a conflict.
const MAX_CAS_ATTEMPTS: usize = 3;

#[derive(Debug, PartialEq)]
pub struct PaymentOutcome {
    pub amount_paid: f64,
    pub balance_due: f64,
    pub status: InvoiceStatus,
    pub paid_date: Option<String>,
}

/// Compute the updated balance fields for a payment against an invoice
/// snapshot. Pure; rejects non-positive amounts and overpayment beyond the
/// epsilon (which tolerates paying a display-rounded "exact balance").
///
/// Status is promoted to `paid` exactly when the remaining balance falls
/// inside the epsilon; a partial payment leaves the prior status alone.
pub fn apply_payment(
    total: f64,
    amount_paid: f64,
    status: InvoiceStatus,
    amount: f64,
    date: &str,
) -> Result<PaymentOutcome> {
    if amount <= 0.0 {
        return Err(TallyError::InvalidPayment(
            "payment amount must be greater than zero".to_string(),
        ));
    }
    let balance_due = (total - amount_paid).max(0.0);
    if amount > balance_due + BALANCE_EPSILON {
        return Err(TallyError::Overpayment {
            attempted: amount,
            balance_due,
        });
    }

    let new_amount_paid = amount_paid + amount;
    let new_balance_due = (total - new_amount_paid).max(0.0);
    if new_balance_due < BALANCE_EPSILON {
        Ok(PaymentOutcome {
            amount_paid: new_amount_paid,
            balance_due: new_balance_due,
            status: InvoiceStatus::Paid,
            paid_date: Some(date.to_string()),
        })
    } else {
        Ok(PaymentOutcome {
            amount_paid: new_amount_paid,
            balance_due: new_balance_due,
            status,
            paid_date: None,
        })
    }
}

/// Record a payment against the invoice's *current* stored values.
///
/// The write is conditional on the `amount_paid`/`total` read in the same
/// attempt, so a concurrent payment from another process makes the UPDATE
/// miss and the read-modify-write cycle retries from fresh values. Each
/// applied payment also appends a row to the payments audit table.
pub fn record_payment(
    conn: &Connection,
    invoice_id: i64,
    amount: f64,
    date: &str,
) -> Result<PaymentOutcome> {
    for _ in 0..MAX_CAS_ATTEMPTS {
        let (total, amount_paid, status): (f64, f64, String) = conn
            .query_row(
                "SELECT total, amount_paid, status FROM invoices WHERE id = ?1",
                [invoice_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|_| TallyError::UnknownInvoice(invoice_id))?;
        let status = InvoiceStatus::parse(&status).unwrap_or(InvoiceStatus::Draft);

        let outcome = apply_payment(total, amount_paid, status, amount, date)?;

        let changed = conn.execute(
            "UPDATE invoices \
             SET amount_paid = ?1, balance_due = ?2, status = ?3, \
                 paid_date = COALESCE(?4, paid_date) \
             WHERE id = ?5 AND amount_paid = ?6 AND total = ?7",
            rusqlite::params![
                outcome.amount_paid,
                outcome.balance_due,
                outcome.status.as_str(),
                outcome.paid_date,
                invoice_id,
                amount_paid,
                total
            ],
        )?;
        if changed == 1 {
            conn.execute(
                "INSERT INTO payments (invoice_id, amount, date) VALUES (?1, ?2, ?3)",
                rusqlite::params![invoice_id, amount, date],
            )?;
            return Ok(outcome);
        }
        // Lost the race; loop re-reads and recomputes.
    }
    Err(TallyError::Conflict(format!(
        "invoice {invoice_id} was updated concurrently; re-run the payment"
    )))
}

pub fn load_invoices(conn: &Connection) -> Result<Vec<Invoice>> {
    let mut stmt = conn.prepare(
        "SELECT id, client, total, amount_paid, balance_due, status, paid_date \
         FROM invoices ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Invoice {
                id: row.get(0)?,
                client: row.get(1)?,
                total: row.get(2)?,
                amount_paid: row.get(3)?,
                balance_due: row.get(4)?,
                status: InvoiceStatus::parse(&row.get::<_, String>(5)?)
                    .unwrap_or(InvoiceStatus::Draft),
                paid_date: row.get(6)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

pub fn create_invoice(
    conn: &Connection,
    client: Option<&str>,
    total: f64,
    status: InvoiceStatus,
) -> Result<i64> {
    if total <= 0.0 {
        return Err(TallyError::InvalidPayment(
            "invoice total must be greater than zero".to_string(),
        ));
    }
    conn.execute(
        "INSERT INTO invoices (client, total, amount_paid, balance_due, status) \
         VALUES (?1, ?2, 0, ?2, ?3)",
        rusqlite::params![client, total, status.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    #[test]
    fn test_partial_payment_keeps_status() {
        let outcome = apply_payment(500.0, 0.0, InvoiceStatus::Sent, 200.0, "2024-03-01").unwrap();
        assert_eq!(outcome.amount_paid, 200.0);
        assert_eq!(outcome.balance_due, 300.0);
        assert_eq!(outcome.status, InvoiceStatus::Sent);
        assert!(outcome.paid_date.is_none());
    }

    #[test]
    fn test_final_payment_promotes_to_paid() {
        let outcome = apply_payment(500.0, 200.0, InvoiceStatus::Sent, 300.0, "2024-03-15").unwrap();
        assert_eq!(outcome.amount_paid, 500.0);
        assert_eq!(outcome.balance_due, 0.0);
        assert_eq!(outcome.status, InvoiceStatus::Paid);
        assert_eq!(outcome.paid_date.as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        assert!(apply_payment(500.0, 0.0, InvoiceStatus::Sent, 0.0, "2024-03-01").is_err());
        assert!(apply_payment(500.0, 0.0, InvoiceStatus::Sent, -10.0, "2024-03-01").is_err());
    }

    #[test]
    fn test_overpayment_rejected() {
        let err = apply_payment(500.0, 400.0, InvoiceStatus::Sent, 100.02, "2024-03-01");
        assert!(matches!(err, Err(TallyError::Overpayment { .. })));
    }

    #[test]
    fn test_rounded_exact_balance_tolerated() {
        // Stored balance is 299.995; the user pays the displayed 300.00.
        let outcome =
            apply_payment(500.0, 200.005, InvoiceStatus::Viewed, 300.0, "2024-03-01").unwrap();
        assert_eq!(outcome.status, InvoiceStatus::Paid);
        assert!(outcome.balance_due < BALANCE_EPSILON);
    }

    #[test]
    fn test_payment_on_paid_invoice_rejected() {
        let err = apply_payment(500.0, 500.0, InvoiceStatus::Paid, 1.0, "2024-03-01");
        assert!(matches!(err, Err(TallyError::Overpayment { .. })));
    }

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_record_payment_sequence() {
        let (_dir, conn) = test_db();
        let id = create_invoice(&conn, Some("Acme"), 500.0, InvoiceStatus::Sent).unwrap();

        record_payment(&conn, id, 200.0, "2024-03-01").unwrap();
        let outcome = record_payment(&conn, id, 300.0, "2024-03-15").unwrap();
        assert_eq!(outcome.amount_paid, 500.0);
        assert_eq!(outcome.status, InvoiceStatus::Paid);

        // Fully paid; any further positive amount overpays.
        assert!(record_payment(&conn, id, 0.50, "2024-03-16").is_err());

        let (amount_paid, balance_due, status, paid_date): (f64, f64, String, Option<String>) =
            conn.query_row(
                "SELECT amount_paid, balance_due, status, paid_date FROM invoices WHERE id = ?1",
                [id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(amount_paid, 500.0);
        assert_eq!(balance_due, 0.0);
        assert_eq!(status, "paid");
        assert_eq!(paid_date.as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn test_record_payment_appends_audit_rows() {
        let (_dir, conn) = test_db();
        let id = create_invoice(&conn, None, 500.0, InvoiceStatus::Sent).unwrap();
        record_payment(&conn, id, 200.0, "2024-03-01").unwrap();
        record_payment(&conn, id, 100.0, "2024-03-08").unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM payments WHERE invoice_id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_record_payment_failure_mutates_nothing() {
        let (_dir, conn) = test_db();
        let id = create_invoice(&conn, None, 500.0, InvoiceStatus::Sent).unwrap();
        assert!(record_payment(&conn, id, 600.0, "2024-03-01").is_err());
        let (amount_paid, status): (f64, String) = conn
            .query_row(
                "SELECT amount_paid, status FROM invoices WHERE id = ?1",
                [id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(amount_paid, 0.0);
        assert_eq!(status, "sent");
        let payments: i64 = conn
            .query_row("SELECT count(*) FROM payments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(payments, 0);
    }

    #[test]
    fn test_record_payment_unknown_invoice() {
        let (_dir, conn) = test_db();
        assert!(matches!(
            record_payment(&conn, 77, 10.0, "2024-03-01"),
            Err(TallyError::UnknownInvoice(77))
        ));
    }

    #[test]
    fn test_create_invoice_rejects_non_positive_total() {
        let (_dir, conn) = test_db();
        assert!(create_invoice(&conn, None, 0.0, InvoiceStatus::Draft).is_err());
    }
}

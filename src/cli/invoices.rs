use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::invoices::{create_invoice, load_invoices, record_payment};
use crate::models::InvoiceStatus;
use crate::settings::db_path;

pub fn add(total: f64, client: Option<&str>, status: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let status = InvoiceStatus::parse(status)
        .ok_or_else(|| TallyError::Other(format!("Unknown invoice status: {status}")))?;
    let id = create_invoice(&conn, client, total, status)?;
    println!("Created invoice {id} for {}", money(total));
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let invoices = load_invoices(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Client", "Total", "Paid", "Balance", "Status", "Paid Date"]);
    for invoice in invoices {
        let status = if invoice.status == InvoiceStatus::Paid {
            invoice.status.as_str().green().to_string()
        } else {
            invoice.status.as_str().to_string()
        };
        table.add_row(vec![
            Cell::new(invoice.id.unwrap_or_default()),
            Cell::new(invoice.client.unwrap_or_default()),
            Cell::new(money(invoice.total)),
            Cell::new(money(invoice.amount_paid)),
            Cell::new(money(invoice.balance_due)),
            Cell::new(status),
            Cell::new(invoice.paid_date.unwrap_or_default()),
        ]);
    }
    println!("Invoices\n{table}");
    Ok(())
}

pub fn pay(invoice_id: i64, amount: f64, date: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let date = date
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());

    let outcome = record_payment(&conn, invoice_id, amount, &date)?;
    println!(
        "Recorded {} against invoice {invoice_id}: paid {}, balance {}",
        money(amount),
        money(outcome.amount_paid),
        money(outcome.balance_due)
    );
    if outcome.status == InvoiceStatus::Paid {
        println!("{}", "Invoice fully paid.".green());
    }
    Ok(())
}

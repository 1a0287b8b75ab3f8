mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod invoices;
mod models;
mod parser;
mod reconciler;
mod rules;
mod settings;

use clap::Parser;
use colored::Colorize;

use cli::{
    Cli, Commands, InvoicesCommands, ReconcileCommands, RulesCommands, StatementsCommands,
    TransactionsCommands,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import {
            file,
            account,
            starting_balance,
            ending_balance,
        } => cli::import::run(&file, account.as_deref(), starting_balance, ending_balance),
        Commands::Categorize => cli::categorize::run(),
        Commands::Transactions { command } => match command {
            TransactionsCommands::Add {
                date,
                amount,
                vendor,
                description,
                category,
            } => cli::transactions::add(
                &date,
                amount,
                vendor.as_deref(),
                description.as_deref(),
                category.as_deref(),
            ),
        },
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                value,
                category,
                match_type,
                applies_to,
                priority,
            } => cli::rules::add(&value, &category, &match_type, &applies_to, priority),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Disable { id } => cli::rules::disable(id),
            RulesCommands::Learn {
                transaction_id,
                category,
            } => cli::rules::learn(transaction_id, &category),
        },
        Commands::Statements { command } => match command {
            StatementsCommands::List => cli::statements::list(),
        },
        Commands::Reconcile { command } => match command {
            ReconcileCommands::Status {
                statement_id,
                ending_balance,
            } => cli::reconcile::status(statement_id, ending_balance),
            ReconcileCommands::Suggest { statement_id } => cli::reconcile::suggest(statement_id),
            ReconcileCommands::Accept { transaction_id } => cli::reconcile::accept(transaction_id),
            ReconcileCommands::Complete { statement_id } => {
                cli::reconcile::run_complete(statement_id)
            }
        },
        Commands::Invoices { command } => match command {
            InvoicesCommands::Add {
                total,
                client,
                status,
            } => cli::invoices::add(total, client.as_deref(), &status),
            InvoicesCommands::List => cli::invoices::list(),
            InvoicesCommands::Pay {
                invoice_id,
                amount,
                date,
            } => cli::invoices::pay(invoice_id, amount, date.as_deref()),
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "Error:".red());
        std::process::exit(1);
    }
}

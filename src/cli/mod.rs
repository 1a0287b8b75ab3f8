pub mod categorize;
pub mod import;
pub mod init;
pub mod invoices;
pub mod reconcile;
pub mod rules;
pub mod statements;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Ledger CLI: statement import, rule-based categorization, reconciliation, invoices."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tally: choose a data directory and initialize the database.
    Init {
        /// Path for tally data (default: ~/Documents/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a bank statement export and pre-categorize its rows.
    Import {
        /// Path to the statement file (delimited text, header row first)
        file: String,
        /// Bank account label to record on the statement
        #[arg(long)]
        account: Option<String>,
        /// Statement starting balance
        #[arg(long = "starting-balance")]
        starting_balance: Option<f64>,
        /// Statement ending balance
        #[arg(long = "ending-balance")]
        ending_balance: Option<f64>,
    },
    /// Re-run categorization rules on uncategorized transactions.
    Categorize,
    /// Record ledger transactions by hand.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// List imported statements.
    Statements {
        #[command(subcommand)]
        command: StatementsCommands,
    },
    /// Reconcile a statement against the ledger.
    Reconcile {
        #[command(subcommand)]
        command: ReconcileCommands,
    },
    /// Track invoices and record payments.
    Invoices {
        #[command(subcommand)]
        command: InvoicesCommands,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add (or re-teach) a categorization rule. Same match key updates in place.
    Add {
        /// Value to match, e.g. a vendor name or description fragment
        value: String,
        /// Category to assign
        #[arg(long)]
        category: String,
        /// Match type: vendor_exact, vendor_contains, description_contains
        #[arg(long = "match-type", default_value = "description_contains")]
        match_type: String,
        /// Applies to: expense, income, both
        #[arg(long = "applies-to", default_value = "both")]
        applies_to: String,
        /// Priority; lower values are evaluated first
        #[arg(long, default_value_t = 100)]
        priority: i64,
    },
    /// List active rules.
    List,
    /// Deactivate a rule by ID.
    Disable {
        id: i64,
    },
    /// Set a transaction's category and teach a rule from it.
    Learn {
        /// Transaction ID to recategorize
        transaction_id: i64,
        /// Category to assign and teach
        #[arg(long)]
        category: String,
    },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// Add a transaction. Negative amounts are expenses, positive income.
    Add {
        /// Transaction date: YYYY-MM-DD
        date: String,
        /// Signed amount, e.g. -4.50 for an expense
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        /// Vendor name (what vendor_exact/vendor_contains rules match on)
        #[arg(long)]
        vendor: Option<String>,
        /// Free-text description
        #[arg(long)]
        description: Option<String>,
        /// Category; when omitted, the rule set is consulted
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum StatementsCommands {
    /// List imported statements.
    List,
}

#[derive(Subcommand)]
pub enum ReconcileCommands {
    /// Show balances and completion eligibility for a statement.
    Status {
        statement_id: i64,
        /// Record/override the statement's ending balance first
        #[arg(long = "ending-balance")]
        ending_balance: Option<f64>,
    },
    /// Suggest 1:1 matches between book and statement transactions.
    Suggest {
        statement_id: i64,
    },
    /// Mark a book transaction reconciled (apply a suggestion).
    Accept {
        transaction_id: i64,
    },
    /// Complete the reconciliation. Refused unless the balance check passes.
    Complete {
        statement_id: i64,
    },
}

#[derive(Subcommand)]
pub enum InvoicesCommands {
    /// Create an invoice.
    Add {
        /// Invoice total
        #[arg(long)]
        total: f64,
        /// Client name
        #[arg(long)]
        client: Option<String>,
        /// Initial status: draft, sent, viewed, overdue
        #[arg(long, default_value = "draft")]
        status: String,
    },
    /// List invoices with balances.
    List,
    /// Record a payment against an invoice.
    Pay {
        invoice_id: i64,
        amount: f64,
        /// Payment date (default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

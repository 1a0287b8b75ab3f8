/// Tolerance for currency comparisons. Absorbs float rounding noise from
/// display-rounded amounts; hard-coded, not configurable.
pub const BALANCE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnType {
    Income,
    Expense,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    VendorExact,
    VendorContains,
    DescriptionContains,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VendorExact => "vendor_exact",
            Self::VendorContains => "vendor_contains",
            Self::DescriptionContains => "description_contains",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vendor_exact" => Some(Self::VendorExact),
            "vendor_contains" => Some(Self::VendorContains),
            "description_contains" => Some(Self::DescriptionContains),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliesTo {
    Expense,
    Income,
    Both,
}

impl AppliesTo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expense" => Some(Self::Expense),
            "income" => Some(Self::Income),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn covers(&self, txn_type: TxnType) -> bool {
        match self {
            Self::Both => true,
            Self::Expense => txn_type == TxnType::Expense,
            Self::Income => txn_type == TxnType::Income,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Viewed,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Viewed => "viewed",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "viewed" => Some(Self::Viewed),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A single money movement. `amount` is stored signed: positive for income,
/// negative for expense.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub date: String,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub amount: f64,
    pub txn_type: TxnType,
    pub category: Option<String>,
    pub is_reconciled: bool,
    pub reconciled_date: Option<String>,
    pub statement_id: Option<i64>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct BankStatement {
    pub id: Option<i64>,
    pub bank_account: Option<String>,
    pub filename: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub starting_balance: Option<f64>,
    pub ending_balance: Option<f64>,
    pub reconciled: bool,
    pub reconciled_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub id: Option<i64>,
    pub match_type: MatchType,
    pub match_value: String,
    pub category: String,
    pub applies_to: AppliesTo,
    pub priority: i64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Invoice {
    pub id: Option<i64>,
    pub client: Option<String>,
    pub total: f64,
    pub amount_paid: f64,
    pub balance_due: f64,
    pub status: InvoiceStatus,
    pub paid_date: Option<String>,
}

/// Intermediate representation of one statement row before DB insert.
/// `amount` here is an unsigned magnitude; the sign convention is carried by
/// `txn_type` until the importer signs it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub txn_type: TxnType,
}

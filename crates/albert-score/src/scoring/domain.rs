use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the engine-managed cash asset.
pub const CASH_ASSET_ID: &str = "cash-on-hand";

/// Identifier wrapper shared by every financial record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn cash() -> Self {
        Self(CASH_ASSET_ID.to_string())
    }

    pub fn is_cash(&self) -> bool {
        self.0 == CASH_ASSET_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Cash,
    Investment,
    Property,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: RecordId,
    pub name: String,
    pub value: f64,
    pub kind: AssetKind,
    pub last_updated: DateTime<Utc>,
}

impl Asset {
    /// The zero-valued cash asset every state starts with.
    pub fn cash_on_hand(now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::cash(),
            name: "Cash on Hand".to_string(),
            value: 0.0,
            kind: AssetKind::Cash,
            last_updated: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    Student,
    Credit,
    Mortgage,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: RecordId,
    pub name: String,
    /// Outstanding principal.
    pub amount: f64,
    /// Annual interest rate as a percentage (`19.9` means 19.9%).
    pub interest_rate: f64,
    pub minimum_payment: f64,
    pub kind: DebtKind,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub const fn label(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// How an expense category is treated by the scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendingClass {
    Necessary,
    Discretionary,
    Unclassified,
}

/// Transaction category. Labels outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Housing,
    Utilities,
    Groceries,
    Healthcare,
    Transportation,
    Insurance,
    Education,
    Childcare,
    Dining,
    Entertainment,
    Shopping,
    Travel,
    Subscription,
    Hobby,
    Luxury,
    Food,
    Salary,
    Savings,
    Investment,
    Other(String),
}

impl Category {
    pub fn parse(label: &str) -> Self {
        match label {
            "Housing" => Self::Housing,
            "Utilities" => Self::Utilities,
            "Groceries" => Self::Groceries,
            "Healthcare" => Self::Healthcare,
            "Transportation" => Self::Transportation,
            "Insurance" => Self::Insurance,
            "Education" => Self::Education,
            "Childcare" => Self::Childcare,
            "Dining" => Self::Dining,
            "Entertainment" => Self::Entertainment,
            "Shopping" => Self::Shopping,
            "Travel" => Self::Travel,
            "Subscription" => Self::Subscription,
            "Hobby" => Self::Hobby,
            "Luxury" => Self::Luxury,
            "Food" => Self::Food,
            "Salary" => Self::Salary,
            "Savings" => Self::Savings,
            "Investment" => Self::Investment,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Housing => "Housing",
            Self::Utilities => "Utilities",
            Self::Groceries => "Groceries",
            Self::Healthcare => "Healthcare",
            Self::Transportation => "Transportation",
            Self::Insurance => "Insurance",
            Self::Education => "Education",
            Self::Childcare => "Childcare",
            Self::Dining => "Dining",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Travel => "Travel",
            Self::Subscription => "Subscription",
            Self::Hobby => "Hobby",
            Self::Luxury => "Luxury",
            Self::Food => "Food",
            Self::Salary => "Salary",
            Self::Savings => "Savings",
            Self::Investment => "Investment",
            Self::Other(label) => label,
        }
    }

    pub fn class(&self) -> SpendingClass {
        match self {
            Self::Housing
            | Self::Utilities
            | Self::Groceries
            | Self::Healthcare
            | Self::Transportation
            | Self::Insurance
            | Self::Education
            | Self::Childcare => SpendingClass::Necessary,
            Self::Dining
            | Self::Entertainment
            | Self::Shopping
            | Self::Travel
            | Self::Subscription
            | Self::Hobby
            | Self::Luxury => SpendingClass::Discretionary,
            _ => SpendingClass::Unclassified,
        }
    }

    pub fn is_discretionary(&self) -> bool {
        self.class() == SpendingClass::Discretionary
    }

    /// Income categories that earn the savings bonus.
    pub fn is_wealth_building(&self) -> bool {
        matches!(self, Self::Savings | Self::Investment)
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub kind: TransactionKind,
    pub category: Category,
    /// Always non-negative; direction comes from `kind`.
    pub amount: f64,
    pub description: String,
    /// Date the transaction occurred, not when it was recorded.
    pub date: NaiveDate,
}

impl Transaction {
    /// Contribution to cash on hand.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Savings,
    Debt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialGoal {
    pub id: RecordId,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub kind: GoalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl FinancialGoal {
    /// Completion fraction in `[0, 1]`. A non-positive target counts as met.
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 1.0;
        }
        let ratio = self.current_amount / self.target_amount;
        if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        }
    }
}

/// Aggregate of every record the engine owns, in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialState {
    pub assets: Vec<Asset>,
    pub debts: Vec<Debt>,
    pub transactions: Vec<Transaction>,
    pub goals: Vec<FinancialGoal>,
}

impl FinancialState {
    /// Empty state seeded with the zero-valued cash asset.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self {
            assets: vec![Asset::cash_on_hand(now)],
            ..Self::default()
        }
    }

    pub fn cash_asset(&self) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.id.is_cash())
    }

    pub(crate) fn cash_asset_mut(&mut self) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|asset| asset.id.is_cash())
    }

    pub fn cash_on_hand(&self) -> f64 {
        self.cash_asset().map(|asset| asset.value).unwrap_or(0.0)
    }

    pub fn total_assets(&self) -> f64 {
        self.assets.iter().map(|asset| asset.value).sum()
    }

    pub fn total_debt(&self) -> f64 {
        self.debts.iter().map(|debt| debt.amount).sum()
    }

    pub fn goal_mut(&mut self, id: &RecordId) -> Option<&mut FinancialGoal> {
        self.goals.iter_mut().find(|goal| &goal.id == id)
    }

    /// Replaces each collection present in the patch wholesale.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(assets) = patch.assets {
            self.assets = assets;
        }
        if let Some(debts) = patch.debts {
            self.debts = debts;
        }
        if let Some(transactions) = patch.transactions {
            self.transactions = transactions;
        }
        if let Some(goals) = patch.goals {
            self.goals = goals;
        }
    }
}

/// Partial state used by the bulk update path. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Asset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debts: Option<Vec<Debt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<FinancialGoal>>,
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        self.assets.is_none()
            && self.debts.is_none()
            && self.transactions.is_none()
            && self.goals.is_none()
    }
}

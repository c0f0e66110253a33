use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::clock::Clock;
use super::domain::{Category, RecordId, Transaction, TransactionKind};
use super::engine::ScoreEngine;

#[derive(Debug, thiserror::Error)]
pub enum LedgerImportError {
    #[error("failed to read ledger: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid ledger CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: '{value}' is not a YYYY-MM-DD date")]
    InvalidDate { row: usize, value: String },
    #[error("row {row}: unknown transaction kind '{value}' (expected income or expense)")]
    InvalidKind { row: usize, value: String },
    #[error("row {row}: amount {amount} must be a finite, non-negative number")]
    InvalidAmount { row: usize, amount: f64 },
}

/// Reads `id,date,kind,category,amount,description` rows into transactions.
pub struct LedgerImporter;

impl LedgerImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>, LedgerImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Transaction>, LedgerImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut transactions = Vec::new();
        for (index, record) in csv_reader.deserialize::<LedgerRow>().enumerate() {
            let row = record?;
            transactions.push(row.into_transaction(index + 1)?);
        }

        Ok(transactions)
    }

    /// Feeds each row through [`ScoreEngine::add_transaction`] so cash and events stay consistent.
    pub fn import_into<R: Read, C: Clock>(
        reader: R,
        engine: &mut ScoreEngine<C>,
    ) -> Result<usize, LedgerImportError> {
        let transactions = Self::from_reader(reader)?;
        let count = transactions.len();
        for transaction in transactions {
            engine.add_transaction(transaction);
        }
        info!(count, score = engine.score(), "imported ledger transactions");
        Ok(count)
    }
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    date: String,
    kind: String,
    category: String,
    amount: f64,
    #[serde(default)]
    description: String,
}

impl LedgerRow {
    fn into_transaction(self, row: usize) -> Result<Transaction, LedgerImportError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|_| {
            LedgerImportError::InvalidDate {
                row,
                value: self.date.clone(),
            }
        })?;

        let kind = match self.kind.trim().to_ascii_lowercase().as_str() {
            "income" => TransactionKind::Income,
            "expense" => TransactionKind::Expense,
            _ => {
                return Err(LedgerImportError::InvalidKind {
                    row,
                    value: self.kind,
                })
            }
        };

        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(LedgerImportError::InvalidAmount {
                row,
                amount: self.amount,
            });
        }

        Ok(Transaction {
            id: RecordId(self.id.unwrap_or_else(|| format!("ledger-{row}"))),
            kind,
            category: Category::parse(&self.category),
            amount: self.amount,
            description: self.description,
            date,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

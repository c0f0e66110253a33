use crate::infra::offline_clock;
use albert_score::config::AppConfig;
use albert_score::error::AppError;
use albert_score::scoring::{
    Clock, DebtToIncome, FinancialSnapshot, LedgerImporter, ScoreBreakdown, ScoreEngine,
};
use albert_score::telemetry;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// CSV ledger with id,date,kind,category,amount,description columns
    #[arg(long)]
    pub(crate) ledger: PathBuf,
    /// Emit the score, breakdown and snapshot as JSON
    #[arg(long)]
    pub(crate) json: bool,
    /// Score as of this date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreReport {
    pub(crate) score: u8,
    pub(crate) breakdown: Option<ScoreBreakdown>,
    pub(crate) snapshot: FinancialSnapshot,
}

impl ScoreReport {
    pub(crate) fn from_engine<C: Clock>(engine: &ScoreEngine<C>) -> Self {
        Self {
            score: engine.score(),
            breakdown: engine.breakdown().cloned(),
            snapshot: engine.snapshot(),
        }
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        ledger,
        json,
        as_of,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let mut engine = ScoreEngine::with_policy(config.scoring, offline_clock(as_of));
    let file = File::open(&ledger)?;
    let imported = LedgerImporter::import_into(file, &mut engine)?;

    let report = ScoreReport::from_engine(&engine);
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Score payload unavailable: {err}"),
        }
    } else {
        println!("Ledger: {} ({} transactions)", ledger.display(), imported);
        render_score_report(&report);
    }

    Ok(())
}

pub(crate) fn render_score_report(report: &ScoreReport) {
    let snapshot = &report.snapshot;
    println!(
        "\nAlbert Score: {} ({}) as of {}",
        report.score,
        snapshot.band.label(),
        snapshot.as_of
    );

    match &report.breakdown {
        Some(breakdown) => {
            println!("\nScore components");
            for component in &breakdown.components {
                println!(
                    "- {}: {:.1}/{:.0} ({})",
                    component.factor.label(),
                    component.points,
                    component.budget,
                    component.notes
                );
            }
            println!(
                "Base {:.1} | event modifier {:+.2} | total {:.1}",
                breakdown.base_score, breakdown.event_modifier, breakdown.total
            );
        }
        None => println!("\nScore components: none yet (initial score)"),
    }

    println!("\nFinancial snapshot");
    println!(
        "- Cash on hand {:.2} | other assets {:.2} | debts {:.2} | net worth {:.2}",
        snapshot.cash_on_hand, snapshot.other_assets, snapshot.total_debts, snapshot.net_worth
    );
    println!(
        "- Monthly income {:.2} | monthly expenses {:.2} | savings rate {:.0}%",
        snapshot.monthly_income,
        snapshot.monthly_expenses,
        snapshot.savings_rate * 100.0
    );
    let debt_to_income = match snapshot.debt_to_income {
        DebtToIncome::Ratio(ratio) => format!("{ratio:.2}"),
        DebtToIncome::Unbounded => "unbounded (no income)".to_string(),
    };
    println!(
        "- Debt-to-income {} | weighted interest {:.1}% | debt-to-asset {:?}",
        debt_to_income, snapshot.weighted_interest_rate, snapshot.debt_to_asset
    );
    println!(
        "- Emergency cover {:.1} months | discretionary share {:.0}% | {} goals",
        snapshot.emergency_fund_months,
        snapshot.discretionary_ratio * 100.0,
        snapshot.goal_count
    );

    if snapshot.recent_transactions.is_empty() {
        println!("\nRecent transactions: none in the last 30 days");
    } else {
        println!("\nRecent transactions");
        for transaction in &snapshot.recent_transactions {
            println!(
                "- {} {} {} {:.2} {}",
                transaction.date,
                transaction.kind.label(),
                transaction.category,
                transaction.amount,
                transaction.description
            );
        }
    }
}

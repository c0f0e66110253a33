use crate::infra::offline_clock;
use crate::report::{render_score_report, ScoreReport};
use albert_score::error::AppError;
use albert_score::scoring::{
    Asset, AssetKind, Category, Clock, Debt, DebtKind, FinancialGoal, GoalKind, ManualClock,
    RecordId, ScoreEngine, Transaction, TransactionKind,
};
use chrono::{Duration, NaiveDate};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the demo household is scored on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Days to let events age before the final recalculation.
    #[arg(long, default_value_t = 14)]
    pub(crate) age_days: i64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let clock = offline_clock(args.as_of);
    let mut engine = ScoreEngine::with_clock(clock.clone());
    let today = clock.now().date_naive();

    println!("Albert Score demo for a sample household ({today})");
    println!("- Fresh engine: score {}", engine.score());

    for month in (0..3).rev() {
        let date = today - Duration::days(month * 30 + 3);
        engine.add_transaction(transaction(
            &format!("payroll-{month}"),
            TransactionKind::Income,
            Category::Salary,
            4_800.0,
            "Payroll deposit",
            date,
        ));
    }
    step(&engine, "Three monthly payroll deposits");

    engine.add_transaction(transaction(
        "rent",
        TransactionKind::Expense,
        Category::Housing,
        1_650.0,
        "Apartment rent",
        today - Duration::days(2),
    ));
    engine.add_transaction(transaction(
        "groceries",
        TransactionKind::Expense,
        Category::Groceries,
        310.0,
        "Weekly groceries",
        today - Duration::days(1),
    ));
    step(&engine, "Rent and groceries");

    for (index, days_ago) in [20, 12, 6, 1].into_iter().enumerate() {
        engine.add_transaction(transaction(
            &format!("dining-{index}"),
            TransactionKind::Expense,
            Category::Dining,
            65.0,
            "Dinner out",
            today - Duration::days(days_ago),
        ));
    }
    step(&engine, "Four dinners out in three weeks");

    let now = clock.now();
    engine.add_debt(Debt {
        id: RecordId::new("student-loan"),
        name: "Student loan".to_string(),
        amount: 12_000.0,
        interest_rate: 4.5,
        minimum_payment: 180.0,
        kind: DebtKind::Student,
        last_updated: now,
    });
    step(&engine, "Student loan at 4.5%");

    engine.add_debt(Debt {
        id: RecordId::new("card"),
        name: "Credit card".to_string(),
        amount: 2_400.0,
        interest_rate: 22.9,
        minimum_payment: 75.0,
        kind: DebtKind::Credit,
        last_updated: now,
    });
    step(&engine, "Credit card at 22.9%");

    let accepted = engine.add_asset(Asset {
        id: RecordId::new("brokerage"),
        name: "Index fund".to_string(),
        value: 9_500.0,
        kind: AssetKind::Investment,
        last_updated: now,
    });
    step(&engine, &format!("Brokerage account (accepted: {accepted})"));

    let mut emergency_fund = FinancialGoal {
        id: RecordId::new("emergency-fund"),
        name: "Emergency fund".to_string(),
        target_amount: 10_000.0,
        current_amount: 2_500.0,
        kind: GoalKind::Savings,
        deadline: Some(today + Duration::days(365)),
    };
    engine.update_goal(emergency_fund.clone());
    step(&engine, "Emergency fund goal at 25%");

    age(&clock, args.age_days);
    emergency_fund.current_amount = 4_000.0;
    engine.update_goal(emergency_fund);
    step(
        &engine,
        &format!("{} days later, goal at 40%", args.age_days.max(0)),
    );

    render_score_report(&ScoreReport::from_engine(&engine));
    Ok(())
}

fn age(clock: &ManualClock, days: i64) {
    if days > 0 {
        clock.advance(Duration::days(days));
    }
}

fn step<C: Clock>(engine: &ScoreEngine<C>, label: &str) {
    let weight = engine
        .events()
        .last()
        .map(|event| format!(" | last event {} {:+.1}", event.label, event.weight))
        .unwrap_or_default();
    println!("- {label}: score {}{weight}", engine.score());
}

fn transaction(
    id: &str,
    kind: TransactionKind,
    category: Category,
    amount: f64,
    description: &str,
    date: NaiveDate,
) -> Transaction {
    Transaction {
        id: RecordId::new(id),
        kind,
        category,
        amount,
        description: description.to_string(),
        date,
    }
}

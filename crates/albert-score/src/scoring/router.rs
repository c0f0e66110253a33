use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::clock::Clock;
use super::domain::{
    Asset, AssetKind, Debt, DebtKind, FinancialGoal, RecordId, StatePatch, Transaction,
};
use super::session::{SessionError, SessionId, SessionRegistry};
use super::snapshot::ScoreBand;

/// Asset payload; `last_updated` is stamped by the engine clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInput {
    pub id: RecordId,
    pub name: String,
    pub value: f64,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtInput {
    pub id: RecordId,
    pub name: String,
    pub amount: f64,
    pub interest_rate: f64,
    #[serde(default)]
    pub minimum_payment: f64,
    pub kind: DebtKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreView {
    pub session_id: SessionId,
    pub score: u8,
    pub band: ScoreBand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
}

impl ScoreView {
    fn new(session_id: SessionId, score: u8) -> Self {
        Self {
            session_id,
            score,
            band: ScoreBand::from_score(score),
            accepted: None,
        }
    }
}

/// Router builder exposing one scoring engine per session.
pub fn session_router<C>(registry: Arc<SessionRegistry<C>>) -> Router
where
    C: Clock + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/api/v1/sessions", post(create_handler::<C>))
        .route("/api/v1/sessions/:session_id", delete(close_handler::<C>))
        .route("/api/v1/sessions/:session_id/score", get(score_handler::<C>))
        .route(
            "/api/v1/sessions/:session_id/state",
            get(state_handler::<C>).patch(patch_state_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/snapshot",
            get(snapshot_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/breakdown",
            get(breakdown_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/assets",
            post(asset_handler::<C>),
        )
        .route("/api/v1/sessions/:session_id/debts", post(debt_handler::<C>))
        .route(
            "/api/v1/sessions/:session_id/transactions",
            post(transaction_handler::<C>),
        )
        .route("/api/v1/sessions/:session_id/goals", put(goal_handler::<C>))
        .with_state(registry)
}

async fn create_handler<C>(State(registry): State<Arc<SessionRegistry<C>>>) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let opened = registry.create().and_then(|id| {
        registry.with_engine(&id, |engine| ScoreView::new(id.clone(), engine.score()))
    });
    match opened {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => session_error(error),
    }
}

async fn close_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    match registry.remove(&id) {
        Ok(()) => {
            let payload = json!({
                "session_id": id,
                "closed": true,
                "active_sessions": registry.len(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => session_error(error),
    }
}

async fn score_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    match registry.with_engine(&id, |engine| engine.score()) {
        Ok(score) => (StatusCode::OK, axum::Json(ScoreView::new(id, score))).into_response(),
        Err(error) => session_error(error),
    }
}

async fn state_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    match registry.with_engine(&id, |engine| engine.financial_state()) {
        Ok(state) => (StatusCode::OK, axum::Json(state)).into_response(),
        Err(error) => session_error(error),
    }
}

async fn snapshot_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    match registry.with_engine(&id, |engine| engine.snapshot()) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => session_error(error),
    }
}

async fn breakdown_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    match registry.with_engine(&id, |engine| (engine.score(), engine.breakdown().cloned())) {
        Ok((score, breakdown)) => {
            let payload = json!({
                "session_id": id,
                "score": score,
                "breakdown": breakdown,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => session_error(error),
    }
}

async fn asset_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    axum::Json(input): axum::Json<AssetInput>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    let outcome = registry.with_engine(&id, |engine| {
        let asset = Asset {
            id: input.id,
            name: input.name,
            value: input.value,
            kind: input.kind,
            last_updated: engine.clock().now(),
        };
        let accepted = engine.add_asset(asset);
        (accepted, engine.score())
    });

    match outcome {
        Ok((accepted, score)) => {
            let status = if accepted {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let view = ScoreView {
                accepted: Some(accepted),
                ..ScoreView::new(id, score)
            };
            (status, axum::Json(view)).into_response()
        }
        Err(error) => session_error(error),
    }
}

async fn debt_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    axum::Json(input): axum::Json<DebtInput>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    let outcome = registry.with_engine(&id, |engine| {
        let debt = Debt {
            id: input.id,
            name: input.name,
            amount: input.amount,
            interest_rate: input.interest_rate,
            minimum_payment: input.minimum_payment,
            kind: input.kind,
            last_updated: engine.clock().now(),
        };
        engine.add_debt(debt);
        engine.score()
    });
    created(id, outcome)
}

async fn transaction_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    axum::Json(transaction): axum::Json<Transaction>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    let outcome = registry.with_engine(&id, |engine| {
        engine.add_transaction(transaction);
        engine.score()
    });
    created(id, outcome)
}

async fn goal_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    axum::Json(goal): axum::Json<FinancialGoal>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    let id = SessionId(session_id);
    match registry.with_engine(&id, |engine| {
        engine.update_goal(goal);
        engine.score()
    }) {
        Ok(score) => (StatusCode::OK, axum::Json(ScoreView::new(id, score))).into_response(),
        Err(error) => session_error(error),
    }
}

async fn patch_state_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    axum::Json(patch): axum::Json<StatePatch>,
) -> Response
where
    C: Clock + Clone + Send + Sync + 'static,
{
    if patch.is_empty() {
        let payload = json!({
            "error": "state patch must replace at least one collection",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let id = SessionId(session_id);
    match registry.with_engine(&id, |engine| {
        engine.update_financial_state(patch);
        engine.score()
    }) {
        Ok(score) => (StatusCode::OK, axum::Json(ScoreView::new(id, score))).into_response(),
        Err(error) => session_error(error),
    }
}

fn created(id: SessionId, outcome: Result<u8, SessionError>) -> Response {
    match outcome {
        Ok(score) => (StatusCode::CREATED, axum::Json(ScoreView::new(id, score))).into_response(),
        Err(error) => session_error(error),
    }
}

fn session_error(error: SessionError) -> Response {
    let status = match error {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::clock::ManualClock;
    use crate::scoring::config::ScoringPolicy;
    use crate::scoring::domain::{Category, TransactionKind};
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    fn registry() -> Arc<SessionRegistry<ManualClock>> {
        let start = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).single().expect("valid");
        Arc::new(SessionRegistry::with_clock(
            ScoringPolicy::default(),
            ManualClock::starting_at(start),
        ))
    }

    async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body readable");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn create_route_returns_initial_score() {
        let router = session_router(registry());

        let response = router
            .oneshot(
                Request::post("/api/v1/sessions")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = read_json(response).await;
        assert_eq!(payload["score"], 50);
        assert_eq!(payload["band"], "fair");
        assert!(payload["session_id"]
            .as_str()
            .unwrap_or_default()
            .starts_with("session-"));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let response = score_handler::<ManualClock>(
            State(registry()),
            Path("session-404404".to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let payload = read_json(response).await;
        assert!(payload["error"]
            .as_str()
            .unwrap_or_default()
            .contains("session-404404"));
    }

    #[tokio::test]
    async fn reserved_cash_asset_is_reported_as_not_accepted() {
        let registry = registry();
        let id = registry.create().expect("session opens");

        let response = asset_handler::<ManualClock>(
            State(registry.clone()),
            Path(id.0.clone()),
            axum::Json(AssetInput {
                id: RecordId::cash(),
                name: "Cash".to_string(),
                value: 1_000_000.0,
                kind: AssetKind::Cash,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["accepted"], false);
        assert_eq!(payload["score"], 50);
    }

    #[tokio::test]
    async fn transaction_route_updates_state() {
        let registry = registry();
        let id = registry.create().expect("session opens");
        let router = session_router(registry.clone());
        let transaction = Transaction {
            id: RecordId::new("pay"),
            kind: TransactionKind::Income,
            category: Category::Salary,
            amount: 3200.0,
            description: "payroll".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2025, 6, 14).expect("valid date"),
        };

        let response = router
            .oneshot(
                Request::post(format!("/api/v1/sessions/{id}/transactions"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&transaction).expect("serializes"),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::CREATED);
        let cash = registry
            .with_engine(&id, |engine| engine.state().cash_on_hand())
            .expect("session exists");
        assert_eq!(cash, 3200.0);
    }

    #[tokio::test]
    async fn empty_state_patch_is_rejected() {
        let registry = registry();
        let id = registry.create().expect("session opens");

        let response = patch_state_handler::<ManualClock>(
            State(registry),
            Path(id.0),
            axum::Json(StatePatch::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn delete_route_closes_the_session() {
        let registry = registry();
        let id = registry.create().expect("session opens");
        let router = session_router(registry.clone());

        let closed = router
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/sessions/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(closed.status(), StatusCode::OK);
        assert_eq!(read_json(closed).await["active_sessions"], 0);

        let score = router
            .oneshot(
                Request::get(format!("/api/v1/sessions/{id}/score"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(score.status(), StatusCode::NOT_FOUND);
        assert!(registry.is_empty());
    }
}

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::clock::{Clock, SystemClock};
use super::config::ScoringPolicy;
use super::engine::ScoreEngine;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

type SharedEngine<C> = Arc<Mutex<ScoreEngine<C>>>;

/// One engine per user session, each behind its own mutex.
pub struct SessionRegistry<C = SystemClock> {
    sessions: Mutex<HashMap<SessionId, SharedEngine<C>>>,
    sequence: AtomicU64,
    policy: ScoringPolicy,
    clock: C,
}

impl<C: Clock + Clone> SessionRegistry<C> {
    pub fn with_clock(policy: ScoringPolicy, clock: C) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(1),
            policy,
            clock,
        }
    }

    pub fn create(&self) -> Result<SessionId, SessionError> {
        let id = SessionId(format!(
            "session-{:06}",
            self.sequence.fetch_add(1, Ordering::Relaxed)
        ));
        let engine = ScoreEngine::with_policy(self.policy.clone(), self.clock.clone());

        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| SessionError::Unavailable("session map poisoned".to_string()))?;
        sessions.insert(id.clone(), Arc::new(Mutex::new(engine)));
        info!(session_id = %id, active = sessions.len(), "opened scoring session");

        Ok(id)
    }

    /// Runs `f` with exclusive access to the session's engine.
    pub fn with_engine<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut ScoreEngine<C>) -> T,
    ) -> Result<T, SessionError> {
        let engine = {
            let sessions = self
                .sessions
                .lock()
                .map_err(|_| SessionError::Unavailable("session map poisoned".to_string()))?;
            sessions
                .get(id)
                .cloned()
                .ok_or_else(|| SessionError::NotFound(id.clone()))?
        };

        let mut guard = engine
            .lock()
            .map_err(|_| SessionError::Unavailable(format!("engine for {id} poisoned")))?;
        Ok(f(&mut guard))
    }

    /// Drops the session's engine; in-flight callers keep their handle until they finish.
    pub fn remove(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| SessionError::Unavailable("session map poisoned".to_string()))?;
        sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        info!(session_id = %id, active = sessions.len(), "closed scoring session");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .map(|sessions| sessions.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::clock::ManualClock;
    use crate::scoring::domain::{Asset, AssetKind, RecordId};
    use chrono::{TimeZone, Utc};

    fn registry() -> SessionRegistry<ManualClock> {
        let start = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).single().expect("valid");
        SessionRegistry::with_clock(ScoringPolicy::default(), ManualClock::starting_at(start))
    }

    #[test]
    fn sessions_are_isolated() {
        let registry = registry();
        let first = registry.create().expect("session opens");
        let second = registry.create().expect("session opens");
        assert_ne!(first, second);

        registry
            .with_engine(&first, |engine| {
                let now = engine.clock().now();
                engine.add_asset(Asset {
                    id: RecordId::new("house"),
                    name: "House".to_string(),
                    value: 250_000.0,
                    kind: AssetKind::Property,
                    last_updated: now,
                })
            })
            .expect("session exists");

        let first_assets = registry
            .with_engine(&first, |engine| engine.state().assets.len())
            .expect("session exists");
        let second_assets = registry
            .with_engine(&second, |engine| engine.state().assets.len())
            .expect("session exists");

        assert_eq!(first_assets, 2);
        assert_eq!(second_assets, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unknown_sessions_are_reported() {
        let registry = registry();
        let missing = SessionId("session-999999".to_string());

        let result = registry.with_engine(&missing, |engine| engine.score());

        assert!(matches!(result, Err(SessionError::NotFound(id)) if id == missing));
        assert!(matches!(registry.remove(&missing), Err(SessionError::NotFound(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn removed_sessions_stop_resolving() {
        let registry = registry();
        let id = registry.create().expect("session opens");

        registry.remove(&id).expect("session closes");

        assert!(registry.is_empty());
        assert!(matches!(
            registry.with_engine(&id, |engine| engine.score()),
            Err(SessionError::NotFound(_))
        ));
    }
}

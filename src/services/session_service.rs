//! Planning sessions
//!
//! A [`PlanningSession`] owns everything that belongs to one trip being
//! planned: its pricing calculator (and so its cache), its history tracker,
//! the last accepted selection and the error flag shown to the traveler.
//! Sessions live in a [`SessionStore`] shared by the HTTP handlers and are
//! discarded when the session ends or sits idle too long.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PricingConfig;
use crate::error::{PricingError, Result};
use crate::models::history::{PriceComparison, PricingHistory};
use crate::models::pricing::PricingUpdate;
use crate::models::selection::{SelectedItems, SelectionChange, TripContext};
use crate::models::timeline::{ScheduledActivity, TimeConflict};
use crate::services::cost_engine::ItineraryCostEngine;
use crate::services::currency_service::CurrencyTable;
use crate::services::history_service::{convert_update, create_price_comparison, PricingHistoryTracker};
use crate::services::pricing_service::{CacheStats, PricingCalculator};
use crate::services::timeline_service::detect_conflicts;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRequest {
    #[serde(default)]
    pub selected_items: SelectedItems,
    pub trip: TripContext,
    pub currency: String,
    /// Monotonically increasing per session; stale tokens are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_token: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingOutcome {
    pub request_token: u64,
    pub pricing: PricingUpdate,
    pub history: PricingHistory,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub latest_token: u64,
    pub current: Option<PricingUpdate>,
    pub history: Option<PricingHistory>,
    pub error: Option<String>,
    pub cache: CacheStats,
}

pub struct PlanningSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_active: Instant,
    currencies: Arc<CurrencyTable>,
    calculator: PricingCalculator,
    tracker: PricingHistoryTracker,
    last_request: Option<PricingRequest>,
    latest_token: u64,
    error: Option<String>,
}

impl PlanningSession {
    pub fn new(
        currencies: Arc<CurrencyTable>,
        engine: Arc<dyn ItineraryCostEngine>,
        config: &PricingConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            last_active: Instant::now(),
            calculator: PricingCalculator::new(currencies.clone(), engine, config),
            tracker: PricingHistoryTracker::new(currencies.clone()),
            currencies,
            last_request: None,
            latest_token: 0,
            error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Price a new selection and fold the result into the history.
    ///
    /// Failures are stored as the session's error flag (cleared by the next
    /// success) as well as returned. A request carrying a token that is not
    /// newer than the last accepted one is discarded without touching state.
    pub fn recalculate(&mut self, request: PricingRequest) -> Result<PricingOutcome> {
        self.last_active = Instant::now();

        let token = match request.request_token {
            Some(token) if token <= self.latest_token => {
                log::warn!(
                    "Session {}: discarding stale pricing request {} (latest {})",
                    self.id,
                    token,
                    self.latest_token
                );
                return Err(PricingError::StaleRequest {
                    token,
                    latest: self.latest_token,
                });
            }
            Some(token) => token,
            None => self.latest_token + 1,
        };
        self.latest_token = token;

        let pricing = match self.calculator.calculate_pricing(
            &request.selected_items,
            &request.trip,
            &request.currency,
        ) {
            Ok(pricing) => pricing,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err);
            }
        };

        let change = SelectionChange::between(
            self.last_request.as_ref().map(|last| &last.selected_items),
            &request.selected_items,
        );
        let history = self.tracker.record_update(pricing.clone(), &change);

        self.error = None;
        self.last_request = Some(request);

        Ok(PricingOutcome {
            request_token: token,
            pricing,
            history,
        })
    }

    pub fn current(&self) -> Option<&PricingUpdate> {
        self.tracker.history().map(|history| &history.current)
    }

    pub fn history(&self) -> Option<&PricingHistory> {
        self.tracker.history()
    }

    pub fn reset_history(&mut self) {
        self.last_active = Instant::now();
        self.tracker.reset_history();
        log::info!("Session {}: pricing history reset", self.id);
    }

    /// Baseline against the latest pricing, in the latest display currency.
    pub fn comparison(&self) -> Result<PriceComparison> {
        let history = self.tracker.history().ok_or(PricingError::NoPricing)?;
        let original = convert_update(&self.currencies, &history.original, history.current.currency())?;
        Ok(create_price_comparison(&original, &history.current))
    }

    /// Overlaps among the last accepted selection's timed activities.
    pub fn conflicts(&self) -> Vec<TimeConflict> {
        let Some(request) = &self.last_request else {
            return Vec::new();
        };

        let scheduled: Vec<ScheduledActivity> = request
            .selected_items
            .activities
            .iter()
            .filter_map(|activity| {
                Some(ScheduledActivity {
                    id: activity.id.clone(),
                    name: activity.name.clone(),
                    date: activity.date.unwrap_or(request.trip.start_date),
                    start_time: activity.start_time?,
                    duration_minutes: activity.duration_minutes?,
                })
            })
            .collect();

        detect_conflicts(&scheduled)
    }

    pub fn purge_expired(&mut self) -> usize {
        self.calculator.purge_expired()
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            created_at: self.created_at,
            latest_token: self.latest_token,
            current: self.current().cloned(),
            history: self.history().cloned(),
            error: self.error.clone(),
            cache: self.calculator.stats(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_entries: usize,
    pub idle_sessions: usize,
}

/// All live planning sessions of the process.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, PlanningSession>>,
    currencies: Arc<CurrencyTable>,
    engine: Arc<dyn ItineraryCostEngine>,
    config: PricingConfig,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(
        currencies: Arc<CurrencyTable>,
        engine: Arc<dyn ItineraryCostEngine>,
        config: PricingConfig,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            currencies,
            engine,
            config,
            idle_ttl,
        }
    }

    pub fn currencies(&self) -> &CurrencyTable {
        &self.currencies
    }

    /// A panic inside one session must not lock every other session out,
    /// so a poisoned map is taken over and the poison cleared.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PlanningSession>> {
        self.sessions.lock().unwrap_or_else(|poisoned| {
            log::error!("Session store lock poisoned, recovering");
            self.sessions.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }

    pub fn create_session(&self) -> SessionSnapshot {
        let session = PlanningSession::new(self.currencies.clone(), self.engine.clone(), &self.config);
        let snapshot = session.snapshot();
        self.lock().insert(session.id(), session);
        log::info!("Planning session {} started", snapshot.session_id);
        snapshot
    }

    pub fn end_session(&self, id: Uuid) -> Result<()> {
        match self.lock().remove(&id) {
            Some(_) => {
                log::info!("Planning session {} ended", id);
                Ok(())
            }
            None => Err(PricingError::SessionNotFound(id)),
        }
    }

    /// Run `f` against one session while holding the store lock.
    pub fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut PlanningSession) -> Result<T>) -> Result<T> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id).ok_or(PricingError::SessionNotFound(id))?;
        f(session)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop expired cache entries everywhere and end sessions idle past the limit.
    pub fn sweep(&self) -> SweepReport {
        let mut sessions = self.lock();
        let idle_ttl = self.idle_ttl;

        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.idle_for() < idle_ttl;
            if !keep {
                log::info!("Planning session {} expired after inactivity", id);
            }
            keep
        });

        let report = SweepReport {
            expired_entries: sessions.values_mut().map(PlanningSession::purge_expired).sum(),
            idle_sessions: before - sessions.len(),
        };
        if report != SweepReport::default() {
            log::debug!(
                "Sweep removed {} cache entries and {} idle sessions",
                report.expired_entries,
                report.idle_sessions
            );
        }
        report
    }
}

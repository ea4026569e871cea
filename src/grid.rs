//! In-memory month grid and its sync with a [`RecordStore`].
//!
//! A grid shows one month at a time. Loading replaces the whole record,
//! edits stay local, and submit pushes the whole record back in one write.
//! Loads are tagged with an increasing request token so that a slow
//! response for a month the user already navigated away from is dropped.

use crate::auth::{Authenticator, Session};
use crate::calendar::MonthKey;
use crate::errors::{GridError, Notification};
use crate::models::{ActiveCell, Category, MonthRecord, MonthSummary, parse_cell};
use crate::stats::summarize;
use crate::store::RecordStore;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPhase {
    Loading,
    Loaded,
    Editing,
    Submitting,
    /// The last submit failed; local edits are kept.
    Error,
}

/// A fetch started by [`MonthlyGrid::begin_load`]. Runs without borrowing
/// the grid.
pub struct PendingLoad {
    token: u64,
    key: MonthKey,
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn Authenticator>,
}

impl PendingLoad {
    pub fn key(&self) -> MonthKey {
        self.key
    }

    pub async fn run(self, session: &Session) -> LoadOutcome {
        let result = match self.auth.current_user(session).await {
            Ok(user) => self.store.fetch_month_record(&user, &self.key).await,
            Err(err) => Err(err),
        };
        LoadOutcome {
            token: self.token,
            key: self.key,
            result,
        }
    }
}

pub struct LoadOutcome {
    token: u64,
    key: MonthKey,
    result: Result<Option<MonthRecord>, GridError>,
}

pub struct MonthlyGrid {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn Authenticator>,
    key: MonthKey,
    record: MonthRecord,
    phase: GridPhase,
    active_cell: Option<ActiveCell>,
    notification: Option<Notification>,
    latest_load: u64,
}

impl MonthlyGrid {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn Authenticator>, key: MonthKey) -> Self {
        Self {
            store,
            auth,
            record: MonthRecord::empty(&key),
            key,
            phase: GridPhase::Loading,
            active_cell: None,
            notification: None,
            latest_load: 0,
        }
    }

    pub fn key(&self) -> MonthKey {
        self.key
    }

    pub fn record(&self) -> &MonthRecord {
        &self.record
    }

    pub fn phase(&self) -> GridPhase {
        self.phase
    }

    pub fn active_cell(&self) -> Option<ActiveCell> {
        self.active_cell
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn value(&self, day_index: usize, category: Category) -> Option<u32> {
        self.record.days[day_index].get(category)
    }

    pub fn summary(&self) -> MonthSummary {
        summarize(&self.record)
    }

    /// Switches the grid to `key` and returns the fetch to run. The grid
    /// shows an empty month until the fetch is finished.
    pub fn begin_load(&mut self, key: MonthKey) -> PendingLoad {
        self.latest_load += 1;
        self.key = key;
        self.record = MonthRecord::empty(&key);
        self.phase = GridPhase::Loading;
        self.active_cell = None;

        PendingLoad {
            token: self.latest_load,
            key,
            store: Arc::clone(&self.store),
            auth: Arc::clone(&self.auth),
        }
    }

    /// Applies a finished fetch. Returns `Ok(false)` when a newer load has
    /// been started since, in which case the outcome is dropped.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> Result<bool, GridError> {
        if outcome.token != self.latest_load {
            debug!(key = %outcome.key, "dropping superseded load");
            return Ok(false);
        }

        let loaded = outcome.result.and_then(|record| match record {
            Some(record) => record
                .validate_for(&outcome.key)
                .map(|_| record)
                .map_err(|err| GridError::Retrieval(err.to_string())),
            None => Ok(MonthRecord::empty(&outcome.key)),
        });

        self.phase = GridPhase::Loaded;
        match loaded {
            Ok(record) => {
                self.record = record;
                Ok(true)
            }
            Err(err) => {
                warn!(key = %outcome.key, "loading month failed: {err}");
                self.record = MonthRecord::empty(&outcome.key);
                self.notification = Some(err.notification());
                Err(err)
            }
        }
    }

    /// Fetches `key` or falls back to an empty month. Errors are returned
    /// for display; the grid is usable either way.
    pub async fn load(&mut self, session: &Session, key: MonthKey) -> Result<(), GridError> {
        let outcome = self.begin_load(key).run(session).await;
        self.finish_load(outcome).map(|_| ())
    }

    /// Replaces one cell with user-typed text. Invalid text is rejected and
    /// the cell keeps its value. Edits are refused while a load is pending,
    /// since the loaded record would replace them.
    ///
    /// # Panics
    ///
    /// Panics if `day_index` is outside the displayed month.
    pub fn set_entry(
        &mut self,
        day_index: usize,
        category: Category,
        text: &str,
    ) -> Result<(), GridError> {
        assert!(
            day_index < self.record.days.len(),
            "day index {day_index} out of range for {}",
            self.key
        );
        self.ensure_loaded()?;

        self.active_cell = Some(ActiveCell {
            day_index,
            category,
        });
        let value = parse_cell(text)?;
        self.record.days[day_index].set(category, value);
        self.phase = GridPhase::Editing;
        Ok(())
    }

    /// Writes the whole displayed month to the store. Refused while a load
    /// is pending; the grid then holds a placeholder, not the stored month.
    pub async fn submit(&mut self, session: &Session) -> Result<(), GridError> {
        self.ensure_loaded()?;
        self.phase = GridPhase::Submitting;
        let result = match self.auth.current_user(session).await {
            Ok(user) => {
                self.store
                    .save_month_record(&user, &self.key, &self.record)
                    .await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                self.phase = GridPhase::Loaded;
                self.active_cell = None;
                self.notification = Some(Notification::success("Data saved successfully!"));
                Ok(())
            }
            Err(err) => {
                warn!(key = %self.key, "saving month failed: {err}");
                self.phase = GridPhase::Error;
                self.notification = Some(err.notification());
                Err(err)
            }
        }
    }

    fn ensure_loaded(&self) -> Result<(), GridError> {
        if self.phase == GridPhase::Loading {
            return Err(GridError::Validation(format!("{} is still loading", self.key)));
        }
        Ok(())
    }
}

//! Statistics store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleet_api::FleetApi;
use fleet_core::Statistics;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsState {
    /// Served record; zeroed until the first successful write.
    pub data: Statistics,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

struct Inner {
    api: Arc<dyn FleetApi>,
    state: watch::Sender<StatisticsState>,
}

/// Observable statistics store. The record is always replaced whole.
#[derive(Clone)]
pub struct StatisticsStore {
    inner: Arc<Inner>,
}

impl StatisticsStore {
    #[must_use]
    pub fn new(api: Arc<dyn FleetApi>) -> Self {
        let (state, _) = watch::channel(StatisticsState::default());
        Self {
            inner: Arc::new(Inner { api, state }),
        }
    }

    #[must_use]
    pub fn state(&self) -> StatisticsState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StatisticsState> {
        self.inner.state.subscribe()
    }

    /// Fetch `GET /statistics`. On failure the previous record is kept.
    pub async fn load(&self) -> StoreResult<()> {
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.inner.api.get_statistics().await {
            Ok(statistics) => {
                self.replace(statistics, false);
                Ok(())
            }
            Err(e) => {
                let err = StoreError::fetch("Failed to fetch statistics", e);
                warn!(error = %err, "Statistics fetch failed; keeping previous record");
                let message = err.to_string();
                self.inner.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(message);
                });
                Err(err)
            }
        }
    }

    pub(crate) fn abandon_load(&self) {
        self.inner.state.send_if_modified(|s| std::mem::take(&mut s.loading));
    }

    pub fn apply_push_snapshot(&self, statistics: Statistics) {
        self.replace(statistics, true);
    }

    fn replace(&self, statistics: Statistics, pushed: bool) {
        self.inner.state.send_modify(|s| {
            debug!(total = statistics.total, pushed, "Statistics replaced");
            s.data = statistics;
            s.last_updated = Some(Utc::now());
            if !pushed {
                s.loading = false;
                s.error = None;
            }
        });
    }
}

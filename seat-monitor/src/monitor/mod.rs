//! Polling orchestrator.
//!
//! Each check cycle walks the whole [`SearchPlan`] one query at a time:
//! fetch, interpret, filter through the alert cache, queue alerts. Between
//! cycles the monitor is idle until the next tick. Queries never run in
//! parallel, so the portal sees one request at a time on one session.

mod plan;
mod source;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::alerts::{AlertCache, AlertKey};
use crate::domain::{SearchOutcome, SearchQuery, TrainResult};
use crate::interpret::interpret;
use crate::notify::{AlertDispatcher, DispatchStats, format_alert};
use crate::portal::DEFAULT_BASE_URL;

pub use plan::SearchPlan;
pub use source::AvailabilitySource;

/// Counts from one check cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub queries: usize,
    pub failed: usize,
    pub fully_booked: usize,
    pub unrecognized: usize,
    pub trains_seen: usize,
    pub alerts_queued: usize,
}

/// Drives check cycles and owns the alert cache.
pub struct Monitor<S> {
    source: S,
    plan: SearchPlan,
    cache: AlertCache,
    dispatcher: AlertDispatcher,
    interval: Duration,
    booking_url: String,
}

impl<S: AvailabilitySource> Monitor<S> {
    pub fn new(
        source: S,
        plan: SearchPlan,
        cache: AlertCache,
        dispatcher: AlertDispatcher,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            plan,
            cache,
            dispatcher,
            interval,
            booking_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Link included in alerts.
    pub fn with_booking_url(mut self, url: impl Into<String>) -> Self {
        self.booking_url = url.into();
        self
    }

    pub fn plan(&self) -> &SearchPlan {
        &self.plan
    }

    pub fn cache(&self) -> &AlertCache {
        &self.cache
    }

    /// Run one full pass over the search plan.
    ///
    /// A failing query is logged and counted; the remaining queries still
    /// run.
    pub async fn check_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for query in self.plan.queries() {
            report.queries += 1;

            let body = match self.source.fetch(&query).await {
                Ok(body) => body,
                Err(e) => {
                    report.failed += 1;
                    let departure = query.departure_time.as_deref().unwrap_or("-");
                    if e.is_network() {
                        warn!(
                            date = %query.travel_date_str(),
                            schedule_type = %query.schedule_type,
                            departure,
                            error = %e,
                            "query failed"
                        );
                    } else {
                        error!(
                            date = %query.travel_date_str(),
                            schedule_type = %query.schedule_type,
                            departure,
                            error = %e,
                            "query failed, portal index page may have changed"
                        );
                    }
                    continue;
                }
            };

            match interpret(&body) {
                SearchOutcome::FullyBooked => {
                    report.fully_booked += 1;
                    info!(
                        date = %query.travel_date_str(),
                        schedule_type = %query.schedule_type,
                        departure = query.departure_time.as_deref().unwrap_or("-"),
                        "fully booked"
                    );
                }
                SearchOutcome::Unrecognized => {
                    report.unrecognized += 1;
                    warn!(
                        date = %query.travel_date_str(),
                        schedule_type = %query.schedule_type,
                        bytes = body.len(),
                        "unrecognized response page, portal layout may have changed"
                    );
                }
                SearchOutcome::Available(trains) => {
                    report.trains_seen += trains.len();
                    info!(
                        date = %query.travel_date_str(),
                        schedule_type = %query.schedule_type,
                        trains = trains.len(),
                        "trains listed"
                    );
                    report.alerts_queued += self.queue_alerts(&query, &trains).await;
                }
            }
        }

        report
    }

    /// Queue alerts for trains not yet announced. Returns how many were queued.
    async fn queue_alerts(&self, query: &SearchQuery, trains: &[TrainResult]) -> usize {
        let pending = self.cache.pending(query.travel_date, trains);
        if pending.len() < trains.len() {
            debug!(
                skipped = trains.len() - pending.len(),
                "already alerted for unchanged trains"
            );
        }

        let mut queued = 0;
        for train in pending {
            let key = AlertKey::new(query.travel_date, train);

            if !train.has_open_seats() {
                debug!(key = %key, "no open seats, not alerting");
                continue;
            }

            let message = format_alert(
                train,
                query.travel_date,
                query.schedule_type,
                &self.booking_url,
            );
            if self.dispatcher.dispatch(message) {
                info!(key = %key, "alert queued");
                self.cache.record(key).await;
                queued += 1;
            }
        }
        queued
    }

    /// Check immediately, then once per interval, until `shutdown` resolves.
    ///
    /// A cycle that panics is logged and the loop carries on. A cycle longer
    /// than the interval delays the next one rather than bunching them up.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.interval.as_secs(),
            queries_per_cycle = self.plan.queries().len(),
            "monitor started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("stopping monitor");
                    break;
                }
                _ = async {
                    ticker.tick().await;
                    self.run_cycle().await
                } => {}
            }
        }
    }

    /// One guarded cycle: panics are caught and logged.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        match AssertUnwindSafe(self.check_cycle()).catch_unwind().await {
            Ok(report) => {
                info!(
                    queries = report.queries,
                    failed = report.failed,
                    fully_booked = report.fully_booked,
                    unrecognized = report.unrecognized,
                    trains = report.trains_seen,
                    alerts = report.alerts_queued,
                    remembered = self.cache.len(),
                    "check cycle complete"
                );
                Some(report)
            }
            Err(_) => {
                error!("check cycle panicked, waiting for next tick");
                None
            }
        }
    }

    /// Stop alert delivery, waiting up to `deadline` for queued alerts.
    pub async fn shutdown(self, deadline: Duration) -> Option<DispatchStats> {
        self.dispatcher.shutdown(deadline).await
    }
}

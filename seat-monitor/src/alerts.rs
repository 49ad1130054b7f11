//! Deduplicating alert cache.
//!
//! An alert is identified by the availability snapshot it announces: date,
//! train, departure time and the seat count of each class. Seeing the same
//! snapshot again is suppressed; a change in any seat count is a new alert.
//!
//! Entries are bounded by count and age so a long-running monitor does not
//! grow without limit. Once an entry ages out, an unchanged snapshot will be
//! announced again.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache as MokaCache;

use crate::domain::{FareClass, TrainResult, format_travel_date};

/// Identity of one announced availability snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub date: NaiveDate,
    pub train_name: String,
    pub departure_time: Option<String>,
    pub first_class_seats: u32,
    pub economy_seats: u32,
}

impl AlertKey {
    /// Derive the key for a train on a travel date.
    ///
    /// A class the page did not list counts as 0 seats.
    pub fn new(date: NaiveDate, train: &TrainResult) -> Self {
        Self {
            date,
            train_name: train.display_name.clone(),
            departure_time: train.departure_time.clone(),
            first_class_seats: train.seats(FareClass::First).unwrap_or(0),
            economy_seats: train.seats(FareClass::Economy).unwrap_or(0),
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_fclass{}_eco{}",
            format_travel_date(self.date),
            self.train_name,
            self.departure_time.as_deref().unwrap_or("N/A"),
            self.first_class_seats,
            self.economy_seats
        )
    }
}

/// Longest time-to-live the underlying cache accepts (1000 years).
pub const MAX_ALERT_TTL: Duration = Duration::from_secs(1000 * 365 * 24 * 60 * 60);

/// Configuration for the alert cache.
#[derive(Debug, Clone)]
pub struct AlertCacheConfig {
    /// Maximum number of remembered alerts.
    pub max_entries: u64,

    /// How long an alert suppresses repeats.
    pub ttl: Duration,
}

impl Default for AlertCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Remembers which availability snapshots have been announced.
pub struct AlertCache {
    /// Key → when the alert was first queued.
    seen: MokaCache<AlertKey, DateTime<Utc>>,
}

impl AlertCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &AlertCacheConfig) -> Self {
        let seen = MokaCache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { seen }
    }

    /// Trains from one query that still need an alert.
    ///
    /// Drops trains whose key is already recorded, and repeats of the same
    /// key within `trains`.
    pub fn pending<'t>(&self, date: NaiveDate, trains: &'t [TrainResult]) -> Vec<&'t TrainResult> {
        let mut batch = HashSet::new();
        trains
            .iter()
            .filter(|train| {
                let key = AlertKey::new(date, train);
                !self.seen.contains_key(&key) && batch.insert(key)
            })
            .collect()
    }

    /// Remember that an alert for `key` has been sent.
    pub async fn record(&self, key: AlertKey) {
        self.seen.insert(key, Utc::now()).await;
    }

    pub fn contains(&self, key: &AlertKey) -> bool {
        self.seen.contains_key(key)
    }

    /// Approximate number of remembered alerts (for monitoring).
    pub fn len(&self) -> u64 {
        self.seen.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply pending evictions so `len` is exact.
    pub async fn sync(&self) {
        self.seen.run_pending_tasks().await;
    }
}

impl Default for AlertCache {
    fn default() -> Self {
        Self::new(&AlertCacheConfig::default())
    }
}

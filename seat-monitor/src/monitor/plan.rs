//! The search space covered by one check cycle.

use chrono::NaiveDate;

use crate::config::{MonitorConfig, RouteConfig};
use crate::domain::{ScheduleType, SearchQuery};

/// Dates, schedule types and departure times to check each cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub dates: Vec<NaiveDate>,
    pub schedule_types: Vec<ScheduleType>,
    pub route: RouteConfig,
    /// Times queried for express trains.
    pub express_times: Vec<String>,
    /// The one time queried for inter-county trains.
    pub inter_county_time: String,
}

impl SearchPlan {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            dates: config.dates.clone(),
            schedule_types: config.train_types.clone(),
            route: config.route,
            express_times: config.departure_times.clone(),
            inter_county_time: config.inter_county_departure_time.clone(),
        }
    }

    /// Departure times to query for a schedule type.
    pub fn times_for(&self, schedule_type: ScheduleType) -> Vec<&str> {
        match schedule_type {
            ScheduleType::Express => self.express_times.iter().map(String::as_str).collect(),
            ScheduleType::InterCounty => vec![self.inter_county_time.as_str()],
        }
    }

    /// The time a one-off query of `schedule_type` should use: the first
    /// configured time for that type, if any.
    pub fn default_time(&self, schedule_type: ScheduleType) -> Option<&str> {
        self.times_for(schedule_type).first().copied()
    }

    /// Every query in the cycle, date-major, in configuration order.
    pub fn queries(&self) -> Vec<SearchQuery> {
        let mut queries = Vec::new();
        for &date in &self.dates {
            for &schedule_type in &self.schedule_types {
                for time in self.times_for(schedule_type) {
                    queries.push(
                        SearchQuery::new(
                            schedule_type,
                            date,
                            self.route.terminal_id,
                            self.route.destination_id,
                        )
                        .with_departure_time(time),
                    );
                }
            }
        }
        queries
    }
}

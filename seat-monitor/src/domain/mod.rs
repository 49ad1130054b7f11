//! Domain types for the seat monitor.
//!
//! Queries describe what to ask the portal; results describe what an
//! interpreted response page says. Results are immutable once built.

mod query;
mod schedule;
mod train;

pub use query::{
    SearchQuery, TRAVEL_DATE_FORMAT, format_travel_date, parse_travel_date, travel_date,
};
pub use schedule::{FareClass, InvalidFareClass, InvalidScheduleType, ScheduleType};
pub use train::{FareClassAvailability, PRICE_UNKNOWN, SearchOutcome, TrainResult};

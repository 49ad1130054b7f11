//! Search query sent to the portal.

use chrono::NaiveDate;
use serde::Serialize;

use super::ScheduleType;

/// Date format used by the portal and the config file: `DD/MM/YYYY`.
pub const TRAVEL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse a `DD/MM/YYYY` travel date.
///
/// # Examples
///
/// ```
/// use seat_monitor::domain::parse_travel_date;
///
/// let date = parse_travel_date("02/01/2026").unwrap();
/// assert_eq!(date.to_string(), "2026-01-02");
///
/// assert!(parse_travel_date("2026-01-02").is_err());
/// ```
pub fn parse_travel_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), TRAVEL_DATE_FORMAT)
}

/// Format a travel date the way the portal expects it.
pub fn format_travel_date(date: NaiveDate) -> String {
    date.format(TRAVEL_DATE_FORMAT).to_string()
}

/// Serde adapter for `DD/MM/YYYY` dates.
pub mod travel_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_travel_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_travel_date(&raw).map_err(|e| {
            serde::de::Error::custom(format!("invalid travel date {raw:?} (expected DD/MM/YYYY): {e}"))
        })
    }

    /// Same as the parent module, for lists of dates.
    pub mod list {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

        pub fn serialize<S: Serializer>(
            dates: &[NaiveDate],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(dates.len()))?;
            for date in dates {
                seq.serialize_element(&super::super::format_travel_date(*date))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<NaiveDate>, D::Error> {
            let raw = Vec::<String>::deserialize(deserializer)?;
            raw.iter()
                .map(|s| {
                    super::super::parse_travel_date(s).map_err(|e| {
                        serde::de::Error::custom(format!(
                            "invalid travel date {s:?} (expected DD/MM/YYYY): {e}"
                        ))
                    })
                })
                .collect()
        }
    }
}

/// One availability query: a schedule type on a date along a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchQuery {
    pub schedule_type: ScheduleType,
    #[serde(with = "travel_date")]
    pub travel_date: NaiveDate,
    pub origin_terminal_id: u32,
    pub destination_terminal_id: u32,
    /// Clock string in the portal's `H.MM` format, e.g. `"3.00"`.
    pub departure_time: Option<String>,
}

impl SearchQuery {
    pub fn new(
        schedule_type: ScheduleType,
        travel_date: NaiveDate,
        origin_terminal_id: u32,
        destination_terminal_id: u32,
    ) -> Self {
        Self {
            schedule_type,
            travel_date,
            origin_terminal_id,
            destination_terminal_id,
            departure_time: None,
        }
    }

    pub fn with_departure_time(mut self, time: impl Into<String>) -> Self {
        self.departure_time = Some(time.into());
        self
    }

    /// The travel date in `DD/MM/YYYY` form.
    pub fn travel_date_str(&self) -> String {
        format_travel_date(self.travel_date)
    }
}

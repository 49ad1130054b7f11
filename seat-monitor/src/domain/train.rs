//! Interpreted availability results.

use serde::Serialize;

use super::FareClass;

/// Sentinel for a price whose label could not be matched.
pub const PRICE_UNKNOWN: &str = "N/A";

/// Seats and prices for one fare class on one train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FareClassAvailability {
    pub class: FareClass,
    pub seat_count: u32,
    /// Upstream-formatted, e.g. `"KES 3,000"`.
    pub adult_price: String,
    pub child_price: String,
}

impl FareClassAvailability {
    /// Availability with unknown prices.
    pub fn new(class: FareClass, seat_count: u32) -> Self {
        Self {
            class,
            seat_count,
            adult_price: PRICE_UNKNOWN.to_string(),
            child_price: PRICE_UNKNOWN.to_string(),
        }
    }

    pub fn with_prices(mut self, adult: impl Into<String>, child: impl Into<String>) -> Self {
        self.adult_price = adult.into();
        self.child_price = child.into();
        self
    }

    /// Whether both prices were read from the page.
    pub fn has_prices(&self) -> bool {
        self.adult_price != PRICE_UNKNOWN && self.child_price != PRICE_UNKNOWN
    }
}

/// One train listed on a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainResult {
    pub display_name: String,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    /// First class before economy; each class at most once.
    pub classes: Vec<FareClassAvailability>,
}

impl TrainResult {
    /// Availability for a class, if the page listed it.
    pub fn class(&self, class: FareClass) -> Option<&FareClassAvailability> {
        self.classes.iter().find(|c| c.class == class)
    }

    /// Seat count for a class, or `None` if the class was not listed.
    pub fn seats(&self, class: FareClass) -> Option<u32> {
        self.class(class).map(|c| c.seat_count)
    }

    /// Total open seats across all listed classes, saturating at `u32::MAX`.
    pub fn total_seats(&self) -> u32 {
        self.classes
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.seat_count))
    }

    /// Whether any listed class has a seat open.
    pub fn has_open_seats(&self) -> bool {
        self.classes.iter().any(|c| c.seat_count > 0)
    }
}

/// What a search response says about availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "trains", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The portal confirmed no seats for the query.
    FullyBooked,
    /// A results container was found; the list may be empty.
    Available(Vec<TrainResult>),
    /// Neither a fully-booked message nor a results container was found.
    /// Usually means the portal's markup changed.
    Unrecognized,
}

impl SearchOutcome {
    /// Trains listed in the outcome (empty unless `Available`).
    pub fn trains(&self) -> &[TrainResult] {
        match self {
            SearchOutcome::Available(trains) => trains,
            _ => &[],
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, SearchOutcome::Unrecognized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> TrainResult {
        TrainResult {
            display_name: "Madaraka Express".to_string(),
            departure_time: Some("03:00 pm".to_string()),
            arrival_time: Some("08:00 pm".to_string()),
            classes: vec![
                FareClassAvailability::new(FareClass::First, 4).with_prices("KES 4,500", "KES 2,250"),
                FareClassAvailability::new(FareClass::Economy, 0),
            ],
        }
    }

    #[test]
    fn class_lookup() {
        let train = train();
        assert_eq!(train.seats(FareClass::First), Some(4));
        assert_eq!(train.seats(FareClass::Economy), Some(0));
        assert_eq!(train.total_seats(), 4);
        assert!(train.class(FareClass::First).unwrap().has_prices());
        assert!(!train.class(FareClass::Economy).unwrap().has_prices());
    }

    #[test]
    fn huge_seat_counts_saturate() {
        let mut train = train();
        train.classes = vec![
            FareClassAvailability::new(FareClass::First, u32::MAX),
            FareClassAvailability::new(FareClass::Economy, 1),
        ];
        assert_eq!(train.total_seats(), u32::MAX);
        assert!(train.has_open_seats());
    }

    #[test]
    fn open_seats() {
        let mut train = train();
        assert!(train.has_open_seats());

        train.classes[0].seat_count = 0;
        assert!(!train.has_open_seats());

        train.classes.clear();
        assert!(!train.has_open_seats());
    }

    #[test]
    fn missing_class_is_none() {
        let mut train = train();
        train.classes.retain(|c| c.class == FareClass::Economy);
        assert_eq!(train.seats(FareClass::First), None);
    }

    #[test]
    fn outcome_trains() {
        assert!(SearchOutcome::FullyBooked.trains().is_empty());
        assert!(SearchOutcome::Unrecognized.trains().is_empty());
        assert!(SearchOutcome::Unrecognized.is_unrecognized());
        assert_eq!(SearchOutcome::Available(vec![train()]).trains().len(), 1);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(SearchOutcome::FullyBooked).unwrap();
        assert_eq!(json["status"], "fully_booked");

        let json = serde_json::to_value(SearchOutcome::Available(vec![train()])).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["trains"][0]["classes"][0]["class"], "first");
        assert_eq!(json["trains"][0]["classes"][0]["adult_price"], "KES 4,500");
    }
}

//! Partial per-block records and their merge.

use std::collections::BTreeMap;

use crate::domain::{FareClass, FareClassAvailability, TrainResult};

/// Why a train block could not be turned into a [`TrainResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    /// No strategy found times or fare classes in the block
    #[error("block has no times and no fare classes")]
    Empty,
}

/// Fields one layout strategy managed to read from a train block.
///
/// Every field is optional. Records from several strategies are merged with
/// [`BlockRecord::merge_missing`], so a later strategy only fills what an
/// earlier one left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRecord {
    pub name: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub classes: BTreeMap<FareClass, FareClassAvailability>,
}

impl BlockRecord {
    /// Fill fields still missing here from `other`.
    pub fn merge_missing(&mut self, other: BlockRecord) {
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.departure.is_none() {
            self.departure = other.departure;
        }
        if self.arrival.is_none() {
            self.arrival = other.arrival;
        }
        for (class, availability) in other.classes {
            self.classes.entry(class).or_insert(availability);
        }
    }

    /// Every field populated; no further strategy could add anything.
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.departure.is_some()
            && self.arrival.is_some()
            && self.classes.contains_key(&FareClass::First)
            && self.classes.contains_key(&FareClass::Economy)
    }

    /// Nothing train-like was found: no times and no fare classes.
    pub fn is_empty(&self) -> bool {
        self.departure.is_none() && self.arrival.is_none() && self.classes.is_empty()
    }

    /// Build the final result, synthesising a name when none was found.
    pub fn into_train(self) -> Result<TrainResult, BlockError> {
        if self.is_empty() {
            return Err(BlockError::Empty);
        }

        let display_name = self.name.unwrap_or_else(|| {
            format!(
                "Train {}",
                self.departure.as_deref().unwrap_or("Unknown")
            )
        });

        Ok(TrainResult {
            display_name,
            departure_time: self.departure,
            arrival_time: self.arrival,
            // BTreeMap order puts first class before economy
            classes: self.classes.into_values().collect(),
        })
    }
}

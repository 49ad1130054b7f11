//! Availability interpreter.
//!
//! Turns a raw search response into a [`SearchOutcome`]:
//!
//! 1. empty input → `Unrecognized`
//! 2. an `h4.main-message` containing "Fully Booked" → `FullyBooked`
//! 3. no `div#form-tags` results container → `Unrecognized`
//! 4. otherwise each `form[action="booking-details.php"]` in the container
//!    is read by the layout strategies in order, merged per field, and
//!    collected into `Available`
//!
//! A block no strategy can make sense of is logged and skipped; the rest of
//! the page is still used.

mod record;
mod strategy;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::domain::{SearchOutcome, TrainResult};

pub use record::{BlockError, BlockRecord};
pub use strategy::{ButtonLayout, CardLayout, DEFAULT_STRATEGIES, LayoutStrategy, button_seats};

/// Phrase the portal puts in its main message when nothing is left.
pub const FULLY_BOOKED_MARKER: &str = "Fully Booked";

static MAIN_MESSAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4.main-message").unwrap());
static RESULTS_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#form-tags").unwrap());
static TRAIN_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"form[action="booking-details.php"]"#).unwrap());

/// Interpret a search response with the built-in layout strategies.
pub fn interpret(raw: &str) -> SearchOutcome {
    interpret_with(raw, DEFAULT_STRATEGIES)
}

/// Interpret a search response with an explicit strategy order.
///
/// Earlier strategies take precedence; later ones only fill fields the
/// earlier ones left empty.
pub fn interpret_with(raw: &str, strategies: &[&dyn LayoutStrategy]) -> SearchOutcome {
    if raw.trim().is_empty() {
        return SearchOutcome::Unrecognized;
    }

    let document = Html::parse_document(raw);

    if document
        .select(&MAIN_MESSAGE)
        .any(|message| message.text().collect::<String>().contains(FULLY_BOOKED_MARKER))
    {
        return SearchOutcome::FullyBooked;
    }

    let Some(container) = document.select(&RESULTS_CONTAINER).next() else {
        return SearchOutcome::Unrecognized;
    };

    let mut trains = Vec::new();
    for (index, block) in container.select(&TRAIN_BLOCK).enumerate() {
        match read_block(block, strategies) {
            Ok(train) => trains.push(train),
            Err(e) => warn!(block = index, error = %e, "skipping train block"),
        }
    }

    SearchOutcome::Available(trains)
}

/// Run every strategy over one block and build the merged result.
fn read_block(
    block: scraper::ElementRef<'_>,
    strategies: &[&dyn LayoutStrategy],
) -> Result<TrainResult, BlockError> {
    let mut merged = BlockRecord::default();

    for strategy in strategies {
        if merged.is_complete() {
            break;
        }
        let record = strategy.extract(block);
        if record != BlockRecord::default() {
            debug!(strategy = strategy.name(), "layout strategy matched");
        }
        merged.merge_missing(record);
    }

    merged.into_train()
}

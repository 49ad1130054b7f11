//! Layout strategies for train blocks.
//!
//! The portal has served two incompatible layouts for the same results
//! page. Each layout gets its own strategy; the interpreter runs them in
//! order and merges what they find field by field.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::domain::{FareClass, FareClassAvailability, PRICE_UNKNOWN};

use super::record::BlockRecord;

/// A way of reading one train block.
pub trait LayoutStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Read whatever this layout can find in `block`.
    ///
    /// Fields the layout does not recognise stay `None`; this never fails.
    fn extract(&self, block: ElementRef<'_>) -> BlockRecord;
}

/// Built-in strategies, newest layout first.
pub static DEFAULT_STRATEGIES: &[&dyn LayoutStrategy] = &[&CardLayout, &ButtonLayout];

static RESULT_TIME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("small.resulttime").unwrap());
static RESULT_TIME_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.span").unwrap());
static CLASS_COLUMN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.col-md-6, div.col-sm-6").unwrap());
static BOX_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4.box-title").unwrap());
static DETAILS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl.details").unwrap());
static DT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt").unwrap());
static DD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());
static SEATS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+SEATS").unwrap());

static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.time").unwrap());
static CLASS_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button.class-btn").unwrap());
static PRICE_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.price-section").unwrap());
static PRICE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.price").unwrap());

/// Current layout: labelled time spans and one card column per class.
///
/// ```html
/// <small class="resulttime">Departure: <span class="span">04:30 pm</span></small>
/// <div class="col-md-6">
///   <h4 class="box-title">FIRST CLASS - 12 SEATS OPEN</h4>
///   <dl class="details"><dt>Adult</dt><dd>KES 4,500</dd></dl>
///   <dl class="details"><dt>Children 3 - 11 Years</dt><dd>KES 2,250</dd></dl>
/// </div>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CardLayout;

impl LayoutStrategy for CardLayout {
    fn name(&self) -> &'static str {
        "card"
    }

    fn extract(&self, block: ElementRef<'_>) -> BlockRecord {
        let mut record = BlockRecord::default();

        let times: Vec<_> = block.select(&RESULT_TIME).collect();
        if times.len() >= 2 {
            record.departure = first_text(times[0], &RESULT_TIME_VALUE);
            record.arrival = first_text(times[1], &RESULT_TIME_VALUE);
        }

        for column in block.select(&CLASS_COLUMN) {
            let Some(title) = column.select(&BOX_TITLE).next() else {
                continue;
            };
            let title = element_text(title).to_uppercase();
            let Some(class) = FareClass::from_title(&title) else {
                continue;
            };

            let seats = SEATS
                .captures(&title)
                .map(|caps| parse_seats(&caps[1]))
                .unwrap_or(0);

            let mut adult = PRICE_UNKNOWN.to_string();
            let mut child = PRICE_UNKNOWN.to_string();
            for details in column.select(&DETAILS) {
                let (Some(dt), Some(dd)) = (details.select(&DT).next(), details.select(&DD).next())
                else {
                    continue;
                };
                let label = element_text(dt).to_lowercase();
                let price = element_text(dd);
                if label.contains("adult") {
                    adult = price;
                } else if is_child_label(&label) {
                    child = price;
                }
            }

            // Later columns win, so a wrapper column matched before its
            // nested class column is overwritten by the nested one.
            record.classes.insert(
                class,
                FareClassAvailability::new(class, seats).with_prices(adult, child),
            );
        }

        record
    }
}

/// Older layout: an `h3` name, bare time divs, and one button per class.
///
/// ```html
/// <h3>Madaraka Express</h3>
/// <div class="time">08:00</div><div class="time">13:30</div>
/// <button class="class-btn">FIRST CLASS - 12 seats</button>
/// <div class="price-section"><span class="price">KES 4,500</span><span class="price">KES 2,250</span></div>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonLayout;

impl LayoutStrategy for ButtonLayout {
    fn name(&self) -> &'static str {
        "button"
    }

    fn extract(&self, block: ElementRef<'_>) -> BlockRecord {
        let mut record = BlockRecord {
            name: first_text(block, &HEADING),
            ..BlockRecord::default()
        };

        let times: Vec<_> = block.select(&TIME).collect();
        if times.len() >= 2 {
            record.departure = non_empty(element_text(times[0]));
            record.arrival = non_empty(element_text(times[1]));
        }

        for button in block.select(&CLASS_BUTTON) {
            let label = element_text(button);
            let Some(class) = FareClass::from_title(&label) else {
                continue;
            };

            let mut availability = FareClassAvailability::new(class, button_seats(&label));

            if let Some(section) = find_following(button, &PRICE_SECTION) {
                let prices: Vec<_> = section.select(&PRICE).map(element_text).collect();
                if prices.len() >= 2 {
                    availability = availability.with_prices(prices[0].clone(), prices[1].clone());
                }
            }

            record.classes.insert(class, availability);
        }

        record
    }
}

/// Seat count from a button label such as `"FIRST CLASS - 12 seats"`.
///
/// Uses the text between the first and second hyphen with non-digits
/// removed. No hyphen or no digits means 0.
pub fn button_seats(label: &str) -> u32 {
    match label.split('-').nth(1) {
        Some(part) => {
            let digits: String = part.chars().filter(char::is_ascii_digit).collect();
            parse_seats(&digits)
        }
        None => 0,
    }
}

/// Parse a run of digits, treating empty or out-of-range input as 0.
fn parse_seats(digits: &str) -> u32 {
    digits.parse().unwrap_or(0)
}

/// Matches "children 3 - 11", "Children (3-11 yrs)", "children 3–11".
fn is_child_label(label: &str) -> bool {
    if !label.contains("children") {
        return false;
    }
    let compact: String = label
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '–' { '-' } else { c })
        .collect();
    compact.contains("3-11")
}

/// Text content with whitespace runs collapsed and ends trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .and_then(non_empty)
}

/// First element matching `selector` after `element` in document order,
/// excluding `element`'s own descendants.
fn find_following<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    let mut current = Some(*element);
    while let Some(node) = current {
        for sibling in node.next_siblings() {
            let found = sibling
                .descendants()
                .filter_map(ElementRef::wrap)
                .find(|candidate| selector.matches(candidate));
            if found.is_some() {
                return found;
            }
        }
        current = node.parent();
    }
    None
}

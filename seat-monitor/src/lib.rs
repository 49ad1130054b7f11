//! Seat availability monitor for the Kenya Railways Madaraka Express
//! booking portal.
//!
//! Polls the portal for configured dates, schedule types and departure
//! times, interprets the result pages, and sends an alert whenever a train
//! with open seats appears or its seat counts change.

pub mod alerts;
pub mod config;
pub mod domain;
pub mod interpret;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod portal;

#[cfg(test)]
mod testing;

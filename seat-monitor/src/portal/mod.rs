//! Ticketing portal client.
//!
//! Covers the two HTTP calls behind every availability check:
//! - `GET /index.php` for an anti-forgery token (and session cookie)
//! - `POST /search-view-results.php` with the search form
//!
//! The client returns raw response bodies. Interpreting them is the job of
//! [`crate::interpret`].

mod client;
mod error;
mod token;

pub use client::{
    DEFAULT_BASE_URL, DEFAULT_DEPARTURE_TIME, PortalClient, PortalConfig, search_form,
};
pub use error::PortalError;
pub use token::{CsrfToken, extract_token};

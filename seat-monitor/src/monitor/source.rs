//! Where raw search responses come from.

use std::future::Future;

use crate::domain::SearchQuery;
use crate::portal::{PortalClient, PortalError};

/// Trait for fetching raw search responses.
///
/// This abstraction allows the monitor to be tested with canned pages.
pub trait AvailabilitySource {
    /// Fetch the raw response body for one query.
    fn fetch(&self, query: &SearchQuery) -> impl Future<Output = Result<String, PortalError>>;
}

impl AvailabilitySource for PortalClient {
    /// Fresh token, then the search, on the client's shared session.
    async fn fetch(&self, query: &SearchQuery) -> Result<String, PortalError> {
        let token = self.fetch_token().await?;
        self.search(query, &token).await
    }
}

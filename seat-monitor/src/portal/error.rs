//! Portal client error types.

/// Errors from talking to the ticketing portal.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Transport failure or timeout
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Portal answered with a non-success status
    #[error("portal returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The index page no longer carries the anti-forgery field
    #[error("csrf token not found in index page")]
    TokenNotFound,
}

impl PortalError {
    /// Transport-level failures, as opposed to the page changing shape.
    pub fn is_network(&self) -> bool {
        matches!(self, PortalError::Network(_) | PortalError::Status { .. })
    }
}

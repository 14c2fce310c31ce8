//! Error types for serving a provider

use crate::diagnostics::Diagnostics;

/// Result form for [`Resource`](crate::Resource) and [`Provider`](crate::Provider) operations.
/// Failures are reported as diagnostics and never carry partial state.
pub type OperationResult<T> = Result<T, Diagnostics>;

/// Errors that stop the provider server itself, as opposed to a single operation
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Reading requests or writing responses failed
    #[error("provider transport failed: {0}")]
    Io(#[from] std::io::Error),
    /// A response could not be encoded
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    /// Two resources registered the same type name
    #[error("resource type `{0}` registered more than once")]
    DuplicateResource(String),
}

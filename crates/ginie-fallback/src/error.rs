//! Error types for consumer-supplied fetch functions.

/// Error returned by a registered refresh function.
///
/// Consumers own their fetch logic (and its error types); the coordinator
/// only logs failures, so a boxed error is all it needs.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one refresh invocation.
pub type FetchResult = Result<(), FetchError>;

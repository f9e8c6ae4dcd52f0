/// Errors raised while building core domain values.
///
/// Ingestion itself never fails (bad payloads coerce to zero); these only
/// surface while validating configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown sensor field: {0}")]
    UnknownField(String),

    #[error("History capacity must be at least 1")]
    ZeroHistoryCapacity,
}

//! Error types for easyloc-core.

/// Errors produced when parsing caller-supplied argument text into the
/// closed enums of this crate.
///
/// These are caller-contract violations: they must be raised at the input
/// boundary, before any storage access happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// The kilometre comparison direction is not `gt` or `lt`.
    #[error("invalid km direction: {0} (expected \"gt\" or \"lt\")")]
    InvalidKmDirection(String),

    /// The grouping field is not `vehicle_uid` or `customer_uid`.
    #[error("invalid grouping field: {0} (expected \"vehicle_uid\" or \"customer_uid\")")]
    InvalidGroupField(String),
}

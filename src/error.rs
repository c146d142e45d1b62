//! Error type shared by every packing strategy.

use thiserror::Error;

/// Errors produced while packing or reading packed arrays.
///
/// Every failure is local and deterministic: retrying the same call with
/// the same input fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackingError {
    /// The caller passed something the codec cannot accept: an empty
    /// input, a negative element, an unknown strategy name, or a word
    /// buffer that does not match its layout.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation needs state that does not exist yet (nothing has been
    /// compressed), or a computed field width does not fit in a word.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Index outside `0..len`.
    #[error("index {index} out of range for {len} packed values")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of packed values.
        len: usize,
    },
}

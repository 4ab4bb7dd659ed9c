use thiserror::Error;

/// Errors reported by the tree containers.
///
/// Lookup misses other than [`Error::KeyNotFound`] are reported as `Option`
/// or `bool` results, and inserting a duplicate key is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// `at`/`at_mut` was called with a key the container does not hold.
    #[error("container does not have an element with the specified key")]
    KeyNotFound,
    /// A cursor at the end of the sequence was dereferenced.
    #[error("cursor is positioned past the end of the sequence")]
    EndOfSequence,
    /// A cursor whose element has been erased was dereferenced.
    #[error("cursor refers to an erased element")]
    StalePosition,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

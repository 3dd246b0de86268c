//! Pair engine error types

use thiserror::Error;

/// Errors returned by pair, list, cursor and value operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairError {
    /// The arena reached its configured live pair limit
    #[error("Allocation failure: pair limit of {0} reached")]
    AllocationFailure(usize),

    /// The pair is already a member of a list
    #[error("Pair is already linked into a list")]
    AlreadyLinked,

    /// The anchor or pair is not a member of the given list
    #[error("Pair is not a member of the list")]
    NotFound,

    /// Linking would place a pair inside its own child list
    #[error("Pair cannot be linked beneath itself")]
    Cycle,

    /// The pair must be unlinked before its scope can change
    #[error("Pair is still linked into a list")]
    StillLinked,

    /// Operation attempted across incompatible value types
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Mutation attempted through a cursor bound read-only
    #[error("Cursor is read-only")]
    ReadOnlyViolation,

    /// Handle refers to a freed or foreign pair, list or scope
    #[error("Invalid {0} handle")]
    InvalidHandle(&'static str),

    /// Parsed value does not fit the target type
    #[error("Value out of range for {ty}: {input}")]
    Overflow { ty: &'static str, input: String },

    /// Text could not be parsed as the target type
    #[error("Invalid {ty} value: {input}")]
    InvalidFormat { ty: &'static str, input: String },

    /// Attribute name or number is not in the dictionary
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Attribute name or number is already defined under the same parent
    #[error("Duplicate attribute: {0}")]
    DuplicateAttribute(String),

    /// Legacy record field exceeds its fixed size
    #[error("{field} too long: {len} bytes (max {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Legacy textual pair could not be tokenized
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Regular expression operand failed to compile
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),
}

/// Result type for pair operations
pub type PairResult<T> = Result<T, PairError>;

impl PairError {
    pub(crate) fn mismatch(expected: &'static str, actual: &'static str) -> Self {
        PairError::TypeMismatch { expected, actual }
    }
}

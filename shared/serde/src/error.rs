use thiserror::Error;

/// Errors produced while reading a structure back from bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The buffer ended before the structure was complete
    #[error("Unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A variable-length integer used more continuation bytes than a u64 allows
    #[error("Variable-length integer overflows 64 bits")]
    VariableIntegerOverflow,

    /// A length-prefixed string was not valid UTF-8
    #[error("String field is not valid UTF-8")]
    InvalidUtf8,

    /// An enum discriminant did not match any known variant
    #[error("Invalid {kind} tag {tag}")]
    InvalidTag { kind: &'static str, tag: u64 },

    /// A length prefix exceeds the bytes left in the buffer
    #[error("Length prefix {length} exceeds remaining {remaining} bytes")]
    LengthOutOfBounds { length: u64, remaining: usize },
}

//! Error types for the protocol layer.

/// Errors produced while decoding a single protocol line.
///
/// Every variant is local to one line: the caller logs it, drops the line,
/// and carries on with the next one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The line was empty after trimming.
    #[error("empty line")]
    Empty,

    /// The first field is not a known command tag.
    #[error("unknown command tag {0:?}")]
    UnknownTag(String),

    /// The tag is known but the line has the wrong number of fields.
    #[error("command {tag} expects {expected} field(s), got {found}")]
    FieldCount {
        tag: char,
        expected: usize,
        found: usize,
    },

    /// A field did not parse as the expected type.
    #[error("command {tag}: field {field} is not valid: {value:?}")]
    InvalidField {
        tag: char,
        field: &'static str,
        value: String,
    },

    /// A player index outside `0..2`.
    #[error("command {tag}: player index {index} out of range")]
    PlayerOutOfRange { tag: char, index: i64 },
}

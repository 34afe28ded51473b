//! Error types for the XML writer library.

use thiserror::Error;

/// Errors that can occur while writing XML.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the underlying sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An end call arrived with no matching open element
    #[error("no open element to close")]
    NoOpenElement,

    /// An operation was called while the writer was in an incompatible state
    #[error("{operation} not allowed while writing {state}")]
    InvalidState {
        /// The operation that was rejected
        operation: &'static str,
        /// A short description of the writer's current state
        state: &'static str,
    },

    /// An element, attribute, or target name was empty
    #[error("empty name is not allowed")]
    EmptyName,

    /// The requested attribute quote character is not usable
    #[error("invalid quote character {0:?}: must be ASCII '\"' or '\\''")]
    InvalidQuoteChar(char),

    /// A processing-instruction target collided with the reserved `xml` name
    #[error("PI target {0:?} is reserved for the XML declaration")]
    ReservedPiTarget(String),

    /// A namespace prefix was bound to a different URI on the same element
    #[error("prefix {0:?} is already bound to a different namespace on this element")]
    PrefixRebound(String),

    /// A public identifier was given without the required system identifier
    #[error("a system identifier is required when a public identifier is given")]
    MissingSystemId,

    /// An NDATA notation reference was given for a parameter entity
    #[error("a notation reference is not allowed on a parameter entity")]
    NotationOnParameterEntity,
}

impl Error {
    /// Returns true for caller-sequencing mistakes (mismatched start/end
    /// calls), as opposed to I/O failures or bad arguments.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::NoOpenElement | Error::InvalidState { .. })
    }
}

/// Result type alias for writer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(Error::NoOpenElement.is_structural());
        assert!(Error::InvalidState {
            operation: "start_comment",
            state: "a CDATA section"
        }
        .is_structural());
        assert!(!Error::EmptyName.is_structural());
        assert!(!Error::Io(std::io::Error::other("boom")).is_structural());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::InvalidState {
            operation: "end_comment",
            state: "element content",
        };
        assert_eq!(
            err.to_string(),
            "end_comment not allowed while writing element content"
        );
        assert_eq!(
            Error::PrefixRebound("dc".to_string()).to_string(),
            "prefix \"dc\" is already bound to a different namespace on this element"
        );
    }
}

//! Error types for the parsing core.
//!
//! Every failure is reported as a distinct, non-recoverable [`Error`]. Callers can
//! group them with [`Error::category`] into I/O, lexical, syntactic and
//! resolution failures.

use crate::object::ObjectRef;

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Failure of the underlying byte source
    Io,
    /// Malformed token (string termination, stray delimiter, bad number text)
    Lexical,
    /// Wrong token kind or value at a grammar position
    Syntax,
    /// Dereferencing or typing failure after parsing
    Resolution,
}

/// Error types that can occur while lexing, parsing or resolving a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// End of input inside a construct that must be closed
    #[error("Unexpected end of input at byte {offset} while reading {context}")]
    UnexpectedEof {
        /// Byte offset where input ran out
        offset: usize,
        /// What was being read
        context: &'static str,
    },

    /// A delimiter byte that cannot start a token
    #[error("Unexpected byte 0x{byte:02X} at byte {offset}")]
    UnexpectedByte {
        /// Byte offset of the offending byte
        offset: usize,
        /// The offending byte
        byte: u8,
    },

    /// Number token text that is neither an integer nor a real
    #[error("Invalid number '{text}' at byte {offset}")]
    InvalidNumber {
        /// Byte offset of the token
        offset: usize,
        /// Accumulated token text
        text: String,
    },

    /// Non-hex digit inside a hex string
    #[error("Invalid hex digit at index {offset} of hex string")]
    InvalidHexString {
        /// Index within the hex string text
        offset: usize,
    },

    /// Name or keyword bytes that are not valid UTF-8
    #[error("Invalid UTF-8 in {context} at byte {offset}")]
    InvalidUtf8 {
        /// Byte offset of the token
        offset: usize,
        /// `"name"` or `"keyword"`
        context: &'static str,
        /// Raw token bytes
        bytes: Vec<u8>,
    },

    /// Token of the wrong kind or value at a grammar position
    #[error("Expected {expected} at byte {offset}, found {found}")]
    UnexpectedToken {
        /// Byte offset of the token
        offset: usize,
        /// What the grammar required
        expected: &'static str,
        /// Description of the token found
        found: String,
    },

    /// End of input before `]`
    #[error("Unterminated array starting at byte {offset}")]
    UnterminatedArray {
        /// Byte offset of the `[`
        offset: usize,
    },

    /// End of input before `>>`
    #[error("Unterminated dictionary starting at byte {offset}")]
    UnterminatedDictionary {
        /// Byte offset of the `<<`
        offset: usize,
    },

    /// Dictionary key that is not a name
    #[error("Dictionary key must be name at byte {offset}, found {found}")]
    InvalidDictionaryKey {
        /// Byte offset of the token
        offset: usize,
        /// Description of the token found
        found: String,
    },

    /// Keyword that is not a value (`obj`, `R`, `stream`, ...)
    #[error("Unexpected keyword '{keyword}' at byte {offset}")]
    UnexpectedKeyword {
        /// Byte offset of the keyword
        offset: usize,
        /// Keyword text
        keyword: String,
    },

    /// `stream` not followed by LF or CRLF
    #[error("Stream keyword must be followed by LF or CRLF at byte {offset}")]
    InvalidStreamEol {
        /// Byte offset after the keyword
        offset: usize,
    },

    /// `stream` keyword after a value that is not a dictionary
    #[error("Expected dictionary before stream")]
    StreamWithoutDictionary,

    /// Stream `/Length` missing, malformed or not resolvable yet
    #[error("Invalid stream length: {0}")]
    InvalidStreamLength(String),

    /// Malformed cross-reference section
    #[error("Invalid cross-reference table: {0}")]
    InvalidXref(String),

    /// Trailer value is not a dictionary
    #[error("Trailer is not a dictionary, found {found}")]
    InvalidTrailer {
        /// Type name of the parsed value
        found: &'static str,
    },

    /// Failure inside an indirect object body
    #[error("Failed to parse object {id} {gen}: {source}")]
    Object {
        /// Object number
        id: u32,
        /// Generation number
        gen: u16,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Referenced object not present in the object table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Document was parsed without an xref/trailer footer
    #[error("Document has no trailer")]
    MissingTrailer,

    /// Trailer lacks `/Root`
    #[error("Missing /Root in trailer")]
    MissingRoot,

    /// `/Root` is not an indirect reference
    #[error("/Root is not an indirect reference, found {found}")]
    InvalidRoot {
        /// Type name of the `/Root` value
        found: &'static str,
    },

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Page tree node with a missing or unknown `/Type`
    #[error("Invalid page tree node {node}: /Type is {found}")]
    InvalidPageTreeNode {
        /// The offending node
        node: ObjectRef,
        /// Description of the `/Type` entry
        found: String,
    },

    /// Circular reference detected in object graph
    #[error("Circular reference detected: object {0}")]
    CircularReference(ObjectRef),

    /// Recursion depth limit exceeded
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),
}

impl Error {
    /// Classify this error. Errors wrapped in [`Error::Object`] report the
    /// category of the wrapped failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) => ErrorCategory::Io,
            Error::UnexpectedEof { .. }
            | Error::UnexpectedByte { .. }
            | Error::InvalidNumber { .. }
            | Error::InvalidHexString { .. }
            | Error::InvalidUtf8 { .. } => ErrorCategory::Lexical,
            Error::UnexpectedToken { .. }
            | Error::UnterminatedArray { .. }
            | Error::UnterminatedDictionary { .. }
            | Error::InvalidDictionaryKey { .. }
            | Error::UnexpectedKeyword { .. }
            | Error::InvalidStreamEol { .. }
            | Error::StreamWithoutDictionary
            | Error::InvalidXref(_)
            | Error::InvalidTrailer { .. }
            | Error::RecursionLimitExceeded(_) => ErrorCategory::Syntax,
            Error::InvalidStreamLength(_)
            | Error::ObjectNotFound(..)
            | Error::MissingTrailer
            | Error::MissingRoot
            | Error::InvalidRoot { .. }
            | Error::InvalidObjectType { .. }
            | Error::InvalidPageTreeNode { .. }
            | Error::CircularReference(_) => ErrorCategory::Resolution,
            Error::Object { source, .. } => source.category(),
        }
    }

    /// Attach the number/generation of the object being parsed.
    pub(crate) fn in_object(self, id: u32, gen: u16) -> Self {
        Error::Object {
            id,
            gen,
            source: Box::new(self),
        }
    }
}

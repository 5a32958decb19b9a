//! Token model shared by the lexer and the parsers.
//!
//! Tokens are produced by [`Lexer`](crate::lexer::Lexer) and consumed within a
//! single parse step. Keyword tokens carry their raw text; the parsers compare it
//! against the constants in [`keywords`].

use std::fmt;

/// Token types recognized by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// End of input reached at a token boundary
    Eof,

    /// Number text (digits, sign and decimal point); not validated by the lexer
    Number(String),

    /// Name without the leading `/` (e.g., "Type" from "/Type")
    Name(String),

    /// Literal string bytes between the outer parentheses.
    /// Escape sequences are NOT processed.
    LiteralString(Vec<u8>),

    /// Hexadecimal string text with whitespace removed
    HexString(Vec<u8>),

    /// Array start delimiter [
    ArrayStart,

    /// Array end delimiter ]
    ArrayEnd,

    /// Dictionary start delimiter <<
    DictStart,

    /// Dictionary end delimiter >>
    DictEnd,

    /// Bare keyword (true, false, null, obj, endobj, stream, R, ...)
    Keyword(String),
}

impl Token {
    /// Short name of the token kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Eof => "EOF",
            Token::Number(_) => "Number",
            Token::Name(_) => "Name",
            Token::LiteralString(_) => "String",
            Token::HexString(_) => "HexString",
            Token::ArrayStart => "ArrayStart",
            Token::ArrayEnd => "ArrayEnd",
            Token::DictStart => "DictStart",
            Token::DictEnd => "DictEnd",
            Token::Keyword(_) => "Keyword",
        }
    }

    /// Check whether this token is the given keyword.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Keyword(k) if k == keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(text) | Token::Name(text) | Token::Keyword(text) => {
                write!(f, "{}({})", self.kind_name(), text)
            },
            Token::LiteralString(bytes) | Token::HexString(bytes) => {
                write!(f, "{}({:?})", self.kind_name(), String::from_utf8_lossy(bytes))
            },
            _ => f.write_str(self.kind_name()),
        }
    }
}

/// Keyword and marker strings with structural meaning.
pub mod keywords {
    /// Boolean true
    pub const TRUE: &str = "true";
    /// Boolean false
    pub const FALSE: &str = "false";
    /// Null object
    pub const NULL: &str = "null";
    /// Indirect object start
    pub const OBJ: &str = "obj";
    /// Indirect object end
    pub const ENDOBJ: &str = "endobj";
    /// Stream body start
    pub const STREAM: &str = "stream";
    /// Stream body end
    pub const ENDSTREAM: &str = "endstream";
    /// Reference marker in `N G R`
    pub const R: &str = "R";
    /// Cross-reference section start
    pub const XREF: &str = "xref";
    /// Trailer dictionary start
    pub const TRAILER: &str = "trailer";
    /// Footer pointer to the xref section (not interpreted)
    pub const STARTXREF: &str = "startxref";
    /// Xref entry in use
    pub const IN_USE: &str = "n";
    /// Xref entry free
    pub const FREE: &str = "f";
}

/// `/Type` values of page tree nodes.
pub mod markers {
    /// Intermediate page tree node
    pub const PAGES: &str = "Pages";
    /// Leaf page node
    pub const PAGE: &str = "Page";
}

/// Whitespace bytes: NUL, TAB, LF, FF, CR, SPACE.
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Delimiter bytes: `( ) < > [ ] { } /`.
#[inline]
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/')
}

/// Bytes that may start or continue a number token.
#[inline]
pub fn is_number_char(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.')
}

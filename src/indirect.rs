//! Indirect object parsing: the `N G obj ... endobj` envelope and stream bodies.
//!
//! ```text
//! 4 0 obj
//! << /Length 44 >>
//! stream
//! ...44 raw bytes...
//! endstream
//! endobj
//! ```
//!
//! The stream payload is read verbatim; `/Filter` is never applied here.

use crate::error::{Error, Result};
use crate::object::{Dictionary, IndirectObject, Stream, Value};
use crate::object_table::ObjectTable;
use crate::parser::Parser;
use crate::token::{keywords, Token};
use std::io::Read;

impl<R: Read> Parser<R> {
    /// Parse the next indirect object.
    ///
    /// Returns `Ok(None)` when the input ends where a new object could start.
    /// A stream's `/Length` given as a reference is looked up in `objects`, so
    /// only objects parsed earlier can supply it.
    ///
    /// # Example
    ///
    /// ```
    /// use pdf_skeleton::lexer::Lexer;
    /// use pdf_skeleton::object_table::ObjectTable;
    /// use pdf_skeleton::parser::Parser;
    ///
    /// let mut parser = Parser::new(Lexer::new(&b"1 0 obj << /Type /Catalog >> endobj"[..]));
    /// let table = ObjectTable::new();
    /// let obj = parser.parse_indirect_object(&table)?.unwrap();
    /// assert_eq!((obj.id, obj.gen), (1, 0));
    /// assert!(parser.parse_indirect_object(&table)?.is_none());
    /// # Ok::<(), pdf_skeleton::error::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Failures after the `N G` header are wrapped in [`Error::Object`] with the
    /// object's number and generation.
    pub fn parse_indirect_object(&mut self, objects: &ObjectTable) -> Result<Option<IndirectObject>> {
        let (tok, offset) = self.next()?;
        if tok == Token::Eof {
            return Ok(None);
        }
        self.parse_indirect_object_from(tok, offset, objects).map(Some)
    }

    /// Parse an indirect object whose object-number token has already been read.
    pub(crate) fn parse_indirect_object_from(
        &mut self,
        tok: Token,
        offset: usize,
        objects: &ObjectTable,
    ) -> Result<IndirectObject> {
        let id: u32 = self.integer_from(tok, offset, "object number")?;
        let gen: u16 = self.expect_integer("generation number")?;

        let value = self
            .parse_object_body(objects)
            .map_err(|e| e.in_object(id, gen))?;

        log::trace!("Parsed object {} {} ({})", id, gen, value.type_name());
        Ok(IndirectObject::new(id, gen, value))
    }

    /// `obj`, one value, then `endobj` or a stream body.
    fn parse_object_body(&mut self, objects: &ObjectTable) -> Result<Value> {
        self.expect_keyword(keywords::OBJ, "'obj'")?;
        let value = self.parse_value()?;

        let (tok, offset) = self.next()?;
        match tok {
            Token::Keyword(k) if k == keywords::ENDOBJ => Ok(value),
            Token::Keyword(k) if k == keywords::STREAM => {
                let dict = match value {
                    Value::Dictionary(dict) => dict,
                    _ => return Err(Error::StreamWithoutDictionary),
                };
                self.parse_stream_body(dict, objects)
            },
            other => Err(Error::UnexpectedToken {
                offset,
                expected: "'endobj' or 'stream'",
                found: other.to_string(),
            }),
        }
    }

    /// Everything after the `stream` keyword up to and including `endobj`.
    fn parse_stream_body(&mut self, dict: Dictionary, objects: &ObjectTable) -> Result<Value> {
        let length = stream_length(&dict, objects)?;

        // A dictionary value never leaves tokens behind, so the lexer is
        // positioned right after the `stream` keyword.
        debug_assert!(!self.has_pending_tokens());

        let lexer = self.lexer_mut();
        lexer.read_stream_eol()?;
        let data = lexer.read_raw(length)?;

        self.expect_keyword(keywords::ENDSTREAM, "'endstream'")?;
        self.expect_keyword(keywords::ENDOBJ, "'endobj'")?;

        Ok(Value::Stream(Stream {
            dict,
            data: bytes::Bytes::from(data),
        }))
    }
}

/// Resolve `/Length` against the objects parsed so far.
fn stream_length(dict: &Dictionary, objects: &ObjectTable) -> Result<usize> {
    let length = match dict.get("Length") {
        None => return Err(Error::InvalidStreamLength("missing /Length".to_string())),
        Some(Value::Reference(r)) => match objects.get_ref(*r) {
            Some(obj) => &obj.value,
            None => {
                return Err(Error::InvalidStreamLength(format!(
                    "/Length refers to {} which has not been parsed",
                    r
                )))
            },
        },
        Some(direct) => direct,
    };

    length
        .as_integer()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            Error::InvalidStreamLength(format!(
                "/Length must be a non-negative integer, found {:?}",
                length
            ))
        })
}

//! Cross-reference table and trailer parser.
//!
//! The xref table maps object numbers to byte offsets in the file. Only the
//! classic single-section table is understood:
//!
//! ```text
//! xref
//! 0 3
//! 0000000000 65535 f
//! 0000000017 00000 n
//! 0000000081 00000 n
//! trailer
//! << /Size 3 /Root 1 0 R >>
//! ```
//!
//! Entries are read token by token, so line layout does not matter.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Value};
use crate::parser::Parser;
use crate::token::{keywords, Token};
use std::collections::HashMap;
use std::io::Read;

/// Cross-reference table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XRefEntry {
    /// Byte offset of the object (next free object number for free entries)
    pub offset: u64,
    /// Generation number
    pub generation: u16,
    /// `n` entries are in use, `f` entries are free
    pub in_use: bool,
}

impl XRefEntry {
    /// Create a new cross-reference entry.
    pub fn new(offset: u64, generation: u16, in_use: bool) -> Self {
        Self {
            offset,
            generation,
            in_use,
        }
    }

    /// Create a new in-use entry.
    pub fn in_use(offset: u64, generation: u16) -> Self {
        Self::new(offset, generation, true)
    }

    /// Create a new free entry.
    pub fn free(next_free: u64, generation: u16) -> Self {
        Self::new(next_free, generation, false)
    }
}

/// Cross-reference table that maps object numbers to their locations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossRefTable {
    entries: HashMap<u32, XRefEntry>,
}

impl CrossRefTable {
    /// Create a new empty cross-reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the cross-reference table.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Get an entry by object number.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Check if an object exists in the xref table.
    pub fn contains(&self, object_number: u32) -> bool {
        self.entries.contains_key(&object_number)
    }

    /// Iterate over `(object number, entry)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> + '_ {
        self.entries.iter().map(|(n, e)| (*n, e))
    }

    /// Get the number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: Read> Parser<R> {
    /// Parse an `xref` section up to (not including) the `trailer` keyword.
    ///
    /// Each subsection header `start count` is followed by `count` entries of
    /// the form `offset generation n|f`; the i-th entry describes object
    /// `start + i`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidXref`] if a header or entry field is not an
    /// integer of the right range, if an entry flag is not `n` or `f`, if a
    /// subsection exceeds `max_xref_subsection_count`, or if the input ends
    /// before `trailer`.
    pub fn parse_xref_table(&mut self) -> Result<CrossRefTable> {
        self.expect_keyword(keywords::XREF, "'xref'")?;
        let mut table = CrossRefTable::new();

        loop {
            let (tok, offset) = self.next()?;
            match tok {
                Token::Keyword(k) if k == keywords::TRAILER => {
                    self.unread(Token::Keyword(k), offset);
                    break;
                },
                Token::Eof => {
                    return Err(Error::InvalidXref(format!(
                        "end of input at byte {} before 'trailer'",
                        offset
                    )))
                },
                tok => self.parse_xref_subsection(tok, offset, &mut table)?,
            }
        }

        log::debug!("Parsed xref table with {} entries", table.len());
        Ok(table)
    }

    /// One subsection; `tok` is the already-read start object number.
    fn parse_xref_subsection(
        &mut self,
        tok: Token,
        offset: usize,
        table: &mut CrossRefTable,
    ) -> Result<()> {
        let start: u32 = self.xref_field_from(tok, offset, "subsection start")?;
        let count: u32 = self.xref_field("subsection count")?;

        let max = self.options().max_xref_subsection_count;
        if count > max {
            return Err(Error::InvalidXref(format!(
                "subsection count {} exceeds limit {}",
                count, max
            )));
        }
        if count == 0 {
            log::warn!("Empty xref subsection starting at object {}", start);
        }

        for i in 0..count {
            let object_number = start.checked_add(i).ok_or_else(|| {
                Error::InvalidXref(format!("object number {} + {} overflows", start, i))
            })?;

            let entry_offset: u64 = self.xref_field("entry offset")?;
            let generation: u16 = self.xref_field("entry generation")?;
            let in_use = self.xref_flag()?;

            table.add_entry(object_number, XRefEntry::new(entry_offset, generation, in_use));
        }

        Ok(())
    }

    fn xref_field<T: TryFrom<i64>>(&mut self, field: &'static str) -> Result<T> {
        let (tok, offset) = self.next()?;
        self.xref_field_from(tok, offset, field)
    }

    fn xref_field_from<T: TryFrom<i64>>(
        &self,
        tok: Token,
        offset: usize,
        field: &'static str,
    ) -> Result<T> {
        self.integer_from(tok, offset, field)
            .map_err(|e| Error::InvalidXref(e.to_string()))
    }

    /// `n` (in use) or `f` (free).
    fn xref_flag(&mut self) -> Result<bool> {
        let (tok, offset) = self.next()?;
        match tok {
            Token::Keyword(k) if k == keywords::IN_USE => Ok(true),
            Token::Keyword(k) if k == keywords::FREE => Ok(false),
            other => Err(Error::InvalidXref(format!(
                "expected entry flag 'n' or 'f' at byte {}, found {}",
                offset, other
            ))),
        }
    }

    /// Parse `trailer` followed by its dictionary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTrailer`] if the value after `trailer` is not a
    /// dictionary.
    pub fn parse_trailer(&mut self) -> Result<Dictionary> {
        self.expect_keyword(keywords::TRAILER, "'trailer'")?;

        match self.parse_value()? {
            Value::Dictionary(dict) => Ok(dict),
            other => Err(Error::InvalidTrailer {
                found: other.type_name(),
            }),
        }
    }
}

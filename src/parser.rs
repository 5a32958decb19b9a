//! PDF value parser.
//!
//! This module combines tokens from the [`Lexer`] into typed [`Value`]s
//! (arrays, dictionaries, indirect references, ...).
//!
//! # Architecture
//!
//! The parser uses a recursive descent approach:
//! 1. Read a token (from the pushback stack first, then the lexer)
//! 2. Based on the token kind, decide how to parse
//! 3. For composite types (arrays, dicts), recursively parse contents
//!
//! # Lookahead
//!
//! `N G R` is the only construct needing more than one token of lookahead: after
//! an integer the parser reads up to two more tokens and pushes them back (in
//! reverse order) unless they complete a reference. The pushback stack therefore
//! never holds more than two tokens; the lexer below keeps its own single byte
//! of pushback.

use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::object::{Dictionary, ObjectRef, Value};
use crate::parser_config::ParserOptions;
use crate::token::{keywords, Token};
use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
    sequence::{pair, tuple},
    IResult,
};
use std::io::Read;

/// Maximum number of tokens ever pushed back at once.
const MAX_PUSHBACK: usize = 2;

/// Classified number token text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NumberText {
    /// Fits `i64` and has no decimal point
    Integer(i64),
    /// Anything else that is numeric
    Real(f64),
}

/// Optional sign followed by digits: `42`, `-123`, `+17`.
fn integer_text(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(one_of("+-")), digit1))(input)
}

/// Optional sign and a decimal point with at least one digit: `3.14`, `.5`, `5.`.
fn real_text(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(tuple((digit1, char('.'), digit0))),
            recognize(pair(char('.'), digit1)),
        )),
    ))(input)
}

/// Convert number token text. Integers that overflow `i64` fall back to reals.
pub(crate) fn classify_number(text: &str) -> Option<NumberText> {
    if all_consuming(integer_text)(text).is_ok() {
        return match text.parse::<i64>() {
            Ok(i) => Some(NumberText::Integer(i)),
            Err(_) => text.parse::<f64>().ok().map(NumberText::Real),
        };
    }

    if all_consuming(real_text)(text).is_ok() {
        return text.parse::<f64>().ok().map(NumberText::Real);
    }

    None
}

/// Recursive-descent parser over a [`Lexer`].
///
/// # Example
///
/// ```
/// use pdf_skeleton::lexer::Lexer;
/// use pdf_skeleton::object::{ObjectRef, Value};
/// use pdf_skeleton::parser::Parser;
///
/// let mut parser = Parser::new(Lexer::new(&b"[ 1 2 /Name ] 10 20 R"[..]));
/// assert_eq!(parser.parse_value()?.as_array().map(|a| a.len()), Some(3));
/// assert_eq!(parser.parse_value()?, Value::Reference(ObjectRef::new(10, 20)));
/// # Ok::<(), pdf_skeleton::error::Error>(())
/// ```
pub struct Parser<R> {
    lexer: Lexer<R>,
    /// Token pushback, popped LIFO; each entry keeps its start offset
    pushback: Vec<(Token, usize)>,
    options: ParserOptions,
    depth: usize,
}

impl<R> std::fmt::Debug for Parser<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("lexer", &self.lexer)
            .field("pushback", &self.pushback)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: Read> Parser<R> {
    /// Create a parser with default options.
    pub fn new(lexer: Lexer<R>) -> Self {
        Self::with_options(lexer, ParserOptions::default())
    }

    /// Create a parser with custom options.
    pub fn with_options(lexer: Lexer<R>, options: ParserOptions) -> Self {
        Self {
            lexer,
            pushback: Vec::with_capacity(MAX_PUSHBACK),
            options,
            depth: 0,
        }
    }

    /// Options in effect.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Next token and its start offset.
    pub(crate) fn next(&mut self) -> Result<(Token, usize)> {
        if let Some(entry) = self.pushback.pop() {
            return Ok(entry);
        }
        let tok = self.lexer.next_token()?;
        Ok((tok, self.lexer.token_offset()))
    }

    /// Push a token back; it is returned by the next call to `next`.
    pub(crate) fn unread(&mut self, tok: Token, offset: usize) {
        debug_assert!(self.pushback.len() < MAX_PUSHBACK, "token pushback overflow");
        log::trace!("Pushing back {} at byte {}", tok, offset);
        self.pushback.push((tok, offset));
    }

    /// Whether tokens are pending in the pushback stack.
    pub(crate) fn has_pending_tokens(&self) -> bool {
        !self.pushback.is_empty()
    }

    pub(crate) fn lexer_mut(&mut self) -> &mut Lexer<R> {
        &mut self.lexer
    }

    /// Consume the keyword `keyword` or fail with `expected` in the message.
    pub(crate) fn expect_keyword(&mut self, keyword: &str, expected: &'static str) -> Result<()> {
        let (tok, offset) = self.next()?;
        if tok.is_keyword(keyword) {
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                offset,
                expected,
                found: tok.to_string(),
            })
        }
    }

    /// Consume an integer token that fits `T`.
    pub(crate) fn expect_integer<T: TryFrom<i64>>(&mut self, expected: &'static str) -> Result<T> {
        let (tok, offset) = self.next()?;
        self.integer_from(tok, offset, expected)
    }

    /// Convert an already-read token into an integer that fits `T`.
    pub(crate) fn integer_from<T: TryFrom<i64>>(
        &self,
        tok: Token,
        offset: usize,
        expected: &'static str,
    ) -> Result<T> {
        let text = match tok {
            Token::Number(text) => text,
            other => {
                return Err(Error::UnexpectedToken {
                    offset,
                    expected,
                    found: other.to_string(),
                })
            },
        };

        match classify_number(&text) {
            Some(NumberText::Integer(i)) => T::try_from(i).map_err(|_| Error::UnexpectedToken {
                offset,
                expected,
                found: format!("out-of-range Number({})", text),
            }),
            Some(NumberText::Real(_)) => Err(Error::UnexpectedToken {
                offset,
                expected,
                found: format!("Number({})", text),
            }),
            None => Err(Error::InvalidNumber { offset, text }),
        }
    }

    /// Parse one value.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedEof`] if the input ends before a value starts
    /// - [`Error::UnterminatedArray`] / [`Error::UnterminatedDictionary`]
    /// - [`Error::InvalidDictionaryKey`] when a dictionary key is not a name
    /// - [`Error::UnexpectedKeyword`] for keywords other than true/false/null
    /// - [`Error::InvalidNumber`] for malformed number text
    pub fn parse_value(&mut self) -> Result<Value> {
        let (tok, offset) = self.next()?;
        self.parse_value_from(tok, offset)
    }

    /// Parse a value whose first token has already been read.
    pub(crate) fn parse_value_from(&mut self, tok: Token, offset: usize) -> Result<Value> {
        match tok {
            Token::Number(text) => self.parse_number_or_reference(text, offset),
            Token::Name(name) => Ok(Value::Name(name)),
            Token::LiteralString(bytes) => Ok(Value::LiteralString(bytes)),
            Token::HexString(bytes) => Ok(Value::HexString(bytes)),
            Token::Keyword(keyword) => match keyword.as_str() {
                keywords::TRUE => Ok(Value::Boolean(true)),
                keywords::FALSE => Ok(Value::Boolean(false)),
                keywords::NULL => Ok(Value::Null),
                _ => Err(Error::UnexpectedKeyword { offset, keyword }),
            },
            Token::ArrayStart => self.nested(offset, Self::parse_array),
            Token::DictStart => self.nested(offset, Self::parse_dictionary),
            Token::Eof => Err(Error::UnexpectedEof {
                offset,
                context: "value",
            }),
            other @ (Token::ArrayEnd | Token::DictEnd) => Err(Error::UnexpectedToken {
                offset,
                expected: "value",
                found: other.to_string(),
            }),
        }
    }

    /// Number, or the first token of an `N G R` reference.
    fn parse_number_or_reference(&mut self, text: String, offset: usize) -> Result<Value> {
        let first = match classify_number(&text) {
            Some(NumberText::Integer(i)) => i,
            Some(NumberText::Real(r)) => return Ok(Value::Number(r)),
            None => return Err(Error::InvalidNumber { offset, text }),
        };
        let number = Value::Number(first as f64);

        // Only a non-negative integer fitting u32 can start a reference
        let id = match u32::try_from(first) {
            Ok(id) => id,
            Err(_) => return Ok(number),
        };

        let (second, second_offset) = self.next()?;
        let gen = match &second {
            Token::Number(t) => match classify_number(t) {
                Some(NumberText::Integer(g)) => u16::try_from(g).ok(),
                _ => None,
            },
            _ => None,
        };
        let gen = match gen {
            Some(gen) => gen,
            None => {
                self.unread(second, second_offset);
                return Ok(number);
            },
        };

        let (third, third_offset) = self.next()?;
        if third.is_keyword(keywords::R) {
            return Ok(Value::Reference(ObjectRef::new(id, gen)));
        }

        self.unread(third, third_offset);
        self.unread(second, second_offset);
        Ok(number)
    }

    /// Run a composite parser one nesting level deeper.
    fn nested(
        &mut self,
        offset: usize,
        parse: fn(&mut Self, usize) -> Result<Value>,
    ) -> Result<Value> {
        if self.depth >= self.options.max_nesting {
            return Err(Error::RecursionLimitExceeded(self.options.max_nesting as u32));
        }
        self.depth += 1;
        let result = parse(self, offset);
        self.depth -= 1;
        result
    }

    /// Parse array contents after `[`.
    fn parse_array(&mut self, start: usize) -> Result<Value> {
        let mut items = Vec::new();

        loop {
            let (tok, offset) = self.next()?;
            match tok {
                Token::ArrayEnd => return Ok(Value::Array(items)),
                Token::Eof => return Err(Error::UnterminatedArray { offset: start }),
                tok => items.push(self.parse_value_from(tok, offset)?),
            }
        }
    }

    /// Parse dictionary contents after `<<`. Duplicate keys: last one wins.
    fn parse_dictionary(&mut self, start: usize) -> Result<Value> {
        let mut dict = Dictionary::new();

        loop {
            let (tok, offset) = self.next()?;
            let key = match tok {
                Token::DictEnd => return Ok(Value::Dictionary(dict)),
                Token::Eof => return Err(Error::UnterminatedDictionary { offset: start }),
                Token::Name(key) => key,
                other => {
                    return Err(Error::InvalidDictionaryKey {
                        offset,
                        found: other.to_string(),
                    })
                },
            };

            let (tok, offset) = self.next()?;
            if tok == Token::Eof {
                return Err(Error::UnterminatedDictionary { offset: start });
            }
            let value = self.parse_value_from(tok, offset)?;
            dict.insert(key, value);
        }
    }
}

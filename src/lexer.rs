//! PDF lexer (tokenizer).
//!
//! This module turns a sequential byte source into [`Token`]s. It recognizes
//! numbers, names, literal and hexadecimal strings, array/dictionary delimiters
//! and bare keywords.
//!
//! # Lexical Overview
//!
//! - Whitespace (NUL, TAB, LF, FF, CR, SPACE) and comments (`%` to end of line)
//!   are skipped before every token.
//! - `[` / `]` are array delimiters; `<<` / `>>` are dictionary delimiters.
//! - `<...>` is a hex string (whitespace dropped), `(...)` a literal string with
//!   balanced parentheses (escapes are kept verbatim).
//! - `/Name` is a name; a digit, `+`, `-` or `.` starts a number; any other
//!   regular byte starts a keyword (`true`, `obj`, `R`, ...).
//!
//! The lexer reads one byte at a time and keeps a single byte of pushback,
//! which is all the grammar needs at this layer.

use crate::error::{Error, Result};
use crate::token::{is_delimiter, is_number_char, is_whitespace, Token};
use std::io::{self, BufRead, BufReader, Read};

/// Stateful tokenizer over a byte source.
pub struct Lexer<R> {
    reader: BufReader<R>,
    /// One-byte pushback slot
    pushback: Option<u8>,
    /// Absolute offset of the next byte to be read
    offset: usize,
    /// Offset of the first byte of the last token returned
    token_start: usize,
}

impl<R> std::fmt::Debug for Lexer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("offset", &self.offset)
            .field("token_start", &self.token_start)
            .field("pushback", &self.pushback)
            .finish_non_exhaustive()
    }
}

impl<R: Read> Lexer<R> {
    /// Create a new lexer reading from `reader`.
    ///
    /// # Example
    ///
    /// ```
    /// use pdf_skeleton::lexer::Lexer;
    /// use pdf_skeleton::token::Token;
    ///
    /// let mut lexer = Lexer::new(&b"/Type /Page"[..]);
    /// assert_eq!(lexer.next_token()?, Token::Name("Type".to_string()));
    /// assert_eq!(lexer.next_token()?, Token::Name("Page".to_string()));
    /// assert_eq!(lexer.next_token()?, Token::Eof);
    /// # Ok::<(), pdf_skeleton::error::Error>(())
    /// ```
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            pushback: None,
            offset: 0,
            token_start: 0,
        }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute offset where the most recently returned token started.
    pub fn token_offset(&self) -> usize {
        self.token_start
    }

    /// Read the next byte, honoring the pushback slot.
    pub(crate) fn read_byte(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            self.offset += 1;
            return Ok(Some(b));
        }

        loop {
            match self.reader.fill_buf() {
                Ok(buf) => {
                    let next = buf.first().copied();
                    if next.is_some() {
                        self.reader.consume(1);
                        self.offset += 1;
                    }
                    return Ok(next);
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Push one byte back. Only one byte may be pending at a time.
    pub(crate) fn unread_byte(&mut self, b: u8) {
        debug_assert!(self.pushback.is_none(), "lexer pushback slot already occupied");
        self.pushback = Some(b);
        self.offset -= 1;
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        while let Some(b) = self.read_byte()? {
            if b == b'%' {
                // Comment runs to end of line or end of input
                while let Some(c) = self.read_byte()? {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
                continue;
            }

            if !is_whitespace(b) {
                self.unread_byte(b);
                break;
            }
        }
        Ok(())
    }

    /// Decode the next token.
    ///
    /// End of input at a token boundary yields [`Token::Eof`]; end of input in the
    /// middle of a string or hex string is an error.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedEof`] inside a literal or hex string
    /// - [`Error::UnexpectedByte`] for a lone `>` or a stray `)`, `{`, `}`
    /// - [`Error::InvalidUtf8`] for a name or keyword whose bytes are not UTF-8
    /// - [`Error::Io`] if the underlying reader fails
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;
        self.token_start = self.offset;

        let b = match self.read_byte()? {
            Some(b) => b,
            None => return Ok(Token::Eof),
        };

        match b {
            b'[' => Ok(Token::ArrayStart),
            b']' => Ok(Token::ArrayEnd),
            b'<' => match self.read_byte()? {
                Some(b'<') => Ok(Token::DictStart),
                Some(other) => {
                    self.unread_byte(other);
                    self.read_hex_string()
                },
                None => Err(Error::UnexpectedEof {
                    offset: self.offset,
                    context: "hex string",
                }),
            },
            b'>' => match self.read_byte()? {
                Some(b'>') => Ok(Token::DictEnd),
                other => {
                    if let Some(other) = other {
                        self.unread_byte(other);
                    }
                    Err(Error::UnexpectedByte {
                        offset: self.token_start,
                        byte: b'>',
                    })
                },
            },
            b'(' => self.read_literal_string(),
            b'/' => {
                let name = self.read_regular()?;
                Ok(Token::Name(self.regular_text(name, "name")?))
            },
            _ if is_number_char(b) => self.read_number(b),
            _ if is_delimiter(b) => Err(Error::UnexpectedByte {
                offset: self.token_start,
                byte: b,
            }),
            _ => {
                self.unread_byte(b);
                let keyword = self.read_regular()?;
                Ok(Token::Keyword(self.regular_text(keyword, "keyword")?))
            },
        }
    }

    /// Names and keywords are kept as text. Bytes that are not UTF-8 are
    /// rejected rather than replaced, so distinct names never collapse.
    fn regular_text(&self, bytes: Vec<u8>, context: &'static str) -> Result<String> {
        String::from_utf8(bytes).map_err(|e| Error::InvalidUtf8 {
            offset: self.token_start,
            context,
            bytes: e.into_bytes(),
        })
    }

    /// Accumulate number bytes. Validity is decided by the parser.
    fn read_number(&mut self, first: u8) -> Result<Token> {
        let mut text = String::new();
        text.push(char::from(first));

        while let Some(b) = self.read_byte()? {
            if !is_number_char(b) {
                self.unread_byte(b);
                break;
            }
            text.push(char::from(b));
        }

        Ok(Token::Number(text))
    }

    /// Accumulate bytes up to the next delimiter or whitespace (names and keywords).
    fn read_regular(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();

        while let Some(b) = self.read_byte()? {
            if is_delimiter(b) || is_whitespace(b) {
                self.unread_byte(b);
                break;
            }
            buf.push(b);
        }

        Ok(buf)
    }

    /// Read a literal string after its opening `(`.
    ///
    /// Nested parenthesis pairs are part of the content; the string ends when
    /// the depth returns to zero.
    fn read_literal_string(&mut self) -> Result<Token> {
        let mut buf = Vec::new();
        let mut depth = 1usize;

        loop {
            let b = self.read_byte()?.ok_or(Error::UnexpectedEof {
                offset: self.offset,
                context: "literal string",
            })?;

            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                },
                _ => {},
            }

            buf.push(b);
        }

        Ok(Token::LiteralString(buf))
    }

    /// Read a hex string after its opening `<`, dropping whitespace.
    fn read_hex_string(&mut self) -> Result<Token> {
        let mut buf = Vec::new();

        loop {
            let b = self.read_byte()?.ok_or(Error::UnexpectedEof {
                offset: self.offset,
                context: "hex string",
            })?;

            if b == b'>' {
                break;
            }
            if !is_whitespace(b) {
                buf.push(b);
            }
        }

        Ok(Token::HexString(buf))
    }

    /// Consume the end-of-line marker that follows the `stream` keyword.
    ///
    /// Exactly one LF or CRLF is accepted. A bare CR is rejected.
    pub(crate) fn read_stream_eol(&mut self) -> Result<()> {
        let offset = self.offset;
        match self.read_byte()? {
            Some(b'\n') => Ok(()),
            Some(b'\r') => match self.read_byte()? {
                Some(b'\n') => Ok(()),
                Some(other) => {
                    self.unread_byte(other);
                    Err(Error::InvalidStreamEol { offset })
                },
                None => Err(Error::InvalidStreamEol { offset }),
            },
            Some(other) => {
                self.unread_byte(other);
                Err(Error::InvalidStreamEol { offset })
            },
            None => Err(Error::UnexpectedEof {
                offset,
                context: "stream",
            }),
        }
    }

    /// Read exactly `len` raw bytes without interpretation.
    pub(crate) fn read_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(len.min(64 * 1024));

        if len > 0 {
            if let Some(b) = self.pushback.take() {
                self.offset += 1;
                data.push(b);
            }
        }

        let remaining = (len - data.len()) as u64;
        let read = (&mut self.reader).take(remaining).read_to_end(&mut data)?;
        self.offset += read;

        if data.len() < len {
            return Err(Error::UnexpectedEof {
                offset: self.offset,
                context: "stream data",
            });
        }

        Ok(data)
    }

    /// Iterate over the remaining tokens.
    ///
    /// The iterator ends at end of input (the [`Token::Eof`] marker itself is not
    /// yielded) or right after yielding the first error.
    pub fn tokens(&mut self) -> Tokens<'_, R> {
        Tokens {
            lexer: self,
            done: false,
        }
    }
}

/// Iterator returned by [`Lexer::tokens`].
#[derive(Debug)]
pub struct Tokens<'a, R> {
    lexer: &'a mut Lexer<R>,
    done: bool,
}

impl<R: Read> Iterator for Tokens<'_, R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.lexer.next_token() {
            Ok(Token::Eof) => {
                self.done = true;
                None
            },
            Ok(tok) => Some(Ok(tok)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(input: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let eof = tok == Token::Eof;
            out.push(tok);
            if eof {
                break;
            }
        }
        out
    }

    fn num(s: &str) -> Token {
        Token::Number(s.to_string())
    }

    fn kw(s: &str) -> Token {
        Token::Keyword(s.to_string())
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    #[test]
    fn test_lex_signed_integers() {
        assert_eq!(
            lex_all(b"1 123 -45 +67"),
            vec![num("1"), num("123"), num("-45"), num("+67"), Token::Eof]
        );
    }

    #[test]
    fn test_lex_reals() {
        assert_eq!(lex_all(b"3.14 .5 -.002 5."), vec![
            num("3.14"),
            num(".5"),
            num("-.002"),
            num("5."),
            Token::Eof
        ]);
    }

    #[test]
    fn test_lex_number_text_is_not_validated() {
        // Validation happens when the parser converts the text
        assert_eq!(lex_all(b"1-2..3"), vec![num("1-2..3"), Token::Eof]);
    }

    #[test]
    fn test_number_stops_at_delimiter() {
        assert_eq!(lex_all(b"12/Name"), vec![num("12"), Token::Name("Name".into()), Token::Eof]);
    }

    // ========================================================================
    // Strings
    // ========================================================================

    #[test]
    fn test_lex_literal_string() {
        assert_eq!(lex_all(b"(Hello World)"), vec![
            Token::LiteralString(b"Hello World".to_vec()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_lex_nested_literal_string() {
        assert_eq!(lex_all(b"(Str(ing))"), vec![
            Token::LiteralString(b"Str(ing)".to_vec()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_literal_string_keeps_raw_bytes() {
        assert_eq!(lex_all(b"(a\\nb\r\nc)"), vec![
            Token::LiteralString(b"a\\nb\r\nc".to_vec()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_empty_literal_string() {
        assert_eq!(lex_all(b"()"), vec![Token::LiteralString(Vec::new()), Token::Eof]);
    }

    #[test]
    fn test_unterminated_literal_string() {
        let mut lexer = Lexer::new(&b"(abc (def)"[..]);
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { context: "literal string", .. }));
    }

    #[test]
    fn test_lex_hex_string_drops_whitespace() {
        assert_eq!(lex_all(b"<48 65\n6C 6C 6F>"), vec![
            Token::HexString(b"48656C6C6F".to_vec()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_unterminated_hex_string() {
        let mut lexer = Lexer::new(&b"<4865"[..]);
        assert!(matches!(
            lexer.next_token(),
            Err(Error::UnexpectedEof { context: "hex string", .. })
        ));

        let mut lexer = Lexer::new(&b"<"[..]);
        assert!(matches!(lexer.next_token(), Err(Error::UnexpectedEof { .. })));
    }

    // ========================================================================
    // Names, keywords and delimiters
    // ========================================================================

    #[test]
    fn test_lex_names() {
        assert_eq!(lex_all(b"/Type/Page /A;B_c-d"), vec![
            Token::Name("Type".into()),
            Token::Name("Page".into()),
            Token::Name("A;B_c-d".into()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_lex_utf8_name_keeps_bytes() {
        let input = "/Caf\u{e9} /\u{4e2d}".as_bytes();
        assert_eq!(lex_all(input), vec![
            Token::Name("Caf\u{e9}".into()),
            Token::Name("\u{4e2d}".into()),
            Token::Eof
        ]);
    }

    #[test]
    fn test_non_utf8_name_is_error() {
        let mut lexer = Lexer::new(&b"/Ok /A\xE9 1"[..]);
        assert_eq!(lexer.next_token().unwrap(), Token::Name("Ok".into()));
        match lexer.next_token() {
            Err(Error::InvalidUtf8 { offset, context, bytes }) => {
                assert_eq!(offset, 4);
                assert_eq!(context, "name");
                assert_eq!(bytes, b"A\xE9".to_vec());
            },
            other => panic!("expected InvalidUtf8, got {:?}", other),
        }
    }

    #[test]
    fn test_non_utf8_keyword_is_error() {
        let mut lexer = Lexer::new(&b"end\xFFobj"[..]);
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { context: "keyword", offset: 0, .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Lexical);
    }

    #[test]
    fn test_lex_keywords() {
        assert_eq!(lex_all(b"true false null obj endobj R xref trailer"), vec![
            kw("true"),
            kw("false"),
            kw("null"),
            kw("obj"),
            kw("endobj"),
            kw("R"),
            kw("xref"),
            kw("trailer"),
            Token::Eof
        ]);
    }

    #[test]
    fn test_lex_dict_and_array_delimiters() {
        assert_eq!(lex_all(b"<</Kids[1 0 R]>>"), vec![
            Token::DictStart,
            Token::Name("Kids".into()),
            Token::ArrayStart,
            num("1"),
            num("0"),
            kw("R"),
            Token::ArrayEnd,
            Token::DictEnd,
            Token::Eof
        ]);
    }

    #[test]
    fn test_lone_greater_than_is_error() {
        let mut lexer = Lexer::new(&b"> x"[..]);
        assert!(matches!(
            lexer.next_token(),
            Err(Error::UnexpectedByte { byte: b'>', offset: 0 })
        ));

        let mut lexer = Lexer::new(&b">"[..]);
        assert!(matches!(lexer.next_token(), Err(Error::UnexpectedByte { .. })));
    }

    #[test]
    fn test_stray_delimiters_are_errors() {
        for input in [&b")"[..], &b"{"[..], &b"}"[..]] {
            let mut lexer = Lexer::new(input);
            assert!(matches!(lexer.next_token(), Err(Error::UnexpectedByte { .. })));
        }
    }

    // ========================================================================
    // Whitespace, comments and offsets
    // ========================================================================

    #[test]
    fn test_whitespace_and_comments_only() {
        assert_eq!(lex_all(b" \t\r\n\x0c\x00% comment\n%another"), vec![Token::Eof]);
        assert_eq!(lex_all(b""), vec![Token::Eof]);
    }

    #[test]
    fn test_comment_between_tokens() {
        assert_eq!(lex_all(b"%PDF-1.7\n1 % trailing\r2"), vec![num("1"), num("2"), Token::Eof]);
    }

    #[test]
    fn test_token_offsets() {
        let mut lexer = Lexer::new(&b"  /A  (b)"[..]);
        lexer.next_token().unwrap();
        assert_eq!(lexer.token_offset(), 2);
        lexer.next_token().unwrap();
        assert_eq!(lexer.token_offset(), 6);
        assert_eq!(lexer.offset(), 9);
    }

    #[test]
    fn test_tokens_iterator() {
        let mut lexer = Lexer::new(&b"1 0 obj << >> endobj"[..]);
        let toks: Vec<Token> = lexer.tokens().collect::<Result<_>>().unwrap();
        assert_eq!(toks, vec![
            num("1"),
            num("0"),
            kw("obj"),
            Token::DictStart,
            Token::DictEnd,
            kw("endobj")
        ]);
    }

    #[test]
    fn test_tokens_iterator_stops_after_error() {
        let mut lexer = Lexer::new(&b"1 > 2"[..]);
        let toks: Vec<Result<Token>> = lexer.tokens().collect();
        assert_eq!(toks.len(), 2);
        assert!(toks[1].is_err());
    }

    // ========================================================================
    // Raw stream access
    // ========================================================================

    #[test]
    fn test_stream_eol_and_raw_bytes() {
        let mut lexer = Lexer::new(&b"stream\r\nABC\x00Dendstream"[..]);
        assert_eq!(lexer.next_token().unwrap(), kw("stream"));
        lexer.read_stream_eol().unwrap();
        assert_eq!(lexer.read_raw(5).unwrap(), b"ABC\x00D");
        assert_eq!(lexer.next_token().unwrap(), kw("endstream"));
    }

    #[test]
    fn test_stream_bare_cr_rejected() {
        let mut lexer = Lexer::new(&b"stream\rABC"[..]);
        lexer.next_token().unwrap();
        assert!(matches!(lexer.read_stream_eol(), Err(Error::InvalidStreamEol { .. })));
    }

    #[test]
    fn test_read_raw_short_input() {
        let mut lexer = Lexer::new(&b"stream\nAB"[..]);
        lexer.next_token().unwrap();
        lexer.read_stream_eol().unwrap();
        assert!(matches!(
            lexer.read_raw(10),
            Err(Error::UnexpectedEof { context: "stream data", .. })
        ));
    }
}

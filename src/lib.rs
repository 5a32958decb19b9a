// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::enum_variant_names)]

//! # PDF Skeleton
//!
//! Parsing core for the PDF file format: turns a raw byte stream into a
//! navigable object graph (catalog → page tree → page objects).
//!
//! ## Components
//!
//! ```text
//! bytes
//!     ↓
//! [Lexer] (tokens: numbers, names, strings, delimiters, keywords)
//!     ↓
//! [Parser] (values, N G R references, N G obj ... endobj, streams)
//!     ↓
//! [ObjectTable] (objects keyed by number and generation)
//!     ↓
//! [Document] (xref + trailer → catalog → ordered pages)
//! ```
//!
//! Stream filters, encryption, incremental updates and content interpretation
//! are outside this crate.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_skeleton::Document;
//!
//! let input = b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
//! 2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >> endobj
//! 3 0 obj << /Type /Page >> endobj
//! 4 0 obj << /Type /Page >> endobj
//! xref
//! 0 1
//! 0000000000 65535 f
//! trailer
//! << /Root 1 0 R >>";
//!
//! let mut doc = Document::parse(&input[..])?;
//! doc.resolve_catalog()?;
//! let pages = doc.resolve_pages()?;
//! assert_eq!(pages.len(), 2);
//! assert_eq!(pages[0].id, 3);
//! # Ok::<(), pdf_skeleton::Error>(())
//! ```
//!
//! Reading from a file works the same way with any [`std::io::Read`] source:
//!
//! ```no_run
//! let file = std::fs::File::open("sample.pdf")?;
//! let mut doc = pdf_skeleton::Document::parse(file)?;
//! println!("{} pages", doc.resolve_pages()?.len());
//! # Ok::<(), pdf_skeleton::Error>(())
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Tokens and lexing
pub mod lexer;
pub mod token;

// Object model
pub mod object;
pub mod object_table;

// Parsing
mod indirect;
pub mod parser;
/// Parser configuration options
pub mod parser_config;
pub mod xref;

// Document resolution
pub mod document;

// Serialization
pub mod writer;

// Re-exports
pub use document::Document;
pub use error::{Error, ErrorCategory, Result};
pub use lexer::Lexer;
pub use object::{Dictionary, IndirectObject, ObjectRef, Stream, Value};
pub use object_table::ObjectTable;
pub use parser::Parser;
pub use parser_config::ParserOptions;
pub use token::Token;
pub use xref::{CrossRefTable, XRefEntry};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

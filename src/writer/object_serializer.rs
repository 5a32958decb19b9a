//! Value serialization.
//!
//! Writes [`Value`]s back in the syntax the lexer reads, so that parsing the
//! output yields an equal value. String and name bytes are written as stored:
//! the lexer keeps escapes verbatim, so nothing is re-escaped here.

use crate::error::Result;
use crate::object::{Dictionary, IndirectObject, Stream, Value};
use std::io::Write;

/// Serializer for values and indirect objects.
///
/// # Example
///
/// ```
/// use pdf_skeleton::object::{ObjectRef, Value};
/// use pdf_skeleton::writer::ObjectSerializer;
///
/// let value = Value::Array(vec![Value::Number(1.5), Value::Reference(ObjectRef::new(3, 0))]);
/// assert_eq!(ObjectSerializer::compact().serialize_to_string(&value), "[1.5 3 0 R]");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    /// Whether to use compact formatting (minimal whitespace)
    compact: bool,
}

impl ObjectSerializer {
    /// Create a new object serializer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compact serializer (minimal whitespace).
    pub fn compact() -> Self {
        Self { compact: true }
    }

    /// Serialize a value to bytes.
    pub fn serialize(&self, value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_value(&mut buf, value);
        buf
    }

    /// Serialize a value to a string (for debugging).
    pub fn serialize_to_string(&self, value: &Value) -> String {
        String::from_utf8_lossy(&self.serialize(value)).into_owned()
    }

    /// Serialize an indirect object definition.
    ///
    /// Format: `{id} {gen} obj\n{value}\nendobj\n`
    pub fn serialize_indirect(&self, object: &IndirectObject) -> Vec<u8> {
        let mut buf = format!("{} {} obj\n", object.id, object.gen).into_bytes();
        self.write_value(&mut buf, &object.value);
        buf.extend_from_slice(b"\nendobj\n");
        buf
    }

    /// Serialize a value into any writer.
    pub fn write_to<W: Write>(&self, w: &mut W, value: &Value) -> Result<()> {
        w.write_all(&self.serialize(value))?;
        Ok(())
    }

    fn write_value(&self, buf: &mut Vec<u8>, value: &Value) {
        match value {
            Value::Null => buf.extend_from_slice(b"null"),
            Value::Boolean(b) => buf.extend_from_slice(if *b { &b"true"[..] } else { &b"false"[..] }),
            Value::Number(n) => self.write_number(buf, *n),
            Value::Name(name) => {
                buf.push(b'/');
                buf.extend_from_slice(name.as_bytes());
            },
            Value::LiteralString(s) => {
                buf.push(b'(');
                buf.extend_from_slice(s);
                buf.push(b')');
            },
            Value::HexString(s) => {
                buf.push(b'<');
                buf.extend_from_slice(s);
                buf.push(b'>');
            },
            Value::Array(items) => self.write_array(buf, items),
            Value::Dictionary(dict) => self.write_dictionary(buf, dict),
            Value::Stream(stream) => self.write_stream(buf, stream),
            Value::Reference(r) => buf.extend_from_slice(r.to_string().as_bytes()),
        }
    }

    /// Shortest text that parses back to the same number.
    fn write_number(&self, buf: &mut Vec<u8>, value: f64) {
        if !value.is_finite() {
            log::warn!("Cannot represent {} as a number, writing 0", value);
            buf.push(b'0');
            return;
        }
        // f64 Display never uses exponent notation and prints 5.0 as "5"
        buf.extend_from_slice(value.to_string().as_bytes());
    }

    fn write_array(&self, buf: &mut Vec<u8>, items: &[Value]) {
        buf.push(b'[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                buf.push(b' ');
            }
            self.write_value(buf, item);
        }
        buf.push(b']');
    }

    fn write_dictionary(&self, buf: &mut Vec<u8>, dict: &Dictionary) {
        buf.extend_from_slice(b"<<");

        // Sort keys for deterministic output
        let mut entries: Vec<_> = dict.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in entries {
            buf.extend_from_slice(if self.compact { &b" /"[..] } else { &b"\n  /"[..] });
            buf.extend_from_slice(key.as_bytes());
            buf.push(b' ');
            self.write_value(buf, value);
        }

        if !self.compact && !dict.is_empty() {
            buf.push(b'\n');
        } else if !dict.is_empty() {
            buf.push(b' ');
        }
        buf.extend_from_slice(b">>");
    }

    fn write_stream(&self, buf: &mut Vec<u8>, stream: &Stream) {
        let mut dict = stream.dict.clone();
        dict.insert("Length".to_string(), Value::Number(stream.data.len() as f64));

        self.write_dictionary(buf, &dict);
        buf.extend_from_slice(b"\nstream\n");
        buf.extend_from_slice(&stream.data);
        buf.extend_from_slice(b"\nendstream");
    }
}

//! Object model: values, references, streams and indirect objects.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Dictionary payload: name (without `/`) to value. Keys are unique.
pub type Dictionary = HashMap<String, Value>;

/// A parsed value.
///
/// Arrays and dictionaries own their children. A [`Value::Reference`] only
/// names another indirect object; it is resolved on demand through the
/// [`ObjectTable`](crate::object_table::ObjectTable).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (integers and reals share one double-precision representation)
    Number(f64),
    /// Name, stored without the leading `/`
    Name(String),
    /// Literal string bytes, escapes not processed
    LiteralString(Vec<u8>),
    /// Hex string text (hex digits, whitespace removed)
    HexString(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + raw payload); only produced as an indirect object body
    Stream(Stream),
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

/// Stream object: dictionary plus the raw bytes between `stream` and `endstream`.
///
/// The payload is never decoded here; `/Filter` is left to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// Stream dictionary
    pub dict: Dictionary,
    /// Raw stream data, exactly `/Length` bytes
    pub data: bytes::Bytes,
}

/// A top-level `N G obj ... endobj` unit.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
    /// Object body
    pub value: Value,
}

impl IndirectObject {
    /// Create a new indirect object.
    pub fn new(id: u32, gen: u16, value: Value) -> Self {
        Self { id, gen, value }
    }

    /// The `(number, generation)` identity of this object.
    pub fn reference(&self) -> ObjectRef {
        ObjectRef::new(self.id, self.gen)
    }
}

impl Value {
    /// Get the type name of this value (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::Name(_) => "Name",
            Value::LiteralString(_) => "String",
            Value::HexString(_) => "HexString",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dictionary",
            Value::Stream(_) => "Stream",
            Value::Reference(_) => "Reference",
        }
    }

    /// Try to cast to number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to cast to integer. Only numbers without a fractional part qualify.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream values.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            Value::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// Try to cast to stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Value::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to literal string bytes.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Value::LiteralString(s) => Some(s),
            _ => None,
        }
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Decode a hex string value into bytes.
    ///
    /// An odd number of digits is padded with a trailing 0.
    ///
    /// # Example
    ///
    /// ```
    /// use pdf_skeleton::object::Value;
    ///
    /// let value = Value::HexString(b"48656C6C6F".to_vec());
    /// assert_eq!(value.decode_hex()?, b"Hello");
    /// # Ok::<(), pdf_skeleton::error::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidObjectType`] if this is not a hex string, and
    /// [`Error::InvalidHexString`] if it contains a non-hex digit.
    pub fn decode_hex(&self) -> Result<Vec<u8>> {
        let digits = match self {
            Value::HexString(digits) => digits,
            _ => {
                return Err(Error::InvalidObjectType {
                    expected: "HexString".to_string(),
                    found: self.type_name().to_string(),
                })
            },
        };

        let nibble = |index: usize| -> Result<u8> {
            match digits.get(index) {
                None => Ok(0),
                Some(&c) => char::from(c)
                    .to_digit(16)
                    .map(|d| d as u8)
                    .ok_or(Error::InvalidHexString { offset: index }),
            }
        };

        (0..digits.len())
            .step_by(2)
            .map(|i| -> Result<u8> { Ok((nibble(i)? << 4) | nibble(i + 1)?) })
            .collect()
    }
}

impl From<ObjectRef> for Value {
    fn from(r: ObjectRef) -> Self {
        Value::Reference(r)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dictionary(d)
    }
}

//! Writing values back to bytes.
//!
//! Only value and indirect-object serialization is provided; assembling a
//! complete file (xref offsets, trailer) is left to callers.

mod object_serializer;

pub use object_serializer::ObjectSerializer;

//! # Binary format
//!
//! A top-level value is always a document. Documents and arrays share one
//! layout; arrays name their elements `"0"`, `"1"`, ... in order.
//! All integers are little-endian.
//!
//! ```text
//! struct Document {
//!     document_len:   i32,        // Includes itself and the terminating 0x00.
//!     elements:       [Element],
//!     terminator:     u8,         // 0x00, which is BsonType::EndOfDocument.
//! }
//!
//! struct Element {
//!     bson_type:      u8,
//!     name:           cstring,    // UTF-8 without interior 0x00, then 0x00.
//!     value:          Value,      // Layout decided by bson_type.
//! }
//!
//! struct Value::Double            { body: [u8; 8] }
//! struct Value::String or Symbol  { len: i32, body: [u8; len - 1], terminator: u8 }
//! struct Value::Document or Array { Document }
//! struct Value::Binary {
//!     len:            i32,
//!     sub_type:       u8,
//!     body:           [u8; len],  // OldBinary nests a second i32 len inside body.
//! }
//! struct Value::ObjectId          { body: [u8; 12] }
//! struct Value::Boolean           { body: u8 }
//! struct Value::DateTime          { millis_since_epoch: i64 }
//! struct Value::Null              { }
//! struct Value::Int32             { body: i32 }
//! struct Value::Int64             { body: i64 }
//! ```
//!
//! The remaining tags (regular expressions, JavaScript, timestamps, 128-bit
//! decimals, min/max keys) are recognized and skipped, never produced.

mod binary_reader;
mod binary_writer;
mod lengths;
mod reader;
mod settings;
mod writer;

pub use binary_reader::{BsonBinaryReader, Bookmark};
pub use binary_writer::BsonBinaryWriter;
pub use reader::BsonReader;
pub use settings::{ReaderSettings, WriterSettings};
pub use writer::BsonWriter;

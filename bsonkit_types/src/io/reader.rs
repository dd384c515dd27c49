use crate::bson_type::{BinarySubType, BsonType};
use crate::error::{BsonError, Result};
use crate::io::{Bookmark, ReaderSettings};
use crate::values::ObjectId;

/// Token-level cursor over an encoded document.
///
/// Elements are consumed by calling [`BsonReader::read_bson_type`], which
/// positions the cursor on the next element's value (or on the end of the
/// enclosing document/array), followed by exactly one `read_*` or
/// [`BsonReader::skip_value`] call for that value.
pub trait BsonReader {
    fn settings(&self) -> &ReaderSettings;

    fn current_bson_type(&self) -> Result<BsonType>;
    fn current_name(&self) -> Option<&str>;
    fn read_bson_type(&mut self) -> Result<BsonType>;

    fn read_start_document(&mut self) -> Result<()>;
    fn read_end_document(&mut self) -> Result<()>;
    fn read_start_array(&mut self) -> Result<()>;
    fn read_end_array(&mut self) -> Result<()>;

    fn read_null(&mut self) -> Result<()>;
    fn read_boolean(&mut self) -> Result<bool>;
    fn read_int32(&mut self) -> Result<i32>;
    fn read_int64(&mut self) -> Result<i64>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_string(&mut self) -> Result<String>;
    fn read_symbol(&mut self) -> Result<String>;
    fn read_binary_data(&mut self) -> Result<(Vec<u8>, BinarySubType)>;
    /// Milliseconds since the Unix epoch.
    fn read_date_time(&mut self) -> Result<i64>;
    fn read_object_id(&mut self) -> Result<ObjectId>;

    fn skip_value(&mut self) -> Result<()>;

    fn bookmark(&mut self) -> Result<Bookmark>;
    fn return_to_bookmark(&mut self, bookmark: &Bookmark) -> Result<()>;

    /// Reads the next element, which must be named `expected`.
    fn read_element(&mut self, expected: &str) -> Result<BsonType> {
        let bson_type = self.read_bson_type()?;
        match self.current_name() {
            Some(name) if name == expected => Ok(bson_type),
            Some(name) => Err(BsonError::format(format!(
                "Expected element '{expected}', found '{name}'."
            ))),
            None => Err(BsonError::format(format!(
                "Expected element '{expected}', found end of document."
            ))),
        }
    }
}

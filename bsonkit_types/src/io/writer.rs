use crate::bson_type::BinarySubType;
use crate::error::Result;
use crate::io::WriterSettings;
use crate::values::ObjectId;

/// Token-level sink producing an encoded document.
///
/// Inside a document every value is preceded by [`BsonWriter::write_name`].
/// Inside an array values are named by position automatically.
pub trait BsonWriter {
    fn settings(&self) -> &WriterSettings;

    fn write_name(&mut self, name: &str) -> Result<()>;

    fn write_start_document(&mut self) -> Result<()>;
    fn write_end_document(&mut self) -> Result<()>;
    fn write_start_array(&mut self) -> Result<()>;
    fn write_end_array(&mut self) -> Result<()>;

    fn write_null(&mut self) -> Result<()>;
    fn write_boolean(&mut self, value: bool) -> Result<()>;
    fn write_int32(&mut self, value: i32) -> Result<()>;
    fn write_int64(&mut self, value: i64) -> Result<()>;
    fn write_double(&mut self, value: f64) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;
    fn write_symbol(&mut self, value: &str) -> Result<()>;
    fn write_binary_data(&mut self, bytes: &[u8], sub_type: BinarySubType) -> Result<()>;
    /// Milliseconds since the Unix epoch.
    fn write_date_time(&mut self, millis: i64) -> Result<()>;
    fn write_object_id(&mut self, value: ObjectId) -> Result<()>;
}

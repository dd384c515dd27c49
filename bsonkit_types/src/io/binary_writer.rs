use crate::bson_type::{BinarySubType, BsonType, BsonTypeInt};
use crate::error::{BsonError, Result};
use crate::io::lengths::{BinaryLen, DocumentLen, StringLen};
use crate::io::{BsonWriter, WriterSettings};
use crate::values::ObjectId;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Before a top-level document.
    Initial,
    /// Expecting `write_name` or the end of the document.
    Name,
    /// Expecting a value.
    Value,
    /// After a top-level document. Another may follow.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Document,
    Array,
}

struct WriteContext {
    kind: ContextKind,
    /// Offset of the length prefix within the buffer.
    start: usize,
    /// Next array index.
    index: usize,
}

/// Writes documents to `W`. Each top-level document is assembled in memory so
/// that length prefixes can be patched in, then written out in one piece.
pub struct BsonBinaryWriter<W: Write> {
    w: W,
    settings: WriterSettings,
    buf: Vec<u8>,
    contexts: Vec<WriteContext>,
    state: WriterState,
    name: Option<String>,
}

impl<W: Write> BsonBinaryWriter<W> {
    pub fn new(w: W) -> Self {
        Self::with_settings(w, WriterSettings::default())
    }

    pub fn with_settings(w: W, settings: WriterSettings) -> Self {
        Self {
            w,
            settings,
            buf: vec![],
            contexts: vec![],
            state: WriterState::Initial,
            name: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    /// Whether a top-level document is complete and nothing is pending.
    pub fn is_done(&self) -> bool {
        self.state == WriterState::Done
    }

    /* primitives */

    fn write_cstring(&mut self, s: &str) -> Result<()> {
        if s.as_bytes().contains(&0) {
            return Err(BsonError::Serialization(format!(
                "Element name '{}' contains a null byte.",
                s.escape_debug()
            )));
        }
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    fn write_len_prefixed_string(&mut self, s: &str) -> Result<()> {
        let str_len = StringLen::from_body(s.as_bytes())?;
        self.buf.extend_from_slice(&str_len.to_le_bytes());
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    /* state */

    /// Writes `bson_type` and the element name, advancing the state past the value.
    fn write_element_header(&mut self, method: &str, bson_type: BsonType) -> Result<()> {
        if self.state != WriterState::Value {
            let msg = if self.contexts.is_empty() {
                format!("{method}: a top-level value must be a document.")
            } else {
                format!(
                    "{method} can only be called when State is Value, not when State is {:?}.",
                    self.state
                )
            };
            return Err(BsonError::invalid_operation(msg));
        }
        let name = match self.contexts.last_mut() {
            Some(ctx) if ctx.kind == ContextKind::Array => {
                let name = ctx.index.to_string();
                ctx.index += 1;
                name
            }
            Some(_) => self
                .name
                .take()
                .ok_or_else(|| BsonError::invalid_operation("Element name was not written."))?,
            None => return Err(BsonError::invalid_operation("Not inside a document.")),
        };
        self.buf.push(*BsonTypeInt::from(bson_type));
        self.write_cstring(&name)?;
        self.after_value();
        Ok(())
    }

    fn after_value(&mut self) {
        self.state = match self.contexts.last() {
            Some(ctx) if ctx.kind == ContextKind::Array => WriterState::Value,
            Some(_) => WriterState::Name,
            None => WriterState::Done,
        };
    }

    fn push_context(&mut self, kind: ContextKind) -> Result<()> {
        if self.contexts.len() >= self.settings.max_depth {
            return Err(BsonError::Serialization(format!(
                "Nesting depth exceeds {}.",
                self.settings.max_depth
            )));
        }
        let start = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        self.contexts.push(WriteContext {
            kind,
            start,
            index: 0,
        });
        self.state = match kind {
            ContextKind::Document => WriterState::Name,
            ContextKind::Array => WriterState::Value,
        };
        Ok(())
    }

    fn pop_context(&mut self, kind: ContextKind) -> Result<()> {
        let ctx = match self.contexts.pop() {
            Some(ctx) if ctx.kind == kind => ctx,
            Some(ctx) => {
                self.contexts.push(ctx);
                return Err(BsonError::invalid_operation(format!("Not inside a {kind:?}.")));
            }
            None => return Err(BsonError::invalid_operation(format!("Not inside a {kind:?}."))),
        };

        /* terminator */
        self.buf.push(*BsonTypeInt::from(BsonType::EndOfDocument));

        /* length prefix */
        let len = self.buf.len() - ctx.start;
        if len > self.settings.max_document_size {
            return Err(BsonError::Serialization(format!(
                "Size {len} is larger than MaxDocumentSize {}.",
                self.settings.max_document_size
            )));
        }
        let doc_len = DocumentLen::from_span(len)?;
        self.buf[ctx.start..ctx.start + 4].copy_from_slice(&doc_len.to_le_bytes());

        self.after_value();
        if self.contexts.is_empty() {
            self.w.write_all(&self.buf)?;
            self.w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl<W: Write> BsonWriter for BsonBinaryWriter<W> {
    fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    fn write_name(&mut self, name: &str) -> Result<()> {
        match self.contexts.last() {
            Some(ctx) if ctx.kind == ContextKind::Document && self.state == WriterState::Name => {
                if name.as_bytes().contains(&0) {
                    return Err(BsonError::Serialization(format!(
                        "Element name '{}' contains a null byte.",
                        name.escape_debug()
                    )));
                }
                self.name = Some(name.to_owned());
                self.state = WriterState::Value;
                Ok(())
            }
            _ => Err(BsonError::invalid_operation(format!(
                "WriteName can only be called when State is Name, not when State is {:?}.",
                self.state
            ))),
        }
    }

    fn write_start_document(&mut self) -> Result<()> {
        match self.state {
            WriterState::Initial | WriterState::Done => {}
            _ => self.write_element_header("WriteStartDocument", BsonType::Document)?,
        }
        self.push_context(ContextKind::Document)
    }

    fn write_end_document(&mut self) -> Result<()> {
        if self.state != WriterState::Name {
            return Err(BsonError::invalid_operation(format!(
                "WriteEndDocument can only be called when State is Name, not when State is {:?}.",
                self.state
            )));
        }
        self.pop_context(ContextKind::Document)
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.write_element_header("WriteStartArray", BsonType::Array)?;
        self.push_context(ContextKind::Array)
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.pop_context(ContextKind::Array)
    }

    fn write_null(&mut self) -> Result<()> {
        self.write_element_header("WriteNull", BsonType::Null)
    }

    fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.write_element_header("WriteBoolean", BsonType::Boolean)?;
        self.buf.push(value as u8);
        Ok(())
    }

    fn write_int32(&mut self, value: i32) -> Result<()> {
        self.write_element_header("WriteInt32", BsonType::Int32)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_int64(&mut self, value: i64) -> Result<()> {
        self.write_element_header("WriteInt64", BsonType::Int64)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        self.write_element_header("WriteDouble", BsonType::Double)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_element_header("WriteString", BsonType::String)?;
        self.write_len_prefixed_string(value)
    }

    fn write_symbol(&mut self, value: &str) -> Result<()> {
        self.write_element_header("WriteSymbol", BsonType::Symbol)?;
        self.write_len_prefixed_string(value)
    }

    fn write_binary_data(&mut self, bytes: &[u8], sub_type: BinarySubType) -> Result<()> {
        self.write_element_header("WriteBinaryData", BsonType::Binary)?;
        if sub_type == BinarySubType::OldBinary {
            let inner_len = BinaryLen::from_body(bytes)?;
            let total = inner_len.checked_add(4).ok_or_else(|| {
                BsonError::Serialization("Binary data is too long.".to_owned())
            })?;
            self.buf.extend_from_slice(&total.to_le_bytes());
            self.buf.push(sub_type.to_byte());
            self.buf.extend_from_slice(&inner_len.to_le_bytes());
        } else {
            let bin_len = BinaryLen::from_body(bytes)?;
            self.buf.extend_from_slice(&bin_len.to_le_bytes());
            self.buf.push(sub_type.to_byte());
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn write_date_time(&mut self, millis: i64) -> Result<()> {
        self.write_element_header("WriteDateTime", BsonType::DateTime)?;
        self.buf.extend_from_slice(&millis.to_le_bytes());
        Ok(())
    }

    fn write_object_id(&mut self, value: ObjectId) -> Result<()> {
        self.write_element_header("WriteObjectId", BsonType::ObjectId)?;
        self.buf.extend_from_slice(&value.bytes());
        Ok(())
    }
}

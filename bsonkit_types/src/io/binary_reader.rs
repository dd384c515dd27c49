use crate::bson_type::{BinarySubType, BsonType, BsonTypeInt};
use crate::error::{BsonError, Result};
use crate::io::lengths::{BinaryLen, DocumentLen, StringLen};
use crate::io::{BsonReader, ReaderSettings};
use crate::values::ObjectId;
use std::io::{Read, Seek, SeekFrom};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// Before a top-level document.
    Initial,
    /// Expecting `read_bson_type`.
    Type,
    /// Positioned on a value.
    Value,
    EndOfDocument,
    EndOfArray,
    /// After a top-level document. Another may follow.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Document,
    Array,
}

#[derive(Debug, Clone)]
struct ReadContext {
    kind: ContextKind,
    /// Stream position just past the terminator.
    end: u64,
}

/// A saved reader position, restorable with [`BsonReader::return_to_bookmark`].
#[derive(Debug, Clone)]
pub struct Bookmark {
    pos: u64,
    state: ReaderState,
    contexts: Vec<ReadContext>,
    current_type: Option<BsonType>,
    current_name: Option<String>,
}

pub struct BsonBinaryReader<R: Read + Seek> {
    r: R,
    settings: ReaderSettings,
    pos: u64,
    state: ReaderState,
    contexts: Vec<ReadContext>,
    current_type: Option<BsonType>,
    current_name: Option<String>,
}

impl<R: Read + Seek> BsonBinaryReader<R> {
    pub fn new(r: R) -> Result<Self> {
        Self::with_settings(r, ReaderSettings::default())
    }

    pub fn with_settings(mut r: R, settings: ReaderSettings) -> Result<Self> {
        let pos = r.stream_position()?;
        Ok(Self {
            r,
            settings,
            pos,
            state: ReaderState::Initial,
            contexts: vec![],
            current_type: Some(BsonType::Document),
            current_name: None,
        })
    }

    pub fn into_inner(self) -> R {
        self.r
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Whether the stream has no bytes left, i.e. no further top-level document.
    pub fn is_at_end(&mut self) -> Result<bool> {
        let len = self.r.seek(SeekFrom::End(0))?;
        self.r.seek(SeekFrom::Start(self.pos))?;
        Ok(self.pos >= len)
    }

    /// Gives up on the top-level document that starts at `start` (the
    /// [`position`](Self::position) before it was read) and positions the
    /// reader just past it, so that the following document can be read.
    /// Works whether or not the document was entered.
    pub fn abandon_document(&mut self, start: u64) -> Result<()> {
        self.r.seek(SeekFrom::Start(start))?;
        self.pos = start;
        let (_, doc_len) = DocumentLen::deser(&mut self.r)?;
        let end = start + doc_len.validate(self.settings.max_document_size)? as u64;
        tracing::warn!(start, end, "Abandoning partially read document.");
        self.r.seek(SeekFrom::Start(end))?;
        self.pos = end;
        self.contexts.clear();
        self.state = ReaderState::Done;
        self.current_type = Some(BsonType::Document);
        self.current_name = None;
        Ok(())
    }

    /* primitives */

    fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.r.read_exact(&mut buf)?;
        self.pos += N as u64;
        Ok(buf)
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.r.read_exact(&mut buf)?;
        self.pos += len as u64;
        Ok(buf)
    }

    fn read_cstring(&mut self) -> Result<String> {
        let mut bytes = vec![];
        loop {
            let [b] = self.read_fixed::<1>()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        String::from_utf8(bytes).map_err(|e| BsonError::format(format!("Invalid cstring: {e}.")))
    }

    fn read_len_prefixed_string(&mut self) -> Result<String> {
        let (r_len, str_len) = StringLen::deser(&mut self.r)?;
        self.pos += r_len as u64;
        let bytes = self.read_vec(str_len.body_len()?)?;
        let [terminator] = self.read_fixed::<1>()?;
        if terminator != 0 {
            return Err(BsonError::format("String is missing its null terminator."));
        }
        String::from_utf8(bytes).map_err(|e| BsonError::format(format!("Invalid UTF-8 string: {e}.")))
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        self.r.seek(SeekFrom::Current(len as i64))?;
        self.pos += len;
        Ok(())
    }

    /* state */

    fn verify_value(&self, method: &str, expected: BsonType) -> Result<()> {
        if self.state != ReaderState::Value {
            return Err(BsonError::invalid_operation(format!(
                "{method} can only be called when State is Value, not when State is {:?}.",
                self.state
            )));
        }
        match self.current_type {
            Some(actual) if actual == expected => Ok(()),
            actual => Err(BsonError::invalid_operation(format!(
                "{method} can only be called when CurrentBsonType is {expected}, not when CurrentBsonType is {actual:?}."
            ))),
        }
    }

    fn value_consumed(&mut self) {
        self.state = ReaderState::Type;
    }

    fn push_context(&mut self, kind: ContextKind) -> Result<()> {
        if self.contexts.len() >= self.settings.max_depth {
            return Err(BsonError::format(format!(
                "Nesting depth exceeds {}.",
                self.settings.max_depth
            )));
        }
        let start = self.pos;
        let (r_len, doc_len) = DocumentLen::deser(&mut self.r)?;
        self.pos += r_len as u64;
        let len = doc_len.validate(self.settings.max_document_size)?;
        let end = start + len as u64;
        if let Some(parent) = self.contexts.last() {
            if end > parent.end {
                return Err(BsonError::format(
                    "Nested document length runs past its parent.",
                ));
            }
        }
        self.contexts.push(ReadContext { kind, end });
        self.state = ReaderState::Type;
        self.current_type = None;
        self.current_name = None;
        Ok(())
    }

    fn pop_context(&mut self, kind: ContextKind) -> Result<()> {
        let ctx = match self.contexts.pop() {
            Some(ctx) if ctx.kind == kind => ctx,
            _ => {
                return Err(BsonError::invalid_operation(format!(
                    "Not inside a {kind:?}."
                )))
            }
        };
        if self.pos != ctx.end {
            return Err(BsonError::format(format!(
                "{kind:?} length prefix says it ends at {}, but it ended at {}.",
                ctx.end, self.pos
            )));
        }
        if self.contexts.is_empty() {
            self.state = ReaderState::Done;
            self.current_type = Some(BsonType::Document);
        } else {
            self.state = ReaderState::Type;
            self.current_type = None;
        }
        self.current_name = None;
        Ok(())
    }

    fn value_len(&mut self, bson_type: BsonType) -> Result<u64> {
        let len = match bson_type {
            BsonType::Double | BsonType::DateTime | BsonType::Int64 | BsonType::Timestamp => 8,
            BsonType::Int32 => 4,
            BsonType::Boolean => 1,
            BsonType::ObjectId => ObjectId::LEN as u64,
            BsonType::Decimal128 => 16,
            BsonType::Null | BsonType::Undefined | BsonType::MinKey | BsonType::MaxKey => 0,
            BsonType::EndOfDocument => 0,
            BsonType::String | BsonType::Symbol | BsonType::JavaScript => {
                let (r_len, str_len) = StringLen::deser(&mut self.r)?;
                self.pos += r_len as u64;
                str_len.body_len()? as u64 + 1
            }
            BsonType::Document | BsonType::Array | BsonType::JavaScriptWithScope => {
                let (r_len, doc_len) = DocumentLen::deser(&mut self.r)?;
                self.pos += r_len as u64;
                (doc_len.validate(self.settings.max_document_size)? - r_len) as u64
            }
            BsonType::Binary => {
                let (r_len, bin_len) = BinaryLen::deser(&mut self.r)?;
                self.pos += r_len as u64;
                bin_len.body_len()? as u64 + 1
            }
            BsonType::RegularExpression => {
                self.read_cstring()?;
                self.read_cstring()?;
                0
            }
        };
        Ok(len)
    }
}

impl<R: Read + Seek> BsonReader for BsonBinaryReader<R> {
    fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    fn current_bson_type(&self) -> Result<BsonType> {
        self.current_type.ok_or_else(|| {
            BsonError::invalid_operation("CurrentBsonType is not set; call ReadBsonType first.")
        })
    }

    fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    fn read_bson_type(&mut self) -> Result<BsonType> {
        match self.state {
            ReaderState::Initial | ReaderState::Done => {
                self.state = ReaderState::Value;
                self.current_type = Some(BsonType::Document);
                self.current_name = None;
                return Ok(BsonType::Document);
            }
            ReaderState::Type => {}
            state => {
                return Err(BsonError::invalid_operation(format!(
                    "ReadBsonType cannot be called when State is {state:?}."
                )))
            }
        }

        let (kind, end) = match self.contexts.last() {
            Some(ctx) => (ctx.kind, ctx.end),
            None => return Err(BsonError::invalid_operation("Not inside a document.")),
        };
        if self.pos >= end {
            return Err(BsonError::format("Read past the end of the document."));
        }

        /* bson_type */
        let (r_len, type_int) = BsonTypeInt::deser(&mut self.r)?;
        self.pos += r_len as u64;
        let bson_type = BsonType::try_from(type_int)?;
        self.current_type = Some(bson_type);

        if bson_type == BsonType::EndOfDocument {
            self.current_name = None;
            self.state = match kind {
                ContextKind::Document => ReaderState::EndOfDocument,
                ContextKind::Array => ReaderState::EndOfArray,
            };
            return Ok(bson_type);
        }

        /* name */
        let name = self.read_cstring()?;
        self.current_name = Some(name);
        self.state = ReaderState::Value;
        Ok(bson_type)
    }

    fn read_start_document(&mut self) -> Result<()> {
        if matches!(self.state, ReaderState::Initial | ReaderState::Done) {
            self.state = ReaderState::Value;
            self.current_type = Some(BsonType::Document);
        }
        self.verify_value("ReadStartDocument", BsonType::Document)?;
        self.push_context(ContextKind::Document)
    }

    fn read_end_document(&mut self) -> Result<()> {
        if self.state != ReaderState::EndOfDocument {
            return Err(BsonError::invalid_operation(format!(
                "ReadEndDocument can only be called when State is EndOfDocument, not when State is {:?}.",
                self.state
            )));
        }
        self.pop_context(ContextKind::Document)
    }

    fn read_start_array(&mut self) -> Result<()> {
        self.verify_value("ReadStartArray", BsonType::Array)?;
        self.push_context(ContextKind::Array)
    }

    fn read_end_array(&mut self) -> Result<()> {
        if self.state != ReaderState::EndOfArray {
            return Err(BsonError::invalid_operation(format!(
                "ReadEndArray can only be called when State is EndOfArray, not when State is {:?}.",
                self.state
            )));
        }
        self.pop_context(ContextKind::Array)
    }

    fn read_null(&mut self) -> Result<()> {
        self.verify_value("ReadNull", BsonType::Null)?;
        self.value_consumed();
        Ok(())
    }

    fn read_boolean(&mut self) -> Result<bool> {
        self.verify_value("ReadBoolean", BsonType::Boolean)?;
        let [b] = self.read_fixed::<1>()?;
        self.value_consumed();
        match b {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(BsonError::format(format!("Invalid Boolean byte 0x{b:02x}."))),
        }
    }

    fn read_int32(&mut self) -> Result<i32> {
        self.verify_value("ReadInt32", BsonType::Int32)?;
        let buf = self.read_fixed::<{ mem::size_of::<i32>() }>()?;
        self.value_consumed();
        Ok(i32::from_le_bytes(buf))
    }

    fn read_int64(&mut self) -> Result<i64> {
        self.verify_value("ReadInt64", BsonType::Int64)?;
        let buf = self.read_fixed::<{ mem::size_of::<i64>() }>()?;
        self.value_consumed();
        Ok(i64::from_le_bytes(buf))
    }

    fn read_double(&mut self) -> Result<f64> {
        self.verify_value("ReadDouble", BsonType::Double)?;
        let buf = self.read_fixed::<{ mem::size_of::<f64>() }>()?;
        self.value_consumed();
        Ok(f64::from_le_bytes(buf))
    }

    fn read_string(&mut self) -> Result<String> {
        self.verify_value("ReadString", BsonType::String)?;
        let s = self.read_len_prefixed_string()?;
        self.value_consumed();
        Ok(s)
    }

    fn read_symbol(&mut self) -> Result<String> {
        self.verify_value("ReadSymbol", BsonType::Symbol)?;
        let s = self.read_len_prefixed_string()?;
        self.value_consumed();
        Ok(s)
    }

    fn read_binary_data(&mut self) -> Result<(Vec<u8>, BinarySubType)> {
        self.verify_value("ReadBinaryData", BsonType::Binary)?;
        let (r_len, bin_len) = BinaryLen::deser(&mut self.r)?;
        self.pos += r_len as u64;
        let mut len = bin_len.body_len()?;
        let [sub_type] = self.read_fixed::<1>()?;
        let sub_type = BinarySubType::from_byte(sub_type)?;
        if sub_type == BinarySubType::OldBinary {
            let (r_len, inner_len) = BinaryLen::deser(&mut self.r)?;
            self.pos += r_len as u64;
            let inner_len = inner_len.body_len()?;
            if inner_len + r_len != len {
                return Err(BsonError::format(
                    "Binary sub type OldBinary has inconsistent sizes.",
                ));
            }
            len = inner_len;
        }
        let bytes = self.read_vec(len)?;
        self.value_consumed();
        Ok((bytes, sub_type))
    }

    fn read_date_time(&mut self) -> Result<i64> {
        self.verify_value("ReadDateTime", BsonType::DateTime)?;
        let buf = self.read_fixed::<{ mem::size_of::<i64>() }>()?;
        self.value_consumed();
        Ok(i64::from_le_bytes(buf))
    }

    fn read_object_id(&mut self) -> Result<ObjectId> {
        self.verify_value("ReadObjectId", BsonType::ObjectId)?;
        let buf = self.read_fixed::<{ ObjectId::LEN }>()?;
        self.value_consumed();
        Ok(ObjectId::from_bytes(buf))
    }

    fn skip_value(&mut self) -> Result<()> {
        let bson_type = match (self.state, self.current_type) {
            (ReaderState::Value, Some(bson_type)) => bson_type,
            (state, _) => {
                return Err(BsonError::invalid_operation(format!(
                    "SkipValue can only be called when State is Value, not when State is {state:?}."
                )))
            }
        };
        let len = self.value_len(bson_type)?;
        self.skip(len)?;
        self.value_consumed();
        Ok(())
    }

    fn bookmark(&mut self) -> Result<Bookmark> {
        Ok(Bookmark {
            pos: self.pos,
            state: self.state,
            contexts: self.contexts.clone(),
            current_type: self.current_type,
            current_name: self.current_name.clone(),
        })
    }

    fn return_to_bookmark(&mut self, bookmark: &Bookmark) -> Result<()> {
        self.r.seek(SeekFrom::Start(bookmark.pos))?;
        self.pos = bookmark.pos;
        self.state = bookmark.state;
        self.contexts = bookmark.contexts.clone();
        self.current_type = bookmark.current_type;
        self.current_name = bookmark.current_name.clone();
        Ok(())
    }
}

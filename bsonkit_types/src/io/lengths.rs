use crate::error::{BsonError, Result};
use derive_more::Deref;
use std::io::{self, Read};
use std::mem;

/// Length prefix of a document or array, counting itself and the terminator.
#[derive(Deref, Clone, Copy)]
pub struct DocumentLen(i32);
impl DocumentLen {
    pub const MIN: i32 = 5;

    pub fn from_span(len: usize) -> Result<Self> {
        let int = i32::try_from(len)
            .map_err(|_| BsonError::Serialization(format!("Document length {len} overflows i32.")))?;
        Ok(Self(int))
    }
    pub fn deser(r: &mut impl Read) -> Result<(usize, Self), io::Error> {
        let mut buf = [0u8; mem::size_of::<i32>()];
        r.read_exact(&mut buf)?;
        let int = i32::from_le_bytes(buf);
        Ok((buf.len(), Self(int)))
    }
    pub fn validate(self, max_document_size: usize) -> Result<usize> {
        if self.0 < Self::MIN {
            return Err(BsonError::format(format!("Invalid document length {}.", self.0)));
        }
        let len = self.0 as usize;
        if len > max_document_size {
            return Err(BsonError::format(format!(
                "Size {len} is larger than MaxDocumentSize {max_document_size}."
            )));
        }
        Ok(len)
    }
}

/// Length prefix of a string value, counting the terminating 0x00.
#[derive(Deref, Clone, Copy)]
pub struct StringLen(i32);
impl StringLen {
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let int = i32::try_from(body.len() + 1)
            .map_err(|_| BsonError::Serialization("String is too long.".to_owned()))?;
        Ok(Self(int))
    }
    pub fn deser(r: &mut impl Read) -> Result<(usize, Self), io::Error> {
        let mut buf = [0u8; mem::size_of::<i32>()];
        r.read_exact(&mut buf)?;
        let int = i32::from_le_bytes(buf);
        Ok((buf.len(), Self(int)))
    }
    pub fn body_len(self) -> Result<usize> {
        if self.0 < 1 {
            return Err(BsonError::format(format!("Invalid string length {}.", self.0)));
        }
        Ok(self.0 as usize - 1)
    }
}

/// Length prefix of binary data, not counting the subtype byte.
#[derive(Deref, Clone, Copy)]
pub struct BinaryLen(i32);
impl BinaryLen {
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let int = i32::try_from(body.len())
            .map_err(|_| BsonError::Serialization("Binary data is too long.".to_owned()))?;
        Ok(Self(int))
    }
    pub fn deser(r: &mut impl Read) -> Result<(usize, Self), io::Error> {
        let mut buf = [0u8; mem::size_of::<i32>()];
        r.read_exact(&mut buf)?;
        let int = i32::from_le_bytes(buf);
        Ok((buf.len(), Self(int)))
    }
    pub fn body_len(self) -> Result<usize> {
        usize::try_from(self.0)
            .map_err(|_| BsonError::format(format!("Invalid binary length {}.", self.0)))
    }
}

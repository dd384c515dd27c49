use crate::error::{BsonError, Result};
use derive_more::{Deref, From};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use std::fmt;
use std::io::{self, Read};
use std::mem;

#[derive(From, Deref, Clone, Copy)]
pub struct BsonTypeInt(u8);
impl From<BsonType> for BsonTypeInt {
    fn from(bson_type: BsonType) -> Self {
        Self(bson_type as u8)
    }
}
impl BsonTypeInt {
    pub fn deser(r: &mut impl Read) -> Result<(usize, Self), io::Error> {
        let mut buf = [0u8; mem::size_of::<u8>()];
        r.read_exact(&mut buf)?;
        let int = u8::from_le_bytes(buf);
        Ok((buf.len(), Self(int)))
    }
}

/// Element type tags. The discriminants are the on-wire byte values.
#[repr(u8)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, FromPrimitive, ToPrimitive, Debug)]
pub enum BsonType {
    EndOfDocument = 0x00,
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Undefined = 0x06,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    RegularExpression = 0x0B,
    JavaScript = 0x0D,
    Symbol = 0x0E,
    JavaScriptWithScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}
impl TryFrom<BsonTypeInt> for BsonType {
    type Error = BsonError;
    fn try_from(int: BsonTypeInt) -> Result<Self> {
        BsonType::from_u8(int.0)
            .ok_or_else(|| BsonError::format(format!("Unknown BsonType 0x{:02x}.", int.0)))
    }
}
impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Binary subtypes this engine produces or accepts.
#[repr(u8)]
#[derive(PartialEq, Eq, Hash, Clone, Copy, FromPrimitive, ToPrimitive, Debug)]
pub enum BinarySubType {
    Binary = 0x00,
    Function = 0x01,
    OldBinary = 0x02,
    UuidLegacy = 0x03,
    UuidStandard = 0x04,
    Md5 = 0x05,
    UserDefined = 0x80,
}
impl BinarySubType {
    pub fn from_byte(byte: u8) -> Result<Self> {
        Self::from_u8(byte)
            .ok_or_else(|| BsonError::format(format!("Unknown binary subtype 0x{byte:02x}.")))
    }
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

use crate::error::{BsonError, Result};
use crate::values::hex;
use derive_more::From;
use std::fmt;
use std::str::FromStr;

/// A 12-byte identifier: 4-byte big-endian seconds timestamp, 3-byte machine
/// id, 2-byte process id, 3-byte big-endian counter.
#[derive(From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId([u8; ObjectId::LEN]);

impl ObjectId {
    pub const LEN: usize = 12;

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_parts(timestamp: u32, machine: u32, pid: u16, increment: u32) -> Self {
        let mut bytes = [0u8; Self::LEN];
        bytes[0..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..7].copy_from_slice(&machine.to_be_bytes()[1..4]);
        bytes[7..9].copy_from_slice(&pid.to_be_bytes());
        bytes[9..12].copy_from_slice(&increment.to_be_bytes()[1..4]);
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; Self::LEN] {
        self.0
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn parse_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        let bytes = <[u8; Self::LEN]>::try_from(bytes).map_err(|_| {
            BsonError::format(format!("'{s}' is not a valid 24 digit hex string."))
        })?;
        Ok(Self(bytes))
    }
}

impl FromStr for ObjectId {
    type Err = BsonError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

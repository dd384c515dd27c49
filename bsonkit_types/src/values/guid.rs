use crate::bson_type::BinarySubType;
use crate::error::{BsonError, Result};
use uuid::Uuid;

/// Byte order used when a GUID is stored as binary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GuidRepresentation {
    Unspecified,
    #[default]
    Standard,
    CSharpLegacy,
    JavaLegacy,
    PythonLegacy,
}

impl GuidRepresentation {
    pub fn sub_type(self) -> Result<BinarySubType> {
        match self {
            Self::Unspecified => Err(BsonError::invalid_operation(
                "GuidRepresentation is Unspecified; cannot choose a binary subtype.",
            )),
            Self::Standard => Ok(BinarySubType::UuidStandard),
            Self::CSharpLegacy | Self::JavaLegacy | Self::PythonLegacy => {
                Ok(BinarySubType::UuidLegacy)
            }
        }
    }
}

pub struct GuidConverter;

impl GuidConverter {
    pub fn to_bytes(guid: &Uuid, repr: GuidRepresentation) -> Result<[u8; 16]> {
        match repr {
            GuidRepresentation::Unspecified => Err(BsonError::invalid_operation(
                "Cannot convert a Guid to bytes with an Unspecified representation.",
            )),
            GuidRepresentation::Standard | GuidRepresentation::PythonLegacy => {
                Ok(*guid.as_bytes())
            }
            GuidRepresentation::CSharpLegacy => Ok(guid.to_bytes_le()),
            GuidRepresentation::JavaLegacy => Ok(java_order(*guid.as_bytes())),
        }
    }

    pub fn from_bytes(bytes: &[u8], repr: GuidRepresentation) -> Result<Uuid> {
        let bytes = <[u8; 16]>::try_from(bytes).map_err(|_| {
            BsonError::format(format!(
                "Expected length of a Guid to be 16, not {}.",
                bytes.len()
            ))
        })?;
        match repr {
            GuidRepresentation::Unspecified => Err(BsonError::invalid_operation(
                "Cannot convert bytes to a Guid with an Unspecified representation.",
            )),
            GuidRepresentation::Standard | GuidRepresentation::PythonLegacy => {
                Ok(Uuid::from_bytes(bytes))
            }
            GuidRepresentation::CSharpLegacy => Ok(Uuid::from_bytes_le(bytes)),
            GuidRepresentation::JavaLegacy => Ok(Uuid::from_bytes(java_order(bytes))),
        }
    }
}

/// Java's legacy driver stored each 8-byte half in reversed order.
fn java_order(mut bytes: [u8; 16]) -> [u8; 16] {
    bytes[0..8].reverse();
    bytes[8..16].reverse();
    bytes
}

use super::{cannot_deserialize, missing_element, next_element, unexpected_element, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::{BinarySubType, BsonError, BsonType, Result};
use fixedbitset::FixedBitSet;

/// A bit set as packed bytes, least significant bit first. When the length
/// is not a whole number of bytes, the bytes go in a document alongside the
/// length:
///
/// ```text
/// { "Length": <int32>, "Bytes": <binary> }
/// ```
///
/// The String form is one `0`/`1` character per bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitSetSerializer;

const LENGTH: &str = "Length";
const BYTES: &str = "Bytes";

impl ValueSerializer for BitSetSerializer {
    type Value = FixedBitSet;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &FixedBitSet,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<FixedBitSet>(options, BsonType::Binary)?;
        match repr.representation {
            BsonType::Binary if value.len() % 8 == 0 => {
                w.write_binary_data(&pack(value), BinarySubType::Binary)
            }
            BsonType::Binary => {
                let len = i32::try_from(value.len()).map_err(|_| {
                    BsonError::Serialization(format!("Bit set of length {} is too long.", value.len()))
                })?;
                w.write_start_document()?;
                w.write_name(LENGTH)?;
                w.write_int32(len)?;
                w.write_name(BYTES)?;
                w.write_binary_data(&pack(value), BinarySubType::Binary)?;
                w.write_end_document()
            }
            BsonType::String => {
                let text = (0..value.len())
                    .map(|i| if value.contains(i) { '1' } else { '0' })
                    .collect::<String>();
                w.write_string(&text)
            }
            other => Err(unsupported::<FixedBitSet>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<FixedBitSet> {
        match r.current_bson_type()? {
            BsonType::Binary => {
                let bytes = read_bytes(r)?;
                Ok(unpack(&bytes, bytes.len() * 8))
            }
            BsonType::Document => read_document(r),
            BsonType::String => {
                let text = r.read_string()?;
                let mut bits = FixedBitSet::with_capacity(text.len());
                for (i, c) in text.chars().enumerate() {
                    match c {
                        '0' => {}
                        '1' => bits.insert(i),
                        _ => {
                            return Err(BsonError::format(format!(
                                "Invalid bit '{}' in bit set text.",
                                c.escape_debug()
                            )))
                        }
                    }
                }
                Ok(bits)
            }
            other => Err(cannot_deserialize::<FixedBitSet>(other)),
        }
    }
}

fn pack(bits: &FixedBitSet) -> Vec<u8> {
    let mut bytes = vec![0u8; (bits.len() + 7) / 8];
    for i in bits.ones() {
        bytes[i / 8] |= 1 << (i % 8);
    }
    bytes
}

fn unpack(bytes: &[u8], len: usize) -> FixedBitSet {
    let mut bits = FixedBitSet::with_capacity(len);
    for i in 0..len {
        if bytes[i / 8] & (1 << (i % 8)) != 0 {
            bits.insert(i);
        }
    }
    bits
}

fn read_bytes(r: &mut dyn BsonReader) -> Result<Vec<u8>> {
    match r.read_binary_data()? {
        (bytes, BinarySubType::Binary | BinarySubType::OldBinary) => Ok(bytes),
        (_, sub_type) => Err(BsonError::format(format!(
            "Invalid binary sub type {sub_type:?} for a bit set."
        ))),
    }
}

fn read_document(r: &mut dyn BsonReader) -> Result<FixedBitSet> {
    let mut len = None;
    let mut bytes = None;
    r.read_start_document()?;
    while let Some((bson_type, name)) = next_element(r)? {
        match (name.as_str(), bson_type) {
            (LENGTH, BsonType::Int32) => len = Some(r.read_int32()?),
            (BYTES, BsonType::Binary) => bytes = Some(read_bytes(r)?),
            _ => return Err(unexpected_element::<FixedBitSet>(&name)),
        }
    }
    r.read_end_document()?;

    let len = len.ok_or_else(|| missing_element::<FixedBitSet>(LENGTH))?;
    let bytes = bytes.ok_or_else(|| missing_element::<FixedBitSet>(BYTES))?;
    let len = usize::try_from(len)
        .ok()
        .filter(|len| (len + 7) / 8 == bytes.len())
        .ok_or_else(|| {
            BsonError::format(format!("Bit set length {len} does not match {} bytes.", bytes.len()))
        })?;
    Ok(unpack(&bytes, len))
}

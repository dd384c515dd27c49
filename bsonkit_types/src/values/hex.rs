use crate::error::{BsonError, Result};
use itertools::Itertools;

pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).join("")
}

pub fn decode(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(BsonError::format(format!(
            "Invalid hex string '{s}': odd number of digits."
        )));
    }
    s.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = digit(pair[0], s)?;
            let lo = digit(pair[1], s)?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

fn digit(c: u8, s: &str) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(BsonError::format(format!(
            "Invalid hex string '{s}': '{}' is not a hex digit.",
            c as char
        ))),
    }
}

use serde_json::json;

use crate::error::ScaleError;
use crate::reader::ScaleReader;


/// One decoded item from the header digest.
///
/// The payload keeps the shape consumers see in the database: engine-tagged
/// items carry `{"engine": .., "data": "0x.."}`, the rest carry their raw
/// fields. The full input must be consumed, each log arrives as its own
/// hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestLog {
    pub index: u8,
    pub name: &'static str,
    pub data: serde_json::Value,
}


const LOG_NAMES: [&str; 7] = [
    "Other",
    "AuthoritiesChange",
    "ChangesTrieRoot",
    "SealV0",
    "Consensus",
    "Seal",
    "PreRuntime",
];


impl DigestLog {
    pub fn decode(bytes: &[u8]) -> Result<Self, ScaleError> {
        let mut input = ScaleReader::new(bytes);
        let index = input.byte()?;
        let data = match index {
            0 => {
                let raw = input.byte_string()?;
                json!({ "data": hex_0x(raw) })
            }
            1 => {
                let len = input.compact_len()?;
                let mut authorities = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    authorities.push(hex_0x(input.bytes(32)?));
                }
                json!(authorities)
            }
            2 => json!(hex_0x(input.bytes(32)?)),
            3 => {
                let slot = input.u64()?;
                let signature = input.bytes(64)?;
                json!({ "slot": slot, "signature": hex_0x(signature) })
            }
            4 | 5 | 6 => {
                let engine = engine_id(input.bytes(4)?);
                let raw = input.byte_string()?;
                json!({ "engine": engine, "data": hex_0x(raw) })
            }
            other => {
                return Err(ScaleError::invalid(format!(
                    "unknown digest item variant {other}"
                )))
            }
        };
        input.expect_end()?;
        Ok(DigestLog {
            index,
            name: LOG_NAMES[index as usize],
            data,
        })
    }
}


fn hex_0x(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}


/// Engine ids are four ASCII bytes on every production runtime; fall back
/// to hex if one is not printable.
fn engine_id(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if s.chars().all(|c| c.is_ascii_graphic()) => s.to_string(),
        _ => hex::encode(bytes),
    }
}

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};


pub type Name = &'static str;
pub type BlockNumber = u64;
pub type ItemIndex = u32;
pub type SpecVersion = u32;


#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockRef {
    pub number: BlockNumber,
    pub hash: String
}


impl BlockRef {
    pub fn new(number: BlockNumber, hash: impl Into<String>) -> Self {
        Self {
            number,
            hash: hash.into()
        }
    }

    pub fn set_hash(&mut self, hash: &str) {
        self.hash.clear();
        self.hash.push_str(hash)
    }
}


impl Display for BlockRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.number, self.hash)
    }
}


/// Strips an optional `0x` prefix from a hex literal.
pub fn unprefix(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}


pub fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(unprefix(value))
}


pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}


/// Parses a block height that may arrive either as a decimal string
/// or as a hex literal (the node reports header numbers as hex).
pub fn parse_block_number(value: &str) -> Result<BlockNumber, std::num::ParseIntError> {
    if let Some(hex) = value.strip_prefix("0x") {
        BlockNumber::from_str_radix(hex, 16)
    } else {
        value.parse()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_number_literals() {
        assert_eq!(parse_block_number("61181").unwrap(), 61181);
        assert_eq!(parse_block_number("0xeefd").unwrap(), 61181);
        assert_eq!(parse_block_number("0").unwrap(), 0);
        assert!(parse_block_number("0xzz").is_err());
    }

    #[test]
    fn hex_roundtrip() {
        assert_eq!(decode_hex("0x00ff").unwrap(), vec![0, 255]);
        assert_eq!(decode_hex("00ff").unwrap(), vec![0, 255]);
        assert_eq!(encode_hex(&[0, 255]), "0x00ff");
    }
}

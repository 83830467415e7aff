use crate::error::ScaleError;
use crate::reader::ScaleReader;


/// Legacy address envelope used by pre-MultiAddress runtimes.
///
/// The first byte selects the representation: `0xff` is a full 32 byte
/// account id, `0xfc`/`0xfd`/`0xfe` are 2/4/8 byte account indices and any
/// byte below `0xf0` is itself a one byte account index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Id([u8; 32]),
    Index(u64),
}


impl Address {
    pub fn decode(input: &mut ScaleReader<'_>) -> Result<Self, ScaleError> {
        let kind = input.byte()?;
        match kind {
            0xff => {
                let raw = input.bytes(32)?;
                let mut id = [0u8; 32];
                id.copy_from_slice(raw);
                Ok(Address::Id(id))
            }
            0xfe => Ok(Address::Index(input.u64()?)),
            0xfd => Ok(Address::Index(input.u32()? as u64)),
            0xfc => Ok(Address::Index(input.u16()? as u64)),
            b if b < 0xf0 => Ok(Address::Index(b as u64)),
            other => Err(ScaleError::invalid(format!(
                "reserved address prefix byte 0x{other:02x}"
            ))),
        }
    }

    /// Account id hex without `0x`, if this address carries one.
    pub fn account_id_hex(&self) -> Option<String> {
        match self {
            Address::Id(id) => Some(hex::encode(id)),
            Address::Index(_) => None,
        }
    }

    pub fn account_index(&self) -> Option<u64> {
        match self {
            Address::Id(_) => None,
            Address::Index(idx) => Some(*idx),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_account_id() {
        let mut raw = vec![0xff];
        raw.extend_from_slice(&[0xab; 32]);
        let mut input = ScaleReader::new(&raw);
        let address = Address::decode(&mut input).unwrap();
        assert_eq!(address, Address::Id([0xab; 32]));
        assert_eq!(address.account_id_hex().unwrap(), "ab".repeat(32));
        assert!(input.is_empty());
    }

    #[test]
    fn short_index_forms() {
        let mut input = ScaleReader::new(&[0x2a]);
        assert_eq!(Address::decode(&mut input).unwrap(), Address::Index(42));

        let mut input = ScaleReader::new(&[0xfc, 0x39, 0x30]);
        assert_eq!(Address::decode(&mut input).unwrap(), Address::Index(12345));

        let mut input = ScaleReader::new(&[0xfd, 0x15, 0xcd, 0x5b, 0x07]);
        assert_eq!(
            Address::decode(&mut input).unwrap(),
            Address::Index(123_456_789)
        );

        let mut input = ScaleReader::new(&[0xfe, 0, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(
            Address::decode(&mut input).unwrap(),
            Address::Index(1 << 32)
        );
    }

    #[test]
    fn reserved_prefix_is_rejected() {
        let mut input = ScaleReader::new(&[0xf0]);
        assert!(Address::decode(&mut input).is_err());
    }
}

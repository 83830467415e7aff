use crate::error::ScaleError;
use crate::reader::ScaleReader;


/// Slot claim from a `PreRuntime` digest with engine id `BABE`.
///
/// Primary and VRF secondary claims carry a VRF output and proof after the
/// slot, which vary between runtime versions, so only the leading fields
/// are read there. Plain secondary claims are exactly authority index plus
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BabePreDigest {
    pub kind: BabeClaimKind,
    pub authority_index: u32,
    pub slot_number: u64,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BabeClaimKind {
    Primary,
    SecondaryPlain,
    SecondaryVrf,
}


impl BabePreDigest {
    pub fn decode(bytes: &[u8]) -> Result<Self, ScaleError> {
        let mut input = ScaleReader::new(bytes);
        let kind = match input.byte()? {
            1 => BabeClaimKind::Primary,
            2 => BabeClaimKind::SecondaryPlain,
            3 => BabeClaimKind::SecondaryVrf,
            other => {
                return Err(ScaleError::invalid(format!(
                    "unknown babe pre-digest variant {other}"
                )))
            }
        };
        let authority_index = input.u32()?;
        let slot_number = input.u64()?;
        if kind == BabeClaimKind::SecondaryPlain {
            input.expect_end()?;
        }
        Ok(BabePreDigest {
            kind,
            authority_index,
            slot_number,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secondary_plain_claim() {
        let mut raw = vec![2];
        raw.extend_from_slice(&7u32.to_le_bytes());
        raw.extend_from_slice(&123_456u64.to_le_bytes());
        let digest = BabePreDigest::decode(&raw).unwrap();
        assert_eq!(digest.kind, BabeClaimKind::SecondaryPlain);
        assert_eq!(digest.authority_index, 7);
        assert_eq!(digest.slot_number, 123_456);
    }

    #[test]
    fn primary_claim_ignores_vrf_tail() {
        let mut raw = vec![1];
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&99u64.to_le_bytes());
        raw.extend_from_slice(&[0xaa; 96]);
        let digest = BabePreDigest::decode(&raw).unwrap();
        assert_eq!(digest.kind, BabeClaimKind::Primary);
        assert_eq!(digest.authority_index, 0);
    }

    #[test]
    fn trailing_bytes_on_secondary_plain_are_an_error() {
        let mut raw = vec![2];
        raw.extend_from_slice(&[0u8; 13]);
        assert!(BabePreDigest::decode(&raw).is_err());
    }
}

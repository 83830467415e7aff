use blake2::{Blake2b512, Digest};

use crate::error::ScaleError;


const CHECKSUM_CONTEXT: &[u8] = b"SS58PRE";


/// Encodes a 32 byte public key as an SS58 address for the given network.
pub fn ss58_encode(account_id: &[u8], network: u16) -> Result<String, ScaleError> {
    if account_id.len() != 32 {
        return Err(ScaleError::invalid(format!(
            "ss58 encoding expects a 32 byte account id, got {}",
            account_id.len()
        )));
    }
    if network > 0x3fff {
        return Err(ScaleError::invalid(format!(
            "ss58 network {network} out of range"
        )));
    }
    let mut data = Vec::with_capacity(2 + account_id.len() + 2);
    if network < 64 {
        data.push(network as u8);
    } else {
        // two byte form: 14 bit ident spread over 6+8 bits
        let first = ((network & 0b0000_0000_1111_1100) >> 2) as u8;
        let second = ((network >> 8) as u8) | (((network & 0b0000_0000_0000_0011) as u8) << 6);
        data.push(first | 0b0100_0000);
        data.push(second);
    }
    data.extend_from_slice(account_id);
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_CONTEXT);
    hasher.update(&data);
    let checksum = hasher.finalize();
    data.extend_from_slice(&checksum[..2]);
    Ok(bs58::encode(data).into_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_dev_account() {
        let account =
            hex::decode("d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d")
                .unwrap();
        assert_eq!(
            ss58_encode(&account, 42).unwrap(),
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
    }

    #[test]
    fn rejects_short_input() {
        assert!(ss58_encode(&[0u8; 20], 42).is_err());
    }
}

use std::hash::Hasher as _;

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Digest};

use crate::error::ScaleError;


type Blake2b256 = Blake2b<U32>;
type Blake2b128 = Blake2b<U16>;


pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Blake2b256::digest(data));
    out
}


pub fn blake2_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Blake2b128::digest(data));
    out
}


pub fn twox64(data: &[u8]) -> [u8; 8] {
    let mut hasher = twox_hash::XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish().to_le_bytes()
}


pub fn twox128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for seed in 0..2u64 {
        let mut hasher = twox_hash::XxHash64::with_seed(seed);
        hasher.write(data);
        out[seed as usize * 8..][..8].copy_from_slice(&hasher.finish().to_le_bytes());
    }
    out
}


pub fn twox256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for seed in 0..4u64 {
        let mut hasher = twox_hash::XxHash64::with_seed(seed);
        hasher.write(data);
        out[seed as usize * 8..][..8].copy_from_slice(&hasher.finish().to_le_bytes());
    }
    out
}


/// Applies a storage hasher, named as it appears in runtime metadata.
pub fn storage_hash(hasher: &str, data: &[u8]) -> Result<Vec<u8>, ScaleError> {
    match hasher {
        "Blake2_256" => Ok(blake2_256(data).to_vec()),
        "Blake2_128" => Ok(blake2_128(data).to_vec()),
        "Blake2_128Concat" => {
            let mut out = blake2_128(data).to_vec();
            out.extend_from_slice(data);
            Ok(out)
        }
        "Twox128" => Ok(twox128(data).to_vec()),
        "Twox256" => Ok(twox256(data).to_vec()),
        "Twox64Concat" => {
            let mut out = twox64(data).to_vec();
            out.extend_from_slice(data);
            Ok(out)
        }
        "Identity" => Ok(data.to_vec()),
        other => Err(ScaleError::invalid(format!(
            "unknown storage hasher `{other}`"
        ))),
    }
}


/// Pre-v9 storage key: a single hash over `prefix name params`.
///
/// Entries that predate the prefixed double-map layout hash the whole
/// space-joined string, with `Blake2_256` as the default hasher.
pub fn legacy_storage_key(
    prefix: &str,
    name: &str,
    params: &[u8],
    hasher: Option<&str>,
) -> Result<Vec<u8>, ScaleError> {
    let mut data = Vec::with_capacity(prefix.len() + name.len() + params.len() + 1);
    data.extend_from_slice(prefix.as_bytes());
    data.push(b' ');
    data.extend_from_slice(name.as_bytes());
    data.extend_from_slice(params);
    storage_hash(hasher.unwrap_or("Blake2_256"), &data)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twox128_of_empty_input() {
        // xxhash64 of "" with seeds 0 and 1, little endian
        assert_eq!(
            hex::encode(twox128(b"")),
            "99e9d85137db46ef4bbea33613baafd5"
        );
    }

    #[test]
    fn twox64_concat_keeps_the_key() {
        let hashed = storage_hash("Twox64Concat", &[0x2a]).unwrap();
        assert_eq!(hashed.len(), 8 + 1);
        assert_eq!(hashed[8], 0x2a);
    }

    #[test]
    fn blake2_128_concat_keeps_the_key() {
        let hashed = storage_hash("Blake2_128Concat", b"abc").unwrap();
        assert_eq!(hashed.len(), 16 + 3);
        assert_eq!(&hashed[16..], b"abc");
    }

    #[test]
    fn legacy_key_defaults_to_blake2_256() {
        let key = legacy_storage_key("System", "Events", &[], None).unwrap();
        assert_eq!(key, blake2_256(b"System Events").to_vec());
    }

    #[test]
    fn unknown_hasher_is_rejected() {
        assert!(storage_hash("Sha3", b"x").is_err());
    }
}

mod hash;
pub use hash::{hash_message, keccak256, MESSAGE_PREFIX};

use crate::types::Address;
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey};

/// Convert a public key to a Klaytn address
pub fn public_key_to_address(key: &PublicKey) -> Address {
    // false for uncompressed
    let uncompressed_pub_key = key.to_encoded_point(false);
    let public_key = uncompressed_pub_key.as_bytes();
    debug_assert_eq!(public_key[0], 0x04);
    let hash = keccak256(&public_key[1..]);
    Address::from_slice(&hash[12..])
}

/// Converts an address to its EIP-55 mixed-case checksum representation.
pub fn to_checksum(addr: &Address) -> String {
    let addr_hex = hex::encode(addr.as_bytes());
    let hash = keccak256(addr_hex.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in addr_hex.chars().enumerate() {
        let nibble = (hash[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses a `0x`-prefixed (or bare) hex address.
///
/// All-lowercase and all-uppercase inputs are accepted as is, mixed-case inputs must carry a
/// valid EIP-55 checksum. Returns `None` for anything else.
pub fn parse_checksummed(value: &str) -> Option<Address> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    if stripped.len() != 40 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return None
    }
    let bytes = hex::decode(stripped).ok()?;
    let address = Address::from_slice(&bytes);

    let has_lower = stripped.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = stripped.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address)[2..] != *stripped {
        return None
    }
    Some(address)
}

/// Strips a leading `0x` and decodes the remaining hex, accepting odd lengths.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    if stripped.len() % 2 == 1 {
        hex::decode(format!("0{stripped}"))
    } else {
        hex::decode(stripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::SecretKey;

    #[test]
    fn key_to_address() {
        let secret = SecretKey::from_slice(&hex_literal::hex!(
            "0000000000000000000000000000000000000000000000000000000000000001"
        ))
        .unwrap();
        assert_eq!(
            public_key_to_address(&secret.public_key()),
            "7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse::<Address>().unwrap()
        );
    }

    #[test]
    // test vectors from https://eips.ethereum.org/EIPS/eip-55
    fn checksum_roundtrip() {
        for addr in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let parsed = parse_checksummed(addr).unwrap();
            assert_eq!(to_checksum(&parsed), addr);
        }
    }

    #[test]
    fn rejects_bad_checksum_and_length() {
        assert!(parse_checksummed("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD").is_none());
        assert!(parse_checksummed("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_some());
        assert!(parse_checksummed("0x5aaeb6053f3e94c9b9a09f33669435e7ef1bea").is_none());
        assert!(parse_checksummed("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_none());
    }

    #[test]
    fn decodes_odd_length_hex() {
        assert_eq!(decode_hex("0x1").unwrap(), vec![0x01]);
        assert_eq!(decode_hex("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex("1e").unwrap(), vec![0x1e]);
    }
}

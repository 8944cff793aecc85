//! A single secp256k1 private key and the signatures it produces
use super::KeyringError;
use caver_core::{
    k256::{
        ecdsa::{RecoveryId, Signature, SigningKey},
        elliptic_curve::sec1::ToEncodedPoint,
        PublicKey,
    },
    rand::{CryptoRng, RngCore},
    types::{Address, SignatureData, H256, U256},
    utils::{decode_hex, public_key_to_address},
};
use std::{fmt, str::FromStr};

/// A secp256k1 private key together with the address derived from it.
#[derive(Clone)]
pub struct PrivateKey {
    signer: SigningKey,
    address: Address,
}

impl PrivateKey {
    /// Creates a new random key seeded with the provided RNG
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        SigningKey::random(rng).into()
    }

    /// Parses a 32 byte big-endian scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyringError> {
        Ok(SigningKey::from_slice(bytes)?.into())
    }

    /// The address derived from the public key, `keccak256(uncompressed[1..])[12..]`
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(self.signer.verifying_key())
    }

    /// SEC1 encoded public key, 33 bytes when `compress` is set and 65 bytes otherwise
    pub fn public_key_bytes(&self, compress: bool) -> Vec<u8> {
        self.public_key().to_encoded_point(compress).as_bytes().to_vec()
    }

    /// The 32 raw bytes of the key
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.signer.to_bytes());
        bytes
    }

    /// `0x` prefixed hex of the key
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Signs a transaction digest, folding the chain id into `v`:
    /// `v = recovery_id + chain_id * 2 + 35`.
    pub fn sign(&self, hash: H256, chain_id: u64) -> Result<SignatureData, KeyringError> {
        let (signature, recovery_id) = self.signer.sign_prehash_recoverable(hash.as_ref())?;
        let v = chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + recovery_id.to_byte() as u64))
            .ok_or(KeyringError::ChainIdOverflow(chain_id))?;
        Ok(to_signature_data(signature, v))
    }

    /// Signs an already prefixed message digest with `v = 27 + recovery_id`.
    pub fn sign_message(&self, message_hash: H256) -> Result<SignatureData, KeyringError> {
        let (signature, recovery_id): (Signature, RecoveryId) =
            self.signer.sign_prehash_recoverable(message_hash.as_ref())?;
        Ok(to_signature_data(signature, recovery_id.to_byte() as u64 + 27))
    }
}

fn to_signature_data(signature: Signature, v: u64) -> SignatureData {
    let (r, s) = signature.split_bytes();
    SignatureData::new(v, U256::from_big_endian(&r), U256::from_big_endian(&s))
}

impl From<SigningKey> for PrivateKey {
    fn from(signer: SigningKey) -> Self {
        let address = public_key_to_address(&PublicKey::from(signer.verifying_key()));
        Self { signer, address }
    }
}

impl FromStr for PrivateKey {
    type Err = KeyringError;

    /// Parses the hex of the key, with or without the `0x` prefix
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(src)?;
        if bytes.len() != 32 {
            return Err(KeyringError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )))
        }
        Self::from_bytes(&bytes)
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.signer.to_bytes().eq(&other.signer.to_bytes())
    }
}

impl Eq for PrivateKey {}

// do not log the key
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").field("address", &self.address).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caver_core::utils::hash_message;

    #[test]
    fn huge_chain_ids_are_refused() {
        let key: PrivateKey =
            "0000000000000000000000000000000000000000000000000000000000000001".parse().unwrap();
        assert!(matches!(
            key.sign(H256::repeat_byte(1), u64::MAX / 2),
            Err(KeyringError::ChainIdOverflow(id)) if id == u64::MAX / 2
        ));
        let signature = key.sign(H256::repeat_byte(1), u64::MAX / 2 - 18).unwrap();
        assert_eq!(signature.chain_id(), Some(u64::MAX / 2 - 18));
    }

    #[test]
    fn key_to_address() {
        let key: PrivateKey =
            "0000000000000000000000000000000000000000000000000000000000000001".parse().unwrap();
        assert_eq!(
            key.address(),
            Address::from_str("7E5F4552091A69125d5DfCb7b8C2659029395Bdf").expect("Decoding failed")
        );

        let key: PrivateKey =
            "0x0000000000000000000000000000000000000000000000000000000000000002".parse().unwrap();
        assert_eq!(
            key.address(),
            Address::from_str("2B5AD5c4795c026514f8317c7a215E218DcCD6cF").expect("Decoding failed")
        );
    }

    #[test]
    fn rejects_short_keys() {
        assert!(matches!(
            "0x0102".parse::<PrivateKey>(),
            Err(KeyringError::InvalidPrivateKey(_))
        ));
        assert!(matches!("0xzz".parse::<PrivateKey>(), Err(KeyringError::HexError(_))));
    }

    #[test]
    fn transaction_signature_carries_chain_id() {
        let key = PrivateKey::new(&mut caver_core::rand::thread_rng());
        let hash = H256::repeat_byte(0x42);
        let sig = key.sign(hash, 1001).unwrap();
        assert!(sig.v == 2037 || sig.v == 2038);
        assert_eq!(sig.chain_id(), Some(1001));
        assert_eq!(sig.recover(hash).unwrap(), key.address());
    }

    #[test]
    fn message_signature_uses_compact_v() {
        let key = PrivateKey::new(&mut caver_core::rand::thread_rng());
        let hash = hash_message("Some data");
        let sig = key.sign_message(hash).unwrap();
        assert!(sig.v == 27 || sig.v == 28);
        assert_eq!(sig.recover(hash).unwrap(), key.address());
    }

    #[test]
    fn public_key_encodings() {
        let key: PrivateKey =
            "45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8".parse().unwrap();
        assert_eq!(key.public_key_bytes(true).len(), 33);
        let uncompressed = key.public_key_bytes(false);
        assert_eq!(uncompressed.len(), 65);
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(key.to_hex(), "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8");
    }
}

use crate::{
    types::{Address, H256, U256},
    utils::{decode_hex, keccak256},
};
use k256::{
    ecdsa::{Error as K256SignatureError, RecoveryId, Signature as K256Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey as K256PublicKey,
};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::TryFrom, fmt};
use thiserror::Error;

/// An error involving a signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// A signature must consist of exactly `[v, r, s]`, with `r` and `s` at most 32 bytes
    #[error("invalid signature shape: {0}")]
    InvalidSignatureShape(String),
    /// When parsing a signature component from hex
    #[error(transparent)]
    DecodingError(#[from] hex::FromHexError),
    /// Internal error during signature recovery
    #[error(transparent)]
    K256Error(#[from] K256SignatureError),
    /// The `v` value does not carry a recovery id
    #[error("cannot derive a recovery id from v = {0}")]
    InvalidV(u64),
    /// The empty placeholder signature cannot be recovered
    #[error("cannot recover the signer of an empty signature")]
    EmptySignature,
}

/// A `(v, r, s)` signature triple as it is carried by Klaytn transactions.
///
/// `v` is either the compact recovery id (`27`/`28`, message signatures) or the chain id
/// encoded value `recovery_id + chain_id * 2 + 35` (transaction signatures). `r` and `s` are
/// RLP encoded with their leading zeros stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureData {
    /// V value
    pub v: u64,
    /// R value
    pub r: U256,
    /// S Value
    pub s: U256,
}

impl SignatureData {
    /// Creates a signature from its components
    pub fn new(v: u64, r: U256, s: U256) -> Self {
        Self { v, r, s }
    }

    /// The placeholder `[0x01, 0x, 0x]` carried by unsigned transactions
    pub const fn empty() -> Self {
        Self { v: 1, r: U256([0; 4]), s: U256([0; 4]) }
    }

    /// Returns true if this is the unsigned placeholder
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Builds a signature out of raw big-endian components.
    pub fn from_parts(v: &[u8], r: &[u8], s: &[u8]) -> Result<Self, SignatureError> {
        if v.len() > 8 || r.len() > 32 || s.len() > 32 {
            return Err(SignatureError::InvalidSignatureShape(format!(
                "component lengths v={}, r={}, s={}",
                v.len(),
                r.len(),
                s.len()
            )))
        }
        let v = v.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
        Ok(Self { v, r: U256::from_big_endian(r), s: U256::from_big_endian(s) })
    }

    /// The RLP encoding of the `[v, r, s]` list
    pub fn encode(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }

    /// Recovers the address which produced this signature over `hash`.
    pub fn recover<H: Into<H256>>(&self, hash: H) -> Result<Address, SignatureError> {
        let public_key = self.recover_public_key(hash)?;
        let public_key = public_key.to_encoded_point(/* compress = */ false);
        let public_key = public_key.as_bytes();
        debug_assert_eq!(public_key[0], 0x04);
        let hash = keccak256(&public_key[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }

    /// Recovers the public key which produced this signature over `hash`.
    pub fn recover_public_key<H: Into<H256>>(
        &self,
        hash: H,
    ) -> Result<K256PublicKey, SignatureError> {
        if self.is_empty() {
            return Err(SignatureError::EmptySignature)
        }
        let hash = hash.into();
        let (signature, recovery_id) = self.as_signature()?;
        let verify_key =
            VerifyingKey::recover_from_prehash(hash.as_ref(), &signature, recovery_id)?;
        Ok(K256PublicKey::from(&verify_key))
    }

    /// Retrieve the recovery ID.
    pub fn recovery_id(&self) -> Result<RecoveryId, SignatureError> {
        let standard_v = match self.v {
            0 | 27 => 0,
            1 | 28 => 1,
            v if v >= 35 => ((v - 35) % 2) as u8,
            v => return Err(SignatureError::InvalidV(v)),
        };
        RecoveryId::from_byte(standard_v).ok_or(SignatureError::InvalidV(self.v))
    }

    /// The chain id folded into `v`, if any
    pub fn chain_id(&self) -> Option<u64> {
        if self.v >= 35 {
            return Some((self.v - 35) >> 1)
        }
        None
    }

    fn as_signature(&self) -> Result<(K256Signature, RecoveryId), SignatureError> {
        let recovery_id = self.recovery_id()?;
        let mut r_bytes = [0u8; 32];
        let mut s_bytes = [0u8; 32];
        self.r.to_big_endian(&mut r_bytes);
        self.s.to_big_endian(&mut s_bytes);
        let signature = K256Signature::from_scalars(r_bytes, s_bytes)?;
        Ok((signature, recovery_id))
    }

    fn to_hex_parts(self) -> [String; 3] {
        [u64_to_hex(self.v), u256_to_hex(self.r), u256_to_hex(self.s)]
    }
}

impl Default for SignatureData {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for SignatureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        self.r.to_big_endian(&mut r);
        self.s.to_big_endian(&mut s);
        write!(f, "{}{}{}", u64_to_hex(self.v), hex::encode(r), hex::encode(s))
    }
}

impl Encodable for SignatureData {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.v);
        s.append(&self.r);
        s.append(&self.s);
    }
}

impl Decodable for SignatureData {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen)
        }
        Ok(Self { v: rlp.val_at(0)?, r: rlp.val_at(1)?, s: rlp.val_at(2)? })
    }
}

impl<'a, S: AsRef<str>> TryFrom<&'a [S]> for SignatureData {
    type Error = SignatureError;

    /// Parses `[v, r, s]` hex strings, `"0x"` standing for an empty component
    fn try_from(parts: &'a [S]) -> Result<Self, Self::Error> {
        if parts.len() != 3 {
            return Err(SignatureError::InvalidSignatureShape(format!(
                "expected [v, r, s], got {} elements",
                parts.len()
            )))
        }
        let v = decode_hex(parts[0].as_ref())?;
        let r = decode_hex(parts[1].as_ref())?;
        let s = decode_hex(parts[2].as_ref())?;
        Self::from_parts(&v, &r, &s)
    }
}

impl<S: AsRef<str>> TryFrom<[S; 3]> for SignatureData {
    type Error = SignatureError;

    fn try_from(parts: [S; 3]) -> Result<Self, Self::Error> {
        Self::try_from(&parts[..])
    }
}

impl Serialize for SignatureData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_hex_parts().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SignatureData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = Vec::<String>::deserialize(deserializer)?;
        Self::try_from(&parts[..]).map_err(D::Error::custom)
    }
}

fn u64_to_hex(value: u64) -> String {
    let hex = format!("{value:x}");
    if hex.len() % 2 == 1 {
        format!("0x0{hex}")
    } else {
        format!("0x{hex}")
    }
}

fn u256_to_hex(value: U256) -> String {
    if value.is_zero() {
        return "0x".to_owned()
    }
    let hex = format!("{value:x}");
    if hex.len() % 2 == 1 {
        format!("0x0{hex}")
    } else {
        format!("0x{hex}")
    }
}

/// One signature or a list of signatures, the two shapes accepted when attaching signatures to
/// a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureSet {
    /// A single `[v, r, s]` triple
    Single(SignatureData),
    /// A list of `[[v, r, s], ...]` triples
    Multiple(Vec<SignatureData>),
}

impl SignatureSet {
    /// Number of signatures in the set
    pub fn len(&self) -> usize {
        match self {
            SignatureSet::Single(_) => 1,
            SignatureSet::Multiple(sigs) => sigs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the set into a list
    pub fn into_vec(self) -> Vec<SignatureData> {
        match self {
            SignatureSet::Single(sig) => vec![sig],
            SignatureSet::Multiple(sigs) => sigs,
        }
    }

    /// Parses either a flat `["0x..", "0x..", "0x.."]` or a nested `[["0x..", ..], ..]` JSON array
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SignatureError> {
        let shape_error = || {
            SignatureError::InvalidSignatureShape(format!("expected a signature array, got {value}"))
        };
        let items = value.as_array().ok_or_else(shape_error)?;
        if items.iter().all(|item| item.is_string()) && !items.is_empty() {
            let parts = items.iter().filter_map(|item| item.as_str()).collect::<Vec<_>>();
            return Ok(SignatureSet::Single(SignatureData::try_from(&parts[..])?))
        }
        items
            .iter()
            .map(|item| {
                let parts = item
                    .as_array()
                    .ok_or_else(shape_error)?
                    .iter()
                    .map(|part| part.as_str().ok_or_else(shape_error))
                    .collect::<Result<Vec<_>, _>>()?;
                SignatureData::try_from(&parts[..])
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SignatureSet::Multiple)
    }
}

impl From<SignatureData> for SignatureSet {
    fn from(sig: SignatureData) -> Self {
        SignatureSet::Single(sig)
    }
}

impl From<Vec<SignatureData>> for SignatureSet {
    fn from(sigs: Vec<SignatureData>) -> Self {
        SignatureSet::Multiple(sigs)
    }
}

impl From<&[SignatureData]> for SignatureSet {
    fn from(sigs: &[SignatureData]) -> Self {
        SignatureSet::Multiple(sigs.to_vec())
    }
}

impl IntoIterator for SignatureSet {
    type Item = SignatureData;
    type IntoIter = std::vec::IntoIter<SignatureData>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

/// Appends `incoming` to `existing`, skipping empty placeholders and signatures already present.
pub(crate) fn merge_signatures(
    existing: &mut Vec<SignatureData>,
    incoming: impl IntoIterator<Item = SignatureData>,
) {
    for sig in incoming {
        if !sig.is_empty() && !existing.contains(&sig) {
            existing.push(sig);
        }
    }
}

/// Appends the RLP list of signatures, the empty placeholder standing in for an empty list.
pub(crate) fn rlp_append_signatures(s: &mut RlpStream, signatures: &[SignatureData]) {
    if signatures.is_empty() {
        s.begin_list(1);
        s.append(&SignatureData::empty());
    } else {
        s.append_list::<SignatureData, _>(signatures);
    }
}

/// Decodes a signature list, dropping the empty placeholders.
pub(crate) fn decode_signatures(rlp: &Rlp) -> Result<Vec<SignatureData>, DecoderError> {
    let mut signatures = Vec::new();
    merge_signatures(&mut signatures, rlp.as_list::<SignatureData>()?);
    Ok(signatures)
}

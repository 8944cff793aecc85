//! Account keys carried by account update transactions.
use crate::types::{Bytes, Role};
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey};
use rlp::{DecoderError, Rlp, RlpStream};
use thiserror::Error;

const NIL_TAG: u8 = 0x80;
const LEGACY_TAG: u8 = 0x01;
const PUBLIC_TAG: u8 = 0x02;
const FAIL_TAG: u8 = 0x03;
const WEIGHTED_MULTISIG_TAG: u8 = 0x04;
const ROLE_BASED_TAG: u8 = 0x05;

/// Maximum number of keys a weighted multisig key may hold
pub const MAX_MULTISIG_KEYS: usize = 10;

/// An error involving an account key.
#[derive(Debug, Error)]
pub enum AccountKeyError {
    /// The encoding starts with a tag no account key uses
    #[error("unknown account key tag {0:#04x}")]
    UnknownTag(u8),
    /// The encoding is empty
    #[error("empty account key encoding")]
    Empty,
    /// A public key is not a valid secp256k1 point
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    /// The threshold is zero or above the sum of all weights
    #[error("invalid threshold {threshold}, the sum of all weights is {total}")]
    InvalidThreshold { threshold: u64, total: u64 },
    /// The weights of a weighted multisig key add up past `u64::MAX`
    #[error("the weights of the multisig key overflow")]
    WeightOverflow,
    /// Weighted multisig holds no keys, or more than allowed
    #[error("a weighted multisig key must hold between 1 and {MAX_MULTISIG_KEYS} keys, got {0}")]
    InvalidKeyCount(usize),
    /// A role-based key must hold one to three role keys, none of them role-based
    #[error("invalid role-based key: {0}")]
    InvalidRoleBasedKey(&'static str),
    /// The nil key only exists inside a role-based key
    #[error("the nil key cannot be used as an account key on its own")]
    NilAccountKey,
    /// When decoding the RLP payload
    #[error(transparent)]
    DecodingError(#[from] DecoderError),
}

/// A public key together with its weight in a weighted multisig key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedPublicKey {
    pub weight: u64,
    pub key: PublicKey,
}

/// A weighted multisig key, valid once the weights of the signing keys reach the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedMultiSig {
    pub threshold: u64,
    pub keys: Vec<WeightedPublicKey>,
}

impl WeightedMultiSig {
    /// Creates a weighted multisig key, checking the threshold against the weights
    pub fn new(threshold: u64, keys: Vec<WeightedPublicKey>) -> Result<Self, AccountKeyError> {
        let key = Self { threshold, keys };
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<(), AccountKeyError> {
        if self.keys.is_empty() || self.keys.len() > MAX_MULTISIG_KEYS {
            return Err(AccountKeyError::InvalidKeyCount(self.keys.len()))
        }
        let total = self
            .keys
            .iter()
            .try_fold(0u64, |total, k| total.checked_add(k.weight))
            .ok_or(AccountKeyError::WeightOverflow)?;
        if self.threshold == 0 || self.threshold > total {
            return Err(AccountKeyError::InvalidThreshold { threshold: self.threshold, total })
        }
        Ok(())
    }
}

/// The key configuration of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKey {
    /// Leaves a role untouched inside a role-based key
    Nil,
    /// The key is derived from the address
    Legacy,
    /// A single public key
    Public(PublicKey),
    /// No signature is ever valid for the account
    Fail,
    /// Several weighted public keys
    WeightedMultiSig(WeightedMultiSig),
    /// One key per role, ordered as [`Role::ALL`]
    RoleBased(Vec<AccountKey>),
}

impl AccountKey {
    /// Creates a role-based key, checking it holds one to three non role-based keys
    pub fn role_based(keys: Vec<AccountKey>) -> Result<Self, AccountKeyError> {
        let key = AccountKey::RoleBased(keys);
        key.validate()?;
        Ok(key)
    }

    /// Checks the structural rules of the key
    pub fn validate(&self) -> Result<(), AccountKeyError> {
        match self {
            AccountKey::WeightedMultiSig(multisig) => multisig.validate(),
            AccountKey::RoleBased(keys) => {
                if keys.is_empty() || keys.len() > Role::COUNT {
                    return Err(AccountKeyError::InvalidRoleBasedKey("expected 1 to 3 role keys"))
                }
                for key in keys {
                    if matches!(key, AccountKey::RoleBased(_)) {
                        return Err(AccountKeyError::InvalidRoleBasedKey(
                            "role keys cannot be role-based",
                        ))
                    }
                    key.validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Returns the tag-prefixed RLP encoding of the key
    pub fn rlp_encoding(&self) -> Bytes {
        let mut out = Vec::new();
        match self {
            AccountKey::Nil => out.push(NIL_TAG),
            AccountKey::Legacy => {
                out.push(LEGACY_TAG);
                out.extend_from_slice(&RlpStream::new_list(0).out());
            }
            AccountKey::Fail => {
                out.push(FAIL_TAG);
                out.extend_from_slice(&RlpStream::new_list(0).out());
            }
            AccountKey::Public(key) => {
                out.push(PUBLIC_TAG);
                out.extend_from_slice(&rlp::encode(&compressed(key)));
            }
            AccountKey::WeightedMultiSig(multisig) => {
                out.push(WEIGHTED_MULTISIG_TAG);
                let mut rlp = RlpStream::new_list(2);
                rlp.append(&multisig.threshold);
                rlp.begin_list(multisig.keys.len());
                for weighted in &multisig.keys {
                    rlp.begin_list(2);
                    rlp.append(&weighted.weight);
                    rlp.append(&compressed(&weighted.key));
                }
                out.extend_from_slice(&rlp.out());
            }
            AccountKey::RoleBased(keys) => {
                out.push(ROLE_BASED_TAG);
                let mut rlp = RlpStream::new_list(keys.len());
                for key in keys {
                    rlp.append(&key.rlp_encoding().to_vec());
                }
                out.extend_from_slice(&rlp.out());
            }
        }
        out.into()
    }

    /// Decodes a tag-prefixed account key
    pub fn decode(encoded: &[u8]) -> Result<Self, AccountKeyError> {
        let (tag, payload) = encoded.split_first().ok_or(AccountKeyError::Empty)?;
        let key = match *tag {
            NIL_TAG if payload.is_empty() => AccountKey::Nil,
            LEGACY_TAG => {
                expect_empty_list(payload)?;
                AccountKey::Legacy
            }
            FAIL_TAG => {
                expect_empty_list(payload)?;
                AccountKey::Fail
            }
            PUBLIC_TAG => {
                let rlp = Rlp::new(payload);
                AccountKey::Public(parse_public_key(rlp.data()?)?)
            }
            WEIGHTED_MULTISIG_TAG => {
                let rlp = Rlp::new(payload);
                let threshold: u64 = rlp.val_at(0)?;
                let keys = rlp
                    .at(1)?
                    .iter()
                    .map(|item| {
                        Ok(WeightedPublicKey {
                            weight: item.val_at(0)?,
                            key: parse_public_key(item.at(1)?.data()?)?,
                        })
                    })
                    .collect::<Result<Vec<_>, AccountKeyError>>()?;
                AccountKey::WeightedMultiSig(WeightedMultiSig { threshold, keys })
            }
            ROLE_BASED_TAG => {
                let rlp = Rlp::new(payload);
                let keys = rlp
                    .iter()
                    .map(|item| AccountKey::decode(item.data()?))
                    .collect::<Result<Vec<_>, _>>()?;
                AccountKey::RoleBased(keys)
            }
            other => return Err(AccountKeyError::UnknownTag(other)),
        };
        key.validate()?;
        Ok(key)
    }
}

fn compressed(key: &PublicKey) -> Vec<u8> {
    key.to_encoded_point(true).as_bytes().to_vec()
}

fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, AccountKeyError> {
    PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| AccountKeyError::InvalidPublicKey(format!("0x{}", hex::encode(bytes))))
}

fn expect_empty_list(payload: &[u8]) -> Result<(), AccountKeyError> {
    let rlp = Rlp::new(payload);
    if !rlp.is_list() || rlp.item_count()? != 0 {
        return Err(DecoderError::RlpExpectedToBeList.into())
    }
    Ok(())
}

//! The digests signed by the sender and by the fee payer of a transaction
use super::{typed::TypedTransaction, TransactionError};
use crate::{types::H256, utils::keccak256};

/// A function computing the digest to sign in place of the default one
pub type CustomHasher = fn(&TypedTransaction) -> Result<H256, TransactionError>;

/// Where the digest to sign comes from.
#[derive(Clone, Copy, Default)]
pub enum HashSource {
    /// `keccak256` of the role's signature payload
    #[default]
    Default,
    /// A caller supplied hasher
    Custom(CustomHasher),
}

impl std::fmt::Debug for HashSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashSource::Default => f.write_str("Default"),
            HashSource::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Computes the digests signed over a transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionHasher;

impl TransactionHasher {
    /// The digest the sender signs: `keccak256(RLP([common, chainId, 0, 0]))`
    pub fn sender_hash(
        tx: &TypedTransaction,
        source: HashSource,
    ) -> Result<H256, TransactionError> {
        match source {
            HashSource::Default => Ok(keccak256(tx.rlp_encoding_for_signature()?).into()),
            HashSource::Custom(hasher) => hasher(tx),
        }
    }

    /// The digest the fee payer signs: `keccak256(RLP([common, feePayer, chainId, 0, 0]))`
    pub fn fee_payer_hash(
        tx: &TypedTransaction,
        source: HashSource,
    ) -> Result<H256, TransactionError> {
        match source {
            HashSource::Default => {
                Ok(keccak256(tx.rlp_encoding_for_fee_payer_signature()?).into())
            }
            HashSource::Custom(hasher) => hasher(tx),
        }
    }
}

// Re-export common datatypes with more specific names

/// A transaction Hash
pub use ethereum_types::H256 as TxHash;

pub use ethereum_types::{Address, H160, H256, U128, U256, U64};

mod bytes;
pub use self::bytes::{deserialize_bytes, serialize_bytes, Bytes, ParseBytesError};

mod signature;
pub use signature::{SignatureData, SignatureError, SignatureSet};

mod account_key;
pub use account_key::{AccountKey, AccountKeyError, WeightedMultiSig, WeightedPublicKey};

mod role;
pub use role::Role;

pub mod transaction;
pub use transaction::{
    hasher::{HashSource, TransactionHasher},
    typed::TypedTransaction,
    TransactionError, TxFields, TxType,
};

//! Provides keyrings and a unified interface for signing Klaytn transactions.
//!
//! A [`Keyring`] holds the keys of one account: a single key, the keys of a weighted multisig
//! account, or one key list per [`Role`](caver_core::types::Role). Transactions are signed as
//! their sender or, for fee-delegated transactions, as their fee payer; the role of the
//! signature decides which keys sign.
//!
//! You can implement the `Signer` trait to extend functionality to other signers
//! such as Hardware Security Modules, KMS etc.
//!
//! ```no_run
//! # use caver_core::types::{transaction::{FeeDelegatedWithRatio, FeeRatio, TxFields, ValueTransferMemo}, TypedTransaction};
//! # use caver_signers::{Keyring, Signer};
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let sender: Keyring = "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8".parse()?;
//! let fee_payer = Keyring::generate(&mut caver_core::rand::thread_rng());
//!
//! let fields = TxFields::new(sender.address(), 100_000u64)
//!     .nonce(0u64)
//!     .gas_price(25_000_000_000u64)
//!     .chain_id(1001u64);
//! let memo = ValueTransferMemo::new("0x7b65b75d204abed71587c9e519a89277766ee1d0".parse()?, 10u64, b"hello".to_vec());
//! let mut tx: TypedTransaction = FeeDelegatedWithRatio::new(fields, memo, FeeRatio::new(30)?)?.into();
//!
//! sender.sign_transaction(&mut tx).await?;
//! fee_payer.sign_transaction_as_fee_payer(&mut tx).await?;
//! let raw = tx.raw_transaction()?;
//! # Ok(())
//! # }
//! ```
mod keyring;
pub use keyring::{
    Keyring, KeyringError, MessageSigned, MultipleKeyring, PrivateKey, RoleBasedKeyring,
    SingleKeyring, WeightedMultiSigOptions,
};

mod keystore;
pub use keystore::{
    CipherparamsJson, CryptoJson, Kdf, KdfType, KdfparamsType, Keystore, KeystoreError,
    KeystoreOptions, KeystoreVersion, KeyringJson,
};

mod transaction;

use async_trait::async_trait;
use caver_core::types::{Address, TypedTransaction};
use std::error::Error;

/// Trait for signing transactions and messages
///
/// Implement this trait to support different signing modes, e.g. Ledger, hosted etc.
#[async_trait]
pub trait Signer: std::fmt::Debug + Send + Sync {
    type Error: Error + Send + Sync;

    /// Signs the hash of the provided message after prefixing it
    async fn sign_message<S: Send + Sync + AsRef<[u8]>>(
        &self,
        message: S,
    ) -> Result<MessageSigned, Self::Error>;

    /// Signs the transaction as its sender, appending the signatures to it
    async fn sign_transaction(&self, tx: &mut TypedTransaction) -> Result<(), Self::Error>;

    /// Signs a fee-delegated transaction as its fee payer, appending the signatures to it
    async fn sign_transaction_as_fee_payer(
        &self,
        tx: &mut TypedTransaction,
    ) -> Result<(), Self::Error>;

    /// Returns the signer's Klaytn address
    fn address(&self) -> Address;
}

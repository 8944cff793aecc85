#![cfg_attr(docsrs, feature(doc_cfg))]
//! # caver-rs
//!
//! Build, sign and combine Klaytn transactions: the legacy transaction and the typed
//! transactions in their basic, fee-delegated and fee-delegated-with-ratio forms.
//!
//! A prelude is provided which imports all the important things for you.
//!
//! ```
//! use caver::prelude::*;
//!
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let sender: Keyring = "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8".parse()?;
//! let fee_payer = Keyring::generate(&mut caver::core::rand::thread_rng());
//!
//! let (provider, mock) = Provider::mocked();
//! mock.push(U256::from(25_000_000_000u64))?;
//! mock.push(U256::zero())?;
//! mock.push(U64::from(1001))?;
//!
//! let memo = ValueTransferMemo::new("0x7b65b75d204abed71587c9e519a89277766ee1d0".parse()?, 10u64, b"hello".to_vec());
//! let mut tx: TypedTransaction =
//!     FeeDelegatedWithRatio::new(TxFields::new(sender.address(), 100_000u64), memo, FeeRatio::new(30)?)?.into();
//!
//! provider.fill_transaction(&mut tx).await?;
//! sender.sign_transaction(&mut tx).await?;
//! fee_payer.sign_transaction_as_fee_payer(&mut tx).await?;
//!
//! let raw = tx.raw_transaction()?;
//! assert!(raw.starts_with("0x12"));
//! # Ok(())
//! # }
//! ```

/// # Klaytn types, transactions and utilities
///
/// Primitives, signatures, account keys, every transaction type with its RLP layout, the
/// sender and fee payer digests and combination of signed raw transactions.
pub mod core {
    pub use caver_core::*;
}

/// # Keyrings and signing
///
/// Single, multiple and role-based keyrings, KlaytnWalletKey, keystore V3/V4 and the
/// [`Signer`](caver_signers::Signer) trait signing transactions as sender or fee payer.
pub mod signers {
    pub use caver_signers::*;
}

/// # Node access
///
/// The [`NodeProvider`](caver_providers::NodeProvider) contract filling gas price, nonce and
/// chain id, a JSON-RPC provider over any transport and a mock transport.
pub mod providers {
    pub use caver_providers::*;
}

/// Easy imports of frequently used type definitions and traits
pub mod prelude {
    pub use super::core::types::{
        transaction::{
            hasher::{HashSource, TransactionHasher},
            AccountUpdate, Basic, Cancel, ChainDataAnchoring, Envelope, FeeDelegated,
            FeeDelegatedWithRatio, FeeRatio, LegacyTransaction, SmartContractDeploy,
            SmartContractExecution, TxFields, ValueTransfer, ValueTransferMemo,
        },
        *,
    };

    pub use super::providers::*;

    pub use super::signers::*;
}

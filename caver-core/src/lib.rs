#![cfg_attr(docsrs, feature(doc_cfg))]
//! Klaytn types, transaction codecs and utilities.
//!
//! This library provides the transaction family of the Klaytn ledger: the
//! legacy transaction, the basic typed transactions and their fee-delegated
//! (optionally fee-ratio) forms, each with its exact RLP layout. Every typed
//! transaction exposes the hash its sender signs, the hash its fee payer signs
//! and the final transaction hash.
//!
//! ## Building and encoding a transaction
//!
//! ```rust
//! use caver_core::types::{
//!     transaction::{Basic, TxFields, ValueTransfer},
//!     Address, TypedTransaction,
//! };
//!
//! # fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let from: Address = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b".parse()?;
//! let to: Address = "0x7b65b75d204abed71587c9e519a89277766ee1d0".parse()?;
//!
//! let fields = TxFields::new(from, 21_000u64).nonce(0u64).gas_price(25_000_000_000u64).chain_id(1001u64);
//! let tx: TypedTransaction = Basic::new(fields, ValueTransfer::new(to, 1u64))?.into();
//!
//! // unsigned transactions still encode, carrying the empty signature placeholder
//! let raw = tx.rlp_encoding()?;
//! assert_eq!(raw.as_ref()[0], 0x08);
//! # Ok(())
//! # }
//! ```
//!
//! ## Signing messages
//!
//! Messages are signed over `keccak256("\x19Klaytn Signed Message:\n" + len + message)`,
//! see [`utils::hash_message`].
pub mod types;

/// Various utilities
pub mod utils;

// re-export rand to avoid potential confusion when there's rand version mismatches
pub use rand;

// re-export k256
pub use k256;

// re-export the rlp engine used by all transaction layouts
pub use rlp;

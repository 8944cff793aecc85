#![cfg_attr(docsrs, feature(doc_cfg))]
//! Access to a Klaytn node for the values a transaction needs before it can be signed.
//!
//! [`NodeProvider`] is the node contract: gas price, pending nonce and chain id.
//! [`NodeProvider::fill_transaction`] queries exactly the values a transaction is missing.
//! [`Provider`] implements the contract over any [`JsonRpcClient`] transport; this crate ships
//! the [`MockProvider`] transport for tests and leaves network transports to the caller.
//!
//! ```
//! use caver_core::types::{transaction::{Basic, TxFields, ValueTransfer}, Address, TypedTransaction, U256, U64};
//! use caver_providers::{NodeProvider, Provider};
//!
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let (provider, mock) = Provider::mocked();
//! mock.push(U256::from(25_000_000_000u64))?;
//! mock.push(U256::from(7))?;
//! mock.push(U64::from(1001))?;
//!
//! let from = Address::repeat_byte(1);
//! let mut tx: TypedTransaction =
//!     Basic::new(TxFields::new(from, 21_000u64), ValueTransfer::new(Address::repeat_byte(2), 1u64))?.into();
//! provider.fill_transaction(&mut tx).await?;
//! assert_eq!(tx.fields().nonce, Some(U256::from(7)));
//! # Ok(())
//! # }
//! ```
mod errors;
pub use errors::ProviderError;

mod provider;
pub use provider::Provider;

mod mock;
pub use mock::{JsonRpcError, MockError, MockProvider, MockResponse};

use async_trait::async_trait;
use caver_core::types::{Address, TransactionError, TypedTransaction, U256, U64};
use serde::{de::DeserializeOwned, Serialize};
use std::{error::Error, fmt::Debug};
use tracing::debug;

#[async_trait]
/// Trait which must be implemented by data transports to be used with the Klaytn
/// JSON-RPC provider.
pub trait JsonRpcClient: Debug + Send + Sync {
    /// A JSON-RPC Error
    type Error: Error + Into<ProviderError>;

    /// Sends a request with the provided JSON-RPC and parameters serialized as JSON
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned;
}

/// The node queries a transaction depends on.
#[async_trait]
pub trait NodeProvider: Debug + Send + Sync {
    type Error: Error + Send + Sync + From<TransactionError>;

    /// The unit price of gas
    async fn get_gas_price(&self) -> Result<U256, Self::Error>;

    /// The nonce of the next transaction of `address`, pending transactions included
    async fn get_transaction_count(&self, address: Address) -> Result<U256, Self::Error>;

    async fn get_chain_id(&self) -> Result<U64, Self::Error>;

    /// Queries the node for the `gasPrice`, `nonce` and `chainId` the transaction lacks, in
    /// that order. Values already present are neither queried nor overwritten.
    ///
    /// The nonce is looked up by sender: a legacy transaction without sender fails with
    /// [`TransactionError::MissingField`] before any query is made.
    async fn fill_transaction(&self, tx: &mut TypedTransaction) -> Result<(), Self::Error> {
        let from = tx.from();
        if tx.fields().nonce.is_none() && from.is_zero() {
            return Err(TransactionError::MissingField("from".to_owned()).into())
        }

        if tx.fields().gas_price.is_none() {
            let gas_price = self.get_gas_price().await?;
            debug!(%gas_price, "filled gasPrice");
            tx.fields_mut().gas_price = Some(gas_price);
        }
        if tx.fields().nonce.is_none() {
            let nonce = self.get_transaction_count(from).await?;
            debug!(%nonce, ?from, "filled nonce");
            tx.fields_mut().nonce = Some(nonce);
        }
        if tx.fields().chain_id.is_none() {
            let chain_id = self.get_chain_id().await?;
            debug!(%chain_id, "filled chainId");
            tx.fields_mut().chain_id = Some(chain_id);
        }
        Ok(())
    }
}

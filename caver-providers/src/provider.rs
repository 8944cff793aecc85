use crate::{JsonRpcClient, MockProvider, NodeProvider, ProviderError};
use async_trait::async_trait;
use caver_core::types::{Address, U256, U64};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{trace, Instrument};

/// A Klaytn node reached over the JSON-RPC API. Must be instantiated with a data transport
/// which implements the [`JsonRpcClient`](trait@crate::JsonRpcClient) trait.
#[derive(Clone, Debug)]
pub struct Provider<C> {
    inner: C,
}

impl<C: JsonRpcClient> Provider<C> {
    pub fn new(client: C) -> Self {
        Self { inner: client }
    }

    pub fn client(&self) -> &C {
        &self.inner
    }

    /// Sends the given request through the transport, logging it in an `rpc` span
    pub async fn request<T, R>(&self, method: &str, params: T) -> Result<R, ProviderError>
    where
        T: Debug + Serialize + Send + Sync,
        R: Serialize + DeserializeOwned + Debug + Send,
    {
        let span =
            tracing::trace_span!("rpc", method = method, params = ?serde_json::to_string(&params)?);
        let res = async move {
            trace!("tx");
            let res: R = self.inner.request(method, params).await.map_err(Into::into)?;
            trace!(rx = ?serde_json::to_string(&res)?);
            Ok::<_, ProviderError>(res)
        }
        .instrument(span)
        .await?;
        Ok(res)
    }
}

impl Provider<MockProvider> {
    /// Returns a `Provider` instantiated with an internal "mock" transport.
    ///
    /// # Example
    ///
    /// ```
    /// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
    /// use caver_core::types::U64;
    /// use caver_providers::{NodeProvider, Provider};
    /// // Instantiate the provider
    /// let (provider, mock) = Provider::mocked();
    /// // Push the mock response
    /// mock.push(U64::from(1001))?;
    /// // Make the call
    /// let chain_id = provider.get_chain_id().await?;
    /// // The response matches
    /// assert_eq!(chain_id.as_u64(), 1001);
    /// // And so does the request
    /// mock.assert_request("klay_chainID", ())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn mocked() -> (Self, MockProvider) {
        let mock = MockProvider::new();
        let mock_clone = mock.clone();
        (Self::new(mock), mock_clone)
    }
}

#[async_trait]
impl<C: JsonRpcClient> NodeProvider for Provider<C> {
    type Error = ProviderError;

    async fn get_gas_price(&self) -> Result<U256, ProviderError> {
        self.request("klay_gasPrice", ()).await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256, ProviderError> {
        self.request("klay_getTransactionCount", (address, "pending")).await
    }

    async fn get_chain_id(&self) -> Result<U64, ProviderError> {
        self.request("klay_chainID", ()).await
    }
}

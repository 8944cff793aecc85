//! Signing transactions as their sender or as their fee payer
use crate::{Keyring, KeyringError, MessageSigned, Signer};
use async_trait::async_trait;
use caver_core::types::{
    transaction::hasher::{HashSource, TransactionHasher},
    Address, Role, TransactionError, TypedTransaction,
};
use tracing::debug;

fn chain_id(tx: &TypedTransaction) -> Result<u64, TransactionError> {
    tx.fields().chain_id.map(|id| id.as_u64()).ok_or(TransactionError::FieldUndefined("chainId"))
}

impl Keyring {
    /// Signs `tx` as its sender and appends the signatures.
    ///
    /// A transaction without sender is attributed to the keyring; a transaction of another
    /// sender fails with [`KeyringError::AddressMismatch`]. On error `tx` is left untouched. Account updates are signed with the
    /// account update keys, everything else with the transaction keys. `index` picks a single
    /// key of the role.
    pub fn sign_transaction_with(
        &self,
        tx: &mut TypedTransaction,
        index: Option<usize>,
        hasher: HashSource,
    ) -> Result<(), KeyringError> {
        if tx.is_legacy() && self.is_decoupled() {
            return Err(KeyringError::DecoupledKeyringRejected)
        }
        let from = tx.from();
        let mut signed = tx.clone();
        if from.is_zero() {
            signed.set_from(self.address());
        } else if from != self.address() {
            return Err(KeyringError::AddressMismatch {
                field: "from",
                expected: from,
                keyring: self.address(),
            })
        }

        let role = signed.role();
        let hash = TransactionHasher::sender_hash(&signed, hasher)?;
        let signatures = self.sign(hash, chain_id(&signed)?, role, index)?;
        debug!(
            tx_type = %signed.tx_type(),
            from = ?self.address(),
            ?role,
            signatures = signatures.len(),
            "signed transaction"
        );
        signed.append_signatures(signatures)?;
        *tx = signed;
        Ok(())
    }

    /// Signs a fee-delegated `tx` as its fee payer and appends the signatures.
    ///
    /// A transaction without fee payer takes the keyring's address as fee payer.
    pub fn sign_transaction_as_fee_payer_with(
        &self,
        tx: &mut TypedTransaction,
        index: Option<usize>,
        hasher: HashSource,
    ) -> Result<(), KeyringError> {
        let fee_payer = tx.fee_payer().ok_or(TransactionError::Unsupported {
            operation: "fee payer signing",
            tx_type: tx.tx_type(),
        })?;
        let mut signed = tx.clone();
        if fee_payer.is_zero() {
            signed.set_fee_payer(self.address())?;
        } else if fee_payer != self.address() {
            return Err(KeyringError::AddressMismatch {
                field: "feePayer",
                expected: fee_payer,
                keyring: self.address(),
            })
        }

        let hash = TransactionHasher::fee_payer_hash(&signed, hasher)?;
        let signatures = self.sign(hash, chain_id(&signed)?, Role::FeePayer, index)?;
        debug!(
            tx_type = %signed.tx_type(),
            fee_payer = ?self.address(),
            signatures = signatures.len(),
            "signed transaction as fee payer"
        );
        signed.append_fee_payer_signatures(signatures)?;
        *tx = signed;
        Ok(())
    }
}

#[async_trait]
impl Signer for Keyring {
    type Error = KeyringError;

    async fn sign_message<S: Send + Sync + AsRef<[u8]>>(
        &self,
        message: S,
    ) -> Result<MessageSigned, Self::Error> {
        Keyring::sign_message(self, message, Role::Transaction, None)
    }

    async fn sign_transaction(&self, tx: &mut TypedTransaction) -> Result<(), Self::Error> {
        self.sign_transaction_with(tx, None, HashSource::Default)
    }

    async fn sign_transaction_as_fee_payer(
        &self,
        tx: &mut TypedTransaction,
    ) -> Result<(), Self::Error> {
        self.sign_transaction_as_fee_payer_with(tx, None, HashSource::Default)
    }

    fn address(&self) -> Address {
        Keyring::address(self)
    }
}

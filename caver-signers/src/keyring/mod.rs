mod private_key;
pub use private_key::PrivateKey;

mod account_key;
pub use account_key::WeightedMultiSigOptions;

mod wallet_key;

use crate::keystore::KeystoreError;
use caver_core::{
    k256::ecdsa,
    rand::{CryptoRng, RngCore},
    types::{
        AccountKeyError, Address, Bytes, Role, SignatureData, SignatureError, SignatureSet,
        TransactionError, H256,
    },
    utils::hash_message,
};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
/// Error thrown by the keyring module
pub enum KeyringError {
    /// The transaction names another sender or fee payer than the keyring
    #[error("the keyring address {keyring} does not match the transaction {field} {expected}")]
    AddressMismatch { field: &'static str, expected: Address, keyring: Address },
    #[error("invalid key index {index}, the key list holds {length} keys")]
    IndexOutOfRange { index: usize, length: usize },
    /// Multiple keyrings only hold keys for the transaction role
    #[error("a multiple keyring has no {0} keys")]
    RoleNotSupported(Role),
    #[error("the keyring holds no key usable for {0}")]
    NoKeyForRole(Role),
    /// Legacy transactions are signed by the key of the sender itself
    #[error("a legacy transaction cannot be signed by a decoupled keyring")]
    DecoupledKeyringRejected,
    #[error("the operation requires a single keyring")]
    NotSingleKeyring,
    #[error("invalid KlaytnWalletKey: {0}")]
    InvalidKlaytnWalletKey(String),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    /// `recovery_id + chain_id * 2 + 35` does not fit a `v` value
    #[error("chain id {0} is too large to be folded into a signature")]
    ChainIdOverflow(u64),
    /// The weighted multisig options do not match the key list
    #[error("{weights} weights given for {keys} keys")]
    WeightCountMismatch { weights: usize, keys: usize },
    /// Error propagated from k256's ECDSA module
    #[error(transparent)]
    EcdsaError(#[from] ecdsa::Error),
    /// Error propagated from the hex crate.
    #[error(transparent)]
    HexError(#[from] hex::FromHexError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    AccountKey(#[from] AccountKeyError),
    #[error(transparent)]
    Keystore(#[from] KeystoreError),
}

/// A keyring holding exactly one key.
///
/// The address may differ from the one derived from the key, in which case the keyring is
/// decoupled: the account's key was replaced by an account update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleKeyring {
    pub(crate) address: Address,
    pub(crate) key: PrivateKey,
}

impl SingleKeyring {
    pub fn key(&self) -> &PrivateKey {
        &self.key
    }
}

/// A keyring holding the keys of a weighted multisig account, all serving the transaction role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleKeyring {
    pub(crate) address: Address,
    pub(crate) keys: Vec<PrivateKey>,
}

impl MultipleKeyring {
    pub fn keys(&self) -> &[PrivateKey] {
        &self.keys
    }
}

/// A keyring holding an independent key list per [`Role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBasedKeyring {
    pub(crate) address: Address,
    pub(crate) keys: [Vec<PrivateKey>; Role::COUNT],
}

impl RoleBasedKeyring {
    /// The key list of `role`, possibly empty
    pub fn keys(&self, role: Role) -> &[PrivateKey] {
        &self.keys[role.index()]
    }
}

/// The keys of one Klaytn account.
///
/// ```
/// use caver_core::types::{Role, H256};
/// use caver_signers::Keyring;
///
/// let keyring: Keyring =
///     "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8".parse().unwrap();
/// let hash = H256::repeat_byte(1);
///
/// let signatures = keyring.sign(hash, 1001, Role::Transaction, None).unwrap();
/// assert_eq!(signatures.len(), 1);
/// assert_eq!(signatures.into_vec()[0].recover(hash).unwrap(), keyring.address());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyring {
    Single(SingleKeyring),
    Multiple(MultipleKeyring),
    RoleBased(RoleBasedKeyring),
}

/// The result of [`Keyring::sign_message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSigned {
    pub message: Bytes,
    /// `keccak256("\x19Klaytn Signed Message:\n" + len + message)`
    pub message_hash: H256,
    pub signatures: Vec<SignatureData>,
}

impl Keyring {
    /// Creates a single keyring out of a fresh random key
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_private_key(PrivateKey::new(rng))
    }

    /// A single keyring whose address is derived from `key`
    pub fn from_private_key(key: PrivateKey) -> Self {
        Keyring::Single(SingleKeyring { address: key.address(), key })
    }

    /// A single keyring of `address`, whose account key is `key`
    pub fn decoupled(address: Address, key: PrivateKey) -> Self {
        Keyring::Single(SingleKeyring { address, key })
    }

    pub fn multiple(address: Address, keys: Vec<PrivateKey>) -> Self {
        Keyring::Multiple(MultipleKeyring { address, keys })
    }

    /// Creates a role-based keyring, the lists ordered as [`Role::ALL`]
    pub fn role_based(address: Address, keys: [Vec<PrivateKey>; Role::COUNT]) -> Self {
        Keyring::RoleBased(RoleBasedKeyring { address, keys })
    }

    pub fn address(&self) -> Address {
        match self {
            Keyring::Single(keyring) => keyring.address,
            Keyring::Multiple(keyring) => keyring.address,
            Keyring::RoleBased(keyring) => keyring.address,
        }
    }

    /// Returns true when the account key is not the one the address was derived from.
    ///
    /// Multiple and role-based keyrings are always decoupled.
    pub fn is_decoupled(&self) -> bool {
        match self {
            Keyring::Single(keyring) => keyring.key.address() != keyring.address,
            Keyring::Multiple(_) | Keyring::RoleBased(_) => true,
        }
    }

    /// The keys signing for `role`.
    ///
    /// A role-based keyring without keys for the account update or fee payer role falls back
    /// to its transaction keys.
    pub fn keys_by_role(&self, role: Role) -> Result<&[PrivateKey], KeyringError> {
        let keys = match self {
            Keyring::Single(keyring) => std::slice::from_ref(&keyring.key),
            Keyring::Multiple(keyring) => {
                if role != Role::Transaction {
                    return Err(KeyringError::RoleNotSupported(role))
                }
                &keyring.keys
            }
            Keyring::RoleBased(keyring) => match keyring.keys(role) {
                [] if role != Role::Transaction => keyring.keys(Role::Transaction),
                keys => keys,
            },
        };
        if keys.is_empty() {
            return Err(KeyringError::NoKeyForRole(role))
        }
        Ok(keys)
    }

    /// The keys signing for `role`. A single keyring ignores `index`, it only has one key.
    fn select(&self, role: Role, index: Option<usize>) -> Result<&[PrivateKey], KeyringError> {
        let keys = self.keys_by_role(role)?;
        match (self, index) {
            (Keyring::Single(_), _) | (_, None) => Ok(keys),
            (_, Some(index)) => keys
                .get(index)
                .map(std::slice::from_ref)
                .ok_or(KeyringError::IndexOutOfRange { index, length: keys.len() }),
        }
    }

    /// Signs a transaction digest with the keys of `role`.
    ///
    /// With an `index` only that key signs and a [`SignatureSet::Single`] is returned, otherwise
    /// every key of the role signs.
    pub fn sign(
        &self,
        hash: H256,
        chain_id: u64,
        role: Role,
        index: Option<usize>,
    ) -> Result<SignatureSet, KeyringError> {
        let keys = self.select(role, index)?;
        trace!(address = ?self.address(), ?role, ?index, keys = keys.len(), "signing digest");
        let signatures =
            keys.iter().map(|key| key.sign(hash, chain_id)).collect::<Result<Vec<_>, _>>()?;
        Ok(match (index, signatures.as_slice()) {
            (Some(_), [signature]) => SignatureSet::Single(*signature),
            _ => SignatureSet::Multiple(signatures),
        })
    }

    /// Signs `keccak256("\x19Klaytn Signed Message:\n" + len + message)` with the keys of `role`
    pub fn sign_message<M: AsRef<[u8]>>(
        &self,
        message: M,
        role: Role,
        index: Option<usize>,
    ) -> Result<MessageSigned, KeyringError> {
        let message = message.as_ref();
        let message_hash = hash_message(message);
        let keys = self.select(role, index)?;
        let signatures =
            keys.iter().map(|key| key.sign_message(message_hash)).collect::<Result<_, _>>()?;
        Ok(MessageSigned { message: message.to_vec().into(), message_hash, signatures })
    }

    /// Recovers the address of the key that signed `message` with [`Keyring::sign_message`]
    pub fn recover_message<M: AsRef<[u8]>>(
        message: M,
        signature: &SignatureData,
    ) -> Result<Address, KeyringError> {
        Ok(signature.recover(hash_message(message))?)
    }
}

impl From<PrivateKey> for Keyring {
    fn from(key: PrivateKey) -> Self {
        Self::from_private_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<PrivateKey> {
        let mut rng = caver_core::rand::thread_rng();
        (0..n).map(|_| PrivateKey::new(&mut rng)).collect()
    }

    fn addresses(set: SignatureSet, hash: H256) -> Vec<Address> {
        set.into_vec().iter().map(|sig| sig.recover(hash).unwrap()).collect()
    }

    #[test]
    fn single_keyring_signs_for_every_role() {
        let key = keys(1).remove(0);
        let keyring = Keyring::from_private_key(key.clone());
        let hash = H256::repeat_byte(7);
        for role in Role::ALL {
            assert_eq!(addresses(keyring.sign(hash, 1, role, None).unwrap(), hash), vec![key.address()]);
        }
        assert!(matches!(keyring.sign(hash, 1, Role::Transaction, Some(0)), Ok(SignatureSet::Single(_))));
        assert!(!keyring.is_decoupled());
    }

    #[test]
    fn single_keyring_ignores_the_key_index() {
        let key = keys(1).remove(0);
        let keyring = Keyring::from_private_key(key.clone());
        let hash = H256::repeat_byte(1);
        let signed = keyring.sign(hash, 1, Role::Transaction, Some(1)).unwrap();
        assert!(matches!(signed, SignatureSet::Single(_)));
        assert_eq!(addresses(signed, hash), vec![key.address()]);

        let message = keyring.sign_message("Some data", Role::FeePayer, Some(5)).unwrap();
        assert_eq!(
            Keyring::recover_message("Some data", &message.signatures[0]).unwrap(),
            key.address()
        );
    }

    #[test]
    fn multiple_keyring_only_serves_transactions() {
        let keys = keys(3);
        let keyring = Keyring::multiple(Address::repeat_byte(1), keys.clone());
        let hash = H256::repeat_byte(7);

        let signed = keyring.sign(hash, 1, Role::Transaction, None).unwrap();
        assert_eq!(addresses(signed, hash), keys.iter().map(PrivateKey::address).collect::<Vec<_>>());
        assert_eq!(
            addresses(keyring.sign(hash, 1, Role::Transaction, Some(2)).unwrap(), hash),
            vec![keys[2].address()]
        );
        assert!(matches!(
            keyring.sign(hash, 1, Role::FeePayer, None),
            Err(KeyringError::RoleNotSupported(Role::FeePayer))
        ));
        assert!(keyring.is_decoupled());
    }

    #[test]
    fn role_based_dispatch_and_fallback() {
        let keys = keys(4);
        let keyring = Keyring::role_based(
            Address::repeat_byte(1),
            [vec![keys[0].clone(), keys[1].clone()], vec![], vec![keys[2].clone(), keys[3].clone()]],
        );
        let hash = H256::repeat_byte(9);

        assert_eq!(
            addresses(keyring.sign(hash, 1, Role::FeePayer, None).unwrap(), hash),
            vec![keys[2].address(), keys[3].address()]
        );
        // no account update keys, the transaction keys sign instead
        assert_eq!(
            addresses(keyring.sign(hash, 1, Role::AccountUpdate, Some(1)).unwrap(), hash),
            vec![keys[1].address()]
        );

        let empty = Keyring::role_based(Address::repeat_byte(1), [vec![], vec![], vec![]]);
        assert!(matches!(
            empty.sign(hash, 1, Role::FeePayer, None),
            Err(KeyringError::NoKeyForRole(Role::FeePayer))
        ));
    }

    #[test]
    fn message_roundtrip() {
        let keyring = Keyring::generate(&mut caver_core::rand::thread_rng());
        let signed = keyring.sign_message("Some data", Role::Transaction, None).unwrap();
        assert_eq!(signed.message_hash, hash_message("Some data"));
        assert_eq!(signed.signatures.len(), 1);
        assert!(signed.signatures[0].v == 27 || signed.signatures[0].v == 28);
        assert_eq!(
            Keyring::recover_message("Some data", &signed.signatures[0]).unwrap(),
            keyring.address()
        );
    }

    #[test]
    fn decoupled_single_keyring() {
        let key = keys(1).remove(0);
        let keyring = Keyring::decoupled(Address::repeat_byte(0xaa), key.clone());
        assert!(keyring.is_decoupled());
        assert_eq!(keyring.address(), Address::repeat_byte(0xaa));
        let hash = H256::repeat_byte(3);
        assert_eq!(addresses(keyring.sign(hash, 1, Role::Transaction, None).unwrap(), hash), vec![key.address()]);
    }
}

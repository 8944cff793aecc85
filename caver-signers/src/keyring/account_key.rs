use super::{Keyring, KeyringError, PrivateKey};
use caver_core::types::{AccountKey, Role, WeightedMultiSig, WeightedPublicKey};

/// Threshold and per key weights of a weighted multisig account key.
///
/// Empty `weights` give every key a weight of 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedMultiSigOptions {
    pub threshold: u64,
    pub weights: Vec<u64>,
}

impl Default for WeightedMultiSigOptions {
    fn default() -> Self {
        Self { threshold: 1, weights: Vec::new() }
    }
}

impl WeightedMultiSigOptions {
    pub fn new(threshold: u64, weights: Vec<u64>) -> Self {
        Self { threshold, weights }
    }

    fn build(&self, keys: &[PrivateKey]) -> Result<AccountKey, KeyringError> {
        let weights = if self.weights.is_empty() { vec![1; keys.len()] } else { self.weights.clone() };
        if weights.len() != keys.len() {
            return Err(KeyringError::WeightCountMismatch { weights: weights.len(), keys: keys.len() })
        }
        let keys = keys
            .iter()
            .zip(weights)
            .map(|(key, weight)| WeightedPublicKey { weight, key: key.public_key() })
            .collect();
        Ok(AccountKey::WeightedMultiSig(WeightedMultiSig::new(self.threshold, keys)?))
    }
}

impl Keyring {
    /// The account key an account update has to install for this keyring to control the account.
    ///
    /// A coupled single keyring maps to [`AccountKey::Legacy`], a decoupled one to
    /// [`AccountKey::Public`]. A multiple keyring becomes a weighted multisig built with the first
    /// of `options`. A role-based keyring becomes a role-based key with one entry per role,
    /// `options` being indexed by role: a role with one key and default options becomes
    /// [`AccountKey::Public`], other roles a weighted multisig. Roles without keys are left
    /// [`AccountKey::Nil`], keeping the key the account already has.
    pub fn to_account_key(
        &self,
        options: &[WeightedMultiSigOptions],
    ) -> Result<AccountKey, KeyringError> {
        match self {
            Keyring::Single(keyring) if self.is_decoupled() => {
                Ok(AccountKey::Public(keyring.key.public_key()))
            }
            Keyring::Single(_) => Ok(AccountKey::Legacy),
            Keyring::Multiple(keyring) => {
                options.first().cloned().unwrap_or_default().build(&keyring.keys)
            }
            Keyring::RoleBased(keyring) => {
                let keys = Role::ALL
                    .iter()
                    .map(|role| match (keyring.keys(*role), options.get(role.index())) {
                        ([], _) => Ok(AccountKey::Nil),
                        ([key], option)
                            if option.map_or(true, |option| *option == Default::default()) =>
                        {
                            Ok(AccountKey::Public(key.public_key()))
                        }
                        (keys, option) => option.cloned().unwrap_or_default().build(keys),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AccountKey::role_based(keys)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caver_core::types::Address;

    fn keys(n: usize) -> Vec<PrivateKey> {
        let mut rng = caver_core::rand::thread_rng();
        (0..n).map(|_| PrivateKey::new(&mut rng)).collect()
    }

    #[test]
    fn single_keyring_keys() {
        let key = keys(1).remove(0);
        assert_eq!(Keyring::from_private_key(key.clone()).to_account_key(&[]).unwrap(), AccountKey::Legacy);
        assert_eq!(
            Keyring::decoupled(Address::repeat_byte(1), key.clone()).to_account_key(&[]).unwrap(),
            AccountKey::Public(key.public_key())
        );
    }

    #[test]
    fn multiple_keyring_defaults_to_unit_weights() {
        let keys = keys(3);
        let keyring = Keyring::multiple(Address::repeat_byte(1), keys.clone());
        match keyring.to_account_key(&[]).unwrap() {
            AccountKey::WeightedMultiSig(multisig) => {
                assert_eq!(multisig.threshold, 1);
                assert!(multisig.keys.iter().all(|key| key.weight == 1));
                assert_eq!(multisig.keys[2].key, keys[2].public_key());
            }
            other => panic!("unexpected account key {other:?}"),
        }

        let options = [WeightedMultiSigOptions::new(2, vec![1, 1])];
        assert!(matches!(
            keyring.to_account_key(&options),
            Err(KeyringError::WeightCountMismatch { weights: 2, keys: 3 })
        ));
        let options = [WeightedMultiSigOptions::new(5, vec![1, 1, 1])];
        assert!(matches!(keyring.to_account_key(&options), Err(KeyringError::AccountKey(_))));
    }

    #[test]
    fn role_based_keyring_key() {
        let keys = keys(3);
        let keyring = Keyring::role_based(
            Address::repeat_byte(1),
            [vec![keys[0].clone()], vec![], vec![keys[1].clone(), keys[2].clone()]],
        );
        let options = [Default::default(), Default::default(), WeightedMultiSigOptions::new(2, vec![1, 1])];
        match keyring.to_account_key(&options).unwrap() {
            AccountKey::RoleBased(roles) => {
                assert_eq!(roles[0], AccountKey::Public(keys[0].public_key()));
                assert_eq!(roles[1], AccountKey::Nil);
                assert!(matches!(&roles[2], AccountKey::WeightedMultiSig(multisig) if multisig.threshold == 2));
            }
            other => panic!("unexpected account key {other:?}"),
        }
    }

    #[test]
    fn single_role_key_with_custom_weight_stays_multisig() {
        let keys = keys(1);
        let keyring =
            Keyring::role_based(Address::repeat_byte(1), [keys.clone(), vec![], vec![]]);
        let options = [WeightedMultiSigOptions::new(2, vec![2])];
        match keyring.to_account_key(&options).unwrap() {
            AccountKey::RoleBased(roles) => assert!(matches!(
                &roles[0],
                AccountKey::WeightedMultiSig(multisig) if multisig.threshold == 2 && multisig.keys[0].weight == 2
            )),
            other => panic!("unexpected account key {other:?}"),
        }
    }
}

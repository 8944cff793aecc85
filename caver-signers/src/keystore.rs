//! Password encrypted keyrings in the Web3 Secret Storage layout.
//!
//! Version 3 stores a single key under `crypto`. Version 4 stores every key of a keyring under
//! `keyring`, as a flat list for single and multiple keyrings or as one list per role.
use crate::keyring::{Keyring, KeyringError, PrivateKey};
use aes::Aes128;
use caver_core::{
    rand::{thread_rng, RngCore},
    types::{Address, Role},
    utils::keccak256,
};
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::Hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const CIPHER: &str = "aes-128-ctr";
const PBKDF2_PRF: &str = "hmac-sha256";
const SALT_LEN: usize = 32;
const IV_LEN: usize = 16;

#[derive(Error, Debug)]
/// An error thrown when encrypting or decrypting a keystore
pub enum KeystoreError {
    /// The password does not decrypt the keystore
    #[error("message authentication code mismatch, wrong password?")]
    MacMismatch,
    #[error("unsupported keystore version {0}")]
    UnsupportedVersion(u8),
    #[error("unsupported cipher {0}")]
    UnsupportedCipher(String),
    #[error("invalid key derivation parameters: {0}")]
    InvalidKdfParams(String),
    /// The keystore lacks the section its version requires
    #[error("invalid keystore: {0}")]
    InvalidKeystore(&'static str),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// The key derivation function and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kdf {
    Scrypt { n: u32, r: u32, p: u32, dklen: u8 },
    Pbkdf2 { c: u32, dklen: u8 },
}

impl Default for Kdf {
    fn default() -> Self {
        Kdf::Scrypt { n: 4096, r: 8, p: 1, dklen: 32 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeystoreVersion {
    /// One key, single keyrings only
    V3,
    #[default]
    V4,
}

impl KeystoreVersion {
    fn number(self) -> u8 {
        match self {
            KeystoreVersion::V3 => 3,
            KeystoreVersion::V4 => 4,
        }
    }
}

/// Options of [`Keyring::encrypt`], version 4 with scrypt by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeystoreOptions {
    pub version: KeystoreVersion,
    pub kdf: Kdf,
}

impl KeystoreOptions {
    pub fn v3() -> Self {
        Self { version: KeystoreVersion::V3, ..Default::default() }
    }

    pub fn kdf(mut self, kdf: Kdf) -> Self {
        self.kdf = kdf;
        self
    }
}

/// An encrypted keyring, serialized as keystore JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keystore {
    pub version: u8,
    pub id: Uuid,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto: Option<CryptoJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyring: Option<KeyringJson>,
}

/// The encrypted keys of a version 4 keystore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyringJson {
    Flat(Vec<CryptoJson>),
    RoleBased(Vec<Vec<CryptoJson>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Represents the "crypto" part of an encrypted JSON keystore
pub struct CryptoJson {
    pub cipher: String,
    pub cipherparams: CipherparamsJson,
    #[serde(with = "hex")]
    pub ciphertext: Vec<u8>,
    pub kdf: KdfType,
    pub kdfparams: KdfparamsType,
    #[serde(with = "hex")]
    pub mac: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Represents the "cipherparams" part of an encrypted JSON keystore
pub struct CipherparamsJson {
    #[serde(with = "hex")]
    pub iv: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Types of key derivation functions supported by the keystore
pub enum KdfType {
    Pbkdf2,
    Scrypt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
/// Defines the various parameters used in the supported KDFs
pub enum KdfparamsType {
    Pbkdf2 {
        c: u32,
        dklen: u8,
        prf: String,
        #[serde(with = "hex")]
        salt: Vec<u8>,
    },
    Scrypt {
        dklen: u8,
        n: u32,
        p: u32,
        r: u32,
        #[serde(with = "hex")]
        salt: Vec<u8>,
    },
}

impl Keystore {
    /// Parses keystore JSON
    pub fn from_json(json: &str) -> Result<Self, KeystoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, KeystoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Keyring {
    /// Encrypts every key of the keyring with `password`
    pub fn encrypt<P: AsRef<[u8]>>(
        &self,
        password: P,
        options: KeystoreOptions,
    ) -> Result<Keystore, KeyringError> {
        let password = password.as_ref();
        let encrypt_all = |keys: &[PrivateKey]| {
            keys.iter().map(|key| encrypt_key(key, password, options.kdf)).collect::<Result<Vec<_>, _>>()
        };
        let (crypto, keyring) = match (options.version, self) {
            (KeystoreVersion::V3, Keyring::Single(keyring)) => {
                (Some(encrypt_key(&keyring.key, password, options.kdf)?), None)
            }
            (KeystoreVersion::V3, _) => return Err(KeyringError::NotSingleKeyring),
            (KeystoreVersion::V4, Keyring::Single(keyring)) => {
                (None, Some(KeyringJson::Flat(encrypt_all(std::slice::from_ref(&keyring.key))?)))
            }
            (KeystoreVersion::V4, Keyring::Multiple(keyring)) => {
                (None, Some(KeyringJson::Flat(encrypt_all(&keyring.keys)?)))
            }
            (KeystoreVersion::V4, Keyring::RoleBased(keyring)) => {
                let lists = Role::ALL
                    .iter()
                    .map(|role| encrypt_all(keyring.keys(*role)))
                    .collect::<Result<Vec<_>, _>>()?;
                (None, Some(KeyringJson::RoleBased(lists)))
            }
        };
        debug!(address = ?self.address(), version = options.version.number(), "encrypted keyring");
        Ok(Keystore {
            version: options.version.number(),
            id: Uuid::new_v4(),
            address: self.address(),
            crypto,
            keyring,
        })
    }

    /// Decrypts a keystore produced by [`Keyring::encrypt`] or another Klaytn wallet
    pub fn decrypt<P: AsRef<[u8]>>(keystore: &Keystore, password: P) -> Result<Self, KeyringError> {
        let password = password.as_ref();
        let decrypt_all = |list: &[CryptoJson]| {
            list.iter().map(|crypto| decrypt_key(crypto, password)).collect::<Result<Vec<_>, _>>()
        };
        let address = keystore.address;
        let keyring = match (keystore.version, &keystore.crypto, &keystore.keyring) {
            (3, Some(crypto), _) => Keyring::decoupled(address, decrypt_key(crypto, password)?),
            (3, None, _) => return Err(KeystoreError::InvalidKeystore("missing crypto").into()),
            (4, _, Some(KeyringJson::Flat(list))) => {
                let mut keys = decrypt_all(list)?;
                match keys.len() {
                    0 => return Err(KeystoreError::InvalidKeystore("empty keyring").into()),
                    1 => Keyring::decoupled(address, keys.remove(0)),
                    _ => Keyring::multiple(address, keys),
                }
            }
            (4, _, Some(KeyringJson::RoleBased(lists))) => {
                if lists.len() > Role::COUNT {
                    return Err(KeystoreError::InvalidKeystore("more than three roles").into())
                }
                let mut keys: [Vec<PrivateKey>; Role::COUNT] = Default::default();
                for (slot, list) in keys.iter_mut().zip(lists) {
                    *slot = decrypt_all(list)?;
                }
                Keyring::role_based(address, keys)
            }
            (4, _, None) => return Err(KeystoreError::InvalidKeystore("missing keyring").into()),
            (version, ..) => return Err(KeystoreError::UnsupportedVersion(version).into()),
        };
        debug!(?address, version = keystore.version, "decrypted keyring");
        Ok(keyring)
    }
}

fn derive_key(password: &[u8], kdf: &KdfparamsType) -> Result<Vec<u8>, KeystoreError> {
    let (dklen, salt) = match kdf {
        KdfparamsType::Pbkdf2 { dklen, salt, .. } | KdfparamsType::Scrypt { dklen, salt, .. } => {
            (*dklen as usize, salt)
        }
    };
    if dklen < 32 {
        return Err(KeystoreError::InvalidKdfParams(format!("dklen {dklen} is below 32")))
    }
    let mut key = vec![0u8; dklen];
    match kdf {
        KdfparamsType::Pbkdf2 { c, prf, .. } => {
            if prf != PBKDF2_PRF {
                return Err(KeystoreError::InvalidKdfParams(format!("unsupported prf {prf}")))
            }
            pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, *c, key.as_mut_slice());
        }
        KdfparamsType::Scrypt { n, p, r, .. } => {
            if !n.is_power_of_two() || *n < 2 {
                return Err(KeystoreError::InvalidKdfParams(format!("n = {n} is not a power of 2")))
            }
            let params = scrypt::Params::new(n.trailing_zeros() as u8, *r, *p)
                .map_err(|err| KeystoreError::InvalidKdfParams(err.to_string()))?;
            scrypt::scrypt(password, salt, &params, key.as_mut_slice())
                .map_err(|err| KeystoreError::InvalidKdfParams(err.to_string()))?;
        }
    }
    Ok(key)
}

/// `keccak256(dk[16..32] ++ ciphertext)`
fn mac(derived_key: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    keccak256([&derived_key[16..32], ciphertext].concat())
}

fn apply_cipher(derived_key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), KeystoreError> {
    let mut cipher = Aes128Ctr::new_from_slices(&derived_key[..16], iv)
        .map_err(|_| KeystoreError::InvalidKeystore("the iv must be 16 bytes"))?;
    cipher.apply_keystream(buf);
    Ok(())
}

fn encrypt_key(key: &PrivateKey, password: &[u8], kdf: Kdf) -> Result<CryptoJson, KeystoreError> {
    let mut rng = thread_rng();
    let mut salt = vec![0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut iv = vec![0u8; IV_LEN];
    rng.fill_bytes(&mut iv);

    let (kdf_type, kdfparams) = match kdf {
        Kdf::Scrypt { n, r, p, dklen } => {
            (KdfType::Scrypt, KdfparamsType::Scrypt { dklen, n, p, r, salt })
        }
        Kdf::Pbkdf2 { c, dklen } => (
            KdfType::Pbkdf2,
            KdfparamsType::Pbkdf2 { c, dklen, prf: PBKDF2_PRF.to_owned(), salt },
        ),
    };
    let derived_key = derive_key(password, &kdfparams)?;

    let mut ciphertext = key.to_bytes().to_vec();
    apply_cipher(&derived_key, &iv, &mut ciphertext)?;
    let mac = mac(&derived_key, &ciphertext).to_vec();

    Ok(CryptoJson {
        cipher: CIPHER.to_owned(),
        cipherparams: CipherparamsJson { iv },
        ciphertext,
        kdf: kdf_type,
        kdfparams,
        mac,
    })
}

fn decrypt_key(crypto: &CryptoJson, password: &[u8]) -> Result<PrivateKey, KeyringError> {
    if crypto.cipher != CIPHER {
        return Err(KeystoreError::UnsupportedCipher(crypto.cipher.clone()).into())
    }
    let derived_key = derive_key(password, &crypto.kdfparams)?;
    if mac(&derived_key, &crypto.ciphertext).as_slice() != crypto.mac.as_slice() {
        return Err(KeystoreError::MacMismatch.into())
    }
    let mut key = crypto.ciphertext.clone();
    apply_cipher(&derived_key, &crypto.cipherparams.iv, &mut key)?;
    PrivateKey::from_bytes(&key)
}

//! The KlaytnWalletKey format, `0x{private key}0x00{address}`
use super::{Keyring, KeyringError, PrivateKey};
use caver_core::{types::Address, utils::decode_hex};
use std::str::FromStr;

/// The only key type the format defines
const KEY_TYPE: &str = "00";

impl Keyring {
    /// Formats the keyring as `0x{private key}0x00{address}`, the address in lowercase hex.
    ///
    /// Only single keyrings have a KlaytnWalletKey.
    pub fn klaytn_wallet_key(&self) -> Result<String, KeyringError> {
        match self {
            Keyring::Single(keyring) => Ok(format!(
                "{}0x{KEY_TYPE}{}",
                keyring.key.to_hex(),
                hex::encode(keyring.address.as_bytes())
            )),
            _ => Err(KeyringError::NotSingleKeyring),
        }
    }

    /// Parses a KlaytnWalletKey. The keyring is decoupled when the embedded address differs from
    /// the one derived from the key.
    pub fn from_klaytn_wallet_key(wallet_key: &str) -> Result<Self, KeyringError> {
        let invalid = || KeyringError::InvalidKlaytnWalletKey(wallet_key.to_owned());
        let stripped = wallet_key.strip_prefix("0x").unwrap_or(wallet_key);
        let parts = stripped.split("0x").collect::<Vec<_>>();
        let (key, key_type, address) = match parts.as_slice() {
            [key, key_type, address] => (*key, *key_type, *address),
            _ => return Err(invalid()),
        };
        if key.len() != 64 || key_type != KEY_TYPE || address.len() != 40 {
            return Err(invalid())
        }
        let key = PrivateKey::from_bytes(&decode_hex(key)?)?;
        let address = Address::from_slice(&decode_hex(address)?);
        Ok(Keyring::decoupled(address, key))
    }
}

impl FromStr for Keyring {
    type Err = KeyringError;

    /// Parses either a KlaytnWalletKey or the hex of a single private key
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        if src.strip_prefix("0x").unwrap_or(src).contains("0x") {
            return Self::from_klaytn_wallet_key(src)
        }
        Ok(Keyring::from_private_key(src.parse()?))
    }
}

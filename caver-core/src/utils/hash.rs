//! Hashing utilities for Klaytn payloads.

use ethereum_types::H256;
use tiny_keccak::{Hasher, Keccak};

/// Prefix prepended to every message signed with a keyring.
pub const MESSAGE_PREFIX: &str = "\x19Klaytn Signed Message:\n";

/// Hash a message the way Klaytn nodes and wallets expect.
///
/// The final message is a UTF-8 string, encoded as follows:
/// `"\x19Klaytn Signed Message:\n" + message.length + message`
///
/// This message is then hashed using [Keccak-256](keccak256).
pub fn hash_message<T: AsRef<[u8]>>(message: T) -> H256 {
    let message = message.as_ref();
    let len = message.len();
    let len_string = len.to_string();

    let mut klay_message = Vec::with_capacity(MESSAGE_PREFIX.len() + len_string.len() + len);
    klay_message.extend_from_slice(MESSAGE_PREFIX.as_bytes());
    klay_message.extend_from_slice(len_string.as_bytes());
    klay_message.extend_from_slice(message);

    H256(keccak256(&klay_message))
}

/// Compute the Keccak-256 hash of input bytes.
///
/// Note that strings are interpreted as UTF-8 bytes,
pub fn keccak256<T: AsRef<[u8]>>(bytes: T) -> [u8; 32] {
    let mut output = [0u8; 32];

    let mut hasher = Keccak::v256();
    hasher.update(bytes.as_ref());
    hasher.finalize(&mut output);

    output
}

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::Display;

/// The role a key plays for an account.
///
/// Role-based accounts keep an independent key set per role; the role decides which of them
/// has to sign a given payload.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum Role {
    /// Signs every transaction except account updates
    #[strum(serialize = "roleTransactionKey")]
    Transaction = 0,
    /// Signs account update transactions
    #[strum(serialize = "roleAccountUpdateKey")]
    AccountUpdate = 1,
    /// Signs as the fee payer of fee-delegated transactions
    #[strum(serialize = "roleFeePayerKey")]
    FeePayer = 2,
}

impl Role {
    /// Number of roles a role-based account holds
    pub const COUNT: usize = 3;

    /// All roles, ordered by their index
    pub const ALL: [Role; Role::COUNT] = [Role::Transaction, Role::AccountUpdate, Role::FeePayer];

    /// The position of this role in a role-based key list
    pub fn index(self) -> usize {
        u8::from(self) as usize
    }
}

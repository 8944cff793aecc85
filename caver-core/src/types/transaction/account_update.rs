use super::{
    decode_fee_ratio, decode_head, decode_next, rlp_append_head, FeeRatio, TransactionError,
    TxBody, TxFields, TxType,
};
use crate::types::{AccountKey, AccountKeyError, Bytes, Role};
use rlp::{Rlp, RlpStream};

/// Replaces the key of the `from` account.
///
/// Wire fields: `nonce, gasPrice, gas, from, rlpEncodedKey`. Signed with the account update
/// role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub account_key: AccountKey,
}

impl AccountUpdate {
    pub fn new(account_key: AccountKey) -> Self {
        Self { account_key }
    }
}

impl TxBody for AccountUpdate {
    const TX_TYPES: [TxType; 3] = [
        TxType::AccountUpdate,
        TxType::FeeDelegatedAccountUpdate,
        TxType::FeeDelegatedAccountUpdateWithRatio,
    ];
    const NUM_FIELDS: usize = 5;
    const ROLE: Role = Role::AccountUpdate;

    fn validate(&self) -> Result<(), TransactionError> {
        if self.account_key == AccountKey::Nil {
            return Err(AccountKeyError::NilAccountKey.into())
        }
        Ok(self.account_key.validate()?)
    }

    fn rlp_append_fields(&self, fields: &TxFields, fee_ratio: Option<FeeRatio>, s: &mut RlpStream) {
        rlp_append_head(s, fields);
        s.append(&fields.from);
        s.append(&self.account_key.rlp_encoding());
        if let Some(fee_ratio) = fee_ratio {
            s.append(&fee_ratio);
        }
    }

    fn decode_fields(
        rlp: &Rlp,
        offset: &mut usize,
        with_ratio: bool,
    ) -> Result<(TxFields, Self, Option<FeeRatio>), TransactionError> {
        let (nonce, gas_price, gas) = decode_head(rlp, offset)?;
        let from = decode_next(rlp, offset)?;
        let encoded_key: Bytes = decode_next(rlp, offset)?;
        let account_key = AccountKey::decode(encoded_key.as_ref())?;
        let fee_ratio = decode_fee_ratio(rlp, offset, with_ratio)?;
        Ok((TxFields::decoded(from, nonce, gas_price, gas), Self { account_key }, fee_ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        transaction::{Basic, Envelope, FeeDelegated},
        Address,
    };
    use k256::SecretKey;

    fn fields() -> TxFields {
        TxFields::new(Address::repeat_byte(0x11), 100_000u64)
            .nonce(0u64)
            .gas_price(25_000_000_000u64)
            .chain_id(1001u64)
    }

    #[test]
    fn signs_with_account_update_role() {
        let tx = Basic::new(fields(), AccountUpdate::new(AccountKey::Legacy)).unwrap();
        assert_eq!(tx.role(), Role::AccountUpdate);
        assert_eq!(tx.tx_type(), TxType::AccountUpdate);
    }

    #[test]
    fn rejects_nil_key() {
        assert!(matches!(
            Basic::new(fields(), AccountUpdate::new(AccountKey::Nil)),
            Err(TransactionError::AccountKey(AccountKeyError::NilAccountKey))
        ));
    }

    #[test]
    fn account_key_roundtrips_as_byte_string() {
        let key = SecretKey::from_slice(&[0x22; 32]).unwrap().public_key();
        let body = AccountUpdate::new(
            AccountKey::role_based(vec![AccountKey::Public(key), AccountKey::Nil, AccountKey::Fail])
                .unwrap(),
        );
        let tx = FeeDelegated::new(fields(), body).unwrap();
        let raw = tx.rlp_encoding().unwrap();
        assert_eq!(raw.as_ref()[0], 0x21);

        let decoded = FeeDelegated::<AccountUpdate>::decode(raw.as_ref()).unwrap();
        assert_eq!(decoded.tx.body, tx.tx.body);
        assert_eq!(decoded.fee_payer, Address::zero());
    }
}

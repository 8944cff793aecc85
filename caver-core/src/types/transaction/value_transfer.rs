use super::{
    decode_fee_ratio, decode_head, decode_next, rlp_append_head, FeeRatio, TransactionError,
    TxBody, TxFields, TxType,
};
use crate::types::{Address, Bytes, U256};
use rlp::{Rlp, RlpStream};

/// Sends KLAY to `to`.
///
/// Wire fields: `nonce, gasPrice, gas, to, value, from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTransfer {
    pub to: Address,
    pub value: U256,
}

impl ValueTransfer {
    pub fn new<T: Into<U256>>(to: Address, value: T) -> Self {
        Self { to, value: value.into() }
    }
}

impl TxBody for ValueTransfer {
    const TX_TYPES: [TxType; 3] = [
        TxType::ValueTransfer,
        TxType::FeeDelegatedValueTransfer,
        TxType::FeeDelegatedValueTransferWithRatio,
    ];
    const NUM_FIELDS: usize = 6;

    fn rlp_append_fields(&self, fields: &TxFields, fee_ratio: Option<FeeRatio>, s: &mut RlpStream) {
        rlp_append_head(s, fields);
        s.append(&self.to);
        s.append(&self.value);
        s.append(&fields.from);
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
        let to = decode_next(rlp, offset)?;
        let value = decode_next(rlp, offset)?;
        let from = decode_next(rlp, offset)?;
        let fee_ratio = decode_fee_ratio(rlp, offset, with_ratio)?;
        Ok((TxFields::decoded(from, nonce, gas_price, gas), Self { to, value }, fee_ratio))
    }
}

/// Sends KLAY to `to` together with a memo.
///
/// Wire fields: `nonce, gasPrice, gas, to, value, from, input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTransferMemo {
    pub to: Address,
    pub value: U256,
    /// The memo
    pub input: Bytes,
}

impl ValueTransferMemo {
    pub fn new<T: Into<U256>, I: Into<Bytes>>(to: Address, value: T, input: I) -> Self {
        Self { to, value: value.into(), input: input.into() }
    }
}

impl TxBody for ValueTransferMemo {
    const TX_TYPES: [TxType; 3] = [
        TxType::ValueTransferMemo,
        TxType::FeeDelegatedValueTransferMemo,
        TxType::FeeDelegatedValueTransferMemoWithRatio,
    ];
    const NUM_FIELDS: usize = 7;

    fn rlp_append_fields(&self, fields: &TxFields, fee_ratio: Option<FeeRatio>, s: &mut RlpStream) {
        rlp_append_head(s, fields);
        s.append(&self.to);
        s.append(&self.value);
        s.append(&fields.from);
        s.append(&self.input);
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
        let to = decode_next(rlp, offset)?;
        let value = decode_next(rlp, offset)?;
        let from = decode_next(rlp, offset)?;
        let input = decode_next(rlp, offset)?;
        let fee_ratio = decode_fee_ratio(rlp, offset, with_ratio)?;
        Ok((TxFields::decoded(from, nonce, gas_price, gas), Self { to, value, input }, fee_ratio))
    }
}

use super::{
    decode_fee_ratio, decode_head, decode_next, rlp_append_head, FeeRatio, TransactionError,
    TxBody, TxFields, TxType,
};
use rlp::{Rlp, RlpStream};

/// Cancels the pending transaction of `from` with the same nonce.
///
/// Wire fields: `nonce, gasPrice, gas, from`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cancel;

impl TxBody for Cancel {
    const TX_TYPES: [TxType; 3] =
        [TxType::Cancel, TxType::FeeDelegatedCancel, TxType::FeeDelegatedCancelWithRatio];
    const NUM_FIELDS: usize = 4;

    fn rlp_append_fields(&self, fields: &TxFields, fee_ratio: Option<FeeRatio>, s: &mut RlpStream) {
        rlp_append_head(s, fields);
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
        let from = decode_next(rlp, offset)?;
        let fee_ratio = decode_fee_ratio(rlp, offset, with_ratio)?;
        Ok((TxFields::decoded(from, nonce, gas_price, gas), Cancel, fee_ratio))
    }
}

use super::{
    decode_fee_ratio, decode_head, decode_next, rlp_append_head, FeeRatio, TransactionError,
    TxBody, TxFields, TxType,
};
use crate::types::Bytes;
use rlp::{Rlp, RlpStream};

/// Anchors service chain data in the main chain.
///
/// Wire fields: `nonce, gasPrice, gas, from, input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDataAnchoring {
    /// The RLP encoded anchored data
    pub input: Bytes,
}

impl ChainDataAnchoring {
    pub fn new<I: Into<Bytes>>(input: I) -> Self {
        Self { input: input.into() }
    }
}

impl TxBody for ChainDataAnchoring {
    const TX_TYPES: [TxType; 3] = [
        TxType::ChainDataAnchoring,
        TxType::FeeDelegatedChainDataAnchoring,
        TxType::FeeDelegatedChainDataAnchoringWithRatio,
    ];
    const NUM_FIELDS: usize = 5;

    fn rlp_append_fields(&self, fields: &TxFields, fee_ratio: Option<FeeRatio>, s: &mut RlpStream) {
        rlp_append_head(s, fields);
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
        let from = decode_next(rlp, offset)?;
        let input = decode_next(rlp, offset)?;
        let fee_ratio = decode_fee_ratio(rlp, offset, with_ratio)?;
        Ok((TxFields::decoded(from, nonce, gas_price, gas), Self { input }, fee_ratio))
    }
}

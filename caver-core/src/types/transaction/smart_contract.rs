use super::{
    decode_empty, decode_fee_ratio, decode_head, decode_next, rlp_append_head, CodeFormat,
    FeeRatio, TransactionError, TxBody, TxFields, TxType,
};
use crate::types::{Address, Bytes, U256};
use rlp::{Rlp, RlpStream};
use std::convert::TryFrom;

/// Deploys the contract whose bytecode is `input`.
///
/// Wire fields: `nonce, gasPrice, gas, to, value, from, input, humanReadable, codeFormat`,
/// with `to` always empty. The fee ratio sits between `humanReadable` and `codeFormat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartContractDeploy {
    pub value: U256,
    /// Contract bytecode followed by the encoded constructor arguments
    pub input: Bytes,
    /// Human readable addresses are not supported by the network, must be false
    pub human_readable: bool,
    pub code_format: CodeFormat,
}

impl SmartContractDeploy {
    pub fn new<T: Into<U256>, I: Into<Bytes>>(value: T, input: I) -> Self {
        Self {
            value: value.into(),
            input: input.into(),
            human_readable: false,
            code_format: CodeFormat::Evm,
        }
    }
}

impl TxBody for SmartContractDeploy {
    const TX_TYPES: [TxType; 3] = [
        TxType::SmartContractDeploy,
        TxType::FeeDelegatedSmartContractDeploy,
        TxType::FeeDelegatedSmartContractDeployWithRatio,
    ];
    const NUM_FIELDS: usize = 9;

    fn validate(&self) -> Result<(), TransactionError> {
        if self.human_readable {
            return Err(TransactionError::HumanReadableUnsupported)
        }
        Ok(())
    }

    fn rlp_append_fields(&self, fields: &TxFields, fee_ratio: Option<FeeRatio>, s: &mut RlpStream) {
        rlp_append_head(s, fields);
        s.append_empty_data();
        s.append(&self.value);
        s.append(&fields.from);
        s.append(&self.input);
        s.append(&u8::from(self.human_readable));
        if let Some(fee_ratio) = fee_ratio {
            s.append(&fee_ratio);
        }
        s.append(&u8::from(self.code_format));
    }

    fn decode_fields(
        rlp: &Rlp,
        offset: &mut usize,
        with_ratio: bool,
    ) -> Result<(TxFields, Self, Option<FeeRatio>), TransactionError> {
        let (nonce, gas_price, gas) = decode_head(rlp, offset)?;
        decode_empty(rlp, offset)?;
        let value = decode_next(rlp, offset)?;
        let from = decode_next(rlp, offset)?;
        let input = decode_next(rlp, offset)?;
        let human_readable = match decode_next::<u8>(rlp, offset)? {
            0 => false,
            1 => return Err(TransactionError::HumanReadableUnsupported),
            _ => return Err(rlp::DecoderError::Custom("humanReadable is not a boolean").into()),
        };
        let fee_ratio = decode_fee_ratio(rlp, offset, with_ratio)?;
        let code_format = decode_next::<u8>(rlp, offset)?;
        let code_format = CodeFormat::try_from(code_format)
            .map_err(|_| TransactionError::InvalidCodeFormat(code_format.to_string()))?;
        let body = Self { value, input, human_readable, code_format };
        Ok((TxFields::decoded(from, nonce, gas_price, gas), body, fee_ratio))
    }
}

/// Calls the contract at `to` with `input`.
///
/// Wire fields: `nonce, gasPrice, gas, to, value, from, input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartContractExecution {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

impl SmartContractExecution {
    pub fn new<T: Into<U256>, I: Into<Bytes>>(to: Address, value: T, input: I) -> Self {
        Self { to, value: value.into(), input: input.into() }
    }
}

impl TxBody for SmartContractExecution {
    const TX_TYPES: [TxType; 3] = [
        TxType::SmartContractExecution,
        TxType::FeeDelegatedSmartContractExecution,
        TxType::FeeDelegatedSmartContractExecutionWithRatio,
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

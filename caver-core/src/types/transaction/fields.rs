//! Construction of transactions out of JSON field bags, as sent by wallets and dapps.
use super::{
    typed::TypedTransaction, AccountUpdate, Basic, Cancel, ChainDataAnchoring, CodeFormat,
    FeeDelegated, FeeDelegatedWithRatio, FeeRatio, LegacyTransaction, SmartContractDeploy,
    SmartContractExecution, TransactionError, TxBody, TxFields, TxType, ValueTransfer,
    ValueTransferMemo,
};
use crate::{
    types::{AccountKey, Address, Bytes, SignatureSet, U256, U64},
    utils::{decode_hex, parse_checksummed},
};
use serde_json::{Map, Value};
use std::{convert::TryFrom, str::FromStr};

/// Fields accepted by every transaction type
const COMMON_FIELDS: &[&str] = &["type", "from", "nonce", "gas", "gasPrice", "chainId", "signatures"];

const FEE_DELEGATION_FIELDS: &[&str] = &["feePayer", "feePayerSignatures"];

const FEE_RATIO: &str = "feeRatio";

/// Fields of each family on top of the common ones
fn family_fields(tx_type: TxType) -> &'static [&'static str] {
    match tx_type.tag() & !0x07 {
        0x08 => &["to", "value"],
        0x10 | 0x30 => &["to", "value", "input"],
        0x20 => &["key"],
        0x28 => &["value", "input", "humanReadable", "codeFormat"],
        0x38 => &[],
        0x48 => &["input"],
        _ => &["to", "value", "input"],
    }
}

fn is_allowed(tx_type: TxType, name: &str) -> bool {
    COMMON_FIELDS.contains(&name) ||
        family_fields(tx_type).contains(&name) ||
        (tx_type.is_fee_delegated() && FEE_DELEGATION_FIELDS.contains(&name)) ||
        (tx_type.is_fee_delegated_with_ratio() && name == FEE_RATIO)
}

impl TypedTransaction {
    /// Builds a transaction out of a JSON object holding its fields.
    ///
    /// `type` is either the name of the type (`"TxTypeFeeDelegatedValueTransfer"`) or its tag.
    /// Quantities are JSON numbers, `0x` prefixed hex or decimal strings, byte fields are `0x`
    /// prefixed hex and the account key of an account update is its RLP encoding in `key`.
    ///
    /// ```
    /// use caver_core::types::{TransactionError, TypedTransaction};
    /// use serde_json::json;
    ///
    /// let tx = TypedTransaction::from_json(&json!({
    ///     "type": "TxTypeFeeDelegatedValueTransferWithRatio",
    ///     "from": "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b",
    ///     "to": "0x7b65b75d204abed71587c9e519a89277766ee1d0",
    ///     "value": "0x0a",
    ///     "gas": 25000,
    ///     "feeRatio": 30,
    /// }))
    /// .unwrap();
    /// assert_eq!(tx.fee_ratio().unwrap().get(), 30);
    ///
    /// let err = TypedTransaction::from_json(&json!({
    ///     "type": "TxTypeValueTransfer",
    ///     "from": "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b",
    ///     "to": "0x7b65b75d204abed71587c9e519a89277766ee1d0",
    ///     "value": 1,
    ///     "gas": 25000,
    ///     "feePayer": "0x33f524631e573329a550296f595c820d6c65213f",
    /// }))
    /// .unwrap_err();
    /// assert!(matches!(err, TransactionError::UnexpectedField(..)));
    /// ```
    pub fn from_json(value: &Value) -> Result<Self, TransactionError> {
        let map = value
            .as_object()
            .ok_or_else(|| TransactionError::InvalidFieldValue("transaction".to_owned(), value.to_string()))?;
        let tx_type = parse_type(map.get("type").ok_or_else(|| missing("type"))?)?;
        if let Some(name) = map.keys().find(|name| !is_allowed(tx_type, name)) {
            return Err(TransactionError::UnexpectedField(name.clone(), tx_type))
        }
        let bag = FieldBag { map };

        let mut tx = match tx_type.tag() & !0x07 {
            0x08 => bag.build(tx_type, ValueTransfer { to: bag.address("to")?, value: bag.u256("value")? })?,
            0x10 => bag.build(
                tx_type,
                ValueTransferMemo {
                    to: bag.address("to")?,
                    value: bag.u256("value")?,
                    input: bag.bytes("input")?,
                },
            )?,
            0x20 => bag.build(tx_type, AccountUpdate::new(bag.account_key("key")?))?,
            0x28 => bag.build(
                tx_type,
                SmartContractDeploy {
                    value: bag.opt_u256("value")?.unwrap_or_default(),
                    input: bag.bytes("input")?,
                    human_readable: bag.human_readable()?,
                    code_format: bag.code_format()?,
                },
            )?,
            0x30 => bag.build(
                tx_type,
                SmartContractExecution {
                    to: bag.address("to")?,
                    value: bag.opt_u256("value")?.unwrap_or_default(),
                    input: bag.bytes("input")?,
                },
            )?,
            0x38 => bag.build(tx_type, Cancel)?,
            0x48 => bag.build(tx_type, ChainDataAnchoring::new(bag.bytes("input")?))?,
            _ => {
                let fields = TxFields {
                    from: bag.opt_address("from")?.unwrap_or_default(),
                    ..bag.tx_fields_without_from()?
                };
                LegacyTransaction {
                    fields,
                    to: bag.opt_address("to")?,
                    value: bag.opt_u256("value")?.unwrap_or_default(),
                    input: bag.opt_bytes("input")?.unwrap_or_default(),
                    signature: None,
                }
                .into()
            }
        };

        if let Some(signatures) = bag.get("signatures") {
            tx.append_signatures(SignatureSet::from_json(signatures)?)?;
        }
        if let Some(fee_payer) = bag.opt_address("feePayer")? {
            tx.set_fee_payer(fee_payer)?;
        }
        if let Some(signatures) = bag.get("feePayerSignatures") {
            tx.append_fee_payer_signatures(SignatureSet::from_json(signatures)?)?;
        }
        tx.validate()?;
        Ok(tx)
    }
}

/// Parses a type name like `TxTypeValueTransfer` or a tag given as a number or hex string
fn parse_type(value: &Value) -> Result<TxType, TransactionError> {
    let unknown = || TransactionError::UnknownTransactionType(value.to_string());
    let tag = match value {
        Value::String(name) => {
            if let Ok(tx_type) = TxType::from_str(name) {
                return Ok(tx_type)
            }
            let hex = name.strip_prefix("0x").ok_or_else(unknown)?;
            u8::from_str_radix(hex, 16).map_err(|_| unknown())?
        }
        Value::Number(number) => {
            number.as_u64().and_then(|tag| u8::try_from(tag).ok()).ok_or_else(unknown)?
        }
        _ => return Err(unknown()),
    };
    TxType::try_from(tag).map_err(|_| unknown())
}

fn missing(name: &str) -> TransactionError {
    TransactionError::MissingField(name.to_owned())
}

struct FieldBag<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> FieldBag<'a> {
    /// The value of `name`, `null` counting as absent
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|value| !value.is_null())
    }

    fn required(&self, name: &str) -> Result<&'a Value, TransactionError> {
        self.get(name).ok_or_else(|| missing(name))
    }

    fn invalid(name: &str, value: &Value) -> TransactionError {
        TransactionError::InvalidFieldValue(name.to_owned(), value.to_string())
    }

    fn address(&self, name: &str) -> Result<Address, TransactionError> {
        self.opt_address(name)?.ok_or_else(|| missing(name))
    }

    fn opt_address(&self, name: &str) -> Result<Option<Address>, TransactionError> {
        let value = match self.get(name) {
            Some(value) => value,
            None => return Ok(None),
        };
        value
            .as_str()
            .and_then(parse_checksummed)
            .map(Some)
            .ok_or_else(|| TransactionError::InvalidAddress(name.to_owned(), value.to_string()))
    }

    fn u256(&self, name: &str) -> Result<U256, TransactionError> {
        self.opt_u256(name)?.ok_or_else(|| missing(name))
    }

    fn opt_u256(&self, name: &str) -> Result<Option<U256>, TransactionError> {
        let value = match self.get(name) {
            Some(value) => value,
            None => return Ok(None),
        };
        let parsed = match value {
            Value::Number(number) => number.as_u64().map(U256::from),
            Value::String(s) => match s.strip_prefix("0x") {
                Some("") => Some(U256::zero()),
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_dec_str(s).ok(),
            },
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| Self::invalid(name, value))
    }

    fn bytes(&self, name: &str) -> Result<Bytes, TransactionError> {
        self.opt_bytes(name)?.ok_or_else(|| missing(name))
    }

    fn opt_bytes(&self, name: &str) -> Result<Option<Bytes>, TransactionError> {
        let value = match self.get(name) {
            Some(value) => value,
            None => return Ok(None),
        };
        let hex = value.as_str().ok_or_else(|| Self::invalid(name, value))?;
        Ok(Some(decode_hex(hex)?.into()))
    }

    /// The fields shared by every type, `from` left to the caller
    fn tx_fields_without_from(&self) -> Result<TxFields, TransactionError> {
        Ok(TxFields {
            from: Address::zero(),
            nonce: self.opt_u256("nonce")?,
            gas: self.u256("gas")?,
            gas_price: self.opt_u256("gasPrice")?,
            chain_id: self.opt_u64("chainId")?,
        })
    }

    fn opt_u64(&self, name: &str) -> Result<Option<U64>, TransactionError> {
        match self.opt_u256(name)? {
            Some(value) if value > U256::from(u64::MAX) => {
                Err(TransactionError::InvalidFieldValue(name.to_owned(), format!("{value:#x}")))
            }
            value => Ok(value.map(|value| U64::from(value.low_u64()))),
        }
    }

    fn tx_fields(&self) -> Result<TxFields, TransactionError> {
        Ok(TxFields { from: self.address("from")?, ..self.tx_fields_without_from()? })
    }

    /// An integer in 1..=99, either a JSON number or a hex string
    fn fee_ratio(&self) -> Result<FeeRatio, TransactionError> {
        let value = self.required(FEE_RATIO)?;
        let invalid = || TransactionError::InvalidFeeRatio(value.to_string());
        let ratio = match value {
            Value::Number(number) => number.as_u64(),
            Value::String(s) => {
                s.strip_prefix("0x").and_then(|hex| u64::from_str_radix(hex, 16).ok())
            }
            _ => None,
        }
        .ok_or_else(invalid)?;
        u8::try_from(ratio).ok().and_then(|ratio| FeeRatio::new(ratio).ok()).ok_or_else(invalid)
    }

    fn human_readable(&self) -> Result<bool, TransactionError> {
        match self.get("humanReadable") {
            None | Some(Value::Bool(false)) => Ok(false),
            Some(Value::Bool(true)) => Err(TransactionError::HumanReadableUnsupported),
            Some(value) => Err(Self::invalid("humanReadable", value)),
        }
    }

    fn code_format(&self) -> Result<CodeFormat, TransactionError> {
        let value = match self.get("codeFormat") {
            Some(value) => value,
            None => return Ok(CodeFormat::Evm),
        };
        let format = match value {
            Value::Number(number) => number.as_u64(),
            Value::String(s) if s.eq_ignore_ascii_case("evm") => Some(0),
            Value::String(s) => {
                s.strip_prefix("0x").and_then(|hex| u64::from_str_radix(hex, 16).ok())
            }
            _ => None,
        };
        format
            .and_then(|format| u8::try_from(format).ok())
            .and_then(|format| CodeFormat::try_from(format).ok())
            .ok_or_else(|| TransactionError::InvalidCodeFormat(value.to_string()))
    }

    fn account_key(&self, name: &str) -> Result<AccountKey, TransactionError> {
        let encoded = self.bytes(name)?;
        Ok(AccountKey::decode(encoded.as_ref())?)
    }

    /// Wraps `body` in the envelope of `tx_type`
    fn build<B: TxBody>(&self, tx_type: TxType, body: B) -> Result<TypedTransaction, TransactionError>
    where
        TypedTransaction: From<Basic<B>> + From<FeeDelegated<B>> + From<FeeDelegatedWithRatio<B>>,
    {
        let fields = self.tx_fields()?;
        Ok(if tx_type.is_fee_delegated_with_ratio() {
            FeeDelegatedWithRatio::new(fields, body, self.fee_ratio()?)?.into()
        } else if tx_type.is_fee_delegated() {
            FeeDelegated::new(fields, body)?.into()
        } else {
            Basic::new(fields, body)?.into()
        })
    }
}

//! Klaytn transactions: the legacy transaction and the typed transaction families, in their
//! basic, fee-delegated and fee-delegated-with-ratio forms.
pub mod hasher;
pub mod typed;

mod envelope;
pub use envelope::{Basic, Envelope, FeeDelegated, FeeDelegatedWithRatio};

mod legacy;
pub use legacy::LegacyTransaction;

mod fields;

mod value_transfer;
pub use value_transfer::{ValueTransfer, ValueTransferMemo};

mod account_update;
pub use account_update::AccountUpdate;

mod smart_contract;
pub use smart_contract::{SmartContractDeploy, SmartContractExecution};

mod cancel;
pub use cancel::Cancel;

mod chain_data_anchoring;
pub use chain_data_anchoring::ChainDataAnchoring;

use crate::types::{AccountKeyError, Address, Role, SignatureError, U256, U64};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};
use strum::{Display, EnumString};
use thiserror::Error;

/// An error involving a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// A field required by the transaction type is absent
    #[error("missing field: {0}")]
    MissingField(String),
    /// A field outside the schema of the transaction type was supplied
    #[error("unexpected field `{0}` for {1}")]
    UnexpectedField(String, TxType),
    /// An address-shaped field has a bad length, bad hex or a bad checksum
    #[error("invalid address for `{0}`: {1}")]
    InvalidAddress(String, String),
    /// The fee ratio is outside 1..=99 or not a number
    #[error("invalid fee ratio {0}, expected an integer in 1..=99")]
    InvalidFeeRatio(String),
    /// A field holds a value of the wrong shape
    #[error("invalid value for `{0}`: {1}")]
    InvalidFieldValue(String, String),
    /// The code format is not EVM
    #[error("invalid code format {0}, only EVM (0) is supported")]
    InvalidCodeFormat(String),
    /// `humanReadable` was set, Klaytn no longer supports human readable addresses
    #[error("human readable addresses are not supported")]
    HumanReadableUnsupported,
    /// The type name or tag matches no Klaytn transaction
    #[error("unknown transaction type {0}")]
    UnknownTransactionType(String),
    /// A value required to encode or hash the transaction has not been filled in
    #[error("{0} is undefined, fill it first")]
    FieldUndefined(&'static str),
    /// A legacy transaction already carries a different signature
    #[error("the legacy transaction is already signed")]
    SignatureAlreadySet,
    /// A legacy transaction holds a single signature
    #[error("a legacy transaction holds one signature, got {0}")]
    TooManySignatures(usize),
    /// Fee payer signatures were supplied while the fee payer is still unknown
    #[error("fee payer signatures require a fee payer address")]
    FeePayerSignaturesWithoutFeePayer,
    /// A combined transaction differs in a field other than its signatures
    #[error("the transactions to combine differ in `{0}`")]
    ConflictingTransactionData(&'static str),
    /// A raw transaction to combine is of another type
    #[error("transaction type mismatch, expected {expected} but got {actual}")]
    TypeMismatch { expected: TxType, actual: TxType },
    /// The operation is not defined for the transaction type
    #[error("{operation} is not supported by {tx_type}")]
    Unsupported { operation: &'static str, tx_type: TxType },
    /// When decoding the RLP payload
    #[error(transparent)]
    Rlp(#[from] DecoderError),
    /// Error in underlying lib `hex`
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// A signature is malformed or cannot be recovered
    #[error(transparent)]
    Signature(#[from] SignatureError),
    /// The account key of an account update is invalid
    #[error(transparent)]
    AccountKey(#[from] AccountKeyError),
}

/// The type tag of every Klaytn transaction.
///
/// The legacy transaction carries no tag on the wire; it is listed with `0x00`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum TxType {
    #[strum(serialize = "TxTypeLegacyTransaction")]
    Legacy = 0x00,
    #[strum(serialize = "TxTypeValueTransfer")]
    ValueTransfer = 0x08,
    #[strum(serialize = "TxTypeFeeDelegatedValueTransfer")]
    FeeDelegatedValueTransfer = 0x09,
    #[strum(serialize = "TxTypeFeeDelegatedValueTransferWithRatio")]
    FeeDelegatedValueTransferWithRatio = 0x0a,
    #[strum(serialize = "TxTypeValueTransferMemo")]
    ValueTransferMemo = 0x10,
    #[strum(serialize = "TxTypeFeeDelegatedValueTransferMemo")]
    FeeDelegatedValueTransferMemo = 0x11,
    #[strum(serialize = "TxTypeFeeDelegatedValueTransferMemoWithRatio")]
    FeeDelegatedValueTransferMemoWithRatio = 0x12,
    #[strum(serialize = "TxTypeAccountUpdate")]
    AccountUpdate = 0x20,
    #[strum(serialize = "TxTypeFeeDelegatedAccountUpdate")]
    FeeDelegatedAccountUpdate = 0x21,
    #[strum(serialize = "TxTypeFeeDelegatedAccountUpdateWithRatio")]
    FeeDelegatedAccountUpdateWithRatio = 0x22,
    #[strum(serialize = "TxTypeSmartContractDeploy")]
    SmartContractDeploy = 0x28,
    #[strum(serialize = "TxTypeFeeDelegatedSmartContractDeploy")]
    FeeDelegatedSmartContractDeploy = 0x29,
    #[strum(serialize = "TxTypeFeeDelegatedSmartContractDeployWithRatio")]
    FeeDelegatedSmartContractDeployWithRatio = 0x2a,
    #[strum(serialize = "TxTypeSmartContractExecution")]
    SmartContractExecution = 0x30,
    #[strum(serialize = "TxTypeFeeDelegatedSmartContractExecution")]
    FeeDelegatedSmartContractExecution = 0x31,
    #[strum(serialize = "TxTypeFeeDelegatedSmartContractExecutionWithRatio")]
    FeeDelegatedSmartContractExecutionWithRatio = 0x32,
    #[strum(serialize = "TxTypeCancel")]
    Cancel = 0x38,
    #[strum(serialize = "TxTypeFeeDelegatedCancel")]
    FeeDelegatedCancel = 0x39,
    #[strum(serialize = "TxTypeFeeDelegatedCancelWithRatio")]
    FeeDelegatedCancelWithRatio = 0x3a,
    #[strum(serialize = "TxTypeChainDataAnchoring")]
    ChainDataAnchoring = 0x48,
    #[strum(serialize = "TxTypeFeeDelegatedChainDataAnchoring")]
    FeeDelegatedChainDataAnchoring = 0x49,
    #[strum(serialize = "TxTypeFeeDelegatedChainDataAnchoringWithRatio")]
    FeeDelegatedChainDataAnchoringWithRatio = 0x4a,
}

impl TxType {
    /// The leading byte of the typed wire form
    pub fn tag(self) -> u8 {
        self.into()
    }

    pub fn is_legacy(self) -> bool {
        self == TxType::Legacy
    }

    /// True for the fee-delegated forms, with or without a fee ratio
    pub fn is_fee_delegated(self) -> bool {
        !self.is_legacy() && self.tag() & 0x07 != 0
    }

    pub fn is_fee_delegated_with_ratio(self) -> bool {
        !self.is_legacy() && self.tag() & 0x07 == 2
    }

    /// True for the account update family, signed with the account update role
    pub fn is_account_update(self) -> bool {
        self.tag() & !0x07 == 0x20
    }
}

/// Share of the transaction fee, in percent, paid by the fee payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FeeRatio(u8);

impl FeeRatio {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 99;

    pub fn new(ratio: u8) -> Result<Self, TransactionError> {
        if (Self::MIN..=Self::MAX).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(TransactionError::InvalidFeeRatio(ratio.to_string()))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for FeeRatio {
    type Error = TransactionError;

    fn try_from(ratio: u8) -> Result<Self, Self::Error> {
        Self::new(ratio)
    }
}

impl From<FeeRatio> for u8 {
    fn from(ratio: FeeRatio) -> Self {
        ratio.0
    }
}

impl fmt::Display for FeeRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Encodable for FeeRatio {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append(&self.0);
    }
}

impl Decodable for FeeRatio {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Self::new(rlp.as_val()?).map_err(|_| DecoderError::Custom("fee ratio out of range"))
    }
}

/// Format of the code deployed by a smart contract deploy transaction
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum CodeFormat {
    #[default]
    Evm = 0,
}

/// The fields shared by every transaction.
///
/// `nonce`, `gas_price` and `chain_id` may be left empty at construction; they must be filled
/// in, by hand or from a node, before the transaction is encoded, hashed or signed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxFields {
    /// Sender address, the zero address standing for "unknown" on legacy transactions
    pub from: Address,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,

    /// Gas limit
    pub gas: U256,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,

    #[serde(rename = "chainId", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U64>,
}

impl TxFields {
    /// Creates the fields of a transaction sent by `from` with the given gas limit
    pub fn new<T: Into<U256>>(from: Address, gas: T) -> Self {
        Self { from, gas: gas.into(), ..Default::default() }
    }

    // Builder pattern helpers

    /// Sets the `nonce` field to the provided value
    pub fn nonce<T: Into<U256>>(mut self, nonce: T) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the `gas_price` field to the provided value
    pub fn gas_price<T: Into<U256>>(mut self, gas_price: T) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    /// Sets the `chain_id` field to the provided value
    pub fn chain_id<T: Into<U64>>(mut self, chain_id: T) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// Fails with [`TransactionError::FieldUndefined`] naming the first value left empty
    pub fn ensure_filled(&self) -> Result<(), TransactionError> {
        if self.nonce.is_none() {
            return Err(TransactionError::FieldUndefined("nonce"))
        }
        if self.gas_price.is_none() {
            return Err(TransactionError::FieldUndefined("gasPrice"))
        }
        if self.chain_id.is_none() {
            return Err(TransactionError::FieldUndefined("chainId"))
        }
        Ok(())
    }

    pub fn is_filled(&self) -> bool {
        self.ensure_filled().is_ok()
    }

    pub(crate) fn filled_chain_id(&self) -> Result<U64, TransactionError> {
        self.chain_id.ok_or(TransactionError::FieldUndefined("chainId"))
    }

    /// Fields as decoded from the wire, the chain id coming from the signatures
    pub(crate) fn decoded(from: Address, nonce: U256, gas_price: U256, gas: U256) -> Self {
        Self { from, nonce: Some(nonce), gas, gas_price: Some(gas_price), chain_id: None }
    }
}

/// The family specific part of a typed transaction.
///
/// A body knows its place in the tag table and the order its fields take on the wire; the
/// envelopes ([`Basic`], [`FeeDelegated`], [`FeeDelegatedWithRatio`]) add the signatures and
/// the fee payer around it.
pub trait TxBody: Clone + fmt::Debug + PartialEq + Eq + Send + Sync {
    /// The basic, fee-delegated and fee-delegated-with-ratio types of the family
    const TX_TYPES: [TxType; 3];

    /// Number of family fields on the wire, the common fields included
    const NUM_FIELDS: usize;

    /// The role whose keys sign the transaction
    const ROLE: Role = Role::Transaction;

    /// Checks the body against the domain of its fields
    fn validate(&self) -> Result<(), TransactionError> {
        Ok(())
    }

    /// Appends the family fields in wire order, the fee ratio in its family specific position
    fn rlp_append_fields(&self, fields: &TxFields, fee_ratio: Option<FeeRatio>, s: &mut RlpStream);

    /// Decodes the family fields starting at `offset`, advancing it past them
    fn decode_fields(
        rlp: &Rlp,
        offset: &mut usize,
        with_ratio: bool,
    ) -> Result<(TxFields, Self, Option<FeeRatio>), TransactionError>;
}

pub(super) fn rlp_opt<T: Encodable>(rlp: &mut RlpStream, opt: &Option<T>) {
    if let Some(inner) = opt {
        rlp.append(inner);
    } else {
        rlp.append(&"");
    }
}

/// Appends nonce, gas price and gas, the head every family starts with
pub(super) fn rlp_append_head(rlp: &mut RlpStream, fields: &TxFields) {
    rlp_opt(rlp, &fields.nonce);
    rlp_opt(rlp, &fields.gas_price);
    rlp.append(&fields.gas);
}

/// Decodes the value at `offset` and increments it
#[inline]
pub(super) fn decode_next<T: Decodable>(rlp: &Rlp, offset: &mut usize) -> Result<T, DecoderError> {
    let value = rlp.val_at(*offset)?;
    *offset += 1;
    Ok(value)
}

/// Decodes nonce, gas price and gas
pub(super) fn decode_head(
    rlp: &Rlp,
    offset: &mut usize,
) -> Result<(U256, U256, U256), DecoderError> {
    Ok((decode_next(rlp, offset)?, decode_next(rlp, offset)?, decode_next(rlp, offset)?))
}

pub(super) fn decode_fee_ratio(
    rlp: &Rlp,
    offset: &mut usize,
    with_ratio: bool,
) -> Result<Option<FeeRatio>, DecoderError> {
    if with_ratio {
        decode_next(rlp, offset).map(Some)
    } else {
        Ok(None)
    }
}

/// Decodes an item that must be the empty string, like the `to` of a contract deploy
pub(super) fn decode_empty(rlp: &Rlp, offset: &mut usize) -> Result<(), DecoderError> {
    let item = rlp.at(*offset)?;
    if !item.is_data() || !item.is_empty() {
        return Err(DecoderError::Custom("expected an empty string"))
    }
    *offset += 1;
    Ok(())
}

/// extracts the chain id from the signature v value based on EIP-155
pub(crate) fn extract_chain_id(v: u64) -> Option<U64> {
    // if a chain id is available, v = {0, 1} + CHAIN_ID * 2 + 35
    if v >= 35 {
        return Some(U64::from((v - 35) >> 1))
    }
    None
}

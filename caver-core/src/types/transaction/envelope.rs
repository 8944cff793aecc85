use super::{decode_next, FeeRatio, TransactionError, TxBody, TxFields, TxType};
use crate::{
    types::{
        signature::{decode_signatures, merge_signatures, rlp_append_signatures},
        Address, Bytes, Role, SignatureData, SignatureSet, H256, U64,
    },
    utils::keccak256,
};
use rlp::{Rlp, RlpStream};

/// Behavior shared by every transaction form.
///
/// Implemented by [`super::LegacyTransaction`] and by the three envelopes around a
/// [`TxBody`]; [`super::typed::TypedTransaction`] dispatches to it.
pub trait Envelope {
    fn tx_type(&self) -> TxType;

    fn fields(&self) -> &TxFields;

    fn fields_mut(&mut self) -> &mut TxFields;

    /// The role whose keys sign as the sender
    fn role(&self) -> Role {
        Role::Transaction
    }

    /// Checks the field domains and the signature invariants
    fn validate(&self) -> Result<(), TransactionError>;

    fn signatures(&self) -> &[SignatureData];

    /// Appends sender signatures, dropping empty placeholders and duplicates
    fn append_signatures(&mut self, signatures: SignatureSet) -> Result<(), TransactionError>;

    fn clear_signatures(&mut self);

    /// The fee payer, `Some` for the fee-delegated forms only
    fn fee_payer(&self) -> Option<Address> {
        None
    }

    fn fee_payer_signatures(&self) -> &[SignatureData] {
        &[]
    }

    fn set_fee_payer(&mut self, _fee_payer: Address) -> Result<(), TransactionError> {
        Err(self.unsupported("set_fee_payer"))
    }

    fn append_fee_payer_signatures(
        &mut self,
        _signatures: SignatureSet,
    ) -> Result<(), TransactionError> {
        Err(self.unsupported("append_fee_payer_signatures"))
    }

    fn clear_fee_payer_signatures(&mut self) {}

    fn fee_ratio(&self) -> Option<FeeRatio> {
        None
    }

    fn set_fee_ratio(&mut self, _fee_ratio: FeeRatio) -> Result<(), TransactionError> {
        Err(self.unsupported("set_fee_ratio"))
    }

    /// The wire form
    fn rlp_encoding(&self) -> Result<Bytes, TransactionError>;

    /// The fields both the sender and the fee payer sign over
    fn common_rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError>;

    /// The payload whose hash the sender signs
    fn rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError>;

    /// The payload whose hash the fee payer signs
    fn rlp_encoding_for_fee_payer_signature(&self) -> Result<Bytes, TransactionError> {
        Err(self.unsupported("rlp_encoding_for_fee_payer_signature"))
    }

    /// Hash of the sender's part of the transaction, equal to the transaction hash unless the
    /// transaction is fee-delegated
    fn sender_tx_hash(&self) -> Result<H256, TransactionError> {
        Ok(keccak256(self.rlp_encoding()?).into())
    }

    /// Decodes the wire form
    fn decode(raw: &[u8]) -> Result<Self, TransactionError>
    where
        Self: Sized;

    #[doc(hidden)]
    fn unsupported(&self, operation: &'static str) -> TransactionError {
        TransactionError::Unsupported { operation, tx_type: self.tx_type() }
    }
}

/// A typed transaction signed by its sender alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basic<B> {
    pub fields: TxFields,
    pub body: B,
    pub signatures: Vec<SignatureData>,
}

/// A typed transaction whose fee is paid by a fee payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeDelegated<B> {
    pub tx: Basic<B>,
    /// The zero address until a fee payer is known
    pub fee_payer: Address,
    pub fee_payer_signatures: Vec<SignatureData>,
}

/// A typed transaction whose fee is split between its sender and a fee payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeDelegatedWithRatio<B> {
    pub tx: FeeDelegated<B>,
    pub fee_ratio: FeeRatio,
}

impl<B: TxBody> Basic<B> {
    /// Creates an unsigned transaction, validating the body
    pub fn new(fields: TxFields, body: B) -> Result<Self, TransactionError> {
        let tx = Self { fields, body, signatures: Vec::new() };
        tx.validate()?;
        Ok(tx)
    }

    /// Appends the family fields
    fn rlp_append_fields(&self, fee_ratio: Option<FeeRatio>, rlp: &mut RlpStream) {
        self.body.rlp_append_fields(&self.fields, fee_ratio, rlp)
    }

    fn num_fields(fee_ratio: Option<FeeRatio>) -> usize {
        B::NUM_FIELDS + usize::from(fee_ratio.is_some())
    }

    /// `tag ++ RLP([fields..., [signatures...], fee payer parts...])`
    fn encode(
        &self,
        tx_type: TxType,
        fee_ratio: Option<FeeRatio>,
        fee_payer: Option<(&Address, &[SignatureData])>,
    ) -> Result<Bytes, TransactionError> {
        self.fields.ensure_filled()?;
        let extra = if fee_payer.is_some() { 3 } else { 1 };
        let mut rlp = RlpStream::new_list(Self::num_fields(fee_ratio) + extra);
        self.rlp_append_fields(fee_ratio, &mut rlp);
        rlp_append_signatures(&mut rlp, &self.signatures);
        if let Some((fee_payer, signatures)) = fee_payer {
            rlp.append(fee_payer);
            rlp_append_signatures(&mut rlp, signatures);
        }
        Ok(tagged(tx_type, &rlp.out()))
    }

    /// `RLP([tag, fields...])`
    fn common_encoding(
        &self,
        tx_type: TxType,
        fee_ratio: Option<FeeRatio>,
    ) -> Result<Bytes, TransactionError> {
        self.fields.ensure_filled()?;
        let mut rlp = RlpStream::new_list(Self::num_fields(fee_ratio) + 1);
        rlp.append(&tx_type.tag());
        self.rlp_append_fields(fee_ratio, &mut rlp);
        Ok(rlp.out().freeze().into())
    }

    /// `RLP([common, fee payer?, chain id, 0, 0])`
    fn signature_payload(
        &self,
        tx_type: TxType,
        fee_ratio: Option<FeeRatio>,
        fee_payer: Option<&Address>,
    ) -> Result<Bytes, TransactionError> {
        let common = self.common_encoding(tx_type, fee_ratio)?;
        let chain_id: U64 = self.fields.filled_chain_id()?;
        let mut rlp = RlpStream::new_list(if fee_payer.is_some() { 5 } else { 4 });
        rlp.append(&common);
        if let Some(fee_payer) = fee_payer {
            rlp.append(fee_payer);
        }
        rlp.append(&chain_id);
        rlp.append_empty_data();
        rlp.append_empty_data();
        Ok(rlp.out().freeze().into())
    }

    /// Decodes `RLP([fields..., [signatures...], ...])` after the tag, checking the item count
    fn decode_list(
        rlp: &Rlp,
        with_ratio: bool,
        fee_delegated: bool,
    ) -> Result<(Self, Option<FeeRatio>, usize), TransactionError> {
        let expected = B::NUM_FIELDS +
            usize::from(with_ratio) +
            if fee_delegated { 3 } else { 1 };
        if rlp.item_count()? != expected {
            return Err(rlp::DecoderError::RlpIncorrectListLen.into())
        }
        let mut offset = 0;
        let (mut fields, body, fee_ratio) = B::decode_fields(rlp, &mut offset, with_ratio)?;
        let signatures = decode_signatures(&rlp.at(offset)?)?;
        offset += 1;
        fields.chain_id = signatures.first().and_then(|sig| super::extract_chain_id(sig.v));
        Ok((Self { fields, body, signatures }, fee_ratio, offset))
    }
}

impl<B: TxBody> FeeDelegated<B> {
    /// Creates an unsigned transaction whose fee payer is not yet known
    pub fn new(fields: TxFields, body: B) -> Result<Self, TransactionError> {
        Ok(Self {
            tx: Basic::new(fields, body)?,
            fee_payer: Address::zero(),
            fee_payer_signatures: Vec::new(),
        })
    }

    /// Sets the fee payer
    pub fn with_fee_payer(mut self, fee_payer: Address) -> Result<Self, TransactionError> {
        self.fee_payer = fee_payer;
        self.validate()?;
        Ok(self)
    }

    fn encode(&self, tx_type: TxType, fee_ratio: Option<FeeRatio>) -> Result<Bytes, TransactionError> {
        self.tx.encode(tx_type, fee_ratio, Some((&self.fee_payer, self.fee_payer_signatures.as_slice())))
    }

    fn fee_payer_payload(
        &self,
        tx_type: TxType,
        fee_ratio: Option<FeeRatio>,
    ) -> Result<Bytes, TransactionError> {
        if self.fee_payer.is_zero() {
            return Err(TransactionError::FieldUndefined("feePayer"))
        }
        self.tx.signature_payload(tx_type, fee_ratio, Some(&self.fee_payer))
    }

    fn decode_with(
        raw: &[u8],
        tx_type: TxType,
        with_ratio: bool,
    ) -> Result<(Self, Option<FeeRatio>), TransactionError> {
        let rlp = Rlp::new(untagged(raw, tx_type)?);
        let (mut tx, fee_ratio, mut offset) = Basic::<B>::decode_list(&rlp, with_ratio, true)?;
        let fee_payer: Address = decode_next(&rlp, &mut offset)?;
        let fee_payer_signatures = decode_signatures(&rlp.at(offset)?)?;
        if tx.fields.chain_id.is_none() {
            tx.fields.chain_id =
                fee_payer_signatures.first().and_then(|sig| super::extract_chain_id(sig.v));
        }
        let decoded = Self { tx, fee_payer, fee_payer_signatures };
        decoded.validate_fee_payer()?;
        Ok((decoded, fee_ratio))
    }

    fn validate_fee_payer(&self) -> Result<(), TransactionError> {
        if self.fee_payer.is_zero() && !self.fee_payer_signatures.is_empty() {
            return Err(TransactionError::FeePayerSignaturesWithoutFeePayer)
        }
        Ok(())
    }

    /// `keccak(tag ++ RLP([fields..., [signatures...]]))`, the fee payer parts removed
    fn sender_hash(&self, tx_type: TxType, fee_ratio: Option<FeeRatio>) -> Result<H256, TransactionError> {
        Ok(keccak256(self.tx.encode(tx_type, fee_ratio, None)?).into())
    }
}

impl<B: TxBody> FeeDelegatedWithRatio<B> {
    /// Creates an unsigned transaction whose fee payer is not yet known
    pub fn new(fields: TxFields, body: B, fee_ratio: FeeRatio) -> Result<Self, TransactionError> {
        Ok(Self { tx: FeeDelegated::new(fields, body)?, fee_ratio })
    }

    /// Sets the fee payer
    pub fn with_fee_payer(mut self, fee_payer: Address) -> Result<Self, TransactionError> {
        self.tx = self.tx.with_fee_payer(fee_payer)?;
        Ok(self)
    }

    pub fn with_fee_ratio(mut self, fee_ratio: FeeRatio) -> Result<Self, TransactionError> {
        self.fee_ratio = fee_ratio;
        self.validate()?;
        Ok(self)
    }
}

impl<B: TxBody> Envelope for Basic<B> {
    fn tx_type(&self) -> TxType {
        B::TX_TYPES[0]
    }

    fn fields(&self) -> &TxFields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut TxFields {
        &mut self.fields
    }

    fn role(&self) -> Role {
        B::ROLE
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.fields.from.is_zero() {
            return Err(TransactionError::MissingField("from".to_owned()))
        }
        self.body.validate()
    }

    fn signatures(&self) -> &[SignatureData] {
        &self.signatures
    }

    fn append_signatures(&mut self, signatures: SignatureSet) -> Result<(), TransactionError> {
        merge_signatures(&mut self.signatures, signatures);
        Ok(())
    }

    fn clear_signatures(&mut self) {
        self.signatures.clear();
    }

    fn rlp_encoding(&self) -> Result<Bytes, TransactionError> {
        self.encode(self.tx_type(), None, None)
    }

    fn common_rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.common_encoding(self.tx_type(), None)
    }

    fn rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.signature_payload(self.tx_type(), None, None)
    }

    fn decode(raw: &[u8]) -> Result<Self, TransactionError> {
        let rlp = Rlp::new(untagged(raw, B::TX_TYPES[0])?);
        let (tx, _, _) = Self::decode_list(&rlp, false, false)?;
        Ok(tx)
    }
}

impl<B: TxBody> Envelope for FeeDelegated<B> {
    fn tx_type(&self) -> TxType {
        B::TX_TYPES[1]
    }

    fn fields(&self) -> &TxFields {
        &self.tx.fields
    }

    fn fields_mut(&mut self) -> &mut TxFields {
        &mut self.tx.fields
    }

    fn role(&self) -> Role {
        B::ROLE
    }

    fn validate(&self) -> Result<(), TransactionError> {
        self.tx.validate()?;
        self.validate_fee_payer()
    }

    fn signatures(&self) -> &[SignatureData] {
        &self.tx.signatures
    }

    fn append_signatures(&mut self, signatures: SignatureSet) -> Result<(), TransactionError> {
        self.tx.append_signatures(signatures)
    }

    fn clear_signatures(&mut self) {
        self.tx.clear_signatures();
    }

    fn fee_payer(&self) -> Option<Address> {
        Some(self.fee_payer)
    }

    fn fee_payer_signatures(&self) -> &[SignatureData] {
        &self.fee_payer_signatures
    }

    fn set_fee_payer(&mut self, fee_payer: Address) -> Result<(), TransactionError> {
        self.fee_payer = fee_payer;
        self.validate_fee_payer()
    }

    fn append_fee_payer_signatures(
        &mut self,
        signatures: SignatureSet,
    ) -> Result<(), TransactionError> {
        let signatures = signatures.into_vec();
        if self.fee_payer.is_zero() && signatures.iter().any(|sig| !sig.is_empty()) {
            return Err(TransactionError::FeePayerSignaturesWithoutFeePayer)
        }
        merge_signatures(&mut self.fee_payer_signatures, signatures);
        Ok(())
    }

    fn clear_fee_payer_signatures(&mut self) {
        self.fee_payer_signatures.clear();
    }

    fn rlp_encoding(&self) -> Result<Bytes, TransactionError> {
        self.encode(self.tx_type(), None)
    }

    fn common_rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.tx.common_encoding(self.tx_type(), None)
    }

    fn rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.tx.signature_payload(self.tx_type(), None, None)
    }

    fn rlp_encoding_for_fee_payer_signature(&self) -> Result<Bytes, TransactionError> {
        self.fee_payer_payload(self.tx_type(), None)
    }

    fn sender_tx_hash(&self) -> Result<H256, TransactionError> {
        self.sender_hash(self.tx_type(), None)
    }

    fn decode(raw: &[u8]) -> Result<Self, TransactionError> {
        let (tx, _) = Self::decode_with(raw, B::TX_TYPES[1], false)?;
        Ok(tx)
    }
}

impl<B: TxBody> Envelope for FeeDelegatedWithRatio<B> {
    fn tx_type(&self) -> TxType {
        B::TX_TYPES[2]
    }

    fn fields(&self) -> &TxFields {
        self.tx.fields()
    }

    fn fields_mut(&mut self) -> &mut TxFields {
        self.tx.fields_mut()
    }

    fn role(&self) -> Role {
        B::ROLE
    }

    fn validate(&self) -> Result<(), TransactionError> {
        self.tx.validate()
    }

    fn signatures(&self) -> &[SignatureData] {
        self.tx.signatures()
    }

    fn append_signatures(&mut self, signatures: SignatureSet) -> Result<(), TransactionError> {
        self.tx.append_signatures(signatures)
    }

    fn clear_signatures(&mut self) {
        self.tx.clear_signatures();
    }

    fn fee_payer(&self) -> Option<Address> {
        self.tx.fee_payer()
    }

    fn fee_payer_signatures(&self) -> &[SignatureData] {
        self.tx.fee_payer_signatures()
    }

    fn set_fee_payer(&mut self, fee_payer: Address) -> Result<(), TransactionError> {
        self.tx.set_fee_payer(fee_payer)
    }

    fn append_fee_payer_signatures(
        &mut self,
        signatures: SignatureSet,
    ) -> Result<(), TransactionError> {
        self.tx.append_fee_payer_signatures(signatures)
    }

    fn clear_fee_payer_signatures(&mut self) {
        self.tx.clear_fee_payer_signatures();
    }

    fn fee_ratio(&self) -> Option<FeeRatio> {
        Some(self.fee_ratio)
    }

    fn set_fee_ratio(&mut self, fee_ratio: FeeRatio) -> Result<(), TransactionError> {
        self.fee_ratio = fee_ratio;
        Ok(())
    }

    fn rlp_encoding(&self) -> Result<Bytes, TransactionError> {
        self.tx.encode(self.tx_type(), Some(self.fee_ratio))
    }

    fn common_rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.tx.tx.common_encoding(self.tx_type(), Some(self.fee_ratio))
    }

    fn rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.tx.tx.signature_payload(self.tx_type(), Some(self.fee_ratio), None)
    }

    fn rlp_encoding_for_fee_payer_signature(&self) -> Result<Bytes, TransactionError> {
        self.tx.fee_payer_payload(self.tx_type(), Some(self.fee_ratio))
    }

    fn sender_tx_hash(&self) -> Result<H256, TransactionError> {
        self.tx.sender_hash(self.tx_type(), Some(self.fee_ratio))
    }

    fn decode(raw: &[u8]) -> Result<Self, TransactionError> {
        let (tx, fee_ratio) = FeeDelegated::<B>::decode_with(raw, B::TX_TYPES[2], true)?;
        let fee_ratio = fee_ratio.ok_or(TransactionError::MissingField("feeRatio".to_owned()))?;
        Ok(Self { tx, fee_ratio })
    }
}

fn tagged(tx_type: TxType, payload: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(tx_type.tag());
    out.extend_from_slice(payload);
    out.into()
}

/// Strips the type tag, checking it is the expected one
fn untagged(raw: &[u8], tx_type: TxType) -> Result<&[u8], TransactionError> {
    match raw.split_first() {
        Some((tag, payload)) if *tag == tx_type.tag() => Ok(payload),
        Some((tag, _)) => match TxType::try_from(*tag) {
            Ok(actual) => Err(TransactionError::TypeMismatch { expected: tx_type, actual }),
            Err(_) => Err(TransactionError::UnknownTransactionType(format!("{tag:#04x}"))),
        },
        None => Err(rlp::DecoderError::RlpIsTooShort.into()),
    }
}

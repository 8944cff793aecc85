use super::{
    decode_head, decode_next, extract_chain_id, rlp_append_head, rlp_opt, Envelope,
    TransactionError, TxFields, TxType,
};
use crate::{
    types::{signature::merge_signatures, Address, Bytes, SignatureData, SignatureSet, U256},
    utils::keccak256,
};
use rlp::{Rlp, RlpStream};

/// Legacy transactions have 9 fields
const NUM_TX_FIELDS: usize = 9;

/// The untagged transaction inherited from Ethereum.
///
/// It holds at most one signature, whose `v` folds in the chain id. Its sender is always the
/// address derived from the signing key, so it is never signed by a decoupled keyring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTransaction {
    /// Common fields, `from` is the zero address until known
    pub fields: TxFields,

    /// Recipient address (None for contract creation)
    pub to: Option<Address>,

    pub value: U256,

    /// The compiled code of a contract OR the encoded call of a contract method
    pub input: Bytes,

    pub signature: Option<SignatureData>,
}

impl LegacyTransaction {
    pub fn new(fields: TxFields) -> Self {
        Self { fields, ..Default::default() }
    }

    // Builder pattern helpers

    /// Sets the `to` field in the transaction to the provided value
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Sets the `value` field in the transaction to the provided value
    pub fn value<T: Into<U256>>(mut self, value: T) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the `input` field in the transaction to the provided value
    pub fn input<T: Into<Bytes>>(mut self, input: T) -> Self {
        self.input = input.into();
        self
    }

    fn rlp_base(&self, rlp: &mut RlpStream) {
        rlp_append_head(rlp, &self.fields);
        rlp_opt(rlp, &self.to);
        rlp.append(&self.value);
        rlp.append(&self.input);
    }
}

impl Envelope for LegacyTransaction {
    fn tx_type(&self) -> TxType {
        TxType::Legacy
    }

    fn fields(&self) -> &TxFields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut TxFields {
        &mut self.fields
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.signature.map_or(false, |sig| sig.is_empty()) {
            return Err(crate::types::SignatureError::InvalidSignatureShape(
                "a legacy transaction cannot hold the empty signature".to_owned(),
            )
            .into())
        }
        Ok(())
    }

    fn signatures(&self) -> &[SignatureData] {
        match &self.signature {
            Some(sig) => std::slice::from_ref(sig),
            None => &[],
        }
    }

    /// Sets the signature; an identical signature is accepted again, any other one is rejected
    fn append_signatures(&mut self, signatures: SignatureSet) -> Result<(), TransactionError> {
        let mut incoming = Vec::new();
        merge_signatures(&mut incoming, signatures);
        let sig = match incoming.as_slice() {
            [] => return Ok(()),
            [sig] => *sig,
            many => return Err(TransactionError::TooManySignatures(many.len())),
        };
        match self.signature {
            Some(existing) if existing == sig => Ok(()),
            Some(_) => Err(TransactionError::SignatureAlreadySet),
            None => {
                self.signature = Some(sig);
                Ok(())
            }
        }
    }

    fn clear_signatures(&mut self) {
        self.signature = None;
    }

    fn rlp_encoding(&self) -> Result<Bytes, TransactionError> {
        self.fields.ensure_filled()?;
        let mut rlp = RlpStream::new_list(NUM_TX_FIELDS);
        self.rlp_base(&mut rlp);
        let sig = self.signature.unwrap_or_else(SignatureData::empty);
        rlp.append(&sig.v);
        rlp.append(&sig.r);
        rlp.append(&sig.s);
        Ok(rlp.out().freeze().into())
    }

    fn common_rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.rlp_encoding_for_signature()
    }

    /// `RLP([nonce, gasPrice, gas, to, value, input, chainId, 0, 0])`
    fn rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.fields.ensure_filled()?;
        let mut rlp = RlpStream::new_list(NUM_TX_FIELDS);
        self.rlp_base(&mut rlp);
        rlp.append(&self.fields.filled_chain_id()?);
        rlp.append_empty_data();
        rlp.append_empty_data();
        Ok(rlp.out().freeze().into())
    }

    /// Decodes the wire form, recovering `from` from the signature
    fn decode(raw: &[u8]) -> Result<Self, TransactionError> {
        let rlp = Rlp::new(raw);
        if !rlp.is_list() {
            return Err(rlp::DecoderError::RlpExpectedToBeList.into())
        }
        if rlp.item_count()? != NUM_TX_FIELDS {
            return Err(rlp::DecoderError::RlpIncorrectListLen.into())
        }
        let mut offset = 0;
        let (nonce, gas_price, gas) = decode_head(&rlp, &mut offset)?;
        let to = decode_to(&rlp, &mut offset)?;
        let value = decode_next(&rlp, &mut offset)?;
        let input = decode_next(&rlp, &mut offset)?;
        let sig = SignatureData {
            v: decode_next(&rlp, &mut offset)?,
            r: decode_next(&rlp, &mut offset)?,
            s: decode_next(&rlp, &mut offset)?,
        };

        let mut fields = TxFields::decoded(Address::zero(), nonce, gas_price, gas);
        fields.chain_id = extract_chain_id(sig.v);
        let mut tx = Self { fields, to, value, input, signature: None };
        if !sig.is_empty() {
            tx.signature = Some(sig);
            if tx.fields.chain_id.is_some() {
                let sighash = keccak256(tx.rlp_encoding_for_signature()?);
                tx.fields.from = sig.recover(sighash)?;
            }
        }
        Ok(tx)
    }
}

/// Decodes the `to` field, the empty string standing for a contract creation
fn decode_to(rlp: &Rlp, offset: &mut usize) -> Result<Option<Address>, rlp::DecoderError> {
    let to = rlp.at(*offset)?;
    let to = if to.is_empty() {
        if to.is_data() {
            None
        } else {
            return Err(rlp::DecoderError::RlpExpectedToBeData)
        }
    } else {
        Some(to.as_val()?)
    };
    *offset += 1;
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use k256::ecdsa::SigningKey;
    use std::str::FromStr;

    fn tx() -> LegacyTransaction {
        let fields = TxFields::new(Address::zero(), 21_000u64)
            .nonce(0u64)
            .gas_price(25_000_000_000u64)
            .chain_id(1u64);
        LegacyTransaction::new(fields)
            .to(Address::from_str("7b65b75d204abed71587c9e519a89277766ee1d0").unwrap())
            .value(1u64)
    }

    fn sign(tx: &LegacyTransaction, key: &SigningKey) -> SignatureData {
        let sighash = keccak256(tx.rlp_encoding_for_signature().unwrap());
        let (sig, recid) = key.sign_prehash_recoverable(&sighash).unwrap();
        let (r, s) = sig.split_bytes();
        let chain_id = tx.fields.chain_id.unwrap().as_u64();
        SignatureData::new(
            recid.to_byte() as u64 + chain_id * 2 + 35,
            U256::from_big_endian(&r),
            U256::from_big_endian(&s),
        )
    }

    #[test]
    fn single_signature_cap() {
        let mut tx = tx();
        let a = SignatureData::new(0x25, 1.into(), 2.into());
        let b = SignatureData::new(0x26, 3.into(), 4.into());

        assert!(matches!(
            tx.append_signatures(vec![a, b].into()),
            Err(TransactionError::TooManySignatures(2))
        ));
        assert!(tx.signature.is_none());

        tx.append_signatures(a.into()).unwrap();
        assert!(matches!(tx.append_signatures(b.into()), Err(TransactionError::SignatureAlreadySet)));
        assert_eq!(tx.signatures(), &[a]);
    }

    // combining a legacy transaction with its own signed copy must stay idempotent
    #[test]
    fn appending_the_present_signature_again_is_a_no_op() {
        let key = SigningKey::from_slice(&[0x11; 32]).unwrap();
        let mut tx = tx();
        let sig = sign(&tx, &key);
        tx.append_signatures(sig.into()).unwrap();
        let signed = tx.clone();

        tx.append_signatures(sig.into()).unwrap();
        tx.append_signatures(vec![sig, SignatureData::empty()].into()).unwrap();
        assert_eq!(tx, signed);
        assert_eq!(tx.signatures(), &[sig]);
    }

    #[test]
    fn decode_recovers_sender() {
        let key = SigningKey::from_slice(&hex!(
            "45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8"
        ))
        .unwrap();
        let mut tx = tx();
        let sig = sign(&tx, &key);
        tx.append_signatures(sig.into()).unwrap();

        let raw = tx.rlp_encoding().unwrap();
        assert!(raw.as_ref()[0] >= 0xc0);
        let decoded = LegacyTransaction::decode(raw.as_ref()).unwrap();
        assert_eq!(
            decoded.fields.from,
            Address::from_str("a94f5374fce5edbc8e2a8697c15331677e6ebf0b").unwrap()
        );
        assert_eq!(decoded.fields.chain_id, tx.fields.chain_id);
        assert_eq!(decoded.signature, Some(sig));
    }

    #[test]
    fn unsigned_roundtrip_keeps_contract_creation() {
        let mut tx = tx();
        tx.to = None;
        tx.input = hex!("6080604052").to_vec().into();
        let decoded = LegacyTransaction::decode(tx.rlp_encoding().unwrap().as_ref()).unwrap();
        assert_eq!(decoded.to, None);
        assert_eq!(decoded.signature, None);
        assert_eq!(decoded.input, tx.input);
    }

    #[test]
    fn requires_filled_fields() {
        let mut tx = tx();
        tx.fields.gas_price = None;
        assert!(matches!(tx.rlp_encoding(), Err(TransactionError::FieldUndefined("gasPrice"))));
    }
}

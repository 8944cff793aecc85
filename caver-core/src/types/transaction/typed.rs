use super::{
    AccountUpdate, Basic, Cancel, ChainDataAnchoring, Envelope, FeeDelegated,
    FeeDelegatedWithRatio, FeeRatio, LegacyTransaction, SmartContractDeploy,
    SmartContractExecution, TransactionError, TxFields, TxType, ValueTransfer, ValueTransferMemo,
};
use crate::{
    types::{Address, Bytes, Role, SignatureData, SignatureSet, H256},
    utils::{decode_hex, keccak256},
};
use k256::PublicKey;
use std::convert::TryFrom;

macro_rules! typed_transaction {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Any Klaytn transaction, one variant per transaction type.
        ///
        /// Every variant shares the [`Envelope`] behavior, which this enum dispatches to.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum TypedTransaction {
            $($variant($ty),)*
        }

        $(
            impl From<$ty> for TypedTransaction {
                fn from(tx: $ty) -> Self {
                    TypedTransaction::$variant(tx)
                }
            }
        )*

        impl TypedTransaction {
            fn envelope(&self) -> &dyn Envelope {
                match self {
                    $(TypedTransaction::$variant(tx) => tx,)*
                }
            }

            fn envelope_mut(&mut self) -> &mut dyn Envelope {
                match self {
                    $(TypedTransaction::$variant(tx) => tx,)*
                }
            }

            fn decode_as(tx_type: TxType, raw: &[u8]) -> Result<Self, TransactionError> {
                match tx_type {
                    $(TxType::$variant => <$ty as Envelope>::decode(raw).map(TypedTransaction::$variant),)*
                }
            }
        }
    };
}

typed_transaction! {
    Legacy(LegacyTransaction),
    ValueTransfer(Basic<ValueTransfer>),
    FeeDelegatedValueTransfer(FeeDelegated<ValueTransfer>),
    FeeDelegatedValueTransferWithRatio(FeeDelegatedWithRatio<ValueTransfer>),
    ValueTransferMemo(Basic<ValueTransferMemo>),
    FeeDelegatedValueTransferMemo(FeeDelegated<ValueTransferMemo>),
    FeeDelegatedValueTransferMemoWithRatio(FeeDelegatedWithRatio<ValueTransferMemo>),
    AccountUpdate(Basic<AccountUpdate>),
    FeeDelegatedAccountUpdate(FeeDelegated<AccountUpdate>),
    FeeDelegatedAccountUpdateWithRatio(FeeDelegatedWithRatio<AccountUpdate>),
    SmartContractDeploy(Basic<SmartContractDeploy>),
    FeeDelegatedSmartContractDeploy(FeeDelegated<SmartContractDeploy>),
    FeeDelegatedSmartContractDeployWithRatio(FeeDelegatedWithRatio<SmartContractDeploy>),
    SmartContractExecution(Basic<SmartContractExecution>),
    FeeDelegatedSmartContractExecution(FeeDelegated<SmartContractExecution>),
    FeeDelegatedSmartContractExecutionWithRatio(FeeDelegatedWithRatio<SmartContractExecution>),
    Cancel(Basic<Cancel>),
    FeeDelegatedCancel(FeeDelegated<Cancel>),
    FeeDelegatedCancelWithRatio(FeeDelegatedWithRatio<Cancel>),
    ChainDataAnchoring(Basic<ChainDataAnchoring>),
    FeeDelegatedChainDataAnchoring(FeeDelegated<ChainDataAnchoring>),
    FeeDelegatedChainDataAnchoringWithRatio(FeeDelegatedWithRatio<ChainDataAnchoring>),
}

impl TypedTransaction {
    pub fn tx_type(&self) -> TxType {
        self.envelope().tx_type()
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, TypedTransaction::Legacy(_))
    }

    pub fn fields(&self) -> &TxFields {
        self.envelope().fields()
    }

    pub fn fields_mut(&mut self) -> &mut TxFields {
        self.envelope_mut().fields_mut()
    }

    pub fn from(&self) -> Address {
        self.fields().from
    }

    pub fn set_from(&mut self, from: Address) {
        self.fields_mut().from = from;
    }

    /// The role whose keys sign as the sender, account update for the account update family
    pub fn role(&self) -> Role {
        self.envelope().role()
    }

    pub fn validate(&self) -> Result<(), TransactionError> {
        self.envelope().validate()
    }

    pub fn signatures(&self) -> &[SignatureData] {
        self.envelope().signatures()
    }

    /// Appends one signature or a list of signatures.
    ///
    /// Empty placeholders and signatures already present are skipped. A legacy transaction
    /// holds one signature: a second, different one fails with
    /// [`TransactionError::SignatureAlreadySet`], several at once with
    /// [`TransactionError::TooManySignatures`].
    pub fn append_signatures<S: Into<SignatureSet>>(
        &mut self,
        signatures: S,
    ) -> Result<(), TransactionError> {
        self.envelope_mut().append_signatures(signatures.into())
    }

    /// The fee payer of a fee-delegated transaction, the zero address if not yet known
    pub fn fee_payer(&self) -> Option<Address> {
        self.envelope().fee_payer()
    }

    pub fn fee_payer_signatures(&self) -> &[SignatureData] {
        self.envelope().fee_payer_signatures()
    }

    pub fn set_fee_payer(&mut self, fee_payer: Address) -> Result<(), TransactionError> {
        self.envelope_mut().set_fee_payer(fee_payer)
    }

    /// Appends fee payer signatures, which requires a fee payer to be set
    pub fn append_fee_payer_signatures<S: Into<SignatureSet>>(
        &mut self,
        signatures: S,
    ) -> Result<(), TransactionError> {
        self.envelope_mut().append_fee_payer_signatures(signatures.into())
    }

    pub fn fee_ratio(&self) -> Option<FeeRatio> {
        self.envelope().fee_ratio()
    }

    // Validating transformations

    /// Sets the sender and validates the result
    pub fn with_from(mut self, from: Address) -> Result<Self, TransactionError> {
        self.set_from(from);
        self.validate()?;
        Ok(self)
    }

    /// Sets the fee payer and validates the result
    pub fn with_fee_payer(mut self, fee_payer: Address) -> Result<Self, TransactionError> {
        self.set_fee_payer(fee_payer)?;
        self.validate()?;
        Ok(self)
    }

    /// Sets the fee ratio of a fee-delegated-with-ratio transaction
    pub fn with_fee_ratio(mut self, fee_ratio: FeeRatio) -> Result<Self, TransactionError> {
        self.envelope_mut().set_fee_ratio(fee_ratio)?;
        self.validate()?;
        Ok(self)
    }

    // Encodings and hashes

    /// The wire form, unsigned transactions carrying the empty signature placeholder
    pub fn rlp_encoding(&self) -> Result<Bytes, TransactionError> {
        self.envelope().rlp_encoding()
    }

    /// The wire form as a `0x` prefixed hex string
    pub fn raw_transaction(&self) -> Result<String, TransactionError> {
        Ok(self.rlp_encoding()?.to_string())
    }

    /// `RLP([tag, fields...])`, shared by the sender and the fee payer payloads
    pub fn common_rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.envelope().common_rlp_encoding_for_signature()
    }

    pub fn rlp_encoding_for_signature(&self) -> Result<Bytes, TransactionError> {
        self.envelope().rlp_encoding_for_signature()
    }

    pub fn rlp_encoding_for_fee_payer_signature(&self) -> Result<Bytes, TransactionError> {
        self.envelope().rlp_encoding_for_fee_payer_signature()
    }

    /// `keccak256` of the wire form
    pub fn transaction_hash(&self) -> Result<H256, TransactionError> {
        Ok(keccak256(self.rlp_encoding()?).into())
    }

    /// The hash of the sender's part of a fee-delegated transaction; for every other type it
    /// equals the transaction hash
    pub fn sender_tx_hash(&self) -> Result<H256, TransactionError> {
        self.envelope().sender_tx_hash()
    }

    // Decoding

    /// Decodes a wire form, dispatching on its first byte
    pub fn decode(raw: &[u8]) -> Result<Self, TransactionError> {
        let first = *raw.first().ok_or(rlp::DecoderError::RlpIsTooShort)?;
        if first >= 0xc0 {
            return Ok(LegacyTransaction::decode(raw)?.into())
        }
        let tx_type = TxType::try_from(first)
            .map_err(|_| TransactionError::UnknownTransactionType(format!("{first:#04x}")))?;
        if tx_type.is_legacy() {
            return Err(TransactionError::UnknownTransactionType(format!("{first:#04x}")))
        }
        Self::decode_as(tx_type, raw)
    }

    /// Decodes a `0x` prefixed hex wire form
    pub fn from_raw_hex(raw: &str) -> Result<Self, TransactionError> {
        Self::decode(&decode_hex(raw)?)
    }

    // Combine

    /// Merges the signatures of peer-signed copies of this transaction and returns the merged
    /// wire form.
    ///
    /// Every raw transaction must be of the same type and carry the same fields. Missing nonce,
    /// gas price and chain id are taken from the first peer, a zero fee payer is replaced by
    /// the peer's one. On any error the transaction is left untouched.
    pub fn combine_signed_raw_transactions<S: AsRef<str>>(
        &mut self,
        raw_transactions: &[S],
    ) -> Result<Bytes, TransactionError> {
        let mut combined = self.clone();
        for raw in raw_transactions {
            let peer = Self::from_raw_hex(raw.as_ref())?;
            if peer.tx_type() != combined.tx_type() {
                return Err(TransactionError::TypeMismatch {
                    expected: combined.tx_type(),
                    actual: peer.tx_type(),
                })
            }
            combined.adopt_missing_fields(&peer);
            if let Some(field) = combined.first_conflict(&peer) {
                return Err(TransactionError::ConflictingTransactionData(field))
            }

            combined.append_signatures(peer.signatures())?;
            if let Some(peer_fee_payer) = peer.fee_payer() {
                if combined.fee_payer().map_or(false, |fee_payer| fee_payer.is_zero()) {
                    combined.set_fee_payer(peer_fee_payer)?;
                }
                combined.append_fee_payer_signatures(peer.fee_payer_signatures())?;
            }
        }
        let encoded = combined.rlp_encoding()?;
        *self = combined;
        Ok(encoded)
    }

    fn adopt_missing_fields(&mut self, peer: &Self) {
        let peer_fields = peer.fields();
        let fields = self.fields_mut();
        if fields.nonce.is_none() {
            fields.nonce = peer_fields.nonce;
        }
        if fields.gas_price.is_none() {
            fields.gas_price = peer_fields.gas_price;
        }
        if fields.chain_id.is_none() {
            fields.chain_id = peer_fields.chain_id;
        }
        // the sender of a legacy transaction is only known once recovered
        if fields.from.is_zero() {
            fields.from = peer_fields.from;
        }
    }

    /// Names the first non-signature field that differs from `peer`
    fn first_conflict(&self, peer: &Self) -> Option<&'static str> {
        let (local, remote) = (self.fields(), peer.fields());
        if local.nonce != remote.nonce {
            return Some("nonce")
        }
        if local.gas_price != remote.gas_price {
            return Some("gasPrice")
        }
        if local.gas != remote.gas {
            return Some("gas")
        }
        if remote.chain_id.is_some() && local.chain_id != remote.chain_id {
            return Some("chainId")
        }
        if !remote.from.is_zero() && local.from != remote.from {
            return Some("from")
        }
        if self.fee_ratio() != peer.fee_ratio() {
            return Some("feeRatio")
        }
        if let (Some(local), Some(remote)) = (self.fee_payer(), peer.fee_payer()) {
            if !local.is_zero() && !remote.is_zero() && local != remote {
                return Some("feePayer")
            }
        }
        // compare the family fields with everything above aligned
        let mut aligned = peer.clone();
        *aligned.fields_mut() = local.clone();
        aligned.clear_signatures();
        let mut stripped = self.clone();
        stripped.clear_signatures();
        if stripped != aligned {
            return Some("payload")
        }
        None
    }

    /// Removes every signature and the fee payer
    fn clear_signatures(&mut self) {
        let envelope = self.envelope_mut();
        envelope.clear_signatures();
        envelope.clear_fee_payer_signatures();
        if envelope.fee_payer().is_some() {
            // cannot fail once the fee payer signatures are gone
            let _ = envelope.set_fee_payer(Address::zero());
        }
    }

    // Recovery

    /// Recovers the public keys behind the sender signatures
    pub fn recover_public_keys(&self) -> Result<Vec<PublicKey>, TransactionError> {
        let sighash = H256::from(keccak256(self.rlp_encoding_for_signature()?));
        recover_all(self.signatures(), sighash)
    }

    /// Recovers the public keys behind the fee payer signatures
    pub fn recover_fee_payer_public_keys(&self) -> Result<Vec<PublicKey>, TransactionError> {
        let sighash = H256::from(keccak256(self.rlp_encoding_for_fee_payer_signature()?));
        recover_all(self.fee_payer_signatures(), sighash)
    }
}

fn recover_all(
    signatures: &[SignatureData],
    sighash: H256,
) -> Result<Vec<PublicKey>, TransactionError> {
    signatures
        .iter()
        .map(|sig| sig.recover_public_key(sighash).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        types::{AccountKey, U256},
        utils::public_key_to_address,
    };
    use hex_literal::hex;
    use k256::ecdsa::SigningKey;
    use std::str::FromStr;

    const SENDER_KEY: [u8; 32] =
        hex!("45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8");
    const FEE_PAYER_KEY: [u8; 32] =
        hex!("b9d5558443585bca6f225b935950e3f6e69f9da8a5809a83f51c3365dff53936");

    fn sign(key: [u8; 32], payload: Bytes, chain_id: u64) -> SignatureData {
        let key = SigningKey::from_slice(&key).unwrap();
        let (sig, recid) = key.sign_prehash_recoverable(&keccak256(payload)).unwrap();
        let (r, s) = sig.split_bytes();
        SignatureData::new(
            recid.to_byte() as u64 + chain_id * 2 + 35,
            U256::from_big_endian(&r),
            U256::from_big_endian(&s),
        )
    }

    fn address(key: [u8; 32]) -> Address {
        public_key_to_address(&SigningKey::from_slice(&key).unwrap().verifying_key().into())
    }

    fn fields() -> TxFields {
        TxFields::new(address(SENDER_KEY), 1_000_000u64)
            .nonce(1234u64)
            .gas_price(25_000_000_000u64)
            .chain_id(1u64)
    }

    fn memo_with_ratio() -> TypedTransaction {
        let to = Address::from_str("7b65b75d204abed71587c9e519a89277766ee1d0").unwrap();
        FeeDelegatedWithRatio::new(
            fields(),
            ValueTransferMemo::new(to, 10u64, "hello"),
            FeeRatio::new(30).unwrap(),
        )
        .unwrap()
        .into()
    }

    /// One transaction of every type, signed by the sender and, if fee-delegated, by the
    /// fee payer
    fn every_type() -> Vec<TypedTransaction> {
        let to = Address::repeat_byte(0x7b);
        let ratio = FeeRatio::new(30).unwrap();
        let key = SigningKey::from_slice(&SENDER_KEY).unwrap();
        let account_key = AccountKey::Public(key.verifying_key().into());
        let deploy = SmartContractDeploy::new(0u64, hex!("6080604052").to_vec());
        let execution = SmartContractExecution::new(to, 0u64, hex!("a9059cbb").to_vec());
        let anchoring = ChainDataAnchoring::new(hex!("f8a6a0").to_vec());
        let f = fields;

        let legacy = LegacyTransaction::new(f()).to(to).value(1u64);
        let mut txs: Vec<TypedTransaction> = vec![
            legacy.into(),
            Basic::new(f(), ValueTransfer::new(to, 1u64)).unwrap().into(),
            FeeDelegated::new(f(), ValueTransfer::new(to, 1u64)).unwrap().into(),
            FeeDelegatedWithRatio::new(f(), ValueTransfer::new(to, 1u64), ratio).unwrap().into(),
            Basic::new(f(), ValueTransferMemo::new(to, 1u64, "memo")).unwrap().into(),
            FeeDelegated::new(f(), ValueTransferMemo::new(to, 1u64, "memo")).unwrap().into(),
            FeeDelegatedWithRatio::new(f(), ValueTransferMemo::new(to, 1u64, "memo"), ratio)
                .unwrap()
                .into(),
            Basic::new(f(), AccountUpdate::new(account_key.clone())).unwrap().into(),
            FeeDelegated::new(f(), AccountUpdate::new(account_key.clone())).unwrap().into(),
            FeeDelegatedWithRatio::new(f(), AccountUpdate::new(account_key), ratio).unwrap().into(),
            Basic::new(f(), deploy.clone()).unwrap().into(),
            FeeDelegated::new(f(), deploy.clone()).unwrap().into(),
            FeeDelegatedWithRatio::new(f(), deploy, ratio).unwrap().into(),
            Basic::new(f(), execution.clone()).unwrap().into(),
            FeeDelegated::new(f(), execution.clone()).unwrap().into(),
            FeeDelegatedWithRatio::new(f(), execution, ratio).unwrap().into(),
            Basic::new(f(), Cancel).unwrap().into(),
            FeeDelegated::new(f(), Cancel).unwrap().into(),
            FeeDelegatedWithRatio::new(f(), Cancel, ratio).unwrap().into(),
            Basic::new(f(), anchoring.clone()).unwrap().into(),
            FeeDelegated::new(f(), anchoring.clone()).unwrap().into(),
            FeeDelegatedWithRatio::new(f(), anchoring, ratio).unwrap().into(),
        ];
        for tx in txs.iter_mut() {
            let sig = sign(SENDER_KEY, tx.rlp_encoding_for_signature().unwrap(), 1);
            tx.append_signatures(sig).unwrap();
            if tx.fee_payer().is_some() {
                tx.set_fee_payer(address(FEE_PAYER_KEY)).unwrap();
                let sig = sign(FEE_PAYER_KEY, tx.rlp_encoding_for_fee_payer_signature().unwrap(), 1);
                tx.append_fee_payer_signatures(sig).unwrap();
            }
        }
        txs
    }

    #[test]
    fn roundtrip_every_type() {
        let txs = every_type();
        assert_eq!(txs.len(), 22);
        for tx in txs {
            let raw = tx.rlp_encoding().unwrap();
            if !tx.is_legacy() {
                assert_eq!(raw.as_ref()[0], tx.tx_type().tag());
            }
            let decoded = TypedTransaction::decode(raw.as_ref()).unwrap();
            assert_eq!(decoded, tx, "{}", tx.tx_type());
            assert_eq!(decoded.signatures().len(), 1);
        }
    }

    #[test]
    fn recovers_signers_of_every_type() {
        let sender = address(SENDER_KEY);
        let fee_payer = address(FEE_PAYER_KEY);
        for tx in every_type() {
            let keys = tx.recover_public_keys().unwrap();
            assert_eq!(public_key_to_address(&keys[0]), sender, "{}", tx.tx_type());
            if tx.fee_payer().is_some() {
                let keys = tx.recover_fee_payer_public_keys().unwrap();
                assert_eq!(public_key_to_address(&keys[0]), fee_payer);
            }
        }
    }

    #[test]
    fn hash_ignores_signature_order() {
        let a = SignatureData::new(0x25, 1.into(), 2.into());
        let b = SignatureData::new(0x26, 3.into(), 4.into());
        let mut first = memo_with_ratio();
        first.append_signatures(vec![a, b]).unwrap();
        let mut second = memo_with_ratio();
        second.append_signatures(b).unwrap();
        second.append_signatures(a).unwrap();

        let payload = first.rlp_encoding_for_signature().unwrap();
        assert_eq!(payload, second.rlp_encoding_for_signature().unwrap());
        assert_eq!(payload, memo_with_ratio().rlp_encoding_for_signature().unwrap());
    }

    #[test]
    fn sender_hash_is_independent_of_fee_payer() {
        let mut tx = memo_with_ratio();
        tx.append_signatures(sign(SENDER_KEY, tx.rlp_encoding_for_signature().unwrap(), 1)).unwrap();
        let sender_hash = tx.sender_tx_hash().unwrap();

        tx.set_fee_payer(address(FEE_PAYER_KEY)).unwrap();
        assert_eq!(tx.sender_tx_hash().unwrap(), sender_hash);
        assert_ne!(tx.transaction_hash().unwrap(), sender_hash);

        tx.append_fee_payer_signatures(sign(
            FEE_PAYER_KEY,
            tx.rlp_encoding_for_fee_payer_signature().unwrap(),
            1,
        ))
        .unwrap();
        assert_eq!(tx.sender_tx_hash().unwrap(), sender_hash);
        assert_eq!(
            sender_hash,
            H256::from(hex!("56e151eda2e89f05cf0d975911fdce1b14d548c8616266e6b4a2bb608232a929"))
        );
    }

    #[test]
    fn sender_hash_equals_transaction_hash_for_basic_types() {
        let tx = every_type().remove(1);
        assert_eq!(tx.tx_type(), TxType::ValueTransfer);
        assert_eq!(tx.sender_tx_hash().unwrap(), tx.transaction_hash().unwrap());
    }

    #[test]
    fn fee_payer_signatures_need_a_fee_payer() {
        let mut tx = memo_with_ratio();
        let sig = SignatureData::new(0x26, 1.into(), 2.into());
        assert!(matches!(
            tx.append_fee_payer_signatures(sig),
            Err(TransactionError::FeePayerSignaturesWithoutFeePayer)
        ));

        let mut basic = every_type().remove(1);
        assert!(matches!(
            basic.append_fee_payer_signatures(sig),
            Err(TransactionError::Unsupported { tx_type: TxType::ValueTransfer, .. })
        ));
    }

    #[test]
    fn golden_fee_delegated_memo_with_ratio() {
        let mut tx = memo_with_ratio();
        tx.append_signatures(sign(SENDER_KEY, tx.rlp_encoding_for_signature().unwrap(), 1)).unwrap();
        tx.set_fee_payer(address(FEE_PAYER_KEY)).unwrap();
        tx.append_fee_payer_signatures(sign(
            FEE_PAYER_KEY,
            tx.rlp_encoding_for_fee_payer_signature().unwrap(),
            1,
        ))
        .unwrap();
        assert_eq!(
            tx.transaction_hash().unwrap(),
            H256::from(hex!("921da3a06d532e50e84a3bf871fe20ec99c3757f9e12872485ce6e02ac280df9"))
        );
    }

    #[test]
    fn combine_is_order_independent() {
        let a = SignatureData::new(0x25, 1.into(), 2.into());
        let b = SignatureData::new(0x26, 3.into(), 4.into());
        let signed = |sig: SignatureData| {
            let mut tx = memo_with_ratio();
            tx.append_signatures(sig).unwrap();
            tx.raw_transaction().unwrap()
        };
        let (raw_a, raw_b) = (signed(a), signed(b));

        let mut at_once = memo_with_ratio();
        at_once.combine_signed_raw_transactions(&[&raw_a, &raw_b]).unwrap();

        let mut one_by_one = memo_with_ratio();
        one_by_one.combine_signed_raw_transactions(&[&raw_b]).unwrap();
        one_by_one.combine_signed_raw_transactions(&[&raw_a]).unwrap();
        // combining again changes nothing
        one_by_one.combine_signed_raw_transactions(&[&raw_a, &raw_b]).unwrap();

        let mut left = at_once.signatures().to_vec();
        let mut right = one_by_one.signatures().to_vec();
        left.sort_by_key(|sig| sig.v);
        right.sort_by_key(|sig| sig.v);
        assert_eq!(left, right);
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn combine_fills_missing_values_from_peer() {
        let mut peer = memo_with_ratio();
        peer.append_signatures(SignatureData::new(0x25, 1.into(), 2.into())).unwrap();
        let raw = peer.raw_transaction().unwrap();

        let mut local = memo_with_ratio();
        local.fields_mut().nonce = None;
        local.fields_mut().chain_id = None;
        local.combine_signed_raw_transactions(&[raw]).unwrap();
        assert_eq!(local.fields().nonce, Some(1234u64.into()));
        assert_eq!(local.fields().chain_id, Some(1u64.into()));
    }

    #[test]
    fn combine_fails_closed() {
        let sig = SignatureData::new(0x25, 1.into(), 2.into());
        let mut good = memo_with_ratio();
        good.append_signatures(sig).unwrap();

        let mut other_value = memo_with_ratio();
        if let TypedTransaction::FeeDelegatedValueTransferMemoWithRatio(tx) = &mut other_value {
            tx.tx.tx.body.value = 11u64.into();
        }
        other_value.append_signatures(SignatureData::new(0x26, 3.into(), 4.into())).unwrap();

        let mut local = memo_with_ratio();
        let err = local
            .combine_signed_raw_transactions(&[
                good.raw_transaction().unwrap(),
                other_value.raw_transaction().unwrap(),
            ])
            .unwrap_err();
        assert!(matches!(err, TransactionError::ConflictingTransactionData("payload")));
        assert!(local.signatures().is_empty());

        let cancel = every_type().remove(16).raw_transaction().unwrap();
        assert!(matches!(
            local.combine_signed_raw_transactions(&[cancel]),
            Err(TransactionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn combine_rejects_a_different_fee_payer() {
        let mut local = memo_with_ratio();
        local.set_fee_payer(Address::repeat_byte(0x01)).unwrap();
        let mut peer = memo_with_ratio();
        peer.set_fee_payer(Address::repeat_byte(0x02)).unwrap();
        peer.append_fee_payer_signatures(SignatureData::new(0x26, 3.into(), 4.into())).unwrap();
        assert!(matches!(
            local.combine_signed_raw_transactions(&[peer.raw_transaction().unwrap()]),
            Err(TransactionError::ConflictingTransactionData("feePayer"))
        ));
    }

    #[test]
    fn legacy_combine_same_signature_is_noop() {
        let legacy = every_type().remove(0);
        let raw = legacy.raw_transaction().unwrap();
        let mut local = legacy.clone();
        local.combine_signed_raw_transactions(&[&raw]).unwrap();
        assert_eq!(local, legacy);

        let mut unsigned = legacy.clone();
        unsigned.clear_signatures();
        unsigned.set_from(Address::zero());
        unsigned.combine_signed_raw_transactions(&[&raw]).unwrap();
        assert_eq!(unsigned, legacy);
    }

    #[test]
    fn decode_rejects_unknown_tags() {
        assert!(matches!(
            TypedTransaction::decode(&[0x07, 0xc0]),
            Err(TransactionError::UnknownTransactionType(_))
        ));
        assert!(matches!(
            TypedTransaction::decode(&[0x00, 0xc0]),
            Err(TransactionError::UnknownTransactionType(_))
        ));
        assert!(TypedTransaction::decode(&[]).is_err());
    }
}

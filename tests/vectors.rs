//! Wire encodings and hashes of each transaction family against known vectors.
//!
//! The value transfer and account update vectors are the RLP encoding examples of the Klaytn
//! documentation. The fee-delegated value transfer with ratio carries the documented sender
//! signature; its fee payer signs with `FEE_PAYER_KEY`.
use caver::prelude::*;

const SENDER_KEY: &str = "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8";
const FEE_PAYER_KEY: &str = "0xb9d5558443585bca6f225b935950e3f6e69f9da8a5809a83f51c3365dff53936";
const TO: &str = "0x7b65b75d204abed71587c9e519a89277766ee1d0";
const DEPLOY_INPUT: &str = "6080604052348015600f57600080fd5b50603e80601d6000396000f3fe6080604052600080fdfea165627a7a72305820";

fn sender() -> Keyring {
    SENDER_KEY.parse().unwrap()
}

fn fee_payer() -> Keyring {
    FEE_PAYER_KEY.parse().unwrap()
}

fn fields() -> TxFields {
    TxFields::new(sender().address(), 0xf4240u64).nonce(1234u64).gas_price(0x19u64).chain_id(1u64)
}

fn h256(hash: &str) -> H256 {
    hash.parse().unwrap()
}

fn assert_vector(tx: &TypedTransaction, raw: &str, tx_hash: &str, sender_tx_hash: &str) {
    assert_eq!(tx.raw_transaction().unwrap(), raw);
    assert_eq!(tx.transaction_hash().unwrap(), h256(tx_hash));
    assert_eq!(tx.sender_tx_hash().unwrap(), h256(sender_tx_hash));

    let decoded = TypedTransaction::decode(tx.rlp_encoding().unwrap().as_ref()).unwrap();
    assert_eq!(&decoded, tx);
}

#[tokio::test]
async fn value_transfer() {
    let mut tx: TypedTransaction =
        Basic::new(fields(), ValueTransfer::new(TO.parse().unwrap(), 10u64)).unwrap().into();
    sender().sign_transaction(&mut tx).await.unwrap();

    let hash = "0x762f130342569e9669a4d8547f1248bd2554fbbf3062d63a97ce28bfa97aa9d7";
    assert_vector(
        &tx,
        "0x08f87a8204d219830f4240947b65b75d204abed71587c9e519a89277766ee1d00a94a94f5374fce5edbc8e2a8697c15331677e6ebf0bf845f84325a0f3d0cd43661cabf53425535817c5058c27781f478cb5459874feaa462ed3a29aa06748abe186269ff10b8100a4b7d7fea274b53ea2905acbf498dc8b5ab1bf4fbc",
        hash,
        hash,
    );
}

#[tokio::test]
async fn fee_delegated_value_transfer_with_ratio() {
    let mut tx: TypedTransaction = FeeDelegatedWithRatio::new(
        fields(),
        ValueTransfer::new(TO.parse().unwrap(), 10u64),
        FeeRatio::new(30).unwrap(),
    )
    .unwrap()
    .into();
    sender().sign_transaction(&mut tx).await.unwrap();
    assert_eq!(
        tx.signatures()[0].r,
        U256::from_str_radix("dde32b8241f039a82b124fe94d3e556eb08f0d6f26d07dcc0f3fca621f1090ca", 16)
            .unwrap()
    );
    assert_eq!(
        tx.signatures()[0].s,
        U256::from_str_radix("1c8c336b358ab6d3a2bbf25de2adab4d01b754e2fb3b9b710069177d54c1e956", 16)
            .unwrap()
    );
    fee_payer().sign_transaction_as_fee_payer(&mut tx).await.unwrap();

    assert_vector(
        &tx,
        "0x0af8d78204d219830f4240947b65b75d204abed71587c9e519a89277766ee1d00a94a94f5374fce5edbc8e2a8697c15331677e6ebf0b1ef845f84325a0dde32b8241f039a82b124fe94d3e556eb08f0d6f26d07dcc0f3fca621f1090caa01c8c336b358ab6d3a2bbf25de2adab4d01b754e2fb3b9b710069177d54c1e9569433f524631e573329a550296f595c820d6c65213ff845f84325a066b6869811dcb65745a00e1823646694b34fcf7d7e7130b901f711817eaffc02a03c51718dadd68cd8f9a4c17f44de0daf8cf665bc5a42aa7d3b28865c1cc76ae1",
        "0x7f4a67bc99e6e496a875f70a07b4c2739c72d7f7e7793f89c93780b4e00018e6",
        "0x4711ed4023e821425968342c1d50063b6bc3176b1792b7075cfeee3656d450f6",
    );
}

#[tokio::test]
async fn account_update() {
    let key = AccountKey::Public(SENDER_KEY.parse::<PrivateKey>().unwrap().public_key());
    let mut tx: TypedTransaction = Basic::new(fields(), AccountUpdate::new(key)).unwrap().into();
    sender().sign_transaction(&mut tx).await.unwrap();

    let hash = "0x8c70627d6b637c7d033ead083fc5e43e5cad10c704a86dd9bda7ac104a0e5ad0";
    assert_vector(
        &tx,
        "0x20f8888204d219830f424094a94f5374fce5edbc8e2a8697c15331677e6ebf0ba302a1033a514176466fa815ed481ffad09110a2d344f6c9b78c1d14afc351c3a51be33df845f84325a0f7d479628f05f51320f0842193e3f7ae55a5b49d3645bf55c35bee1e8fd2593aa04de8eab5338fdc86e96f8c49ed516550f793fc2c4007614ce3d2a6b33cf9e451",
        hash,
        hash,
    );
}

#[tokio::test]
async fn smart_contract_deploy() {
    let deploy = SmartContractDeploy::new(0u64, hex::decode(DEPLOY_INPUT).unwrap());
    let mut tx: TypedTransaction = Basic::new(fields(), deploy).unwrap().into();
    sender().sign_transaction(&mut tx).await.unwrap();

    let hash = "0x8dda4abde05fc846acb087ca006e19f2e2fc587ed8026211dccac051e9db46d0";
    assert_vector(
        &tx,
        "0x28f8998204d219830f4240808094a94f5374fce5edbc8e2a8697c15331677e6ebf0bb06080604052348015600f57600080fd5b50603e80601d6000396000f3fe6080604052600080fdfea165627a7a723058208080f845f84326a0ccb45b07658a77f4642416ceaafdbfdd0cd90d9c875c99787df2d926d1ecba2ba013f777591c3e07037528c8dc061f9c20f952ef3a73850a453a8994be1f146149",
        hash,
        hash,
    );
}

#[tokio::test]
async fn fee_delegated_smart_contract_deploy_with_ratio() {
    // the fee ratio sits between humanReadable and codeFormat
    let deploy = SmartContractDeploy::new(0u64, hex::decode(DEPLOY_INPUT).unwrap());
    let mut tx: TypedTransaction =
        FeeDelegatedWithRatio::new(fields(), deploy, FeeRatio::new(30).unwrap()).unwrap().into();
    sender().sign_transaction(&mut tx).await.unwrap();
    fee_payer().sign_transaction_as_fee_payer(&mut tx).await.unwrap();

    assert_vector(
        &tx,
        "0x2af8f68204d219830f4240808094a94f5374fce5edbc8e2a8697c15331677e6ebf0bb06080604052348015600f57600080fd5b50603e80601d6000396000f3fe6080604052600080fdfea165627a7a72305820801e80f845f84325a0a5127fb2c41f73e053ade34b2cb743500f77bd8c3e401212aba9f142fe928314a07663812ff052bc892ce73cb50f0e6a266af3c7141085ed2328ddcbaeb208a1ab9433f524631e573329a550296f595c820d6c65213ff845f84325a06ce8d52b448231a6977d53457677b2f3ee05769338176806a1c9c55c94bd05bba062dab7b254483ce92d8fa6149ecf30f0946ff67aa5dca912c29fd27394dc58ef",
        "0x5830dba2cd19e7503de4dd7bb40b22f0dbcc7aea13f43bbd6263e61c29479c4c",
        "0x35015ed7bcb1c661c8f06687ab47631cb17526ed6e547a381c3bda76a60e47ad",
    );
}

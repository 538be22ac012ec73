use gloo_timers::future::TimeoutFuture;
use serde::{Serialize, Serializer};
use std::fmt;

use super::abi::{encode_hex, selectors, Address, CallEncoder, WORD};
use super::allowlist::{AllowlistError, AllowlistProof};
use super::contract::{ClaimCondition, ContractRef};
use super::network_config::{ChainDescriptor, RECEIPT_POLL_INTERVAL_MS};
use super::rpc_base::{ChainTransport, RpcConnection, RpcError};
use super::status::CONNECT_WALLET_MESSAGE;
use super::wallet::{EthereumWallet, WalletError};

#[derive(Debug, Clone, PartialEq)]
pub enum MintError {
    NotConnected,
    AlreadyPending,
    Wallet(WalletError),
    Rpc(RpcError),
    Allowlist(AllowlistError),
    /// Mined with status 0
    Reverted { tx_hash: String },
}

impl fmt::Display for MintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MintError::NotConnected => write!(f, "{}", CONNECT_WALLET_MESSAGE),
            MintError::AlreadyPending => write!(f, "A mint is already in progress"),
            MintError::Wallet(err) => write!(f, "{}", err),
            MintError::Rpc(err) => write!(f, "{}", err),
            MintError::Allowlist(err) => write!(f, "{}", err),
            MintError::Reverted { tx_hash } => write!(f, "Transaction {} reverted on-chain", tx_hash),
        }
    }
}

impl From<WalletError> for MintError {
    fn from(err: WalletError) -> Self {
        MintError::Wallet(err)
    }
}

impl From<RpcError> for MintError {
    fn from(err: RpcError) -> Self {
        MintError::Rpc(err)
    }
}

impl From<AllowlistError> for MintError {
    fn from(err: AllowlistError) -> Self {
        MintError::Allowlist(err)
    }
}

fn as_hex_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode_hex(bytes))
}

fn as_hex_quantity<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{:x}", value))
}

/// Unsigned transaction in the shape `eth_sendTransaction` expects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    #[serde(serialize_with = "as_hex_bytes")]
    pub data: Vec<u8>,  // claim calldata
    #[serde(serialize_with = "as_hex_quantity")]
    pub value: u128,    // native payment in wei
}

/// What a confirmed mint hands back
#[derive(Debug, Clone, PartialEq)]
pub struct TxResult {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
}

// claim() has six head words; the proof tuple starts right after them
const CLAIM_HEAD_WORDS: u128 = 6;
// AllowlistProof head: proof offset, limit, price, currency, then the proof length word
const PROOF_TUPLE_WORDS: u128 = 5;

/// Build `claim(receiver, quantity, currency, pricePerToken, allowlistProof, data)`.
///
/// # Parameters
/// * `contract` - the Drop collection being minted from
/// * `recipient` - connected account; also the `from` of the transaction
/// * `quantity` - tokens to claim
/// * `condition` - active claim phase
/// * `proof` - the recipient's allowlist entry, or `AllowlistProof::empty()`
///
/// # Returns
/// The transaction to hand to the wallet. Currency and price follow the
/// allowlist entry when it overrides the phase, and `value` carries the
/// payment when that currency is the native token.
pub fn build_claim(
    contract: &ContractRef,
    recipient: &Address,
    quantity: u128,
    condition: &ClaimCondition,
    proof: &AllowlistProof,
) -> TransactionRequest {
    let terms = proof.terms(condition);
    let proof_offset = CLAIM_HEAD_WORDS * WORD as u128;
    let data_offset = proof_offset + (PROOF_TUPLE_WORDS + proof.proof.len() as u128) * WORD as u128;

    let mut encoder = CallEncoder::new(selectors::CLAIM)
        .address(recipient)
        .uint(quantity)
        .address(&terms.currency)
        .uint(terms.price_per_token)
        .uint(proof_offset)
        .uint(data_offset)
        // AllowlistProof { proof: bytes32[], quantityLimitPerWallet, pricePerToken, currency }
        .uint(4 * WORD as u128)
        .quantity(proof.quantity_limit_per_wallet)
        .quantity(proof.price_per_token)
        .address(&proof.currency)
        .uint(proof.proof.len() as u128);
    for node in &proof.proof {
        encoder = encoder.word(*node);
    }
    // empty `data`
    let data = encoder.uint(0).finish();

    let value = if terms.currency == Address::NATIVE_TOKEN {
        terms.price_per_token.saturating_mul(quantity)
    } else {
        0
    };

    TransactionRequest {
        from: *recipient,
        to: contract.address,
        data,
        value,
    }
}

/// Submission facility: signs, broadcasts and waits for the transaction
#[allow(async_fn_in_trait)]
pub trait TransactionSender {
    async fn send(&self, request: &TransactionRequest) -> Result<TxResult, MintError>;
}

/// Sends through the browser wallet and tracks the receipt over RPC
pub struct WalletSender<T: ChainTransport = RpcConnection> {
    transport: T,                        // dry runs and receipt polling
    chain: &'static ChainDescriptor,     // wallet must be on this chain
}

impl<T: ChainTransport> WalletSender<T> {
    pub fn new(transport: T, chain: &'static ChainDescriptor) -> Self {
        Self { transport, chain }
    }

    /// Poll until the transaction is mined.
    ///
    /// # Returns
    /// The mined transaction, or `MintError::Reverted` when its status is 0.
    /// There is no timeout: once broadcast the transaction cannot be recalled.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxResult, MintError> {
        log::debug!("Polling receipt for {} on {}", tx_hash, self.chain.name);
        loop {
            match self.transport.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) if receipt.succeeded() => {
                    return Ok(TxResult {
                        transaction_hash: receipt.transaction_hash.clone(),
                        block_number: receipt.block(),
                    });
                }
                Ok(Some(_)) => {
                    return Err(MintError::Reverted {
                        tx_hash: tx_hash.to_string(),
                    })
                }
                Ok(None) => log::debug!("Transaction {} still pending", tx_hash),
                // the transaction is already broadcast; keep polling through RPC hiccups
                Err(e) => log::warn!("Receipt lookup for {} failed: {}", tx_hash, e),
            }
            TimeoutFuture::new(RECEIPT_POLL_INTERVAL_MS).await;
        }
    }
}

impl<T: ChainTransport> TransactionSender for WalletSender<T> {
    async fn send(&self, request: &TransactionRequest) -> Result<TxResult, MintError> {
        EthereumWallet::ensure_chain(self.chain).await?;

        // dry run so contract reverts come back with a decoded reason before the wallet prompt
        self.transport
            .eth_call(&request.to, &request.data, Some(&request.from), request.value)
            .await?;

        let tx_hash = EthereumWallet::send_transaction(request).await?;
        log::info!("Mint transaction broadcast: {}", tx_hash);
        self.wait_for_receipt(&tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::abi::Decoder;
    use crate::core::allowlist::{keccak256, UNLIMITED};
    use crate::core::contract::tests::{free_condition, test_contract};
    use crate::core::network_config::PINDORA_TESTNET;
    use crate::core::rpc_base::tests::StubTransport;
    use crate::core::rpc_base::TransactionReceipt;

    fn recipient() -> Address {
        "0x00000000000000000000000000000000000000aa".parse().unwrap()
    }

    fn open_claim(condition: &ClaimCondition) -> TransactionRequest {
        build_claim(&test_contract(), &recipient(), 1, condition, &AllowlistProof::empty())
    }

    fn receipt(status: &str) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: "0xabc".to_string(),
            block_number: "0x10".to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_claim_calldata_layout() {
        let tx = open_claim(&free_condition(7));
        assert_eq!(&tx.data[..4], &selectors::CLAIM);
        // 6 head words + 5 tuple words + 1 bytes length word
        assert_eq!(tx.data.len(), 4 + 12 * WORD);

        let args = Decoder::new(&tx.data[4..]);
        assert_eq!(args.address_at(0).unwrap(), recipient());
        assert_eq!(args.uint_at(WORD).unwrap(), 1);
        assert_eq!(args.address_at(2 * WORD).unwrap(), Address::NATIVE_TOKEN);
        assert_eq!(args.uint_at(3 * WORD).unwrap(), 7);

        let proof = args.usize_at(4 * WORD).unwrap();
        let bytes = args.usize_at(5 * WORD).unwrap();
        assert_eq!(bytes - proof, 5 * WORD);
        // proof array offset inside the tuple points at an empty array
        let array = proof + args.usize_at(proof).unwrap();
        assert_eq!(args.uint_at(array).unwrap(), 0);
        assert_eq!(args.word_at(proof + 2 * WORD).unwrap(), [0xff; WORD]);
        assert_eq!(args.uint_at(bytes).unwrap(), 0);
    }

    #[test]
    fn test_claim_carries_allowlist_proof() {
        let nodes = vec![keccak256(b"left"), keccak256(b"right")];
        let entry = AllowlistProof {
            proof: nodes.clone(),
            quantity_limit_per_wallet: 3,
            price_per_token: UNLIMITED,
            currency: Address::ZERO,
        };
        let tx = build_claim(&test_contract(), &recipient(), 1, &free_condition(7), &entry);
        assert_eq!(tx.data.len(), 4 + (12 + nodes.len()) * WORD);

        let args = Decoder::new(&tx.data[4..]);
        let proof = args.usize_at(4 * WORD).unwrap();
        let bytes = args.usize_at(5 * WORD).unwrap();
        assert_eq!(bytes - proof, (5 + nodes.len()) * WORD);
        assert_eq!(args.uint_at(proof + WORD).unwrap(), 3);
        let array = proof + args.usize_at(proof).unwrap();
        assert_eq!(args.uint_at(array).unwrap(), 2);
        assert_eq!(args.word_at(array + WORD).unwrap(), nodes[0]);
        assert_eq!(args.word_at(array + 2 * WORD).unwrap(), nodes[1]);
        assert_eq!(args.uint_at(bytes).unwrap(), 0);
        // no price override: phase price is paid
        assert_eq!(tx.value, 7);
    }

    #[test]
    fn test_claim_uses_allowlist_price() {
        let entry = AllowlistProof {
            proof: vec![keccak256(b"sibling")],
            quantity_limit_per_wallet: 1,
            price_per_token: 100,
            currency: Address::ZERO,
        };
        let tx = build_claim(&test_contract(), &recipient(), 2, &free_condition(500), &entry);
        let args = Decoder::new(&tx.data[4..]);
        assert_eq!(args.address_at(2 * WORD).unwrap(), Address::NATIVE_TOKEN);
        assert_eq!(args.uint_at(3 * WORD).unwrap(), 100);
        assert_eq!(tx.value, 200);
    }

    #[test]
    fn test_claim_value_for_native_currency() {
        let tx = open_claim(&free_condition(500));
        assert_eq!(tx.value, 500);
        assert_eq!(tx.from, recipient());
        assert_eq!(tx.to, test_contract().address);
    }

    #[test]
    fn test_claim_value_for_erc20_currency() {
        let mut condition = free_condition(500);
        condition.currency = "0x00000000000000000000000000000000000000bb".parse().unwrap();
        assert_eq!(open_claim(&condition).value, 0);
    }

    #[test]
    fn test_request_serializes_as_hex() {
        let tx = open_claim(&free_condition(255));
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["value"], "0xff");
        assert_eq!(json["to"], "0x400f8432253a7caf458062c4c2632230c83b8e73");
        assert!(json["data"].as_str().unwrap().starts_with("0x84bb1e42"));
    }

    #[test]
    fn test_mint_error_display() {
        assert_eq!(MintError::NotConnected.to_string(), CONNECT_WALLET_MESSAGE);
        let reverted = MintError::Reverted { tx_hash: "0xabc".to_string() };
        assert_eq!(reverted.to_string(), "Transaction 0xabc reverted on-chain");
        let allowlist = MintError::from(AllowlistError::InvalidSnapshot("missing baseUri".to_string()));
        assert_eq!(allowlist.to_string(), "Invalid allowlist snapshot: missing baseUri");
    }

    #[tokio::test]
    async fn test_wait_for_receipt_reverted() {
        let sender = WalletSender::new(StubTransport::default().with_receipt(Some(receipt("0x0"))), &PINDORA_TESTNET);
        let err = sender.wait_for_receipt("0xabc").await.unwrap_err();
        assert_eq!(err, MintError::Reverted { tx_hash: "0xabc".to_string() });
    }

    #[tokio::test]
    async fn test_wait_for_receipt_success() {
        let sender = WalletSender::new(StubTransport::default().with_receipt(Some(receipt("0x1"))), &PINDORA_TESTNET);
        let result = sender.wait_for_receipt("0xabc").await.unwrap();
        assert_eq!(result.transaction_hash, "0xabc");
        assert_eq!(result.block_number, Some(16));
    }
}

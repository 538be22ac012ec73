//! Allowlist proofs for claim phases gated by a merkle root.
//!
//! The collection's contract metadata maps every published merkle root to a
//! snapshot document. Small lists ship each claimer's proof inline; larger ones
//! are sharded by the leading hex digits of the claimer address, and each shard
//! carries its entries plus the proof from the shard root up to the phase root.
//! Leaves are `keccak256(abi.encodePacked(claimer, limit, price, currency))`
//! and pairs are hashed in sorted order, matching the Drop contract's verifier.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;
use std::fmt;

use super::abi::{decode_hex, decode_uint, encode_hex, quantity_word, selectors, AbiError, Address, CallEncoder, WORD};
use super::contract::{ClaimCondition, ContractRef, ReadError, RpcContractSource};
use super::network_config::resolve_ipfs_uri;
use super::rpc_base::{ChainTransport, RpcError};

pub type Hash = [u8; WORD];

/// `type(uint256).max` in a `u128` amount field: no limit, or no price override
pub const UNLIMITED: u128 = u128::MAX;

// thirdweb's default shard width
const DEFAULT_SHARD_NYBBLES: usize = 2;

// error type
#[derive(Debug, Clone, PartialEq)]
pub enum AllowlistError {
    Rpc(RpcError),
    Abi(AbiError),
    InvalidSnapshot(String),
    InvalidAmount(String),
}

impl fmt::Display for AllowlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowlistError::Rpc(err) => write!(f, "{}", err),
            AllowlistError::Abi(err) => write!(f, "Unexpected contract data: {}", err),
            AllowlistError::InvalidSnapshot(msg) => write!(f, "Invalid allowlist snapshot: {}", msg),
            AllowlistError::InvalidAmount(value) => write!(f, "Invalid allowlist amount: {}", value),
        }
    }
}

impl From<RpcError> for AllowlistError {
    fn from(err: RpcError) -> Self {
        AllowlistError::Rpc(err)
    }
}

impl From<AbiError> for AllowlistError {
    fn from(err: AbiError) -> Self {
        AllowlistError::Abi(err)
    }
}

impl From<ReadError> for AllowlistError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Rpc(e) => AllowlistError::Rpc(e),
            ReadError::Abi(e) => AllowlistError::Abi(e),
        }
    }
}

/// The `AllowlistProof` argument of `claim`
#[derive(Debug, Clone, PartialEq)]
pub struct AllowlistProof {
    pub proof: Vec<Hash>,
    pub quantity_limit_per_wallet: u128,  // 0 keeps the phase limit
    pub price_per_token: u128,            // UNLIMITED keeps the phase price
    pub currency: Address,                // zero keeps the phase currency
}

/// Currency and unit price `claim` must be called with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimTerms {
    pub currency: Address,
    pub price_per_token: u128,
}

impl AllowlistProof {
    /// No proof; the contract applies the phase's own limits
    pub fn empty() -> Self {
        Self {
            proof: Vec::new(),
            quantity_limit_per_wallet: 0,
            price_per_token: UNLIMITED,
            currency: Address::ZERO,
        }
    }

    pub fn leaf(&self, claimer: &Address) -> Hash {
        hash_entry(claimer, self.quantity_limit_per_wallet, self.price_per_token, &self.currency)
    }

    /// Terms the contract will check the call against.
    ///
    /// An entry with its own price overrides the phase price, and its currency
    /// overrides the phase currency unless it is the zero address.
    pub fn terms(&self, condition: &ClaimCondition) -> ClaimTerms {
        if self.price_per_token == UNLIMITED {
            return ClaimTerms {
                currency: condition.currency,
                price_per_token: condition.price_per_token,
            };
        }
        ClaimTerms {
            currency: if self.currency.is_zero() { condition.currency } else { self.currency },
            price_per_token: self.price_per_token,
        }
    }
}

pub fn keccak256(data: &[u8]) -> Hash {
    let mut hash = [0u8; WORD];
    hash.copy_from_slice(&Keccak256::digest(data));
    hash
}

/// Leaf hash of one allowlist entry
pub fn hash_entry(claimer: &Address, limit: u128, price: u128, currency: &Address) -> Hash {
    let mut packed = Vec::with_capacity(20 + 2 * WORD + 20);
    packed.extend_from_slice(claimer.as_bytes());
    packed.extend_from_slice(&quantity_word(limit));
    packed.extend_from_slice(&quantity_word(price));
    packed.extend_from_slice(currency.as_bytes());
    keccak256(&packed)
}

fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 2 * WORD];
    buf[..WORD].copy_from_slice(low);
    buf[WORD..].copy_from_slice(high);
    keccak256(&buf)
}

// next layer up; an odd node out is carried up unhashed
fn next_layer(layer: &[Hash]) -> Vec<Hash> {
    layer
        .chunks(2)
        .filter_map(|pair| pair.iter().copied().reduce(|a, b| hash_pair(&a, &b)))
        .collect()
}

pub fn merkle_root(leaves: &[Hash]) -> Option<Hash> {
    let mut layer = leaves.to_vec();
    while layer.len() > 1 {
        layer = next_layer(&layer);
    }
    layer.first().copied()
}

/// Sibling path from `leaves[index]` to the root
pub fn merkle_proof(leaves: &[Hash], index: usize) -> Option<Vec<Hash>> {
    if index >= leaves.len() {
        return None;
    }
    let mut proof = Vec::new();
    let mut layer = leaves.to_vec();
    let mut index = index;
    while layer.len() > 1 {
        let sibling = index ^ 1;
        if let Some(node) = layer.get(sibling) {
            proof.push(*node);
        }
        layer = next_layer(&layer);
        index /= 2;
    }
    Some(proof)
}

pub fn verify_proof(proof: &[Hash], root: &Hash, leaf: &Hash) -> bool {
    proof.iter().fold(*leaf, |node, sibling| hash_pair(&node, sibling)) == *root
}

/// Decimal string to base units, e.g. `"0.5"` with 18 decimals.
///
/// Empty and `"unlimited"` map to `UNLIMITED`.
pub fn parse_units(value: &str, decimals: u8) -> Result<u128, AllowlistError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("unlimited") {
        return Ok(UNLIMITED);
    }
    let invalid = || AllowlistError::InvalidAmount(value.to_string());

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(invalid());
    }
    if fraction.len() > usize::from(decimals) {
        return Err(invalid());
    }

    let scale = 10u128.checked_pow(u32::from(decimals)).ok_or_else(invalid)?;
    let whole = if whole.is_empty() { 0 } else { whole.parse::<u128>().map_err(|_| invalid())? };
    let fraction = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = usize::from(decimals));
        padded.parse::<u128>().map_err(|_| invalid())?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)
}

// amounts show up both as JSON strings and as numbers
fn amount_text(value: &Option<serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_hash(raw: &str) -> Result<Hash, AllowlistError> {
    let bytes = decode_hex(raw)?;
    bytes
        .try_into()
        .map_err(|_| AllowlistError::InvalidSnapshot(format!("proof node {} is not 32 bytes", raw)))
}

/// One claimer in a snapshot
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub address: Address,
    #[serde(default)]
    pub max_claimable: Option<serde_json::Value>,
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub currency_address: Option<Address>,
    // inline proof, only in unsharded snapshots
    #[serde(default)]
    pub proof: Vec<String>,
}

impl SnapshotEntry {
    fn currency(&self) -> Address {
        self.currency_address.unwrap_or(Address::ZERO)
    }

    fn has_price(&self) -> bool {
        !amount_text(&self.price).trim().is_empty()
    }

    /// Proof fields for this entry, without the path
    fn resolve(&self, token_decimals: u8, currency_decimals: &impl Fn(&Address) -> u8) -> Result<AllowlistProof, AllowlistError> {
        let currency = self.currency();
        Ok(AllowlistProof {
            proof: Vec::new(),
            quantity_limit_per_wallet: parse_units(&amount_text(&self.max_claimable), token_decimals)?,
            price_per_token: parse_units(&amount_text(&self.price), currency_decimals(&currency))?,
            currency,
        })
    }
}

/// Top-level snapshot document behind a merkle root
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    #[serde(default)]
    pub is_sharded_merkle_tree: bool,
    #[serde(default)]
    pub base_uri: Option<String>,
    #[serde(default)]
    pub shard_nybbles: Option<usize>,
    #[serde(default)]
    pub token_decimals: u8,
    // unsharded snapshots list every claimer here
    #[serde(default)]
    pub claims: Vec<SnapshotEntry>,
}

/// One shard of a sharded snapshot
#[derive(Debug, Deserialize)]
pub struct ShardData {
    #[serde(default)]
    pub proofs: Vec<String>,
    pub entries: Vec<SnapshotEntry>,
}

/// Shard file name for a claimer: the first `nybbles` hex digits of the address
pub fn shard_id(claimer: &Address, nybbles: usize) -> String {
    let hex = claimer.to_string();
    let digits = &hex[2..];
    digits[..nybbles.min(digits.len())].to_string()
}

/// Build the claimer's proof inside a shard, then extend it to the phase root.
///
/// # Returns
/// `None` when the claimer has no entry in the shard
pub fn prove_in_shard(
    shard: &ShardData,
    claimer: &Address,
    token_decimals: u8,
    currency_decimals: impl Fn(&Address) -> u8,
) -> Result<Option<AllowlistProof>, AllowlistError> {
    let mut leaves = Vec::with_capacity(shard.entries.len());
    let mut mine = None;
    for entry in &shard.entries {
        let resolved = entry.resolve(token_decimals, &currency_decimals)?;
        let leaf = resolved.leaf(&entry.address);
        if entry.address == *claimer && mine.is_none() {
            mine = Some((resolved, leaf));
        }
        leaves.push(leaf);
    }

    let Some((mut resolved, leaf)) = mine else {
        return Ok(None);
    };

    // shard trees are built over sorted leaves
    leaves.sort();
    if let Some(root) = merkle_root(&leaves) {
        log::debug!("Shard root {} over {} entries", encode_hex(&root), leaves.len());
    }
    let index = leaves
        .iter()
        .position(|l| *l == leaf)
        .ok_or_else(|| AllowlistError::InvalidSnapshot("claimer leaf missing from shard".to_string()))?;
    let mut proof = merkle_proof(&leaves, index)
        .ok_or_else(|| AllowlistError::InvalidSnapshot("leaf index out of range".to_string()))?;
    for node in &shard.proofs {
        proof.push(parse_hash(node)?);
    }

    resolved.proof = proof;
    Ok(Some(resolved))
}

/// Look the claimer up in an unsharded snapshot, which carries proofs inline
pub fn prove_in_claims(
    claims: &[SnapshotEntry],
    claimer: &Address,
    token_decimals: u8,
    currency_decimals: impl Fn(&Address) -> u8,
) -> Result<Option<AllowlistProof>, AllowlistError> {
    let Some(entry) = claims.iter().find(|c| c.address == *claimer) else {
        return Ok(None);
    };
    let mut resolved = entry.resolve(token_decimals, &currency_decimals)?;
    resolved.proof = entry.proof.iter().map(|p| parse_hash(p)).collect::<Result<_, _>>()?;
    Ok(Some(resolved))
}

/// Finds the allowlist proof for a claimer, if the active phase has an allowlist
#[allow(async_fn_in_trait)]
pub trait AllowlistProver {
    async fn proof_for(
        &self,
        contract: &ContractRef,
        condition: &ClaimCondition,
        claimer: &Address,
    ) -> Result<AllowlistProof, AllowlistError>;
}

impl<T: ChainTransport> RpcContractSource<T> {
    async fn fetch_parsed<D: DeserializeOwned>(&self, uri: &str) -> Result<D, AllowlistError> {
        let url = resolve_ipfs_uri(uri);
        log::debug!("Fetching allowlist data from {}", url);
        let value = self.transport().fetch_document(&url).await?;
        serde_json::from_value(value).map_err(|e| AllowlistError::InvalidSnapshot(format!("{}: {}", url, e)))
    }

    /// Decimals of every priced ERC-20 currency in `entries`; native prices use the chain's decimals
    async fn currency_decimals(
        &self,
        native_decimals: u8,
        entries: &[SnapshotEntry],
    ) -> Result<BTreeMap<Address, u8>, AllowlistError> {
        let mut decimals = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.has_price()) {
            let currency = entry.currency();
            if currency.is_zero() || currency == Address::NATIVE_TOKEN || decimals.contains_key(&currency) {
                continue;
            }
            let data = self
                .transport()
                .eth_call(&currency, &CallEncoder::new(selectors::DECIMALS).finish(), None, 0)
                .await?;
            let value = u8::try_from(decode_uint(&data)?).map_err(|_| AbiError::Overflow("decimals exceed u8"))?;
            decimals.insert(currency, value);
        }
        decimals.insert(Address::ZERO, native_decimals);
        decimals.insert(Address::NATIVE_TOKEN, native_decimals);
        Ok(decimals)
    }
}

impl<T: ChainTransport> AllowlistProver for RpcContractSource<T> {
    /// Resolve the claimer's allowlist entry for the active phase.
    ///
    /// Phases without a merkle root, roots without a published snapshot and
    /// claimers missing from the list all get the empty proof; the contract
    /// then decides with the phase's public limits.
    async fn proof_for(
        &self,
        contract: &ContractRef,
        condition: &ClaimCondition,
        claimer: &Address,
    ) -> Result<AllowlistProof, AllowlistError> {
        if !condition.has_allowlist() {
            return Ok(AllowlistProof::empty());
        }

        let root = encode_hex(&condition.merkle_root);
        let document = self.metadata_document(contract).await?.unwrap_or_default();
        let Some(uri) = document
            .merkle
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&root))
            .map(|(_, uri)| uri.clone())
        else {
            log::warn!("No allowlist snapshot published for merkle root {}", root);
            return Ok(AllowlistProof::empty());
        };

        let snapshot: SnapshotDocument = self.fetch_parsed(&uri).await?;
        let native_decimals = contract.chain.native_currency.decimals;

        let found = if snapshot.is_sharded_merkle_tree {
            let base = snapshot
                .base_uri
                .as_deref()
                .ok_or_else(|| AllowlistError::InvalidSnapshot("sharded snapshot without baseUri".to_string()))?;
            let shard_uri = format!(
                "{}/{}.json",
                base.trim_end_matches('/'),
                shard_id(claimer, snapshot.shard_nybbles.unwrap_or(DEFAULT_SHARD_NYBBLES))
            );

            match self.fetch_parsed::<ShardData>(&shard_uri).await {
                Ok(shard) => {
                    let decimals = self.currency_decimals(native_decimals, &shard.entries).await?;
                    prove_in_shard(&shard, claimer, snapshot.token_decimals, |c| {
                        decimals.get(c).copied().unwrap_or(native_decimals)
                    })?
                }
                // no shard file means nobody with this prefix is listed
                Err(AllowlistError::Rpc(e)) if e.is_not_found() => None,
                Err(e) => return Err(e),
            }
        } else {
            let decimals = self.currency_decimals(native_decimals, &snapshot.claims).await?;
            prove_in_claims(&snapshot.claims, claimer, snapshot.token_decimals, |c| {
                decimals.get(c).copied().unwrap_or(native_decimals)
            })?
        };

        match found {
            Some(proof) => {
                if !verify_proof(&proof.proof, &condition.merkle_root, &proof.leaf(claimer)) {
                    log::warn!("Allowlist proof for {} does not verify against {}", claimer, root);
                }
                log::info!("Found allowlist entry for {} ({} proof nodes)", claimer, proof.proof.len());
                Ok(proof)
            }
            None => {
                log::info!("{} is not on the allowlist for root {}", claimer, root);
                Ok(AllowlistProof::empty())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::contract::tests::{free_condition, test_contract};
    use crate::core::rpc_base::tests::StubTransport;
    use serde_json::json;

    const A: &str = "0x00000000000000000000000000000000000000aa";
    const B: &str = "0x00000000000000000000000000000000000000bb";
    const C: &str = "0x00000000000000000000000000000000000000cc";
    const OUTSIDER: &str = "0x00000000000000000000000000000000000000dd";

    // expected values computed independently from the leaf encoding
    const LEAF_A: &str = "0xd1df8a13d2912b550097213d7b3ab15cb0685578dfb16fc8c34b773d2c06ea05";
    const SHARD_ROOT: &str = "0x5b7204df834a950217361f9658e2fb5d5a8845d8fd34c445d65ae6b34d14e64a";
    const PHASE_ROOT: &str = "0x7774f2d8085c66aae7f0d92777e1f5e5e81c1ae18f54aaa7479c52c07b81c7c6";

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn hash(s: &str) -> Hash {
        parse_hash(s).unwrap()
    }

    fn other_shard_root() -> Hash {
        keccak256(b"other shard")
    }

    /// Shard "00" holding A (limit 1), B (unlimited) and C (limit 3 at 0.1 native)
    pub(crate) fn shard_fixture() -> serde_json::Value {
        json!({
            "proofs": [encode_hex(&other_shard_root())],
            "entries": [
                {"address": A, "maxClaimable": "1"},
                {"address": B, "maxClaimable": "unlimited"},
                {"address": C, "maxClaimable": 3, "price": "0.1", "currencyAddress": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"}
            ]
        })
    }

    fn shard() -> ShardData {
        serde_json::from_value(shard_fixture()).unwrap()
    }

    fn native_18(_: &Address) -> u8 {
        18
    }

    pub(crate) fn allowlist_condition() -> ClaimCondition {
        let mut condition = free_condition(0);
        condition.quantity_limit_per_wallet = 0;
        condition.merkle_root = hash(PHASE_ROOT);
        condition
    }

    #[test]
    fn test_keccak256_known_vector() {
        assert_eq!(
            encode_hex(&keccak256(b"")),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_hash_entry_matches_packed_encoding() {
        assert_eq!(hash_entry(&addr(A), 1, UNLIMITED, &Address::ZERO), hash(LEAF_A));
    }

    #[test]
    fn test_shard_tree_root() {
        let shard = shard();
        let mut leaves: Vec<Hash> = shard
            .entries
            .iter()
            .map(|e| e.resolve(0, &native_18).unwrap().leaf(&e.address))
            .collect();
        leaves.sort();
        assert_eq!(merkle_root(&leaves), Some(hash(SHARD_ROOT)));
        assert_eq!(hash_pair(&hash(SHARD_ROOT), &other_shard_root()), hash(PHASE_ROOT));
    }

    #[test]
    fn test_prove_in_shard_reaches_phase_root() {
        let shard = shard();
        for (claimer, limit) in [(A, 1), (B, UNLIMITED), (C, 3)] {
            let proof = prove_in_shard(&shard, &addr(claimer), 0, native_18).unwrap().unwrap();
            assert!(!proof.proof.is_empty());
            assert_eq!(proof.quantity_limit_per_wallet, limit);
            assert_eq!(proof.proof.last(), Some(&other_shard_root()));
            assert!(
                verify_proof(&proof.proof, &hash(PHASE_ROOT), &proof.leaf(&addr(claimer))),
                "proof for {} should verify",
                claimer
            );
        }
    }

    #[test]
    fn test_prove_in_shard_unknown_claimer() {
        assert_eq!(prove_in_shard(&shard(), &addr(OUTSIDER), 0, native_18).unwrap(), None);
    }

    #[test]
    fn test_priced_entry_overrides_terms() {
        let proof = prove_in_shard(&shard(), &addr(C), 0, native_18).unwrap().unwrap();
        assert_eq!(proof.price_per_token, 100_000_000_000_000_000);
        assert_eq!(proof.currency, Address::NATIVE_TOKEN);

        let terms = proof.terms(&free_condition(5));
        assert_eq!(terms.price_per_token, 100_000_000_000_000_000);
        assert_eq!(terms.currency, Address::NATIVE_TOKEN);

        // unpriced entries keep the phase price
        let plain = prove_in_shard(&shard(), &addr(A), 0, native_18).unwrap().unwrap();
        assert_eq!(plain.terms(&free_condition(5)).price_per_token, 5);
        assert_eq!(AllowlistProof::empty().terms(&free_condition(5)).price_per_token, 5);
    }

    #[test]
    fn test_merkle_proof_odd_layers() {
        let leaves: Vec<Hash> = (0u8..5).map(|i| keccak256(&[i])).collect();
        let root = merkle_root(&leaves).unwrap();
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = merkle_proof(&leaves, i).unwrap();
            assert!(verify_proof(&proof, &root, leaf), "leaf {}", i);
        }
        assert!(merkle_proof(&leaves, 5).is_none());
        assert_eq!(merkle_root(&[]), None);
        assert_eq!(merkle_root(&leaves[..1]), Some(leaves[0]));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1", 0).unwrap(), 1);
        assert_eq!(parse_units("0.1", 18).unwrap(), 100_000_000_000_000_000);
        assert_eq!(parse_units("2.5", 6).unwrap(), 2_500_000);
        assert_eq!(parse_units(".5", 1).unwrap(), 5);
        assert_eq!(parse_units("unlimited", 0).unwrap(), UNLIMITED);
        assert_eq!(parse_units("", 18).unwrap(), UNLIMITED);
        assert!(parse_units("1.5", 0).is_err());
        assert!(parse_units("abc", 18).is_err());
        assert!(parse_units("-1", 18).is_err());
        assert!(parse_units(".", 18).is_err());
    }

    #[test]
    fn test_shard_id() {
        assert_eq!(shard_id(&addr("0xAB00000000000000000000000000000000000001"), 2), "ab");
        assert_eq!(shard_id(&addr(A), 1), "0");
    }

    #[test]
    fn test_prove_in_claims_uses_inline_proof() {
        let claims: Vec<SnapshotEntry> = serde_json::from_value(json!([
            {"address": A, "maxClaimable": "1", "proof": [SHARD_ROOT]}
        ]))
        .unwrap();
        let proof = prove_in_claims(&claims, &addr(A), 0, native_18).unwrap().unwrap();
        assert_eq!(proof.proof, vec![hash(SHARD_ROOT)]);
        assert_eq!(prove_in_claims(&claims, &addr(B), 0, native_18).unwrap(), None);
    }

    const METADATA_URL: &str = "https://meta.example/contract.json";

    fn string_return(text: &str) -> Vec<u8> {
        let mut data = CallEncoder::new([0; 4]).uint(0x20).uint(text.len() as u128).finish()[4..].to_vec();
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(text.len().div_ceil(WORD) * WORD, 0);
        data.extend(bytes);
        data
    }

    pub(crate) fn sharded_transport() -> StubTransport {
        StubTransport::default()
            .with_call(selectors::CONTRACT_URI, string_return(METADATA_URL))
            .with_document(METADATA_URL, json!({"name": "Signal", "merkle": {PHASE_ROOT: "https://lists.example/snapshot.json"}}))
            .with_document(
                "https://lists.example/snapshot.json",
                json!({
                    "merkleRoot": PHASE_ROOT,
                    "baseUri": "https://lists.example/shards/",
                    "shardNybbles": 2,
                    "tokenDecimals": 0,
                    "isShardedMerkleTree": true
                }),
            )
            .with_document("https://lists.example/shards/00.json", shard_fixture())
    }

    #[tokio::test]
    async fn test_proof_for_listed_claimer() {
        let source = RpcContractSource::new(sharded_transport());
        let proof = source.proof_for(&test_contract(), &allowlist_condition(), &addr(A)).await.unwrap();
        assert_eq!(proof.quantity_limit_per_wallet, 1);
        assert!(verify_proof(&proof.proof, &hash(PHASE_ROOT), &proof.leaf(&addr(A))));
        assert!(source.transport().fetched().contains(&"https://lists.example/shards/00.json".to_string()));
    }

    #[tokio::test]
    async fn test_proof_for_unlisted_claimer_is_empty() {
        let source = RpcContractSource::new(sharded_transport());
        let outsider = addr("0xff000000000000000000000000000000000000dd");
        // shard "ff" does not exist
        let proof = source.proof_for(&test_contract(), &allowlist_condition(), &outsider).await.unwrap();
        assert_eq!(proof, AllowlistProof::empty());
    }

    #[tokio::test]
    async fn test_proof_for_open_phase_skips_network() {
        let source = RpcContractSource::new(StubTransport::default());
        let proof = source.proof_for(&test_contract(), &free_condition(0), &addr(A)).await.unwrap();
        assert_eq!(proof, AllowlistProof::empty());
        assert!(source.transport().fetched().is_empty());
    }

    #[tokio::test]
    async fn test_proof_for_unpublished_root_is_empty() {
        let transport = StubTransport::default()
            .with_call(selectors::CONTRACT_URI, string_return(METADATA_URL))
            .with_document(METADATA_URL, json!({"name": "Signal"}));
        let source = RpcContractSource::new(transport);
        let proof = source.proof_for(&test_contract(), &allowlist_condition(), &addr(A)).await.unwrap();
        assert_eq!(proof, AllowlistProof::empty());
    }

    #[tokio::test]
    async fn test_proof_for_reads_erc20_decimals() {
        let token = "0x00000000000000000000000000000000000000ee";
        let shard = json!({
            "proofs": [],
            "entries": [{"address": A, "maxClaimable": "1", "price": "2.5", "currencyAddress": token}]
        });
        let single_root = hash_entry(&addr(A), 1, 2_500_000, &addr(token));
        let root_hex = encode_hex(&single_root);
        let transport = StubTransport::default()
            .with_call(selectors::CONTRACT_URI, string_return(METADATA_URL))
            .with_call(selectors::DECIMALS, CallEncoder::new([0; 4]).uint(6).finish()[4..].to_vec())
            .with_document(METADATA_URL, json!({"merkle": {root_hex.clone(): "https://lists.example/usdc.json"}}))
            .with_document(
                "https://lists.example/usdc.json",
                json!({"baseUri": "https://lists.example/usdc", "shardNybbles": 2, "isShardedMerkleTree": true}),
            )
            .with_document("https://lists.example/usdc/00.json", shard);

        let mut condition = allowlist_condition();
        condition.merkle_root = single_root;
        let proof = RpcContractSource::new(transport)
            .proof_for(&test_contract(), &condition, &addr(A))
            .await
            .unwrap();
        assert_eq!(proof.price_per_token, 2_500_000);
        assert_eq!(proof.currency, addr(token));
        // a one-leaf tree verifies with an empty path
        assert!(verify_proof(&proof.proof, &single_root, &proof.leaf(&addr(A))));
    }
}

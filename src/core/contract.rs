use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use super::abi::{decode_string, decode_uint, selectors, AbiError, Address, CallEncoder, Decoder, WORD};
use super::network_config::{resolve_ipfs_uri, ChainDescriptor};
use super::rpc_base::{ChainTransport, RpcConnection, RpcError};

/// The on-chain collection a page mints from
#[derive(Debug, Clone, PartialEq)]
pub struct ContractRef {
    pub chain: &'static ChainDescriptor,  // network the collection lives on
    pub address: Address,                 // Drop contract
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractMetadata {
    pub name: String,
    pub symbol: Option<String>,
    pub description: Option<String>,
    /// Gateway-resolved image URL
    pub image: Option<String>,
}

// contract-level metadata JSON behind contractURI()
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetadataDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image: Option<String>,
    // merkle root (0x hex) -> allowlist snapshot URI
    #[serde(default)]
    pub(crate) merkle: BTreeMap<String, String>,
}

/// Active claim phase of a Drop contract
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimCondition {
    pub start_timestamp: u64,
    /// `u128::MAX` when unlimited
    pub max_claimable_supply: u128,
    pub supply_claimed: u128,
    /// `u128::MAX` when unlimited
    pub quantity_limit_per_wallet: u128,
    pub merkle_root: [u8; WORD],
    /// Price in the currency's smallest unit
    pub price_per_token: u128,
    pub currency: Address,
}

impl ClaimCondition {
    /// Decode the `ClaimCondition` tuple returned by `getClaimConditionById`
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let d = Decoder::new(data);
        let base = d.usize_at(0)?;
        let field = |i: usize| base + i * WORD;
        let saturating = |i: usize| match d.uint_at(field(i)) {
            Err(AbiError::Overflow(_)) => Ok(u128::MAX),
            other => other,
        };

        Ok(Self {
            start_timestamp: d.u64_at(field(0))?,
            max_claimable_supply: saturating(1)?,
            supply_claimed: d.uint_at(field(2))?,
            quantity_limit_per_wallet: saturating(3)?,
            merkle_root: d.word_at(field(4))?,
            price_per_token: d.uint_at(field(5))?,
            currency: d.address_at(field(6))?,
        })
    }

    pub fn is_native_currency(&self) -> bool {
        self.currency == Address::NATIVE_TOKEN
    }

    pub fn has_allowlist(&self) -> bool {
        self.merkle_root != [0u8; WORD]
    }

    pub fn remaining_supply(&self) -> Option<u128> {
        if self.max_claimable_supply == u128::MAX {
            None
        } else {
            Some(self.max_claimable_supply.saturating_sub(self.supply_claimed))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    Rpc(RpcError),
    Abi(AbiError),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Rpc(err) => write!(f, "{}", err),
            ReadError::Abi(err) => write!(f, "Unexpected contract data: {}", err),
        }
    }
}

impl From<RpcError> for ReadError {
    fn from(err: RpcError) -> Self {
        ReadError::Rpc(err)
    }
}

impl From<AbiError> for ReadError {
    fn from(err: AbiError) -> Self {
        ReadError::Abi(err)
    }
}

/// Tri-state view of one read
#[derive(Debug, Clone, PartialEq)]
pub enum ReadState<T> {
    Loading,
    Loaded(T),
    Errored(String),
}

impl<T> Default for ReadState<T> {
    fn default() -> Self {
        ReadState::Loading
    }
}

impl<T> ReadState<T> {
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => ReadState::Loaded(v),
            Err(e) => ReadState::Errored(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ReadState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ReadState::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ReadState::Errored(e) => Some(e),
            _ => None,
        }
    }
}

/// Locally cached, possibly partial, view of the contract
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContractSnapshot {
    pub metadata: ReadState<ContractMetadata>,
    pub claim_condition: ReadState<ClaimCondition>,
    pub claimed_supply: ReadState<u128>,
    pub next_token_id: ReadState<u128>,
}

/// Read-only queries against the collection contract
#[allow(async_fn_in_trait)]
pub trait ContractSource {
    async fn metadata(&self, contract: &ContractRef) -> Result<ContractMetadata, ReadError>;
    async fn active_claim_condition(&self, contract: &ContractRef) -> Result<ClaimCondition, ReadError>;
    async fn total_claimed_supply(&self, contract: &ContractRef) -> Result<u128, ReadError>;
    async fn next_token_id(&self, contract: &ContractRef) -> Result<u128, ReadError>;
}

/// One of the four independent reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotField {
    Metadata,
    ClaimCondition,
    ClaimedSupply,
    NextTokenId,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 4] = [
        SnapshotField::Metadata,
        SnapshotField::ClaimCondition,
        SnapshotField::ClaimedSupply,
        SnapshotField::NextTokenId,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SnapshotField::Metadata => "contract metadata",
            SnapshotField::ClaimCondition => "claim condition",
            SnapshotField::ClaimedSupply => "claimed supply",
            SnapshotField::NextTokenId => "next token id",
        }
    }
}

/// Settled result of one read, ready to merge into a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Metadata(ReadState<ContractMetadata>),
    ClaimCondition(ReadState<ClaimCondition>),
    ClaimedSupply(ReadState<u128>),
    NextTokenId(ReadState<u128>),
}

impl ContractSnapshot {
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Metadata(state) => self.metadata = state,
            FieldUpdate::ClaimCondition(state) => self.claim_condition = state,
            FieldUpdate::ClaimedSupply(state) => self.claimed_supply = state,
            FieldUpdate::NextTokenId(state) => self.next_token_id = state,
        }
    }

    pub fn mark_loading(&mut self, field: SnapshotField) {
        match field {
            SnapshotField::Metadata => self.metadata = ReadState::Loading,
            SnapshotField::ClaimCondition => self.claim_condition = ReadState::Loading,
            SnapshotField::ClaimedSupply => self.claimed_supply = ReadState::Loading,
            SnapshotField::NextTokenId => self.next_token_id = ReadState::Loading,
        }
    }
}

fn settle<T>(field: SnapshotField, result: Result<T, ReadError>) -> ReadState<T> {
    match &result {
        Ok(_) => log::debug!("Loaded {}", field.label()),
        Err(e) => log::error!("Failed to read {}: {}", field.label(), e),
    }
    ReadState::from_result(result)
}

/// Perform a single read; errors are captured in the returned state.
///
/// # Parameters
/// * `source` - where the contract state comes from
/// * `contract` - collection to read
/// * `field` - which of the four reads to run
///
/// # Returns
/// An update for that field only, `Loaded` or `Errored`, never `Loading`
pub async fn read_field<S: ContractSource>(
    source: &S,
    contract: &ContractRef,
    field: SnapshotField,
) -> FieldUpdate {
    match field {
        SnapshotField::Metadata => FieldUpdate::Metadata(settle(field, source.metadata(contract).await)),
        SnapshotField::ClaimCondition => {
            FieldUpdate::ClaimCondition(settle(field, source.active_claim_condition(contract).await))
        }
        SnapshotField::ClaimedSupply => {
            FieldUpdate::ClaimedSupply(settle(field, source.total_claimed_supply(contract).await))
        }
        SnapshotField::NextTokenId => FieldUpdate::NextTokenId(settle(field, source.next_token_id(contract).await)),
    }
}

/// Run the four reads concurrently; each field settles on its own.
///
/// The page spawns the reads one by one on first load so fields can render as
/// they arrive; this is the refresh path, where the old values stay on screen
/// until the whole snapshot is back.
pub async fn load_snapshot<S: ContractSource>(source: &S, contract: &ContractRef) -> ContractSnapshot {
    let (metadata, claim_condition, claimed_supply, next_token_id) = tokio::join!(
        read_field(source, contract, SnapshotField::Metadata),
        read_field(source, contract, SnapshotField::ClaimCondition),
        read_field(source, contract, SnapshotField::ClaimedSupply),
        read_field(source, contract, SnapshotField::NextTokenId)
    );

    let mut snapshot = ContractSnapshot::default();
    for update in [metadata, claim_condition, claimed_supply, next_token_id] {
        snapshot.apply(update);
    }
    snapshot
}

/// `ContractSource` backed by the chain's JSON-RPC node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RpcContractSource<T = RpcConnection> {
    transport: T,
}

impl<T: ChainTransport> RpcContractSource<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(&self, contract: &ContractRef, data: Vec<u8>) -> Result<Vec<u8>, ReadError> {
        Ok(self.transport.eth_call(&contract.address, &data, None, 0).await?)
    }

    async fn call_string(&self, contract: &ContractRef, selector: [u8; 4]) -> Result<String, ReadError> {
        let data = self.call(contract, CallEncoder::new(selector).finish()).await?;
        Ok(decode_string(&data)?)
    }

    /// Fetch the JSON document `contractURI()` points at
    ///
    /// # Returns
    /// `None` when the contract has no URI set
    pub(crate) async fn metadata_document(&self, contract: &ContractRef) -> Result<Option<MetadataDocument>, ReadError> {
        let uri = self.call_string(contract, selectors::CONTRACT_URI).await?;
        if uri.trim().is_empty() {
            return Ok(None);
        }
        let url = resolve_ipfs_uri(uri.trim());
        log::debug!("Fetching contract metadata from {}", url);
        let value = self.transport.fetch_document(&url).await?;
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ReadError::Rpc(RpcError::InvalidResponse(format!("Bad metadata document: {}", e))))
    }
}

impl<T: ChainTransport> ContractSource for RpcContractSource<T> {
    async fn metadata(&self, contract: &ContractRef) -> Result<ContractMetadata, ReadError> {
        let document = match self.metadata_document(contract).await {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("contractURI lookup failed, falling back to name(): {}", e);
                None
            }
        };

        match document {
            Some(MetadataDocument { name: Some(name), symbol, description, image, .. }) => Ok(ContractMetadata {
                name,
                symbol,
                description,
                image: image.map(|uri| resolve_ipfs_uri(&uri)),
            }),
            // no document, or one without a name: ask the contract, keep what the document had
            other => {
                let name = self.call_string(contract, selectors::NAME).await?;
                let symbol = self.call_string(contract, selectors::SYMBOL).await.ok();
                Ok(ContractMetadata {
                    name,
                    symbol,
                    description: other.as_ref().and_then(|d| d.description.clone()),
                    image: other.and_then(|d| d.image).map(|uri| resolve_ipfs_uri(&uri)),
                })
            }
        }
    }

    async fn active_claim_condition(&self, contract: &ContractRef) -> Result<ClaimCondition, ReadError> {
        let id_data = self
            .call(contract, CallEncoder::new(selectors::GET_ACTIVE_CLAIM_CONDITION_ID).finish())
            .await?;
        let condition_id = decode_uint(&id_data)?;

        let data = self
            .call(
                contract,
                CallEncoder::new(selectors::GET_CLAIM_CONDITION_BY_ID).uint(condition_id).finish(),
            )
            .await?;
        Ok(ClaimCondition::decode(&data)?)
    }

    async fn total_claimed_supply(&self, contract: &ContractRef) -> Result<u128, ReadError> {
        let data = self.call(contract, CallEncoder::new(selectors::TOTAL_MINTED).finish()).await?;
        Ok(decode_uint(&data)?)
    }

    async fn next_token_id(&self, contract: &ContractRef) -> Result<u128, ReadError> {
        let data = self
            .call(contract, CallEncoder::new(selectors::NEXT_TOKEN_ID_TO_MINT).finish())
            .await?;
        Ok(decode_uint(&data)?)
    }
}

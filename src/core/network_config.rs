/// Native gas/payment token of a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

impl NativeCurrency {
    /// Render an amount in smallest units with a fixed number of fraction digits,
    /// rounding half up (`1_250_000_000_000_000_000` with 1 digit -> `"1.3"`).
    pub fn format_amount(&self, amount: u128, fraction_digits: u32) -> String {
        let decimals = self.decimals as u32;
        let digits = fraction_digits.min(decimals);
        let scale = 10u128.pow(decimals - digits);

        let mut scaled = amount / scale;
        if amount % scale >= scale / 2 && scale > 1 {
            scaled += 1;
        }

        if digits == 0 {
            return scaled.to_string();
        }
        let unit = 10u128.pow(digits);
        format!(
            "{}.{:0width$}",
            scaled / unit,
            scaled % unit,
            width = digits as usize
        )
    }
}

/// Static description of an EVM network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub id: u64,                              // EIP-155 chain id
    pub name: &'static str,                   // shown in the wallet and the chain chip
    pub rpc_url: &'static str,                // public JSON-RPC node
    pub native_currency: NativeCurrency,
    pub is_testnet: bool,
    pub block_explorer: Option<&'static str>, // base URL without trailing slash
}

impl ChainDescriptor {
    /// Chain id as the `0x`-prefixed quantity wallets expect
    pub fn hex_id(&self) -> String {
        format!("0x{:x}", self.id)
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.block_explorer
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

pub const PINDORA_TESTNET: ChainDescriptor = ChainDescriptor {
    id: 99812,
    name: "Pindora Testnet",
    rpc_url: "https://subnets.avax.network/pindora/testnet/rpc",
    native_currency: NativeCurrency {
        name: "LUCIA",
        symbol: "LUCIA",
        decimals: 18,
    },
    is_testnet: true,
    block_explorer: None,
};

/// Client identifier issued by the contract SDK provider; selects the IPFS gateway host
pub const CLIENT_ID: &str = "362d66e64e5563b3583827a48e2774e3";

/// Delay between `eth_getTransactionReceipt` polls
pub const RECEIPT_POLL_INTERVAL_MS: u32 = 1_500;

/// Resolve an `ipfs://` URI to an HTTP gateway URL; other URIs pass through.
pub fn resolve_ipfs_uri(uri: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(path) => format!(
            "https://{}.ipfscdn.io/ipfs/{}",
            CLIENT_ID,
            path.trim_start_matches("ipfs/")
        ),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_chain_id() {
        assert_eq!(PINDORA_TESTNET.hex_id(), "0x185e4");
    }

    #[test]
    fn test_format_amount_one_fraction_digit() {
        let lucia = &PINDORA_TESTNET.native_currency;
        assert_eq!(lucia.format_amount(0, 1), "0.0");
        assert_eq!(lucia.format_amount(1_000_000_000_000_000_000, 1), "1.0");
        assert_eq!(lucia.format_amount(1_250_000_000_000_000_000, 1), "1.3");
        assert_eq!(lucia.format_amount(100_000_000_000_000_000, 1), "0.1");
        assert_eq!(lucia.format_amount(40_000_000_000_000_000, 1), "0.0");
    }

    #[test]
    fn test_format_amount_whole_units() {
        let lucia = &PINDORA_TESTNET.native_currency;
        assert_eq!(lucia.format_amount(2_600_000_000_000_000_000, 0), "3");
    }

    #[test]
    fn test_resolve_ipfs_uri() {
        assert_eq!(
            resolve_ipfs_uri("ipfs://QmHash/0"),
            format!("https://{}.ipfscdn.io/ipfs/QmHash/0", CLIENT_ID)
        );
        assert_eq!(resolve_ipfs_uri("https://example.org/a.json"), "https://example.org/a.json");
    }

    #[test]
    fn test_explorer_url_absent() {
        assert_eq!(PINDORA_TESTNET.explorer_tx_url("0xabc"), None);
    }
}

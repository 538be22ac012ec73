use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use js_sys::{Array, Function, Promise, Reflect};
use web_sys::window;

use super::abi::Address;
use super::network_config::ChainDescriptor;

/// EIP-1193 code for a request the user declined
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 code returned by `wallet_switchEthereumChain` for an unknown chain
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

const ACCOUNTS_CHANGED: &str = "accountsChanged";

#[derive(Debug, Clone, PartialEq)]
pub enum WalletError {
    NotInstalled,
    /// Provider rejected the request; `message` is the provider's own text
    Request { code: i64, message: String },
    NoAccount,
    JavaScriptError(String),
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletError::NotInstalled => write!(f, "No browser wallet found. Install MetaMask to continue."),
            WalletError::Request { code, message } => write!(f, "{} (code {})", message, code),
            WalletError::NoAccount => write!(f, "Wallet returned no account"),
            WalletError::JavaScriptError(msg) => write!(f, "Wallet script error: {}", msg),
        }
    }
}

/// Parameters for `wallet_addEthereumChain`
pub fn add_chain_params(chain: &ChainDescriptor) -> serde_json::Value {
    let mut params = serde_json::json!({
        "chainId": chain.hex_id(),
        "chainName": chain.name,
        "rpcUrls": [chain.rpc_url],
        "nativeCurrency": {
            "name": chain.native_currency.name,
            "symbol": chain.native_currency.symbol,
            "decimals": chain.native_currency.decimals,
        },
    });
    if let Some(explorer) = chain.block_explorer {
        params["blockExplorerUrls"] = serde_json::json!([explorer]);
    }
    params
}

/// First address of an `eth_accounts` / `eth_requestAccounts` reply
pub fn first_account(accounts: &serde_json::Value) -> Result<Option<Address>, WalletError> {
    match accounts.as_array().and_then(|list| list.first()).and_then(|a| a.as_str()) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| WalletError::JavaScriptError(format!("Bad account {}: {}", raw, e))),
        None => Ok(None),
    }
}

fn js_error(err: JsValue) -> WalletError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64())
        .map(|c| c as i64);
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string());

    match (code, message) {
        (Some(code), Some(message)) => WalletError::Request { code, message },
        (None, Some(message)) => WalletError::JavaScriptError(message),
        _ => WalletError::JavaScriptError(format!("{:?}", err)),
    }
}

// argument object of ethereum.request()
#[derive(Serialize)]
struct RequestArguments<'a, P> {
    method: &'a str,
    params: &'a P,
}

/// Live `accountsChanged` listener; removed from the provider when dropped
pub struct AccountsSubscription {
    provider: JsValue,
    handler: Option<Closure<dyn FnMut(JsValue)>>,
}

impl Drop for AccountsSubscription {
    fn drop(&mut self) {
        let Some(handler) = self.handler.take() else {
            return;
        };
        let removed = Reflect::get(&self.provider, &JsValue::from_str("removeListener"))
            .ok()
            .filter(|f| f.is_function())
            .map(|f| {
                Function::from(f)
                    .call2(&self.provider, &JsValue::from_str(ACCOUNTS_CHANGED), handler.as_ref().unchecked_ref())
                    .is_ok()
            })
            .unwrap_or(false);

        if removed {
            log::debug!("Stopped watching wallet accounts");
        } else {
            // the provider may still call it
            log::warn!("Wallet has no removeListener; keeping the accounts listener alive");
            handler.forget();
        }
    }
}

/// Browser wallet injected at `window.ethereum` (MetaMask and compatible extensions)
pub struct EthereumWallet;

impl EthereumWallet {
    fn provider() -> Result<JsValue, WalletError> {
        let window = window().ok_or(WalletError::JavaScriptError("No window object".to_string()))?;
        let provider = Reflect::get(&window, &JsValue::from_str("ethereum"))
            .map_err(|e| WalletError::JavaScriptError(format!("Failed to get ethereum: {:?}", e)))?;
        if provider.is_null() || provider.is_undefined() {
            return Err(WalletError::NotInstalled);
        }
        Ok(provider)
    }

    /// Check if a wallet provider is installed in the browser
    pub fn is_installed() -> bool {
        Self::provider().is_ok()
    }

    pub fn is_metamask() -> bool {
        Self::provider()
            .ok()
            .and_then(|p| Reflect::get(&p, &JsValue::from_str("isMetaMask")).ok())
            .and_then(|flag| flag.as_bool())
            .unwrap_or(false)
    }

    /// `ethereum.request({ method, params })`
    ///
    /// # Parameters
    /// * `method` - EIP-1193 / JSON-RPC method name
    /// * `params` - positional params; serialized to plain JS arrays and objects
    ///
    /// # Returns
    /// The provider's result as JSON, `Null` when it resolves to nothing.
    /// A rejected promise maps to `WalletError::Request` when it carries an
    /// EIP-1193 code.
    pub async fn request<P: Serialize>(method: &str, params: &P) -> Result<serde_json::Value, WalletError> {
        let provider = Self::provider()?;
        let request_func = Reflect::get(&provider, &JsValue::from_str("request"))
            .map_err(|e| WalletError::JavaScriptError(format!("Failed to get request function: {:?}", e)))?;
        if !request_func.is_function() {
            return Err(WalletError::JavaScriptError("request is not a function".to_string()));
        }

        let args = RequestArguments { method, params }
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| WalletError::JavaScriptError(format!("Failed to build request: {}", e)))?;

        log::debug!("Wallet request: {}", method);
        let promise = Function::from(request_func)
            .call1(&provider, &args)
            .map_err(js_error)?;
        let result = JsFuture::from(Promise::from(promise)).await.map_err(js_error)?;

        if result.is_undefined() || result.is_null() {
            return Ok(serde_json::Value::Null);
        }
        serde_wasm_bindgen::from_value(result)
            .map_err(|e| WalletError::JavaScriptError(format!("Failed to read result: {}", e)))
    }

    /// Ask the wallet for access and return the selected account
    pub async fn connect() -> Result<Address, WalletError> {
        let accounts = Self::request("eth_requestAccounts", &Vec::<String>::new()).await?;
        first_account(&accounts)?.ok_or(WalletError::NoAccount)
    }

    /// Currently authorised account, without prompting
    pub async fn current_account() -> Result<Option<Address>, WalletError> {
        let accounts = Self::request("eth_accounts", &Vec::<String>::new()).await?;
        first_account(&accounts)
    }

    /// Drop the site's account permission; wallets without the method are treated as disconnected
    pub async fn disconnect() -> Result<(), WalletError> {
        let params = serde_json::json!([{ "eth_accounts": {} }]);
        match Self::request("wallet_revokePermissions", &params).await {
            Ok(_) => Ok(()),
            Err(WalletError::Request { code, message }) if code == -32601 => {
                log::debug!("wallet_revokePermissions unsupported: {}", message);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Switch the wallet to `chain`, registering the chain first if the wallet does not know it
    pub async fn ensure_chain(chain: &ChainDescriptor) -> Result<(), WalletError> {
        let current = Self::request("eth_chainId", &Vec::<String>::new()).await?;
        if current.as_str().map(|id| id.eq_ignore_ascii_case(&chain.hex_id())).unwrap_or(false) {
            return Ok(());
        }

        log::info!("Switching wallet to {} ({})", chain.name, chain.id);
        let switch = serde_json::json!([{ "chainId": chain.hex_id() }]);
        match Self::request("wallet_switchEthereumChain", &switch).await {
            Ok(_) => Ok(()),
            Err(WalletError::Request { code, .. }) if code == UNRECOGNIZED_CHAIN_CODE => {
                log::info!("Chain {} unknown to wallet, adding it", chain.id);
                Self::request("wallet_addEthereumChain", &[add_chain_params(chain)]).await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Hand a transaction to the wallet for signing and broadcast; returns the transaction hash
    pub async fn send_transaction<T: Serialize>(tx: &T) -> Result<String, WalletError> {
        let result = Self::request("eth_sendTransaction", &[tx]).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::JavaScriptError("Transaction hash is not a string".to_string()))
    }

    /// Subscribe to `accountsChanged`; the callback gets the new first account or `None`.
    ///
    /// # Returns
    /// A subscription that keeps the listener registered until it is dropped.
    pub fn on_accounts_changed<F>(mut callback: F) -> Result<AccountsSubscription, WalletError>
    where
        F: FnMut(Option<Address>) + 'static,
    {
        let provider = Self::provider()?;
        let on_func = Reflect::get(&provider, &JsValue::from_str("on"))
            .map_err(|e| WalletError::JavaScriptError(format!("Failed to get on function: {:?}", e)))?;
        if !on_func.is_function() {
            return Err(WalletError::JavaScriptError("on is not a function".to_string()));
        }

        let handler = Closure::<dyn FnMut(JsValue)>::new(move |accounts: JsValue| {
            let account = Array::from(&accounts)
                .iter()
                .find_map(|a| a.as_string())
                .and_then(|raw| raw.parse::<Address>().ok());
            log::info!("Wallet account changed: {:?}", account);
            callback(account);
        });

        Function::from(on_func)
            .call2(&provider, &JsValue::from_str(ACCOUNTS_CHANGED), handler.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(AccountsSubscription {
            provider,
            handler: Some(handler),
        })
    }
}

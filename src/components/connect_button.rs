use dioxus::prelude::*;

use crate::core::abi::Address;
use crate::core::network_config::ChainDescriptor;
use crate::core::session::MintSession;
use crate::core::variant::WalletOptions;
use crate::core::wallet::{EthereumWallet, WalletError};

async fn connect_wallet(chain: &ChainDescriptor) -> Result<Address, WalletError> {
    let address = EthereumWallet::connect().await?;
    EthereumWallet::ensure_chain(chain).await?;
    Ok(address)
}

#[component]
pub fn ConnectButton(
    mut session: Signal<MintSession>,
    chain: &'static ChainDescriptor,
    options: WalletOptions,
) -> Element {
    let mut show_modal = use_signal(|| false);
    let mut connecting = use_signal(|| false);
    let mut connect_error = use_signal(|| Option::<String>::None);

    let account = session.read().account().copied();
    let installed = EthereumWallet::is_installed();
    // other injected providers still answer EIP-1193 requests
    let provider_label = if EthereumWallet::is_metamask() { None } else { Some("Browser Wallet") };
    let modal_class = options.modal_size.css_class();
    let chain_name = chain.name;
    let chain_class = if chain.is_testnet { "chain-chip testnet" } else { "chain-chip" };

    let connect = move |_| {
        spawn(async move {
            connecting.set(true);
            connect_error.set(None);
            match connect_wallet(chain).await {
                Ok(address) => {
                    log::info!("Wallet connected: {}", address);
                    session.with_mut(|s| s.set_account(Some(address)));
                    show_modal.set(false);
                }
                Err(e) => {
                    log::error!("Wallet connection failed: {}", e);
                    connect_error.set(Some(e.to_string()));
                }
            }
            connecting.set(false);
        });
    };

    let disconnect = move |_| {
        spawn(async move {
            if let Err(e) = EthereumWallet::disconnect().await {
                log::warn!("Wallet disconnect failed: {}", e);
            }
            session.with_mut(|s| s.set_account(None));
        });
    };

    if let Some(account) = account {
        let short = account.address.short();
        return rsx! {
            div {
                class: "connect-control connected",
                span { class: "account-chip", title: "{account.address}", "{short}" }
                span { class: chain_class, "{chain_name}" }
                button {
                    class: "wallet-button disconnect",
                    onclick: disconnect,
                    "Disconnect"
                }
            }
        };
    }

    rsx! {
        div {
            class: "connect-control",
            button {
                class: "wallet-button connect",
                onclick: move |_| show_modal.set(true),
                "Connect Wallet"
            }

            dialog {
                open: show_modal(),
                class: "{modal_class}",
                div {
                    class: "dialog-content",
                    h2 { "Connect a wallet" }

                    for wallet in options.wallets.iter() {
                        if installed {
                            button {
                                key: "{wallet.id}",
                                class: "wallet-option",
                                disabled: connecting(),
                                onclick: connect,
                                if connecting() {
                                    "Waiting for wallet..."
                                } else {
                                    "{provider_label.unwrap_or(wallet.name)}"
                                }
                            }
                        } else {
                            a {
                                key: "{wallet.id}",
                                class: "wallet-option install",
                                href: "{wallet.install_url}",
                                target: "_blank",
                                "Install {wallet.name}"
                            }
                        }
                    }

                    if let Some(error) = connect_error() {
                        p { class: "connect-error", "{error}" }
                    }

                    if options.show_branding {
                        p { class: "connect-branding", "Powered by Sovereign Signal" }
                    }

                    button {
                        class: "dialog-close",
                        onclick: move |_| show_modal.set(false),
                        "Close"
                    }
                }
            }
        }
    }
}

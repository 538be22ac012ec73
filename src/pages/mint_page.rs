use dioxus::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::components::{ConnectButton, Header, StatusBanner};
use crate::core::contract::{
    load_snapshot, read_field, ContractRef, ContractSnapshot, ReadState, RpcContractSource, SnapshotField,
};
use crate::core::rpc_base::RpcConnection;
use crate::core::session::{submit_mint, MintOutcome, MintSession, SessionHandle};
use crate::core::transaction::WalletSender;
use crate::core::variant::MintVariant;
use crate::core::wallet::{AccountsSubscription, EthereumWallet};

const CONNECT_TO_MINT_LABEL: &str = "Connect Wallet to Mint";

impl SessionHandle for Signal<MintSession> {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut MintSession) -> R) -> R {
        self.with_mut(f)
    }
}

fn spawn_read(
    mut snapshot: Signal<ContractSnapshot>,
    source: RpcContractSource,
    contract: ContractRef,
    field: SnapshotField,
) {
    spawn(async move {
        let update = read_field(&source, &contract, field).await;
        snapshot.with_mut(|s| s.apply(update));
    });
}

fn retry(
    mut snapshot: Signal<ContractSnapshot>,
    source: RpcContractSource,
    contract: ContractRef,
    field: SnapshotField,
) {
    log::info!("Retrying {}", field.label());
    snapshot.with_mut(|s| s.mark_loading(field));
    spawn_read(snapshot, source, contract, field);
}

#[component]
fn RetryLine(message: String, onretry: EventHandler<()>) -> Element {
    rsx! {
        div {
            class: "read-error",
            span { "{message}" }
            button {
                class: "retry-button",
                onclick: move |_| onretry.call(()),
                "Retry"
            }
        }
    }
}

#[component]
fn Spinner(label: &'static str) -> Element {
    rsx! {
        div {
            class: "loading-line",
            div { class: "spinner" }
            p { "{label}" }
        }
    }
}

#[component]
pub fn MintPage(variant: &'static MintVariant, contract: ContractRef) -> Element {
    let mut session = use_signal(MintSession::new);
    let snapshot = use_signal(ContractSnapshot::default);
    let source = use_hook(|| RpcContractSource::new(RpcConnection::new()));
    // released on unmount so the provider stops calling into this page
    let accounts_watch = use_hook(|| Rc::new(RefCell::new(None::<AccountsSubscription>)));

    use_drop({
        let accounts_watch = accounts_watch.clone();
        move || {
            accounts_watch.borrow_mut().take();
        }
    });

    // page load: fire the four reads and pick up an already-authorized account
    use_hook({
        let source = source.clone();
        let contract = contract.clone();
        move || {
            for field in SnapshotField::ALL {
                spawn_read(snapshot, source.clone(), contract.clone(), field);
            }

            spawn(async move {
                match EthereumWallet::current_account().await {
                    Ok(Some(address)) => {
                        log::info!("Restored wallet account {}", address);
                        session.with_mut(|s| s.set_account(Some(address)));
                    }
                    Ok(None) => log::debug!("No wallet account authorized yet"),
                    Err(e) => log::debug!("Wallet not available: {}", e),
                }
            });

            if EthereumWallet::is_installed() {
                let subscribed = EthereumWallet::on_accounts_changed(move |address| {
                    // the page may already be gone
                    if let Ok(mut current) = session.try_write() {
                        current.set_account(address);
                    }
                });
                match subscribed {
                    Ok(subscription) => *accounts_watch.borrow_mut() = Some(subscription),
                    Err(e) => log::warn!("Could not watch wallet accounts: {}", e),
                }
            }
        }
    });

    let on_mint = {
        let source = source.clone();
        let contract = contract.clone();
        move |_| {
            let source = source.clone();
            let contract = contract.clone();
            let Some(condition) = snapshot.read().claim_condition.value().cloned() else {
                log::warn!("Mint clicked before the claim condition loaded");
                return;
            };

            spawn(async move {
                let sender = WalletSender::new(RpcConnection::new(), contract.chain);
                let mut handle = session;
                let outcome =
                    submit_mint(&mut handle, &source, &sender, &contract, &condition, variant.success_message).await;

                if let MintOutcome::Success(tx) = outcome {
                    if let Some(url) = contract.chain.explorer_tx_url(&tx.transaction_hash) {
                        log::info!("View transaction: {}", url);
                    }
                    let mut snapshot = snapshot;
                    snapshot.set(load_snapshot(&source, &contract).await);
                }
            });
        }
    };

    let current = snapshot.read().clone();
    let state = session.read().clone();
    let currency = &contract.chain.native_currency;
    let background = variant.background_image;
    let collection_image = variant.collection_image;
    let connect_prompt = variant.connect_prompt;

    let mint_label = if state.is_pending() {
        variant.minting_label
    } else if state.account().is_none() {
        CONNECT_TO_MINT_LABEL
    } else {
        variant.mint_label
    };
    let button_disabled = !state.can_submit();

    let retry_handler = |field: SnapshotField| {
        let source = source.clone();
        let contract = contract.clone();
        move |_| retry(snapshot, source.clone(), contract.clone(), field)
    };

    rsx! {
        div {
            class: "mint-page",
            style: "background-image: url('{background}')",
            div { class: "page-overlay" }

            main {
                class: "page-content",
                Header { variant }

                div {
                    class: "mint-card",

                    div {
                        class: "contract-info",
                        match current.metadata {
                            ReadState::Loading => rsx! { Spinner { label: "Loading contract info..." } },
                            ReadState::Errored(message) => rsx! {
                                RetryLine {
                                    message: "Could not load contract info: {message}",
                                    onretry: retry_handler(SnapshotField::Metadata),
                                }
                            },
                            ReadState::Loaded(metadata) => rsx! {
                                div {
                                    class: "collection-image",
                                    img {
                                        src: metadata.image.clone().unwrap_or_else(|| collection_image.to_string()),
                                        alt: "{metadata.name}",
                                    }
                                }
                                h2 { class: "collection-name", "{metadata.name}" }
                                if let Some(description) = metadata.description.as_ref() {
                                    p { class: "collection-description", "{description}" }
                                }
                            },
                        }
                    }

                    div {
                        class: "mint-section",
                        h3 { class: "connect-prompt", "{connect_prompt}" }

                        match current.claim_condition {
                            ReadState::Loading => rsx! { Spinner { label: "Loading mint conditions..." } },
                            ReadState::Errored(message) => rsx! {
                                RetryLine {
                                    message: "Could not load mint conditions: {message}",
                                    onretry: retry_handler(SnapshotField::ClaimCondition),
                                }
                            },
                            ReadState::Loaded(condition) => rsx! {
                                div {
                                    class: "price-tag",
                                    "Price: {currency.format_amount(condition.price_per_token, 1)} {currency.symbol}"
                                }
                                if let Some(remaining) = condition.remaining_supply() {
                                    p { class: "phase-remaining", "{remaining} left in this phase" }
                                }
                                if condition.has_allowlist() {
                                    p { class: "phase-allowlist", "Allowlist phase" }
                                }
                                button {
                                    class: if button_disabled { "mint-button disabled" } else { "mint-button" },
                                    disabled: button_disabled,
                                    onclick: on_mint.clone(),
                                    if state.is_pending() {
                                        div { class: "spinner small" }
                                    }
                                    "{mint_label}"
                                }
                            },
                        }

                        div {
                            class: "supply-info",
                            match current.claimed_supply {
                                ReadState::Loading => rsx! { span { class: "supply-loading", "Minted: ..." } },
                                ReadState::Errored(_) => rsx! {
                                    RetryLine {
                                        message: "Claimed supply unavailable",
                                        onretry: retry_handler(SnapshotField::ClaimedSupply),
                                    }
                                },
                                ReadState::Loaded(claimed) => rsx! { span { "Minted: {claimed}" } },
                            }
                            match current.next_token_id {
                                ReadState::Loading => rsx! { span { class: "supply-loading", "Supply: ..." } },
                                ReadState::Errored(_) => rsx! {
                                    RetryLine {
                                        message: "Total supply unavailable",
                                        onretry: retry_handler(SnapshotField::NextTokenId),
                                    }
                                },
                                ReadState::Loaded(total) => rsx! { span { "Supply: {total}" } },
                            }
                        }
                    }

                    if let Some(status) = state.status() {
                        StatusBanner { status: status.clone() }
                    }

                    if let Some((before, role, after)) = variant.help {
                        div {
                            class: "help-text",
                            p {
                                "{before}"
                                span { class: "help-role", "{role}" }
                                "{after}"
                            }
                        }
                    }
                }

                ConnectButton {
                    session,
                    chain: contract.chain,
                    options: variant.wallet_options.clone(),
                }
            }
        }
    }
}

use dioxus::prelude::*;

use crate::components::Header;
use crate::core::variant::{MintVariant, SIGNAL_ID_ALLOWLIST, SIGNAL_ID_PUBLIC};
use crate::pages::MintPage;

const MAIN_CSS: Asset = asset!("/assets/main.css");

#[derive(Routable, Clone, PartialEq, Debug)]
#[rustfmt::skip]
pub enum Route {
    #[route("/")]
    AllowlistMint {},
    #[route("/public")]
    PublicMint {},
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

#[component]
pub fn App() -> Element {
    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        Router::<Route> {}
    }
}

#[component]
fn AllowlistMint() -> Element {
    rsx! { VariantPage { variant: &SIGNAL_ID_ALLOWLIST } }
}

#[component]
fn PublicMint() -> Element {
    rsx! { VariantPage { variant: &SIGNAL_ID_PUBLIC } }
}

#[component]
fn VariantPage(variant: &'static MintVariant) -> Element {
    match variant.deployed_contract() {
        Ok(Some(contract)) => rsx! { MintPage { variant, contract } },
        Ok(None) => {
            log::info!("No collection deployed for {} yet", variant.route);
            rsx! { NotYetOpen { variant } }
        }
        Err(e) => {
            log::error!("Invalid contract address for {}: {}", variant.route, e);
            rsx! {
                div {
                    class: "config-error",
                    h2 { "Configuration error" }
                    p { "{e}" }
                }
            }
        }
    }
}

// collection not deployed: static card, no chain reads
#[component]
fn NotYetOpen(variant: &'static MintVariant) -> Element {
    let background = variant.background_image;
    let collection_image = variant.collection_image;
    rsx! {
        div {
            class: "mint-page",
            style: "background-image: url('{background}')",
            div { class: "page-overlay" }
            main {
                class: "page-content",
                Header { variant }
                div {
                    class: "mint-card not-open",
                    div {
                        class: "collection-image",
                        img { src: "{collection_image}", alt: "{variant.title}" }
                    }
                    h2 { class: "collection-name", "Mint not yet open" }
                    p { class: "collection-description", "This collection has not been deployed yet. Check back soon." }
                }
            }
        }
    }
}

#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div {
            class: "not-found",
            h2 { "Page not found" }
            p { "Nothing lives at /{path}." }
            Link { to: Route::AllowlistMint {}, "Back to the mint" }
        }
    }
}

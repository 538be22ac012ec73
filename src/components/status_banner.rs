use dioxus::prelude::*;

use crate::core::status::MintStatus;

/// The single status line shown after a mint attempt
#[component]
pub fn StatusBanner(status: MintStatus) -> Element {
    let tone_class = status.tone.css_class();
    let message = status.message;

    rsx! {
        div {
            class: "mint-status",
            div {
                class: "mint-status-message {tone_class}",
                "{message}"
            }
        }
    }
}

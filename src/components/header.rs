use dioxus::prelude::*;

use crate::core::variant::MintVariant;

#[component]
pub fn Header(variant: &'static MintVariant) -> Element {
    let logo = variant.logo_image;
    let title = variant.title;
    let tagline = variant.tagline;
    let restriction = variant.restriction_note;

    rsx! {
        header {
            class: "page-header",
            div {
                class: "logo-frame",
                img {
                    class: "logo",
                    src: "{logo}",
                    alt: "Pindora Logo",
                    width: "120",
                    height: "120",
                }
            }
            h1 { class: "page-title", "{title}" }
            p { class: "page-tagline", "{tagline}" }
            p { class: "page-restriction", "{restriction}" }
            div {
                class: "header-dots",
                span { class: "dot dot-purple" }
                span { class: "dot dot-violet" }
                span { class: "dot dot-orange" }
            }
        }
    }
}

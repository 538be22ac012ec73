use super::abi::AbiError;
use super::contract::ContractRef;
use super::network_config::{ChainDescriptor, PINDORA_TESTNET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalSize {
    Compact,
    Wide,
}

impl ModalSize {
    pub fn css_class(self) -> &'static str {
        match self {
            ModalSize::Compact => "connect-modal compact",
            ModalSize::Wide => "connect-modal wide",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedWallet {
    pub id: &'static str,           // EIP-6963 reverse-DNS id
    pub name: &'static str,
    pub install_url: &'static str,  // shown when no provider is injected
}

pub const METAMASK: SupportedWallet = SupportedWallet {
    id: "io.metamask",
    name: "MetaMask",
    install_url: "https://metamask.io/download/",
};

/// Pass-through options for the connect control
#[derive(Debug, Clone, PartialEq)]
pub struct WalletOptions {
    pub show_branding: bool,
    pub modal_size: ModalSize,
    pub wallets: &'static [SupportedWallet],
}

/// Everything that differs between the mint pages
#[derive(Debug, Clone, PartialEq)]
pub struct MintVariant {
    pub route: &'static str,
    pub chain: &'static ChainDescriptor,
    pub contract_address: &'static str,
    pub title: &'static str,
    pub tagline: &'static str,
    pub restriction_note: &'static str,
    pub connect_prompt: &'static str,
    pub logo_image: &'static str,
    pub background_image: &'static str,
    pub collection_image: &'static str,
    pub mint_label: &'static str,
    pub minting_label: &'static str,
    pub success_message: &'static str,
    /// Help line under the card: text, highlighted role name, trailing text
    pub help: Option<(&'static str, &'static str, &'static str)>,
    pub wallet_options: WalletOptions,
}

impl MintVariant {
    pub fn contract(&self) -> Result<ContractRef, AbiError> {
        Ok(ContractRef {
            chain: self.chain,
            address: self.contract_address.parse()?,
        })
    }

    /// The collection to read and mint from.
    ///
    /// # Returns
    /// `None` while the variant still points at the zero address, i.e. the
    /// collection is not deployed yet and there is nothing to query.
    pub fn deployed_contract(&self) -> Result<Option<ContractRef>, AbiError> {
        let contract = self.contract()?;
        Ok((!contract.address.is_zero()).then_some(contract))
    }
}

/// Allow-list-gated collection for Verified Signal role holders
pub const SIGNAL_ID_ALLOWLIST: MintVariant = MintVariant {
    route: "/",
    chain: &PINDORA_TESTNET,
    contract_address: "0x400F8432253A7CaF458062c4C2632230c83B8e73",
    title: "Sovereign Signal ID Mint",
    tagline: "Claim your whitelist key. Prove you were first.",
    restriction_note: "Mint access is restricted to Verified Signal role holders.",
    connect_prompt: "Connect your whitelisted Metamask wallet.",
    logo_image: "/pindoralogo.png",
    background_image: "/mintbackground.jpeg",
    collection_image: "/SSSF.png",
    mint_label: "🚀 Mint Your Sovereign Signal ID",
    minting_label: "Minting Your Sovereign Signal ID...",
    success_message: "✅ Successfully minted your Sovereign Signal ID! Welcome to the exclusive club.",
    help: Some(("Having trouble? Ensure you have the ", "Verified Signal", " role in Discord.")),
    wallet_options: WalletOptions {
        show_branding: false,
        modal_size: ModalSize::Compact,
        wallets: &[METAMASK],
    },
};

/// Open collection anyone can claim from
pub const SIGNAL_ID_PUBLIC: MintVariant = MintVariant {
    route: "/public",
    chain: &PINDORA_TESTNET,
    // TODO: set to the deployed public collection once its address is published
    contract_address: "0x0000000000000000000000000000000000000000",
    title: "Sovereign Signal Public Mint",
    tagline: "Claim your Signal. Open to every wallet.",
    restriction_note: "One mint per wallet while supply lasts.",
    connect_prompt: "Connect your Metamask wallet.",
    logo_image: "/pindoralogo.png",
    background_image: "/publicbackground.jpeg",
    collection_image: "/SSSF.png",
    mint_label: "🚀 Mint Your Sovereign Signal",
    minting_label: "Minting Your Sovereign Signal...",
    success_message: "✅ Successfully minted your Sovereign Signal! Welcome aboard.",
    help: None,
    wallet_options: WalletOptions {
        show_branding: true,
        modal_size: ModalSize::Wide,
        wallets: &[METAMASK],
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::{StatusTone, MintStatus};

    #[test]
    fn test_variants_parse() {
        for variant in [&SIGNAL_ID_ALLOWLIST, &SIGNAL_ID_PUBLIC] {
            let contract = variant.contract().unwrap();
            assert_eq!(contract.chain.id, 99812);
        }
        assert_eq!(
            SIGNAL_ID_ALLOWLIST.contract().unwrap().address.to_string(),
            "0x400f8432253a7caf458062c4c2632230c83b8e73"
        );
    }

    #[test]
    fn test_success_messages_render_as_success() {
        for variant in [&SIGNAL_ID_ALLOWLIST, &SIGNAL_ID_PUBLIC] {
            assert_eq!(MintStatus::new(variant.success_message).tone, StatusTone::Success);
        }
    }

    #[test]
    fn test_undeployed_collection_has_no_contract() {
        assert_eq!(SIGNAL_ID_PUBLIC.deployed_contract().unwrap(), None);
        let deployed = SIGNAL_ID_ALLOWLIST.deployed_contract().unwrap().unwrap();
        assert_eq!(deployed, SIGNAL_ID_ALLOWLIST.contract().unwrap());

        let broken = MintVariant { contract_address: "0x1234", ..SIGNAL_ID_PUBLIC };
        assert!(broken.deployed_contract().is_err());
    }

    #[test]
    fn test_wallet_options_per_variant() {
        let options = &SIGNAL_ID_ALLOWLIST.wallet_options;
        assert!(!options.show_branding);
        assert_eq!(options.modal_size.css_class(), "connect-modal compact");
        assert_eq!(options.wallets, &[METAMASK]);
        assert_eq!(SIGNAL_ID_PUBLIC.wallet_options.modal_size, ModalSize::Wide);
    }

    #[test]
    fn test_routes_are_distinct() {
        assert_ne!(SIGNAL_ID_ALLOWLIST.route, SIGNAL_ID_PUBLIC.route);
    }
}

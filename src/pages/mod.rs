pub mod mint_page;

pub use mint_page::MintPage;

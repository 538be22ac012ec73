mod connect_button;
mod header;
mod status_banner;

pub use connect_button::ConnectButton;
pub use header::Header;
pub use status_banner::StatusBanner;

pub mod abi;
pub mod allowlist;
pub mod contract;
pub mod network_config;
pub mod rpc_base;
pub mod session;
pub mod status;
pub mod transaction;
pub mod variant;
pub mod wallet;

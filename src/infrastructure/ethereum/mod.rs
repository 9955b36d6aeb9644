//! Ethereum infrastructure - Alloy chain client

mod provider;

pub use provider::{
    create_client, AlloyChainClient, ChainClient, ChainError, ProviderConfig, Receipt,
    WalletAccounts, WalletSource,
};

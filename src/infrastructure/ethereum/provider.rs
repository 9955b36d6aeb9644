//! Chain client abstraction and the Alloy implementation
//!
//! The client pairs a read provider with a signing capability: either
//! accounts managed by the node (`eth_sendTransaction`) or a local key.

use std::path::PathBuf;
use std::time::Duration;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use anyhow::{Context, Result};
use thiserror::Error;

/// JSON-RPC code wallets return when the user declines a request
const USER_REJECTED_CODE: i64 = 4001;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

/// Where transaction signatures come from
#[derive(Clone)]
pub enum WalletSource {
    /// Accounts unlocked on the node (Anvil, Hardhat)
    Node,
    /// Local private key
    PrivateKey(PrivateKeySigner),
}

impl WalletSource {
    /// Parse a hex private key, with or without `0x`
    pub fn from_private_key(key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = key.trim().parse().context("Invalid private key")?;
        Ok(WalletSource::PrivateKey(signer))
    }

    pub fn describe(&self) -> String {
        match self {
            WalletSource::Node => "node accounts".to_string(),
            WalletSource::PrivateKey(signer) => format!("local key {:?}", signer.address()),
        }
    }
}

/// Accounts exposed by the wallet on connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccounts {
    pub accounts: Vec<Address>,
    pub chain_id: u64,
}

/// Mined transaction outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
    pub gas_used: u64,
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            gas_used: receipt.gas_used,
        }
    }
}

/// Failures reported by the chain client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("no wallet account available")]
    NoWallet,

    #[error("request rejected by the wallet")]
    UserRejected,

    /// Execution reverted before broadcast (estimation or call)
    #[error("execution reverted: {message}")]
    Revert {
        data: Option<Bytes>,
        message: String,
    },

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Chain access used by bindings and the lifecycle manager
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// List signer accounts and the chain they are on
    async fn connect(&self) -> Result<WalletAccounts, ChainError>;

    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Read-only call (eth_call)
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Sign and broadcast; the returned hash cannot be recalled
    async fn send(&self, from: Address, to: Address, data: Bytes) -> Result<B256, ChainError>;

    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>, ChainError>;

    /// Poll for the receipt at a fixed interval until it appears
    ///
    /// The transaction is already broadcast, so a failed poll is retried on
    /// the next interval rather than ending the wait.
    async fn wait_for_confirmation(&self, hash: B256, poll: Duration) -> Receipt {
        loop {
            match self.receipt(hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => tracing::trace!(%hash, "receipt not available yet"),
                Err(err) => tracing::debug!(%hash, error = %err, "receipt poll failed, retrying"),
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

/// Chain client over an erased Alloy provider
pub struct AlloyChainClient {
    provider: DynProvider,
    endpoint: String,
    local_signer: Option<Address>,
}

// Builds the transport for a configured builder and erases the filler stack
macro_rules! connect_with {
    ($builder:expr, $config:expr) => {
        match $config {
            ProviderConfig::Http(url) => {
                let rpc_url = url.parse().context("Invalid HTTP URL")?;
                $builder.connect_http(rpc_url).erased()
            }
            ProviderConfig::WebSocket(url) => $builder
                .connect(url)
                .await
                .context("Failed to create WebSocket provider")?
                .erased(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => {
                use alloy::providers::IpcConnect;
                let ipc = IpcConnect::new(path.to_string_lossy().to_string());
                $builder
                    .connect_ipc(ipc)
                    .await
                    .context("Failed to create IPC provider")?
                    .erased()
            }
        }
    };
}

/// Create a chain client from configuration
pub async fn create_client(config: &ProviderConfig, wallet: WalletSource) -> Result<AlloyChainClient> {
    let endpoint = config.display();
    let (provider, local_signer) = match wallet {
        WalletSource::Node => (connect_with!(ProviderBuilder::new(), config), None),
        WalletSource::PrivateKey(signer) => {
            let address = signer.address();
            let builder = ProviderBuilder::new().wallet(EthereumWallet::from(signer));
            (connect_with!(builder, config), Some(address))
        }
    };
    tracing::debug!(%endpoint, local = local_signer.is_some(), "provider created");

    Ok(AlloyChainClient {
        provider,
        endpoint,
        local_signer,
    })
}

#[async_trait::async_trait]
impl ChainClient for AlloyChainClient {
    async fn connect(&self) -> Result<WalletAccounts, ChainError> {
        let accounts = match self.local_signer {
            Some(address) => vec![address],
            None => self.provider.get_accounts().await.map_err(rpc_error)?,
        };
        if accounts.is_empty() {
            return Err(ChainError::NoWallet);
        }
        let chain_id = self.chain_id().await?;
        Ok(WalletAccounts { accounts, chain_id })
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider.get_chain_id().await.map_err(rpc_error)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.provider
            .call(request)
            .await
            .map_err(|err| classify(&err).unwrap_or_else(|| rpc_error(err)))
    }

    async fn send(&self, from: Address, to: Address, data: Bytes) -> Result<B256, ChainError> {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data);
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|err| classify(&err).unwrap_or_else(|| ChainError::Submission(err.to_string())))?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(rpc_error)?;
        Ok(receipt.as_ref().map(Receipt::from))
    }

    fn endpoint_name(&self) -> String {
        self.endpoint.clone()
    }
}

fn rpc_error(err: TransportError) -> ChainError {
    ChainError::Rpc(err.to_string())
}

/// Recognise wallet rejections and execution reverts in an RPC error
fn classify(err: &TransportError) -> Option<ChainError> {
    let payload = err.as_error_resp()?;
    let message = payload.message.to_string();
    let lower = message.to_lowercase();

    if payload.code == USER_REJECTED_CODE
        || lower.contains("user rejected")
        || lower.contains("user denied")
    {
        return Some(ChainError::UserRejected);
    }
    if let Some(data) = payload.as_revert_data() {
        return Some(ChainError::Revert {
            data: Some(data),
            message,
        });
    }
    if lower.contains("revert") {
        return Some(ChainError::Revert { data: None, message });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::transports::RpcError;

    fn error_response(code: i64, message: &str, data: Option<&str>) -> TransportError {
        let json = match data {
            Some(data) => format!(r#"{{"code":{code},"message":"{message}","data":"{data}"}}"#),
            None => format!(r#"{{"code":{code},"message":"{message}"}}"#),
        };
        let payload: ErrorPayload = serde_json::from_str(&json).unwrap();
        RpcError::ErrorResp(payload)
    }

    #[test]
    fn test_classify_user_rejection() {
        let err = error_response(4001, "User rejected the request.", None);
        assert_eq!(classify(&err), Some(ChainError::UserRejected));

        let err = error_response(-32000, "MetaMask Tx Signature: User denied transaction signature.", None);
        assert_eq!(classify(&err), Some(ChainError::UserRejected));
    }

    #[test]
    fn test_classify_revert_with_data() {
        let err = error_response(3, "execution reverted", Some("0xdeadbeef"));
        match classify(&err) {
            Some(ChainError::Revert { data, .. }) => {
                assert_eq!(data, Some(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_other_errors() {
        let err = error_response(-32000, "nonce too low", None);
        assert_eq!(classify(&err), None);
    }

    #[test]
    fn test_wallet_source_from_key() {
        // Anvil default account 0
        let source = WalletSource::from_private_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        match source {
            WalletSource::PrivateKey(signer) => assert_eq!(
                signer.address(),
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
            ),
            WalletSource::Node => panic!("expected local key"),
        }
        assert!(WalletSource::from_private_key("not-a-key").is_err());
    }
}

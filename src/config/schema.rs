//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML config files.
//! Every field has a default so an empty file is a valid devnet setup.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::LAMPORTS_PER_SOL;

/// Root configuration for the wallet client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Solana RPC endpoint settings.
    pub network: NetworkConfig,

    /// Identity provider relay settings.
    pub identity: IdentityConfig,

    /// Test-network funding.
    pub airdrop: AirdropConfig,

    /// Explorer used for transaction links.
    pub explorer: ExplorerConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Solana cluster the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Localnet => "localnet",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Cluster::Devnet, Cluster::Testnet, Cluster::MainnetBeta, Cluster::Localnet]
            .into_iter()
            .find(|c| c.as_str() == name.trim())
    }

    /// Explorer `cluster` query value. Mainnet has none.
    pub fn explorer_param(&self) -> Option<&'static str> {
        match self {
            Cluster::Devnet => Some("devnet"),
            Cluster::Testnet => Some("testnet"),
            Cluster::MainnetBeta => None,
            Cluster::Localnet => Some("custom"),
        }
    }

    /// Only test clusters run a faucet.
    pub fn supports_airdrop(&self) -> bool {
        !matches!(self, Cluster::MainnetBeta)
    }
}

/// Network RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover endpoints, used for reads only.
    pub failover_urls: Vec<String>,

    /// Cluster the endpoints belong to.
    pub cluster: Cluster,

    /// Commitment level for reads and confirmation ("processed", "confirmed", "finalized").
    pub commitment: String,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// How long to wait for an airdrop to confirm.
    pub confirmation_timeout_secs: u64,

    /// Interval between signature status polls in milliseconds.
    pub confirmation_poll_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            failover_urls: Vec::new(),
            cluster: Cluster::Devnet,
            commitment: "confirmed".to_string(),
            rpc_timeout_secs: 10,
            confirmation_timeout_secs: 60,
            confirmation_poll_ms: 1000,
        }
    }
}

/// Identity provider relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the provider relay.
    pub api_url: String,

    /// Publishable API key identifying this application to the provider.
    pub publishable_key: String,

    /// Timeout for short calls (session, metadata, logout). Login and
    /// signing wait on the provider's own deadline.
    pub request_timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8787".to_string(),
            publishable_key: String::new(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AirdropConfig {
    /// Lamports requested per airdrop.
    pub amount_lamports: u64,
}

impl Default for AirdropConfig {
    fn default() -> Self {
        Self {
            amount_lamports: LAMPORTS_PER_SOL,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub base_url: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://explorer.solana.com".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

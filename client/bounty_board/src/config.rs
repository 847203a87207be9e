//! Network table and application configuration loaded from environment variables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::address::Address;
use crate::errors::{BoardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }
}

impl FromStr for Network {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(BoardError::Config(format!("Unknown network: {other}"))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment coordinates for one network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    /// Fullnode JSON-RPC endpoint
    pub rpc_url: String,
    /// Published bounty board package
    pub package_id: Option<Address>,
    /// Shared profile portal object
    pub portal_id: Option<Address>,
}

const DEVNET_PACKAGE: &str = "0xa7ee778a8c7e656adcd03db015c6fe4488276cf614c07989766e636c13286039";
const DEVNET_PORTAL: &str = "0x2ef24b51a85c8d9e30a68ff1a2e0488d556dbabb53ffe9cfabf9656abc42bf87";
const TESTNET_PACKAGE: &str = "0xd3a2cb3f1df0cd8ce4570d1fb122f10ce68434a95304830dca86d0711f2c597a";
const TESTNET_PORTAL: &str = "0x5f11507ec60701ca8f704fd0f54dbd5e4301cb1be735c4cb025977fab50dae93";

impl NetworkConfig {
    /// Static deployment table. Mainnet has an endpoint but no deployment.
    pub fn for_network(network: Network) -> Self {
        let (package, portal) = match network {
            Network::Devnet => (Some(DEVNET_PACKAGE), Some(DEVNET_PORTAL)),
            Network::Testnet => (Some(TESTNET_PACKAGE), Some(TESTNET_PORTAL)),
            Network::Mainnet => (None, None),
        };
        NetworkConfig {
            network,
            rpc_url: format!("https://fullnode.{network}.sui.io:443"),
            package_id: package.and_then(|p| Address::parse(p).ok()),
            portal_id: portal.and_then(|p| Address::parse(p).ok()),
        }
    }

    pub fn require_package(&self) -> Result<Address> {
        self.package_id.ok_or_else(|| {
            BoardError::Config(format!("No bounty board package deployed on {}", self.network))
        })
    }

    pub fn require_portal(&self) -> Result<Address> {
        self.portal_id.ok_or_else(|| {
            BoardError::Config(format!("No profile portal deployed on {}", self.network))
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: NetworkConfig,
    /// Port for the gateway HTTP API
    pub api_port: u16,
    /// Page size used when following list cursors
    pub page_limit: u32,
    /// Maximum in-flight item fetches during a collection fetch
    pub fetch_concurrency: usize,
    /// Deadline applied to every individual remote call
    pub request_timeout: Duration,
    /// Interval between finality checks after submission
    pub finality_poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let network: Network = env_var("NETWORK")
            .unwrap_or_else(|_| "devnet".to_string())
            .parse()?;

        let mut network_config = NetworkConfig::for_network(network);
        if let Ok(url) = env_var("RPC_URL") {
            network_config.rpc_url = url;
        }
        if let Ok(id) = env_var("PACKAGE_ID") {
            network_config.package_id = Some(
                Address::parse(&id)
                    .map_err(|_| BoardError::Config("Invalid PACKAGE_ID".to_string()))?,
            );
        }
        if let Ok(id) = env_var("PORTAL_ID") {
            network_config.portal_id = Some(
                Address::parse(&id)
                    .map_err(|_| BoardError::Config("Invalid PORTAL_ID".to_string()))?,
            );
        }

        let fetch_concurrency: usize = parsed_var("FETCH_CONCURRENCY", "8")?;
        if fetch_concurrency == 0 {
            return Err(BoardError::Config(
                "FETCH_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            network: network_config,
            api_port: parsed_var("API_PORT", "3002")?,
            page_limit: parsed_var("PAGE_LIMIT", "50")?,
            fetch_concurrency,
            request_timeout: Duration::from_secs(parsed_var("REQUEST_TIMEOUT_SECS", "30")?),
            finality_poll_interval: Duration::from_millis(parsed_var("FINALITY_POLL_MS", "500")?),
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| BoardError::Config(format!("Missing env var: {key}")))
}

fn parsed_var<T: FromStr>(key: &str, default: &str) -> Result<T> {
    env_var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| BoardError::Config(format!("Invalid {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names_round_trip() {
        for n in [Network::Devnet, Network::Testnet, Network::Mainnet] {
            assert_eq!(n.as_str().parse::<Network>().unwrap(), n);
        }
        assert!(matches!(
            "localnet".parse::<Network>(),
            Err(BoardError::Config(_))
        ));
    }

    #[test]
    fn devnet_table_has_deployment() {
        let cfg = NetworkConfig::for_network(Network::Devnet);
        assert_eq!(cfg.rpc_url, "https://fullnode.devnet.sui.io:443");
        assert_eq!(cfg.require_package().unwrap().to_string(), DEVNET_PACKAGE);
        assert_eq!(cfg.require_portal().unwrap().to_string(), DEVNET_PORTAL);
    }

    #[test]
    fn mainnet_has_no_deployment() {
        let cfg = NetworkConfig::for_network(Network::Mainnet);
        assert!(matches!(cfg.require_package(), Err(BoardError::Config(_))));
        assert!(matches!(cfg.require_portal(), Err(BoardError::Config(_))));
    }
}

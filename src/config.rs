/*!
Bridge configuration

Paired node/indexer endpoints per chain, signing keys, monitor cadence and
mint parameters, loaded from a TOML or JSON file and validated for
completeness before the bridge starts.
*/

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Chain API endpoints
    pub chains: ChainEndpoints,

    /// Hex-encoded 32-byte signing key seeds per chain
    pub keys: SigningKeys,

    /// Transaction monitor settings
    pub monitor: MonitorConfig,

    /// Destination-chain mint settings
    pub mint: MintConfig,
}

/// Node and indexer endpoints for both chains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEndpoints {
    pub algorand: ChainServices,
    pub voi: ChainServices,
}

/// Paired service endpoints for one chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainServices {
    pub algod: ServiceEndpoint,
    pub indexer: ServiceEndpoint,
}

/// A single chain-query service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub url: String,
    pub token: String,
}

/// Custodial signing key material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningKeys {
    pub algorand: String,
    pub voi: String,
}

/// Transaction monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between fetch cycles
    pub poll_interval_secs: u64,
    /// Anti-spam floor for deposits, in micro-units
    pub min_deposit: u64,
    /// Capacity of the monitor -> engine queue
    pub queue_capacity: usize,
}

/// Destination-chain mint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    /// ARC-72 application id on the destination chain
    pub app_id: u64,
    /// Funding payment paired with each mint call, in micro-units
    pub funding_amount: u64,
    /// Origin-chain identifier passed to mintTo
    pub origin_chain_id: u64,
    /// Seconds between confirmation-status polls
    pub confirmation_poll_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            min_deposit: 200_000, // 0.2 native units
            queue_capacity: 1000,
        }
    }
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            app_id: 26_169_081,
            funding_amount: 249_300 * 2,
            origin_chain_id: 1,
            confirmation_poll_secs: 5,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl MintConfig {
    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_secs(self.confirmation_poll_secs)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            chains: ChainEndpoints {
                algorand: ChainServices {
                    algod: ServiceEndpoint {
                        url: "http://localhost:4001".to_string(),
                        token: String::new(),
                    },
                    indexer: ServiceEndpoint {
                        url: "http://localhost:8980".to_string(),
                        token: String::new(),
                    },
                },
                voi: ChainServices {
                    algod: ServiceEndpoint {
                        url: "http://localhost:4011".to_string(),
                        token: String::new(),
                    },
                    indexer: ServiceEndpoint {
                        url: "http://localhost:8981".to_string(),
                        token: String::new(),
                    },
                },
            },
            keys: SigningKeys {
                algorand: String::new(),
                voi: String::new(),
            },
            monitor: MonitorConfig::default(),
            mint: MintConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML or JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;

        let config: BridgeConfig = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&content)
                .map_err(|e| BridgeError::config(format!("invalid TOML config: {e}")))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| BridgeError::config(format!("invalid JSON config: {e}")))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for completeness
    pub fn validate(&self) -> Result<()> {
        let endpoints = [
            ("algorand.algod", &self.chains.algorand.algod),
            ("algorand.indexer", &self.chains.algorand.indexer),
            ("voi.algod", &self.chains.voi.algod),
            ("voi.indexer", &self.chains.voi.indexer),
        ];
        for (name, ep) in endpoints {
            if ep.url.is_empty() {
                return Err(BridgeError::config(format!("incomplete {name} config: missing url")));
            }
            if ep.token.is_empty() {
                return Err(BridgeError::config(format!("incomplete {name} config: missing token")));
            }
        }

        for (name, key) in [("algorand", &self.keys.algorand), ("voi", &self.keys.voi)] {
            if key.is_empty() {
                return Err(BridgeError::config(format!("missing {name} signing key")));
            }
            let bytes = hex::decode(key)
                .map_err(|_| BridgeError::config(format!("{name} signing key is not valid hex")))?;
            if bytes.len() != 32 {
                return Err(BridgeError::config(format!(
                    "{name} signing key must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
        }

        if self.monitor.queue_capacity == 0 {
            return Err(BridgeError::config("monitor queue capacity must be greater than 0"));
        }
        if self.monitor.poll_interval_secs == 0 {
            return Err(BridgeError::config("monitor poll interval must be greater than 0"));
        }
        if self.mint.app_id == 0 {
            return Err(BridgeError::config("mint app id must be set"));
        }

        Ok(())
    }

    /// Decode the 32-byte signing seed for a chain
    pub fn signing_seed(&self, key: &str) -> Result<[u8; 32]> {
        let bytes =
            hex::decode(key).map_err(|_| BridgeError::config("signing key is not valid hex"))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| BridgeError::config("signing key must be 32 bytes"))?;
        Ok(seed)
    }
}

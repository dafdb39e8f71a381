/*!
# ArcBridge - Cross-Chain NFT Bridge Oracle

Bridges non-fungible tokens from Algorand to Voi: a transaction monitor
watches a custodial account for deposit instructions, and a settlement engine
custodies the source asset and mints an ARC-72 representation on the
destination chain through a two-phase simulate-then-submit protocol.

## Architecture

```text
┌──────────────┐  indexer poll   ┌──────────────┐
│ Algorand     │ --------------> │ Transaction  │
│ (source)     │                 │ Monitor      │
└──────────────┘                 └──────┬───────┘
                                        │ bounded queue
┌──────────────┐  simulate/mint  ┌──────▼───────┐
│ Voi          │ <-------------- │ Settlement   │
│ (destination)│                 │ Engine       │
└──────────────┘                 └──────┬───────┘
                                        │
                                 ┌──────▼───────┐
                                 │ Bridge Ledger│
                                 │ Expect ->    │
                                 │ Prepared ->  │
                                 │ Received ->  │
                                 │ Sent         │
                                 └──────────────┘
```

## Quick Start

```rust,no_run
use arcbridge::config::BridgeConfig;

#[tokio::main]
async fn main() -> arcbridge::Result<()> {
    arcbridge::init();
    let config = BridgeConfig::load("bridge.toml").await?;
    // wire up gateways, ledger, monitor and engine; see the binary
    let _ = config;
    Ok(())
}
```
*/

#![warn(rust_2018_idioms)]

pub use error::{BridgeError, Result};
pub use ledger::{BridgeLedger, BridgeState, BridgingRecord, LedgerStore};
pub use spec::NftSpec;
pub use types::{Address, AssetId, Chain};

pub mod abi;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod monitor;
pub mod note;
pub mod spec;
pub mod txn;
pub mod types;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with the default filter
pub fn init() {
    init_with_tracing("info")
}

/// Initialize tracing with a custom filter, `RUST_LOG` taking precedence
pub fn init_with_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("arcbridge initialized with tracing filter: {}", filter);
}

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get the library name
pub fn name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

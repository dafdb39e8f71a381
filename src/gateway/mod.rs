/*!
Chain query gateway

Read and write access to a chain through its paired node and indexer
services. The core only sees the [`ChainReader`] and [`ChainWriter`] traits;
the single production implementation is the HTTP gateway in [`http`].
*/

use crate::error::GatewayError;
use crate::txn::{BoxRef, TxnParams, UnsignedTransaction};
use crate::types::{Address, AssetId};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use std::fmt;

pub mod http;

pub use http::HttpGateway;

/// Transaction type tag as reported by the indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TxnType {
    #[serde(rename = "pay")]
    Payment,
    #[serde(rename = "axfer")]
    AssetTransfer,
    #[serde(other)]
    Other,
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnType::Payment => write!(f, "pay"),
            TxnType::AssetTransfer => write!(f, "axfer"),
            TxnType::Other => write!(f, "other"),
        }
    }
}

/// Payment-specific fields
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDetails {
    pub amount: u64,
    pub receiver: String,
}

/// Asset-transfer-specific fields
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetTransferDetails {
    pub asset_id: AssetId,
    pub amount: u64,
    pub receiver: String,
}

/// One historical transaction from the indexer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainTransaction {
    pub id: String,
    pub sender: String,
    pub tx_type: TxnType,
    #[serde(default)]
    pub confirmed_round: Option<u64>,
    /// Free-form memo, base64 as on the wire
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub payment_transaction: Option<PaymentDetails>,
    #[serde(default)]
    pub asset_transfer_transaction: Option<AssetTransferDetails>,
}

impl ChainTransaction {
    /// Decoded memo bytes; empty when absent or not valid base64
    pub fn note_bytes(&self) -> Vec<u8> {
        self.note
            .as_deref()
            .and_then(|n| BASE64.decode(n).ok())
            .unwrap_or_default()
    }
}

/// A page of search results with the service's cursor position
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransactionPage {
    pub current_round: u64,
    #[serde(default)]
    pub transactions: Vec<ChainTransaction>,
}

/// One asset position held by an account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetHolding {
    pub asset_id: AssetId,
    pub amount: u64,
}

/// Account state snapshot
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfo {
    pub amount: u64,
    #[serde(default)]
    pub assets: Vec<AssetHolding>,
}

impl AccountInfo {
    /// Holding of the given asset, if the account has opted in
    pub fn holding(&self, asset_id: AssetId) -> Option<&AssetHolding> {
        self.assets.iter().find(|h| h.asset_id == asset_id)
    }
}

/// Registered parameters of an asset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetParams {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reserve: Option<String>,
}

/// Pending/confirmed status of a submitted transaction
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingInfo {
    #[serde(default)]
    pub confirmed_round: Option<u64>,
    #[serde(default)]
    pub pool_error: Option<String>,
}

impl PendingInfo {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.is_some_and(|r| r > 0)
    }
}

/// Outcome of a dry-run execution of a transaction group
#[derive(Debug, Clone, Default)]
pub struct SimulateOutcome {
    /// Non-empty when the group would fail on chain
    pub failure_message: Option<String>,
    /// Application logs in execution order
    pub logs: Vec<Vec<u8>>,
    /// Box references the group touched without declaring
    pub unnamed_boxes: Vec<BoxRef>,
}

impl SimulateOutcome {
    /// Failure message if the dry run reported one
    pub fn failure(&self) -> Option<&str> {
        self.failure_message.as_deref().filter(|m| !m.is_empty())
    }
}

/// Read access to account state, asset metadata and transaction history
#[async_trait]
pub trait ChainReader: Send + Sync + 'static {
    /// Fetch balances and asset holdings of an account
    async fn account_info(&self, address: &Address) -> Result<AccountInfo, GatewayError>;

    /// Fetch the registered parameters of an asset
    async fn asset_params(&self, asset_id: AssetId) -> Result<AssetParams, GatewayError>;

    /// Search transactions addressed to `address` from `min_round` onwards
    async fn search_transactions(
        &self,
        address: &Address,
        min_round: u64,
    ) -> Result<TransactionPage, GatewayError>;

    /// Confirmation status of a submitted transaction
    async fn transaction_status(&self, txid: &str) -> Result<PendingInfo, GatewayError>;
}

/// Transaction submission and dry-run execution
#[async_trait]
pub trait ChainWriter: Send + Sync + 'static {
    /// Current suggested transaction parameters
    async fn suggested_params(&self) -> Result<TxnParams, GatewayError>;

    /// Broadcast an encoded signed transaction group, returning its id
    async fn submit(&self, signed: &[u8]) -> Result<String, GatewayError>;

    /// Execute a group as a dry run without broadcasting
    async fn simulate(
        &self,
        group: &[UnsignedTransaction],
    ) -> Result<SimulateOutcome, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_page_decoding() {
        let body = r#"{
            "current-round": 1200,
            "transactions": [{
                "id": "TXID1",
                "sender": "SENDER",
                "tx-type": "pay",
                "confirmed-round": 1100,
                "note": "eyJhc3NldElkIjo0Mn0=",
                "payment-transaction": {"amount": 200000, "receiver": "RCV"}
            }, {
                "id": "TXID2",
                "sender": "SENDER",
                "tx-type": "appl"
            }]
        }"#;
        let page: TransactionPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.current_round, 1200);
        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.transactions[0].tx_type, TxnType::Payment);
        assert_eq!(page.transactions[0].note_bytes(), br#"{"assetId":42}"#);
        assert_eq!(page.transactions[1].tx_type, TxnType::Other);
        assert!(page.transactions[1].note_bytes().is_empty());
    }

    #[test]
    fn test_account_holding_lookup() {
        let body = r#"{"amount": 1000000, "assets": [{"asset-id": 42, "amount": 1}]}"#;
        let info: AccountInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.holding(42).unwrap().amount, 1);
        assert!(info.holding(7).is_none());
    }

    #[test]
    fn test_pending_confirmation() {
        assert!(!PendingInfo::default().is_confirmed());
        let confirmed = PendingInfo {
            confirmed_round: Some(900),
            pool_error: None,
        };
        assert!(confirmed.is_confirmed());
    }

    #[test]
    fn test_simulate_failure_filtering() {
        let mut outcome = SimulateOutcome::default();
        assert!(outcome.failure().is_none());
        outcome.failure_message = Some(String::new());
        assert!(outcome.failure().is_none());
        outcome.failure_message = Some("logic eval error".to_string());
        assert_eq!(outcome.failure(), Some("logic eval error"));
    }
}

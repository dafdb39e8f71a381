/*!
HTTP gateway over a chain's node and indexer REST services

A thin wrapper: request shaping and response decoding only. Account state,
asset metadata, submission, simulation and status come from the node;
historical search comes from the indexer.
*/

use super::{
    AccountInfo, AssetParams, ChainReader, ChainWriter, PendingInfo, SimulateOutcome,
    TransactionPage,
};
use crate::config::ChainServices;
use crate::error::GatewayError;
use crate::txn::{BoxRef, TxnParams, UnsignedTransaction};
use crate::types::{Address, AssetId};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Gateway to one chain, backed by its algod and indexer endpoints
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    algod_url: String,
    algod_token: String,
    indexer_url: String,
    indexer_token: String,
}

impl HttpGateway {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            client: reqwest::Client::new(),
            algod_url: services.algod.url.trim_end_matches('/').to_string(),
            algod_token: services.algod.token.clone(),
            indexer_url: services.indexer.url.trim_end_matches('/').to_string(),
            indexer_token: services.indexer.token.clone(),
        }
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: String,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn get_algod<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let endpoint = format!("{}{path}", self.algod_url);
        let response = self
            .client
            .get(&endpoint)
            .header(TOKEN_HEADER, &self.algod_token)
            .send()
            .await?;
        Self::decode(endpoint, response).await
    }

    async fn get_indexer<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let endpoint = format!("{}{path}", self.indexer_url);
        let response = self
            .client
            .get(&endpoint)
            .header(TOKEN_HEADER, &self.indexer_token)
            .send()
            .await?;
        Self::decode(endpoint, response).await
    }
}

/// `GET /v2/assets/{id}` wraps the params in an envelope
#[derive(Deserialize)]
struct AssetInfoResponse {
    params: AssetParams,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct SimulateRequest<'a> {
    allow_empty_signatures: bool,
    allow_unnamed_resources: bool,
    txn_groups: Vec<SimulateRequestGroup<'a>>,
}

#[derive(Serialize)]
struct SimulateRequestGroup<'a> {
    txns: &'a [UnsignedTransaction],
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SimulateResponse {
    txn_groups: Vec<SimulateResponseGroup>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SimulateResponseGroup {
    #[serde(default)]
    failure_message: Option<String>,
    #[serde(default)]
    txn_results: Vec<SimulateTxnResultWrapper>,
    #[serde(default)]
    unnamed_resources_accessed: Option<UnnamedResources>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SimulateTxnResultWrapper {
    txn_result: SimulateTxnResult,
}

#[derive(Deserialize)]
struct SimulateTxnResult {
    #[serde(default)]
    logs: Vec<String>,
}

#[derive(Deserialize)]
struct UnnamedResources {
    #[serde(default)]
    boxes: Vec<UnnamedBox>,
}

#[derive(Deserialize)]
struct UnnamedBox {
    app: u64,
    name: String,
}

impl SimulateResponse {
    fn into_outcome(self) -> Result<SimulateOutcome, GatewayError> {
        let Some(group) = self.txn_groups.into_iter().next() else {
            return Ok(SimulateOutcome::default());
        };
        let mut logs = Vec::new();
        for result in &group.txn_results {
            for log in &result.txn_result.logs {
                let decoded = BASE64
                    .decode(log)
                    .map_err(|e| GatewayError::Encoding(format!("simulate log: {e}")))?;
                logs.push(decoded);
            }
        }
        let unnamed_boxes = group
            .unnamed_resources_accessed
            .map(|r| {
                r.boxes
                    .into_iter()
                    .map(|b| {
                        Ok(BoxRef {
                            app_id: b.app,
                            name: BASE64
                                .decode(&b.name)
                                .map_err(|e| GatewayError::Encoding(format!("box name: {e}")))?,
                        })
                    })
                    .collect::<Result<Vec<_>, GatewayError>>()
            })
            .transpose()?
            .unwrap_or_default();
        Ok(SimulateOutcome {
            failure_message: group.failure_message,
            logs,
            unnamed_boxes,
        })
    }
}

#[async_trait]
impl ChainReader for HttpGateway {
    async fn account_info(&self, address: &Address) -> Result<AccountInfo, GatewayError> {
        self.get_algod(&format!("/v2/accounts/{address}")).await
    }

    async fn asset_params(&self, asset_id: AssetId) -> Result<AssetParams, GatewayError> {
        let info: AssetInfoResponse = self.get_algod(&format!("/v2/assets/{asset_id}")).await?;
        Ok(info.params)
    }

    async fn search_transactions(
        &self,
        address: &Address,
        min_round: u64,
    ) -> Result<TransactionPage, GatewayError> {
        self.get_indexer(&format!(
            "/v2/transactions?address={address}&min-round={min_round}"
        ))
        .await
    }

    async fn transaction_status(&self, txid: &str) -> Result<PendingInfo, GatewayError> {
        self.get_algod(&format!("/v2/transactions/pending/{txid}"))
            .await
    }
}

#[async_trait]
impl ChainWriter for HttpGateway {
    async fn suggested_params(&self) -> Result<TxnParams, GatewayError> {
        self.get_algod("/v2/transactions/params").await
    }

    async fn submit(&self, signed: &[u8]) -> Result<String, GatewayError> {
        let endpoint = format!("{}/v2/transactions", self.algod_url);
        let response = self
            .client
            .post(&endpoint)
            .header(TOKEN_HEADER, &self.algod_token)
            .header("Content-Type", "application/x-binary")
            .body(signed.to_vec())
            .send()
            .await?;
        let submitted: SubmitResponse = Self::decode(endpoint, response).await?;
        Ok(submitted.tx_id)
    }

    async fn simulate(
        &self,
        group: &[UnsignedTransaction],
    ) -> Result<SimulateOutcome, GatewayError> {
        let endpoint = format!("{}/v2/transactions/simulate", self.algod_url);
        let request = SimulateRequest {
            allow_empty_signatures: true,
            allow_unnamed_resources: true,
            txn_groups: vec![SimulateRequestGroup { txns: group }],
        };
        let response = self
            .client
            .post(&endpoint)
            .header(TOKEN_HEADER, &self.algod_token)
            .json(&request)
            .send()
            .await?;
        let decoded: SimulateResponse = Self::decode(endpoint, response).await?;
        decoded.into_outcome()
    }
}

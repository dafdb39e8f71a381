/*!
Settlement engine

Consumes candidate transactions from the monitor queue and drives each asset
through the bridging state machine: record creation on a deposit instruction,
custody opt-in on the source chain, receipt confirmation, and finally an
atomic funding-plus-mint group on the destination chain. Minting is two-phase:
a dry run discovers the box resources the application touches, the group is
rebuilt with those declared, then both legs are signed and broadcast together.

Per-item failures never unwind the loop; the record is left where it was and
the next deposit or custody transfer for the asset re-triggers processing.
*/

use crate::abi;
use crate::config::MintConfig;
use crate::error::{BridgeError, ProtocolError, Result};
use crate::gateway::{ChainReader, ChainTransaction, ChainWriter, TxnType};
use crate::ledger::{BridgeState, BridgingRecord, LedgerStore};
use crate::note;
use crate::spec;
use crate::txn::{self, BoxRef, TxnSigner, UnsignedTransaction};
use crate::types::{Address, AssetId, Chain};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives bridging records to their terminal state
pub struct SettlementEngine<SC, DC> {
    source: Arc<SC>,
    destination: Arc<DC>,
    ledger: Arc<dyn LedgerStore>,
    source_signer: Arc<dyn TxnSigner>,
    destination_signer: Arc<dyn TxnSigner>,
    mint: MintConfig,
    confirmation_poll: Duration,
    queue: mpsc::Receiver<ChainTransaction>,
    cancel: CancellationToken,
}

impl<SC, DC> SettlementEngine<SC, DC>
where
    SC: ChainReader + ChainWriter,
    DC: ChainWriter,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<SC>,
        destination: Arc<DC>,
        ledger: Arc<dyn LedgerStore>,
        source_signer: Arc<dyn TxnSigner>,
        destination_signer: Arc<dyn TxnSigner>,
        mint: MintConfig,
        queue: mpsc::Receiver<ChainTransaction>,
        cancel: CancellationToken,
    ) -> Self {
        let confirmation_poll = Duration::from_secs(mint.confirmation_poll_secs);
        Self {
            source,
            destination,
            ledger,
            source_signer,
            destination_signer,
            mint,
            confirmation_poll,
            queue,
            cancel,
        }
    }

    /// Run until the queue closes or cancellation is requested
    ///
    /// Items already buffered when cancellation fires are still processed.
    #[tracing::instrument(name = "settlement", skip_all)]
    pub async fn run(mut self) {
        info!(app_id = self.mint.app_id, "settlement engine started");
        loop {
            tokio::select! {
                biased;
                item = self.queue.recv() => match item {
                    Some(candidate) => self.handle(candidate).await,
                    None => break,
                },
                _ = self.cancel.cancelled() => {
                    while let Ok(candidate) = self.queue.try_recv() {
                        self.handle(candidate).await;
                    }
                    break;
                }
            }
        }
        info!("settlement engine stopped");
    }

    /// Dispatch one candidate; errors stay contained here
    async fn handle(&self, candidate: ChainTransaction) {
        let txid = candidate.id.clone();
        let result = match candidate.tx_type {
            TxnType::Payment => self.handle_deposit(candidate).await,
            TxnType::AssetTransfer => self.handle_custody_transfer(candidate).await,
            TxnType::Other => {
                debug!(txid = %txid, "ignoring unsupported transaction type");
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(
                txid = %txid,
                category = e.category(),
                retryable = e.is_retryable(),
                error = %e,
                "settlement step failed"
            );
        }
    }

    /// A deposit instruction: create the record and start processing
    async fn handle_deposit(&self, candidate: ChainTransaction) -> Result<()> {
        let instruction = note::decode_instruction(&candidate.note_bytes())?;
        let asset_id = instruction.asset_id;

        if let Some(existing) = self.ledger.get(asset_id) {
            if existing.state.is_terminal() {
                info!(asset_id, "asset already settled, ignoring duplicate deposit");
            } else {
                warn!(
                    asset_id,
                    state = %existing.state,
                    "asset already being bridged, ignoring duplicate deposit"
                );
            }
            return Ok(());
        }

        let params = self.source.asset_params(asset_id).await?;
        let reserve = match params.reserve.as_deref() {
            Some(encoded) => encoded
                .parse::<Address>()
                .map_err(crate::error::NoteError::InvalidAddress)?,
            None => Address::ZERO,
        };
        let url = params.url.unwrap_or_default();
        let name = params.name.unwrap_or_default();
        let (detected, asset_url) = spec::classify(asset_id, &url, &name, &reserve)?;

        let record = BridgingRecord::new(
            Chain::Algorand,
            instruction.to,
            asset_id,
            candidate.sender,
            detected,
            asset_url,
            candidate.id,
        );
        self.ledger.put_if_absent(record.clone())?;
        info!(asset_id, spec = %detected, "tracking new bridged asset");

        self.process_record(record).await
    }

    /// A custody transfer: advance the existing record, if any
    async fn handle_custody_transfer(&self, candidate: ChainTransaction) -> Result<()> {
        let Some(transfer) = candidate.asset_transfer_transaction else {
            debug!(txid = %candidate.id, "custody transfer without transfer fields");
            return Ok(());
        };
        match self.ledger.get(transfer.asset_id) {
            Some(record) => self.process_record(record).await,
            None => {
                info!(
                    asset_id = transfer.asset_id,
                    txid = %candidate.id,
                    "custody transfer for untracked asset, dropping"
                );
                Ok(())
            }
        }
    }

    /// Advance one record as far as the observed chain state allows
    async fn process_record(&self, mut record: BridgingRecord) -> Result<()> {
        if record.state.is_terminal() {
            info!(asset_id = record.asset_id, "asset already settled, nothing to do");
            return Ok(());
        }

        let custodial = self.source_signer.address();
        let account = self.source.account_info(&custodial).await?;
        let holding = account.holding(record.asset_id).cloned();

        let Some(holding) = holding else {
            // not yet opted in: opt in, confirm, and wait for the custody
            // transfer to re-trigger processing
            let txid = self.opt_in(record.asset_id, &custodial).await?;
            info!(asset_id = record.asset_id, txid = %txid, "custody opt-in confirmed");
            self.advance(&mut record, BridgeState::Prepared)?;
            return Ok(());
        };

        if record.state < BridgeState::Prepared {
            self.advance(&mut record, BridgeState::Prepared)?;
        }
        if holding.amount >= 1 && record.state < BridgeState::Received {
            self.advance(&mut record, BridgeState::Received)?;
        }

        if record.state == BridgeState::Received {
            if self.nft_exists(record.asset_id).await? {
                info!(
                    asset_id = record.asset_id,
                    "representation already exists on destination chain"
                );
            } else {
                let txid = self.mint(&record).await?;
                info!(
                    asset_id = record.asset_id,
                    txid = %txid,
                    destination = %record.destination,
                    "minted destination representation"
                );
            }
            self.advance(&mut record, BridgeState::Sent)?;
        }
        Ok(())
    }

    /// Record a forward transition in the ledger
    fn advance(&self, record: &mut BridgingRecord, to: BridgeState) -> Result<()> {
        let from = record.state;
        *record = self.ledger.update(record.asset_id, &mut |r| r.state = to)?;
        info!(asset_id = record.asset_id, from = %from, to = %to, "state transition");
        Ok(())
    }

    /// Opt the custodial account into the asset and wait for confirmation
    async fn opt_in(&self, asset_id: AssetId, custodial: &Address) -> Result<String> {
        let params = self.source.suggested_params().await?;
        let opt_in = UnsignedTransaction::asset_opt_in(*custodial, asset_id, &params);
        let blob = self.source_signer.sign(&opt_in)?;
        let txid = self.source.submit(&blob).await?;
        debug!(asset_id, txid = %txid, "opt-in submitted");
        self.wait_for_confirmation(&txid).await?;
        Ok(txid)
    }

    /// Poll the source chain until the transaction confirms
    async fn wait_for_confirmation(&self, txid: &str) -> Result<u64> {
        loop {
            let status = self.source.transaction_status(txid).await?;
            if let Some(pool_error) = status.pool_error.filter(|e| !e.is_empty()) {
                return Err(BridgeError::internal(format!(
                    "transaction {txid} rejected by pool: {pool_error}"
                )));
            }
            if let Some(round) = status.confirmed_round.filter(|r| *r > 0) {
                return Ok(round);
            }
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(BridgeError::internal(format!(
                        "shutdown requested while awaiting confirmation of {txid}"
                    )));
                }
                _ = tokio::time::sleep(self.confirmation_poll) => {}
            }
        }
    }

    /// Dry-run the ownership query and decode the returned owner
    async fn nft_exists(&self, asset_id: AssetId) -> Result<bool> {
        let params = self.destination.suggested_params().await?;
        let args = vec![
            abi::method_selector(abi::OWNER_OF_SIGNATURE).to_vec(),
            abi::encode_uint256(asset_id).to_vec(),
        ];
        let call = UnsignedTransaction::app_call(
            self.destination_signer.address(),
            self.mint.app_id,
            args,
            Vec::new(),
            &params,
        );
        let outcome = self.destination.simulate(&[call]).await?;
        if let Some(message) = outcome.failure() {
            return Err(ProtocolError::SimulateFailed(message.to_string()).into());
        }
        let log = outcome
            .logs
            .first()
            .ok_or(ProtocolError::MissingReturnLog)?;
        let owner = abi::decode_address_return(log)?;
        Ok(owner != Address::ZERO)
    }

    fn mint_args(&self, record: &BridgingRecord) -> Result<Vec<Vec<u8>>> {
        let id_string = record.asset_id.to_string();
        Ok(vec![
            abi::method_selector(abi::MINT_TO_SIGNATURE).to_vec(),
            abi::encode_address(&record.destination).to_vec(),
            abi::encode_fixed_bytes(record.asset_url.as_bytes(), abi::FIXED_ARG_WIDTH)?,
            abi::encode_uint256(record.asset_id).to_vec(),
            abi::encode_fixed_bytes(id_string.as_bytes(), abi::FIXED_ARG_WIDTH)?,
            abi::encode_uint64(self.mint.origin_chain_id).to_vec(),
        ])
    }

    /// Two-phase mint: simulate for resource discovery, then sign and submit
    async fn mint(&self, record: &BridgingRecord) -> Result<String> {
        let params = self.destination.suggested_params().await?;
        let sender = self.destination_signer.address();
        let escrow = txn::application_address(self.mint.app_id);
        let args = self.mint_args(record)?;

        let build_group = |boxes: Vec<BoxRef>| -> Result<Vec<UnsignedTransaction>> {
            let mut group = vec![
                UnsignedTransaction::payment(sender, escrow, self.mint.funding_amount, &params),
                UnsignedTransaction::app_call(
                    sender,
                    self.mint.app_id,
                    args.clone(),
                    boxes,
                    &params,
                ),
            ];
            txn::assign_group(&mut group)?;
            Ok(group)
        };

        let probe = build_group(Vec::new())?;
        let outcome = self.destination.simulate(&probe).await?;
        if let Some(message) = outcome.failure() {
            return Err(ProtocolError::SimulateFailed(message.to_string()).into());
        }
        debug!(
            asset_id = record.asset_id,
            boxes = outcome.unnamed_boxes.len(),
            "mint dry run passed"
        );

        let group = build_group(outcome.unnamed_boxes)?;
        let mut raw = self.destination_signer.sign(&group[0])?;
        raw.extend(self.destination_signer.sign(&group[1])?);
        Ok(self.destination.submit(&raw).await?)
    }
}

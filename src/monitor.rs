/*!
Source-chain transaction monitor

Polls the source chain's indexer for transactions addressed to the custodial
account since the last observed round, filters them through the note codec
and forwards candidates to the settlement engine over a bounded queue. The
queue is closed when the monitor stops, which is the engine's shutdown cue.
*/

use crate::gateway::{ChainReader, ChainTransaction};
use crate::ledger::BridgeLedger;
use crate::note;
use crate::types::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Watches the custodial account and feeds the settlement queue
pub struct TransactionMonitor<R> {
    reader: Arc<R>,
    ledger: Arc<BridgeLedger>,
    custodial: Address,
    min_deposit: u64,
    poll_interval: Duration,
    queue: mpsc::Sender<ChainTransaction>,
    cancel: CancellationToken,
}

impl<R: ChainReader> TransactionMonitor<R> {
    pub fn new(
        reader: Arc<R>,
        ledger: Arc<BridgeLedger>,
        custodial: Address,
        min_deposit: u64,
        poll_interval: Duration,
        queue: mpsc::Sender<ChainTransaction>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            reader,
            ledger,
            custodial,
            min_deposit,
            poll_interval,
            queue,
            cancel,
        }
    }

    /// Run until cancelled or until the settlement engine goes away
    ///
    /// Dropping `self` on return closes the queue.
    #[tracing::instrument(name = "monitor", skip_all)]
    pub async fn run(self) {
        info!(custodial = %self.custodial, "transaction monitor started");
        loop {
            if !self.poll_once().await {
                break;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!("transaction monitor stopped");
    }

    /// One fetch-filter-forward pass; false when the queue is gone
    async fn poll_once(&self) -> bool {
        let min_round = self.ledger.last_round() + 1;
        let page = match self
            .reader
            .search_transactions(&self.custodial, min_round)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, min_round, "transaction search failed, will retry");
                return true;
            }
        };

        let mut max_round = page.current_round;
        for txn in page.transactions {
            if let Some(round) = txn.confirmed_round {
                max_round = max_round.max(round);
            }
            match note::validate_candidate(&txn, self.min_deposit) {
                Ok(()) => {
                    debug!(txid = %txn.id, tx_type = %txn.tx_type, "forwarding candidate");
                    if self.queue.send(txn).await.is_err() {
                        warn!("settlement queue closed, stopping monitor");
                        return false;
                    }
                }
                Err(e) => {
                    debug!(txid = %txn.id, error = %e, "discarding transaction");
                }
            }
        }
        self.ledger.advance_round(max_round);
        true
    }
}

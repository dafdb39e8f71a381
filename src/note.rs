/*!
Deposit-instruction codec

Decodes the JSON bridging instruction carried in a deposit's note field and
applies the acceptance rules for candidate transactions: payments must clear
the anti-spam floor and carry a well-formed instruction; asset transfers with
a positive amount pass through as custody-transfer triggers.
*/

use crate::error::NoteError;
use crate::gateway::{ChainTransaction, TxnType};
use crate::types::{Address, AssetId};
use serde::Deserialize;

/// Decoded bridging instruction from a deposit note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositInstruction {
    pub asset_id: AssetId,
    pub to: Address,
    pub amount: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNote {
    asset_id: AssetId,
    to: String,
    amount: u64,
}

/// Decode and validate an instruction from raw note bytes
pub fn decode_instruction(note: &[u8]) -> Result<DepositInstruction, NoteError> {
    let raw: RawNote =
        serde_json::from_slice(note).map_err(|e| NoteError::MalformedNote(e.to_string()))?;
    let to = raw.to.parse::<Address>()?;
    Ok(DepositInstruction {
        asset_id: raw.asset_id,
        to,
        amount: raw.amount,
    })
}

/// Validate a candidate transaction for forwarding to the settlement engine
///
/// The raw transaction is what gets forwarded; the engine re-parses the
/// instruction when it creates the record.
pub fn validate_candidate(txn: &ChainTransaction, min_deposit: u64) -> Result<(), NoteError> {
    match txn.tx_type {
        TxnType::Payment => {
            let payment = txn
                .payment_transaction
                .as_ref()
                .ok_or_else(|| NoteError::MalformedNote("missing payment fields".to_string()))?;
            if payment.amount < min_deposit {
                return Err(NoteError::BelowMinimum {
                    amount: payment.amount,
                    minimum: min_deposit,
                });
            }
            decode_instruction(&txn.note_bytes())?;
            Ok(())
        }
        TxnType::AssetTransfer => {
            let transfer = txn.asset_transfer_transaction.as_ref().ok_or_else(|| {
                NoteError::MalformedNote("missing asset transfer fields".to_string())
            })?;
            if transfer.amount == 0 {
                return Err(NoteError::UnsupportedType(
                    "zero-amount asset transfer".to_string(),
                ));
            }
            Ok(())
        }
        TxnType::Other => Err(NoteError::UnsupportedType(txn.tx_type.to_string())),
    }
}

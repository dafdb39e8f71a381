/*!
Transaction construction and signing

Unsigned transaction model for both chains, atomic-group pairing and the
ed25519 signer for the custodial accounts. Transactions are hashed and signed
over their bincode encoding with the chain's domain tags.
*/

use crate::error::{BridgeError, Result};
use crate::types::{Address, AssetId};
use ed25519_dalek::{Signer as _, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

/// Group identifier binding an atomic transaction group
pub type GroupId = [u8; 32];

/// Box reference declared on an application call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxRef {
    pub app_id: u64,
    pub name: Vec<u8>,
}

/// Suggested transaction parameters from the node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TxnParams {
    #[serde(default)]
    pub fee: u64,
    pub min_fee: u64,
    pub last_round: u64,
    pub genesis_id: String,
    pub genesis_hash: String,
}

/// Validity window granted past the current round
const VALIDITY_WINDOW: u64 = 1000;

/// Type-specific transaction fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnPayload {
    Payment {
        receiver: Address,
        amount: u64,
    },
    AssetTransfer {
        asset_id: AssetId,
        receiver: Address,
        amount: u64,
    },
    AppCall {
        app_id: u64,
        args: Vec<Vec<u8>>,
        boxes: Vec<BoxRef>,
    },
}

/// An unsigned transaction ready for grouping and signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub sender: Address,
    pub payload: TxnPayload,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub group: Option<GroupId>,
}

impl UnsignedTransaction {
    fn base(sender: Address, payload: TxnPayload, params: &TxnParams) -> Self {
        Self {
            sender,
            payload,
            fee: params.min_fee.max(params.fee),
            first_valid: params.last_round,
            last_valid: params.last_round + VALIDITY_WINDOW,
            genesis_id: params.genesis_id.clone(),
            group: None,
        }
    }

    /// Payment of `amount` micro-units to `receiver`
    pub fn payment(sender: Address, receiver: Address, amount: u64, params: &TxnParams) -> Self {
        Self::base(sender, TxnPayload::Payment { receiver, amount }, params)
    }

    /// Asset opt-in: a zero-amount transfer of the asset to the sender itself
    pub fn asset_opt_in(sender: Address, asset_id: AssetId, params: &TxnParams) -> Self {
        Self::base(
            sender,
            TxnPayload::AssetTransfer {
                asset_id,
                receiver: sender,
                amount: 0,
            },
            params,
        )
    }

    /// Application call with explicit box references
    pub fn app_call(
        sender: Address,
        app_id: u64,
        args: Vec<Vec<u8>>,
        boxes: Vec<BoxRef>,
        params: &TxnParams,
    ) -> Self {
        Self::base(sender, TxnPayload::AppCall { app_id, args, boxes }, params)
    }

    /// Canonical encoding used for hashing and signing
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| BridgeError::internal(format!("transaction encoding failed: {e}")))
    }
}

/// Compute the group id over the canonical encodings of the transactions
///
/// The group field itself is excluded from the computation, matching how the
/// id is assigned after pairing.
pub fn compute_group_id(txns: &[UnsignedTransaction]) -> Result<GroupId> {
    let mut hasher = Sha512_256::new();
    hasher.update(b"TG");
    for txn in txns {
        let mut ungrouped = txn.clone();
        ungrouped.group = None;
        hasher.update(ungrouped.encode()?);
    }
    let digest = hasher.finalize();
    let mut gid = [0u8; 32];
    gid.copy_from_slice(&digest);
    Ok(gid)
}

/// Pair the transactions into one atomic group
pub fn assign_group(txns: &mut [UnsignedTransaction]) -> Result<GroupId> {
    let gid = compute_group_id(txns)?;
    for txn in txns.iter_mut() {
        txn.group = Some(gid);
    }
    Ok(gid)
}

/// Derive the escrow address of an application
pub fn application_address(app_id: u64) -> Address {
    let mut hasher = Sha512_256::new();
    hasher.update(b"appID");
    hasher.update(app_id.to_be_bytes());
    let digest = hasher.finalize();
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    Address(key)
}

/// Signed transaction envelope submitted to the node
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignedTransaction {
    sig: Vec<u8>,
    txn: UnsignedTransaction,
}

/// Signing backend for a custodial account
pub trait TxnSigner: Send + Sync {
    /// Address of the signing account
    fn address(&self) -> Address;

    /// Sign one transaction, returning the encoded signed envelope
    fn sign(&self, txn: &UnsignedTransaction) -> Result<Vec<u8>>;
}

/// ed25519 signer over a raw 32-byte seed
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }
}

impl TxnSigner for Ed25519Signer {
    fn address(&self) -> Address {
        Address(self.key.verifying_key().to_bytes())
    }

    fn sign(&self, txn: &UnsignedTransaction) -> Result<Vec<u8>> {
        let mut message = b"TX".to_vec();
        message.extend_from_slice(&txn.encode()?);
        let sig = self.key.sign(&message);
        let envelope = SignedTransaction {
            sig: sig.to_bytes().to_vec(),
            txn: txn.clone(),
        };
        bincode::serialize(&envelope)
            .map_err(|e| BridgeError::internal(format!("signed envelope encoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TxnParams {
        TxnParams {
            fee: 0,
            min_fee: 1000,
            last_round: 5000,
            genesis_id: "bridge-test-v1".to_string(),
            genesis_hash: "aGFzaA==".to_string(),
        }
    }

    #[test]
    fn test_opt_in_is_zero_amount_self_transfer() {
        let sender = Address([3u8; 32]);
        let txn = UnsignedTransaction::asset_opt_in(sender, 42, &params());
        match txn.payload {
            TxnPayload::AssetTransfer {
                asset_id,
                receiver,
                amount,
            } => {
                assert_eq!(asset_id, 42);
                assert_eq!(receiver, sender);
                assert_eq!(amount, 0);
            }
            _ => panic!("expected asset transfer"),
        }
        assert_eq!(txn.fee, 1000);
        assert_eq!(txn.last_valid, 6000);
    }

    #[test]
    fn test_group_id_binds_both_legs() {
        let p = params();
        let mut group = [
            UnsignedTransaction::payment(Address([1u8; 32]), Address([2u8; 32]), 500_000, &p),
            UnsignedTransaction::app_call(Address([1u8; 32]), 7, vec![vec![1]], vec![], &p),
        ];
        let gid = assign_group(&mut group).unwrap();
        assert_eq!(group[0].group, Some(gid));
        assert_eq!(group[1].group, Some(gid));
    }

    #[test]
    fn test_group_id_ignores_prior_group_assignment() {
        let p = params();
        let mut group = [
            UnsignedTransaction::payment(Address([1u8; 32]), Address([2u8; 32]), 500_000, &p),
            UnsignedTransaction::app_call(Address([1u8; 32]), 7, vec![], vec![], &p),
        ];
        let before = compute_group_id(&group).unwrap();
        assign_group(&mut group).unwrap();
        assert_eq!(compute_group_id(&group).unwrap(), before);
    }

    #[test]
    fn test_group_id_depends_on_content() {
        let p = params();
        let a = UnsignedTransaction::payment(Address([1u8; 32]), Address([2u8; 32]), 1, &p);
        let b = UnsignedTransaction::payment(Address([1u8; 32]), Address([2u8; 32]), 2, &p);
        assert_ne!(
            compute_group_id(std::slice::from_ref(&a)).unwrap(),
            compute_group_id(std::slice::from_ref(&b)).unwrap()
        );
    }

    #[test]
    fn test_application_address_is_stable() {
        let first = application_address(26_169_081);
        let second = application_address(26_169_081);
        assert_eq!(first, second);
        assert_ne!(first, application_address(1));
    }

    #[test]
    fn test_signer_round_trip() {
        let signer = Ed25519Signer::from_seed([9u8; 32]);
        let txn =
            UnsignedTransaction::payment(signer.address(), Address([2u8; 32]), 100, &params());
        let blob = signer.sign(&txn).unwrap();
        let envelope: SignedTransaction = bincode::deserialize(&blob).unwrap();
        assert_eq!(envelope.sig.len(), 64);
        assert_eq!(envelope.txn, txn);
    }
}

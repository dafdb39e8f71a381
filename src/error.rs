/*!
Error types for ArcBridge operations

Errors are grouped the way failures are handled: gateway errors are transient
and retried on the next trigger, note/spec/ledger errors are per-item
rejections, protocol errors abort a mint without advancing state.
*/

use thiserror::Error;

/// Result type alias for ArcBridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Top-level error for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chain gateway I/O errors (transient)
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Deposit-instruction validation errors
    #[error("Note error: {0}")]
    Note(#[from] NoteError),

    /// Metadata-spec detection and content-identifier errors
    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    /// Bridge ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Destination-chain protocol errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors that shouldn't normally occur
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Chain gateway errors — all transient by policy
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("Transaction encoding failed: {0}")]
    Encoding(String),
}

/// Validation failures for a single candidate transaction
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Unsupported transaction type: {0}")]
    UnsupportedType(String),

    #[error("Amount {amount} below minimum deposit {minimum}")]
    BelowMinimum { amount: u64, minimum: u64 },

    #[error("Note is not a valid instruction: {0}")]
    MalformedNote(String),

    #[error("Invalid destination address: {0}")]
    InvalidAddress(#[from] crate::types::AddressError),
}

/// Metadata-spec detection and ARC19 reconstruction failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    #[error("Unsupported template-ipfs spec")]
    UnknownTemplate,

    #[error("Unsupported ipfscid field {0:?}, only reserve is supported")]
    UnsupportedField(String),

    #[error("Unknown multicodec name {0:?} in ipfscid spec")]
    UnsupportedCodec(String),

    #[error("Unknown hash name {0:?} in ipfscid spec")]
    UnsupportedHash(String),

    #[error("CID v0 requires dag-pb codec and sha2-256 hash")]
    InvalidV0,

    #[error("Error encoding multihash digest")]
    HashEncoding,

    #[error("Asset {asset_id} does not match any recognized spec")]
    Unrecognized { asset_id: u64 },
}

/// Bridge ledger access failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Asset {asset_id} is already tracked in state {state}")]
    DuplicateAsset {
        asset_id: u64,
        state: crate::ledger::BridgeState,
    },

    #[error("Asset {asset_id} is not tracked")]
    UnknownAsset { asset_id: u64 },

    #[error("Refusing state transition {from} -> {to}")]
    InvalidTransition {
        from: crate::ledger::BridgeState,
        to: crate::ledger::BridgeState,
    },
}

/// Destination-chain protocol failures during existence check or mint
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Simulation failed: {0}")]
    SimulateFailed(String),

    #[error("Simulation returned no logs for the method call")]
    MissingReturnLog,

    #[error("Malformed return value in simulation log")]
    MalformedReturn,

    #[error("Argument of {len} bytes exceeds fixed width {width}")]
    OversizedArgument { len: usize, width: usize },
}

impl BridgeError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the failed operation may succeed on the next natural trigger
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Gateway(_) | BridgeError::Protocol(_))
    }

    /// Error category for log fields
    pub fn category(&self) -> &'static str {
        match self {
            BridgeError::Config(_) => "config",
            BridgeError::Gateway(_) => "gateway",
            BridgeError::Note(_) => "note",
            BridgeError::Spec(_) => "spec",
            BridgeError::Ledger(_) => "ledger",
            BridgeError::Protocol(_) => "protocol",
            BridgeError::Io(_) => "io",
            BridgeError::Internal(_) => "internal",
        }
    }
}

//! Error handling for the ledger
//!
//! Consensus and mempool failures are expected outcomes and are carried as a
//! [`Rejection`], whose `Display` is the human-readable reason shown to
//! callers. Everything else (disk, decoding, configuration) is a
//! [`LedgerError`].

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Why a transaction or block was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Block height is not tip height + 1
    BadHeight,
    /// Block does not link to the current tip
    BadPrevHash,
    /// Block timestamp is older than the tip's
    TimeWentBackwards,
    /// Block claims a difficulty other than the ledger's current one
    UnexpectedBits,
    /// Header hash misses the proof-of-work target
    BadPow,
    /// Header merkle root does not match the transactions
    BadMerkleRoot,
    EmptyBlock,
    FirstTxNotCoinbase,
    /// A transaction inside a block failed basic sanity
    TxInvalid(Box<Rejection>),
    CoinbasePaysTooMuch,
    /// State transition failed and the block was rolled back
    ApplyFailed(Box<Rejection>),
    UnsupportedTxVersion,
    NoOutputs,
    NonpositiveOutput,
    EmptyRecipient,
    /// Rejected by the configured [`crate::core::Authorizer`]
    Unauthorized(String),
    UnsupportedVin,
    InsufficientFunds { required: u64, available: u64 },
    AmountOverflow,
    AlreadyInMempool,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BadHeight => write!(f, "bad height"),
            Rejection::BadPrevHash => write!(f, "bad prev_hash"),
            Rejection::TimeWentBackwards => write!(f, "time went backwards"),
            Rejection::UnexpectedBits => write!(f, "unexpected difficulty bits"),
            Rejection::BadPow => write!(f, "bad PoW"),
            Rejection::BadMerkleRoot => write!(f, "bad merkle root"),
            Rejection::EmptyBlock => write!(f, "empty block"),
            Rejection::FirstTxNotCoinbase => write!(f, "first tx must be coinbase"),
            Rejection::TxInvalid(why) => write!(f, "tx invalid: {why}"),
            Rejection::CoinbasePaysTooMuch => write!(f, "coinbase pays too much"),
            Rejection::ApplyFailed(why) => write!(f, "apply failed: {why}"),
            Rejection::UnsupportedTxVersion => write!(f, "unsupported tx version"),
            Rejection::NoOutputs => write!(f, "no outputs"),
            Rejection::NonpositiveOutput => write!(f, "nonpositive output"),
            Rejection::EmptyRecipient => write!(f, "empty to_addr"),
            Rejection::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Rejection::UnsupportedVin => write!(f, "unsupported vin"),
            Rejection::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "insufficient funds (required {required}, available {available})"
                )
            }
            Rejection::AmountOverflow => write!(f, "amount overflow"),
            Rejection::AlreadyInMempool => write!(f, "already in mempool"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Error types for ledger operations
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// An expected consensus or mempool failure
    Rejected(Rejection),
    /// File I/O errors
    Io(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// Mining errors
    Mining(String),
    /// Persisted data that does not form a valid ledger
    Corrupt(String),
}

impl LedgerError {
    /// The rejection carried by this error, if it is one.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            LedgerError::Rejected(why) => Some(why),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Rejected(why) => write!(f, "{why}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Mining(msg) => write!(f, "Mining error: {msg}"),
            LedgerError::Corrupt(msg) => write!(f, "Corrupt ledger data: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<Rejection> for LedgerError {
    fn from(why: Rejection) -> Self {
        LedgerError::Rejected(why)
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_reasons_read_naturally() {
        let why = Rejection::ApplyFailed(Box::new(Rejection::InsufficientFunds {
            required: 10,
            available: 3,
        }));
        assert_eq!(
            why.to_string(),
            "apply failed: insufficient funds (required 10, available 3)"
        );

        let why = Rejection::TxInvalid(Box::new(Rejection::NonpositiveOutput));
        assert_eq!(why.to_string(), "tx invalid: nonpositive output");
    }

    #[test]
    fn test_rejection_is_recoverable_from_error() {
        let err: LedgerError = Rejection::BadPow.into();
        assert_eq!(err.rejection(), Some(&Rejection::BadPow));
        assert_eq!(err.to_string(), "bad PoW");

        let io: LedgerError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(io.rejection().is_none());
    }
}

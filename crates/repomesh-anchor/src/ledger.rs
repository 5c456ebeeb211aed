use repomesh_core::{ErrorKind, TrustError};
use std::time::Duration;
use tracing::warn;

/// Receipt returned by a successful anchor submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash on the external ledger.
    pub tx_hash: String,
    /// Whether the ledger reported the transaction as applied.
    pub successful: bool,
}

/// A memo attached to a fetched transaction. All three fields are
/// hex-encoded as they travel on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoEntry {
    /// Hex of the memo type tag.
    pub memo_type_hex: String,
    /// Hex of the memo content type.
    pub memo_format_hex: String,
    /// Hex of the memo payload.
    pub memo_data_hex: String,
}

/// Transport-level ledger failure.
#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    /// Worth retrying: timeouts, connection resets, rate limits.
    #[error("transient ledger failure: {0}")]
    Transient(String),
    /// Not worth retrying: rejections, malformed requests.
    #[error("permanent ledger failure: {0}")]
    Permanent(String),
}

/// External public ledger contract consumed by the anchor engine.
///
/// Implementations submit a self-addressed payment carrying the anchor
/// memo and fetch transactions by hash. They are expected to honor the
/// timeout carried in [`RetryPolicy`]; the retry loop lives here.
pub trait LedgerClient {
    /// Submits a self-payment with the given hex-encoded memo fields.
    fn submit_anchor(
        &self,
        memo_type_hex: &str,
        memo_format_hex: &str,
        memo_data_hex: &str,
    ) -> Result<TxReceipt, LedgerError>;

    /// Fetches the memos attached to a transaction.
    fn fetch_memos(&self, tx_hash: &str) -> Result<Vec<MemoEntry>, LedgerError>;

    /// Wallet address used for self-payments.
    fn wallet_address(&self) -> String;

    /// Network name recorded in manifests and memos.
    fn network(&self) -> String;
}

/// Retry budget for external-ledger calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Per-attempt timeout implementations must honor.
    pub timeout: Duration,
    /// Total attempts before giving up.
    pub max_attempts: u32,
    /// First backoff delay; doubles per retry.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Runs a ledger operation under the retry budget.
///
/// Transient failures back off exponentially and retry; a permanent
/// failure or an exhausted budget surfaces as the warn-class
/// `ExternalLedgerUnavailable`, never as a silent skip.
pub fn with_retries<T>(
    policy: &RetryPolicy,
    what: &str,
    mut op: impl FnMut() -> Result<T, LedgerError>,
) -> Result<T, TrustError> {
    let mut delay = policy.backoff_base;
    let mut last = String::new();
    for attempt in 1..=policy.max_attempts.max(1) {
        match op() {
            Ok(value) => return Ok(value),
            Err(LedgerError::Permanent(message)) => {
                return Err(TrustError::new(
                    ErrorKind::ExternalLedgerUnavailable,
                    format!("{what}: {message}"),
                ));
            }
            Err(LedgerError::Transient(message)) => {
                warn!(%what, attempt, %message, "transient ledger failure");
                last = message;
                if attempt < policy.max_attempts {
                    std::thread::sleep(delay);
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }
    Err(TrustError::new(
        ErrorKind::ExternalLedgerUnavailable,
        format!("{what}: retry budget exhausted: {last}"),
    ))
}

//! Error types for state access.

use alloy_primitives::Address;

/// Result type alias for state operations.
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors surfaced by the host store or the overlay on top of it.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Underlying host store failed.
    #[error("host store error: {0}")]
    Host(String),

    /// A value transfer or burn exceeded the account balance.
    #[error("insufficient balance for {0}")]
    InsufficientBalance(Address),

    /// A balance credit overflowed 256 bits. Cannot happen for realistic
    /// supplies; treated as a fatal chain bug by callers.
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),
}

impl StateError {
    /// Create a host store error.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }
}

//! Handler error taxonomy and its lowering to the precompile result surface.
//!
//! Precedence mirrors the EVM-visible behavior: malformed input reverts with
//! no data, authorization and precondition failures revert with the exact
//! `Error(string)` payload of the original `require` message, gas exhaustion
//! is a plain out-of-gas, and a peer revert propagates its inner payload.
//! Impossible branches (checked arithmetic underflow in a balance) are
//! surfaced as ordinary reverts so a checked and an unchecked implementation
//! cannot split consensus.

use alloy_primitives::Bytes;
use alloy_sol_types::{Revert, SolError};
use revm::precompile::{PrecompileError, PrecompileOutput, PrecompileResult};
use u2u_state::StateError;

/// Handler outcome: ABI-encoded return data, or a failure to lower.
pub(crate) type HandlerResult = std::result::Result<Vec<u8>, SfcError>;

/// Failure modes of a precompile handler.
#[derive(Debug)]
pub enum SfcError {
    /// Business-rule or authorization failure; reverts with `Error(reason)`.
    Revert(String),

    /// A peer precompile reverted; its payload is re-raised verbatim.
    RawRevert(Vec<u8>),

    /// Unknown selector or malformed argument tuple; reverts with no data.
    EmptyRevert,

    /// Supplied gas below the computed debit.
    OutOfGas,

    /// Host state failure (treated as a revert, see module docs).
    State(StateError),
}

impl SfcError {
    /// Shorthand for a reason-carrying revert.
    pub fn revert(reason: impl Into<String>) -> Self {
        Self::Revert(reason.into())
    }
}

impl From<StateError> for SfcError {
    fn from(err: StateError) -> Self {
        Self::State(err)
    }
}

impl std::fmt::Display for SfcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Revert(reason) => write!(f, "reverted: {reason}"),
            Self::RawRevert(_) => write!(f, "reverted with raw payload"),
            Self::EmptyRevert => write!(f, "reverted with no data"),
            Self::OutOfGas => write!(f, "out of gas"),
            Self::State(err) => write!(f, "state error: {err}"),
        }
    }
}

impl std::error::Error for SfcError {}

/// ABI-encode an `Error(string)` revert payload.
pub fn revert_payload(reason: &str) -> Bytes {
    Revert::from(reason).abi_encode().into()
}

/// Decode the reason out of an `Error(string)` payload (test helper).
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data).ok().map(|revert| revert.reason)
}

/// Lower a handler outcome into the revm precompile result.
pub(crate) fn into_precompile_result(gas_used: u64, outcome: HandlerResult) -> PrecompileResult {
    match outcome {
        Ok(bytes) => Ok(PrecompileOutput {
            gas_used,
            gas_refunded: 0,
            bytes: bytes.into(),
            reverted: false,
        }),
        Err(SfcError::Revert(reason)) => Ok(PrecompileOutput {
            gas_used,
            gas_refunded: 0,
            bytes: revert_payload(&reason),
            reverted: true,
        }),
        Err(SfcError::RawRevert(payload)) => Ok(PrecompileOutput {
            gas_used,
            gas_refunded: 0,
            bytes: payload.into(),
            reverted: true,
        }),
        Err(SfcError::EmptyRevert) => Ok(PrecompileOutput {
            gas_used,
            gas_refunded: 0,
            bytes: Bytes::new(),
            reverted: true,
        }),
        Err(SfcError::OutOfGas) => Err(PrecompileError::OutOfGas),
        Err(SfcError::State(err)) => Ok(PrecompileOutput {
            gas_used,
            gas_refunded: 0,
            bytes: revert_payload(&err.to_string()),
            reverted: true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_payload_uses_the_error_string_selector() {
        let payload = revert_payload("zero amount");
        assert_eq!(&payload[..4], &[0x08, 0xc3, 0x79, 0xa0]);
        assert_eq!(decode_revert_reason(&payload).unwrap(), "zero amount");
    }

    #[test]
    fn lowering_keeps_gas_and_revert_flags() {
        let ok = into_precompile_result(21, Ok(vec![1, 2, 3])).unwrap();
        assert!(!ok.reverted);
        assert_eq!(ok.gas_used, 21);
        assert_eq!(ok.bytes.as_ref(), &[1, 2, 3]);

        let reverted =
            into_precompile_result(42, Err(SfcError::revert("not enough time passed"))).unwrap();
        assert!(reverted.reverted);
        assert_eq!(
            decode_revert_reason(&reverted.bytes).unwrap(),
            "not enough time passed"
        );

        let empty = into_precompile_result(0, Err(SfcError::EmptyRevert)).unwrap();
        assert!(empty.reverted);
        assert!(empty.bytes.is_empty());

        assert!(matches!(
            into_precompile_result(0, Err(SfcError::OutOfGas)),
            Err(PrecompileError::OutOfGas)
        ));
    }
}

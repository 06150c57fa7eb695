//! Gas debits for the precompile suite.
//!
//! Flat per-method costs, with per-validator components for the sealing
//! calls and a per-word component for dynamic payloads. Chosen to sit in the
//! same band the bytecode implementation burned; exact equality with the
//! interpreter is explicitly tolerated to differ.

/// Gas cost for view methods.
pub const READ: u64 = 2_100;

/// Additional gas per 32-byte word of dynamic return data or input payload.
pub const PER_WORD: u64 = 100;

/// Gas cost for createValidator.
pub const CREATE_VALIDATOR: u64 = 180_000;

/// Gas cost for delegate.
pub const DELEGATE: u64 = 90_000;

/// Gas cost for undelegate.
pub const UNDELEGATE: u64 = 120_000;

/// Gas cost for withdraw.
pub const WITHDRAW: u64 = 100_000;

/// Gas cost for lockStake / relockStake.
pub const LOCK_STAKE: u64 = 90_000;

/// Gas cost for unlockStake.
pub const UNLOCK_STAKE: u64 = 120_000;

/// Gas cost for claimRewards / restakeRewards.
pub const CLAIM_REWARDS: u64 = 150_000;

/// Gas cost for the public stashRewards entry.
pub const STASH_REWARDS: u64 = 90_000;

/// Gas cost for owner/administrative setters (both SFC and ConstantManager).
pub const ADMIN_WRITE: u64 = 30_000;

/// Gas cost for driver-forwarded callbacks outside sealing.
pub const DRIVER_CALLBACK: u64 = 60_000;

/// Base gas cost for sealEpoch.
pub const SEAL_EPOCH_BASE: u64 = 500_000;

/// Per-validator gas cost for sealEpoch.
pub const SEAL_EPOCH_PER_VALIDATOR: u64 = 30_000;

/// Base gas cost for sealEpochValidators.
pub const SEAL_VALIDATORS_BASE: u64 = 100_000;

/// Per-validator gas cost for sealEpochValidators.
pub const SEAL_VALIDATORS_PER_VALIDATOR: u64 = 10_000;

/// Gas stipend handed to internal peer-precompile calls. Each such call
/// carries its own budget; flat costs keep this from ever mattering in
/// practice.
pub const SUB_CALL_STIPEND: u64 = 50_000_000;

/// Fail with out-of-gas when the supplied gas is below the computed debit.
pub(crate) fn charge(gas_limit: u64, cost: u64) -> Result<(), crate::error::SfcError> {
    if gas_limit < cost {
        Err(crate::error::SfcError::OutOfGas)
    } else {
        Ok(())
    }
}

/// Charge the debit up front, then run the handler.
pub(crate) fn guarded(
    gas_limit: u64,
    cost: u64,
    handler: impl FnOnce() -> crate::error::HandlerResult,
) -> (u64, crate::error::HandlerResult) {
    match charge(gas_limit, cost) {
        Err(err) => (cost, Err(err)),
        Ok(()) => (cost, handler()),
    }
}

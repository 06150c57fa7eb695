//! ConstantManager precompile and the typed constants cache.
//!
//! The fifteen tunables live in ConstantManager storage; reward math reads
//! them on every computation, so the last-read values are cached per chain.
//! Every successful setter flips a dirty flag that the next dispatcher entry
//! observes before its first read.

use crate::abi::{decode_call, IConstantManager};
use crate::error::{into_precompile_result, HandlerResult, SfcError};
use crate::gas::{self, charge};
use crate::vm::{CallCtx, Vm};
use crate::{CONSTANT_MANAGER_ADDRESS, DECIMAL_UNIT};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use parking_lot::RwLock;
use revm::precompile::PrecompileResult;
use std::sync::atomic::{AtomicBool, Ordering};
use u2u_layout::cm as layout;
use u2u_metrics::sfc as metrics;

/// Snapshot of every tunable, loaded in one sweep.
#[derive(Debug, Clone, Copy)]
pub struct Constants {
    pub min_self_stake: U256,
    pub max_delegated_ratio: U256,
    pub validator_commission: U256,
    pub burnt_fee_share: U256,
    pub treasury_fee_share: U256,
    pub unlocked_reward_ratio: U256,
    pub min_lockup_duration: U256,
    pub max_lockup_duration: U256,
    pub withdrawal_period_epochs: U256,
    pub withdrawal_period_time: U256,
    pub base_reward_per_second: U256,
    pub offline_penalty_threshold_blocks_num: U256,
    pub offline_penalty_threshold_time: U256,
    pub target_gas_power_per_second: U256,
    pub gas_price_balancing_counterweight: U256,
}

/// Chain-scoped cache of the last-read constants.
pub struct ConstantsCache {
    value: RwLock<Option<Constants>>,
    dirty: AtomicBool,
}

impl ConstantsCache {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
            dirty: AtomicBool::new(false),
        }
    }

    /// Invalidate before the first read of a call if a setter ran since.
    pub fn on_dispatch_entry(&self) {
        if self.dirty.swap(false, Ordering::AcqRel) {
            *self.value.write() = None;
        }
    }

    /// Called by every successful setter (and by `updateConstsAddress`).
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    fn cached(&self) -> Option<Constants> {
        *self.value.read()
    }

    fn fill(&self, constants: Constants) {
        *self.value.write() = Some(constants);
    }
}

impl Default for ConstantsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm<'_> {
    /// Typed constants, served from the cache when warm.
    pub fn consts(&mut self) -> Result<Constants, SfcError> {
        if let Some(constants) = self.chain.constants.cached() {
            return Ok(constants);
        }
        let cm = self.consts_manager_address()?;
        let constants = Constants {
            min_self_stake: self.sload(cm, layout::slot::MIN_SELF_STAKE)?,
            max_delegated_ratio: self.sload(cm, layout::slot::MAX_DELEGATED_RATIO)?,
            validator_commission: self.sload(cm, layout::slot::VALIDATOR_COMMISSION)?,
            burnt_fee_share: self.sload(cm, layout::slot::BURNT_FEE_SHARE)?,
            treasury_fee_share: self.sload(cm, layout::slot::TREASURY_FEE_SHARE)?,
            unlocked_reward_ratio: self.sload(cm, layout::slot::UNLOCKED_REWARD_RATIO)?,
            min_lockup_duration: self.sload(cm, layout::slot::MIN_LOCKUP_DURATION)?,
            max_lockup_duration: self.sload(cm, layout::slot::MAX_LOCKUP_DURATION)?,
            withdrawal_period_epochs: self.sload(cm, layout::slot::WITHDRAWAL_PERIOD_EPOCHS)?,
            withdrawal_period_time: self.sload(cm, layout::slot::WITHDRAWAL_PERIOD_TIME)?,
            base_reward_per_second: self.sload(cm, layout::slot::BASE_REWARD_PER_SECOND)?,
            offline_penalty_threshold_blocks_num: self
                .sload(cm, layout::slot::OFFLINE_PENALTY_THRESHOLD_BLOCKS)?,
            offline_penalty_threshold_time: self
                .sload(cm, layout::slot::OFFLINE_PENALTY_THRESHOLD_TIME)?,
            target_gas_power_per_second: self
                .sload(cm, layout::slot::TARGET_GAS_POWER_PER_SECOND)?,
            gas_price_balancing_counterweight: self
                .sload(cm, layout::slot::GAS_PRICE_BALANCING_COUNTERWEIGHT)?,
        };
        self.chain.constants.fill(constants);
        Ok(constants)
    }
}

/// `n · 10^18`.
fn units(n: u64) -> U256 {
    U256::from(n) * DECIMAL_UNIT
}

/// Inclusive setter bounds for each tunable slot.
fn bounds_of(slot: U256) -> (U256, U256) {
    if slot == layout::slot::MIN_SELF_STAKE {
        (units(100_000), units(10_000_000))
    } else if slot == layout::slot::MAX_DELEGATED_RATIO {
        (DECIMAL_UNIT, units(31))
    } else if slot == layout::slot::VALIDATOR_COMMISSION
        || slot == layout::slot::BURNT_FEE_SHARE
        || slot == layout::slot::TREASURY_FEE_SHARE
    {
        (U256::ZERO, DECIMAL_UNIT / U256::from(2))
    } else if slot == layout::slot::UNLOCKED_REWARD_RATIO {
        (DECIMAL_UNIT / U256::from(20), DECIMAL_UNIT / U256::from(2))
    } else if slot == layout::slot::MIN_LOCKUP_DURATION {
        (U256::from(86_400), U256::from(2_592_000))
    } else if slot == layout::slot::MAX_LOCKUP_DURATION {
        (U256::from(2_592_000), U256::from(126_144_000))
    } else if slot == layout::slot::WITHDRAWAL_PERIOD_EPOCHS {
        (U256::from(2), U256::from(100))
    } else if slot == layout::slot::WITHDRAWAL_PERIOD_TIME {
        (U256::from(86_400), U256::from(2_592_000))
    } else if slot == layout::slot::BASE_REWARD_PER_SECOND {
        (DECIMAL_UNIT / U256::from(2), units(32))
    } else if slot == layout::slot::OFFLINE_PENALTY_THRESHOLD_BLOCKS {
        (U256::from(100), U256::from(1_000_000))
    } else if slot == layout::slot::OFFLINE_PENALTY_THRESHOLD_TIME {
        (U256::from(86_400), U256::from(864_000))
    } else if slot == layout::slot::TARGET_GAS_POWER_PER_SECOND {
        (U256::from(1_000_000), U256::from(500_000_000))
    } else {
        // gasPriceBalancingCounterweight
        (U256::from(100), U256::from(864_000))
    }
}

fn read_tunable(vm: &mut Vm, slot: U256) -> HandlerResult {
    Ok(vm.sload(CONSTANT_MANAGER_ADDRESS, slot)?.abi_encode())
}

fn update_tunable(vm: &mut Vm, caller: Address, slot: U256, value: U256) -> HandlerResult {
    vm.require_owner(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER, caller)?;
    let (min, max) = bounds_of(slot);
    if value < min {
        return Err(SfcError::revert("too small value"));
    }
    if value > max {
        return Err(SfcError::revert("too big value"));
    }
    vm.sstore(CONSTANT_MANAGER_ADDRESS, slot, value);
    vm.chain.constants.mark_dirty();
    Ok(Vec::new())
}

fn initialize(vm: &mut Vm, owner: Address) -> HandlerResult {
    if vm.read_bool(CONSTANT_MANAGER_ADDRESS, layout::slot::INITIALIZED)? {
        return Err(SfcError::revert("already initialized"));
    }
    vm.sstore(CONSTANT_MANAGER_ADDRESS, layout::slot::INITIALIZED, U256::from(1));
    vm.write_address(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER, owner);
    vm.emit(
        CONSTANT_MANAGER_ADDRESS,
        &IConstantManager::OwnershipTransferred {
            previousOwner: Address::ZERO,
            newOwner: owner,
        },
    );
    Ok(Vec::new())
}

fn transfer_ownership(vm: &mut Vm, caller: Address, new_owner: Address) -> HandlerResult {
    vm.require_owner(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER, caller)?;
    if new_owner == Address::ZERO {
        return Err(SfcError::revert("Ownable: new owner is the zero address"));
    }
    let previous = vm.contract_owner(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER)?;
    vm.write_address(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER, new_owner);
    vm.emit(
        CONSTANT_MANAGER_ADDRESS,
        &IConstantManager::OwnershipTransferred {
            previousOwner: previous,
            newOwner: new_owner,
        },
    );
    Ok(Vec::new())
}

fn renounce_ownership(vm: &mut Vm, caller: Address) -> HandlerResult {
    vm.require_owner(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER, caller)?;
    let previous = vm.contract_owner(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER)?;
    vm.write_address(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER, Address::ZERO);
    vm.emit(
        CONSTANT_MANAGER_ADDRESS,
        &IConstantManager::OwnershipTransferred {
            previousOwner: previous,
            newOwner: Address::ZERO,
        },
    );
    Ok(Vec::new())
}

pub(crate) fn dispatch(
    vm: &mut Vm,
    ctx: CallCtx,
    input: &[u8],
    gas_limit: u64,
) -> PrecompileResult {
    use IConstantManager as CM;

    if input.len() < 4 {
        return into_precompile_result(0, Err(SfcError::EmptyRevert));
    }
    let selector = [input[0], input[1], input[2], input[3]];

    let track = |method: &str| {
        metrics::SFC_CALLS
            .with_label_values(&["constant_manager", method])
            .inc();
    };

    // Getter table: selector → tunable slot.
    let getters: [([u8; 4], U256); 15] = [
        (CM::minSelfStakeCall::SELECTOR, layout::slot::MIN_SELF_STAKE),
        (CM::maxDelegatedRatioCall::SELECTOR, layout::slot::MAX_DELEGATED_RATIO),
        (CM::validatorCommissionCall::SELECTOR, layout::slot::VALIDATOR_COMMISSION),
        (CM::burntFeeShareCall::SELECTOR, layout::slot::BURNT_FEE_SHARE),
        (CM::treasuryFeeShareCall::SELECTOR, layout::slot::TREASURY_FEE_SHARE),
        (CM::unlockedRewardRatioCall::SELECTOR, layout::slot::UNLOCKED_REWARD_RATIO),
        (CM::minLockupDurationCall::SELECTOR, layout::slot::MIN_LOCKUP_DURATION),
        (CM::maxLockupDurationCall::SELECTOR, layout::slot::MAX_LOCKUP_DURATION),
        (CM::withdrawalPeriodEpochsCall::SELECTOR, layout::slot::WITHDRAWAL_PERIOD_EPOCHS),
        (CM::withdrawalPeriodTimeCall::SELECTOR, layout::slot::WITHDRAWAL_PERIOD_TIME),
        (CM::baseRewardPerSecondCall::SELECTOR, layout::slot::BASE_REWARD_PER_SECOND),
        (
            CM::offlinePenaltyThresholdBlocksNumCall::SELECTOR,
            layout::slot::OFFLINE_PENALTY_THRESHOLD_BLOCKS,
        ),
        (
            CM::offlinePenaltyThresholdTimeCall::SELECTOR,
            layout::slot::OFFLINE_PENALTY_THRESHOLD_TIME,
        ),
        (
            CM::targetGasPowerPerSecondCall::SELECTOR,
            layout::slot::TARGET_GAS_POWER_PER_SECOND,
        ),
        (
            CM::gasPriceBalancingCounterweightCall::SELECTOR,
            layout::slot::GAS_PRICE_BALANCING_COUNTERWEIGHT,
        ),
    ];
    if let Some((_, slot)) = getters.iter().find(|(sel, _)| *sel == selector) {
        track("tunable_getter");
        if let Err(err) = charge(gas_limit, gas::READ) {
            return into_precompile_result(gas::READ, Err(err));
        }
        return into_precompile_result(gas::READ, read_tunable(vm, *slot));
    }

    // Setter table: selector → tunable slot; value decoded uniformly since
    // every setter takes a single uint256.
    let setters: [([u8; 4], U256); 15] = [
        (CM::updateMinSelfStakeCall::SELECTOR, layout::slot::MIN_SELF_STAKE),
        (CM::updateMaxDelegatedRatioCall::SELECTOR, layout::slot::MAX_DELEGATED_RATIO),
        (CM::updateValidatorCommissionCall::SELECTOR, layout::slot::VALIDATOR_COMMISSION),
        (CM::updateBurntFeeShareCall::SELECTOR, layout::slot::BURNT_FEE_SHARE),
        (CM::updateTreasuryFeeShareCall::SELECTOR, layout::slot::TREASURY_FEE_SHARE),
        (CM::updateUnlockedRewardRatioCall::SELECTOR, layout::slot::UNLOCKED_REWARD_RATIO),
        (CM::updateMinLockupDurationCall::SELECTOR, layout::slot::MIN_LOCKUP_DURATION),
        (CM::updateMaxLockupDurationCall::SELECTOR, layout::slot::MAX_LOCKUP_DURATION),
        (
            CM::updateWithdrawalPeriodEpochsCall::SELECTOR,
            layout::slot::WITHDRAWAL_PERIOD_EPOCHS,
        ),
        (
            CM::updateWithdrawalPeriodTimeCall::SELECTOR,
            layout::slot::WITHDRAWAL_PERIOD_TIME,
        ),
        (
            CM::updateBaseRewardPerSecondCall::SELECTOR,
            layout::slot::BASE_REWARD_PER_SECOND,
        ),
        (
            CM::updateOfflinePenaltyThresholdBlocksNumCall::SELECTOR,
            layout::slot::OFFLINE_PENALTY_THRESHOLD_BLOCKS,
        ),
        (
            CM::updateOfflinePenaltyThresholdTimeCall::SELECTOR,
            layout::slot::OFFLINE_PENALTY_THRESHOLD_TIME,
        ),
        (
            CM::updateTargetGasPowerPerSecondCall::SELECTOR,
            layout::slot::TARGET_GAS_POWER_PER_SECOND,
        ),
        (
            CM::updateGasPriceBalancingCounterweightCall::SELECTOR,
            layout::slot::GAS_PRICE_BALANCING_COUNTERWEIGHT,
        ),
    ];
    if let Some((_, slot)) = setters.iter().find(|(sel, _)| *sel == selector) {
        track("tunable_setter");
        if let Err(err) = charge(gas_limit, gas::ADMIN_WRITE) {
            return into_precompile_result(gas::ADMIN_WRITE, Err(err));
        }
        // All setters share the single-uint256 argument shape; decode past
        // the selector since the concrete call type varies by arm.
        let outcome = CM::updateMinSelfStakeCall::abi_decode_raw(&input[4..])
            .map_err(|_| SfcError::EmptyRevert)
            .and_then(|call| update_tunable(vm, ctx.caller, *slot, call.v));
        return into_precompile_result(gas::ADMIN_WRITE, outcome);
    }

    let (cost, outcome) = if selector == CM::initializeCall::SELECTOR {
        track("initialize");
        let outcome = decode_call::<CM::initializeCall>(input)
            .and_then(|call| initialize(vm, call.owner));
        (gas::ADMIN_WRITE, outcome)
    } else if selector == CM::ownerCall::SELECTOR {
        track("owner");
        let outcome = vm
            .contract_owner(CONSTANT_MANAGER_ADDRESS, layout::slot::OWNER)
            .map(|owner| owner.abi_encode());
        (gas::READ, outcome)
    } else if selector == CM::transferOwnershipCall::SELECTOR {
        track("transferOwnership");
        let outcome = decode_call::<CM::transferOwnershipCall>(input)
            .and_then(|call| transfer_ownership(vm, ctx.caller, call.newOwner));
        (gas::ADMIN_WRITE, outcome)
    } else if selector == CM::renounceOwnershipCall::SELECTOR {
        track("renounceOwnership");
        (gas::ADMIN_WRITE, renounce_ownership(vm, ctx.caller))
    } else {
        metrics::SFC_UNKNOWN_SELECTORS.inc();
        (0, Err(SfcError::EmptyRevert))
    };

    if let Err(err) = charge(gas_limit, cost) {
        return into_precompile_result(cost, Err(err));
    }
    into_precompile_result(cost, outcome)
}

//! Delegation lifecycle: delegate, undelegate, withdrawal requests, lockup,
//! reward stashing and claiming.

use crate::abi::{INodeDriverAuth, IStakeTokenizer, IVoteBook, ISFC};
use crate::error::{HandlerResult, SfcError};
use crate::rewards::{scale_lockup_reward, slashing_penalty, Rewards};
use crate::validator;
use crate::vm::Vm;
use crate::{DOUBLESIGN_BIT, OK_STATUS, SFC_ADDRESS};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use u2u_layout::sfc as layout;
use u2u_metrics::sfc as metrics;

// ----------------------------------------------------------------------
// Peer collaborators
// ----------------------------------------------------------------------

/// Ask the vote book (when wired) to recount governance votes. A failure is
/// only fatal on strict paths.
pub(crate) fn recount_votes(
    vm: &mut Vm,
    delegator: Address,
    validator_auth: Address,
    strict: bool,
) -> Result<(), SfcError> {
    let vote_book = vm.vote_book_address()?;
    if vote_book == Address::ZERO {
        return Ok(());
    }
    let outcome = vm.call_sub(
        vote_book,
        SFC_ADDRESS,
        U256::ZERO,
        IVoteBook::recountVotesCall {
            delegator,
            validatorAuth: validator_auth,
        }
        .abi_encode(),
    );
    if outcome.is_err() && strict {
        return Err(SfcError::revert("gov votes recounting failed"));
    }
    Ok(())
}

/// Stake-tokenizer gate. Vacuously allowed while no tokenizer is wired;
/// otherwise the tokenizer decides whether outstanding sU2U blocks the
/// withdrawal.
pub(crate) fn check_allowed_to_withdraw(
    vm: &mut Vm,
    delegator: Address,
    to_validator: U256,
) -> Result<(), SfcError> {
    let tokenizer = vm.stake_tokenizer_address()?;
    if tokenizer == Address::ZERO {
        return Ok(());
    }
    let out = vm.call_sub(
        tokenizer,
        SFC_ADDRESS,
        U256::ZERO,
        IStakeTokenizer::allowedToWithdrawStakeCall {
            sender: delegator,
            validatorID: to_validator,
        }
        .abi_encode(),
    )?;
    // An address without code answers with empty data and does not refuse.
    if out.len() >= 32 && out[31] == 0 {
        return Err(SfcError::revert("outstanding sU2U balance"));
    }
    Ok(())
}

/// Mint native tokens into the SFC account through the driver chain.
pub(crate) fn mint_native_token(vm: &mut Vm, amount: U256) -> Result<(), SfcError> {
    if amount.is_zero() {
        return Ok(());
    }
    let driver_auth = vm.node_driver_auth()?;
    vm.call_sub(
        driver_auth,
        SFC_ADDRESS,
        U256::ZERO,
        INodeDriverAuth::incBalanceCall {
            acc: SFC_ADDRESS,
            diff: amount,
        }
        .abi_encode(),
    )?;
    let supply = vm.total_supply()?;
    vm.set_total_supply(supply + amount);
    Ok(())
}

/// Burn native tokens held by the SFC.
pub(crate) fn burn_u2u(vm: &mut Vm, amount: U256) -> Result<(), SfcError> {
    if amount.is_zero() {
        return Ok(());
    }
    let supply = vm.total_supply()?;
    vm.set_total_supply(supply.saturating_sub(amount));
    vm.state.transfer(SFC_ADDRESS, Address::ZERO, amount)?;
    vm.emit(SFC_ADDRESS, &ISFC::BurntU2U { amount });
    Ok(())
}

// ----------------------------------------------------------------------
// Lockup predicates
// ----------------------------------------------------------------------

pub(crate) fn is_locked_up(vm: &mut Vm, delegator: Address, to: U256) -> Result<bool, SfcError> {
    let end_time = vm.lockup_field(delegator, to, layout::lockup::END_TIME)?;
    let duration = vm.lockup_field(delegator, to, layout::lockup::DURATION)?;
    Ok(!end_time.is_zero() && !duration.is_zero() && vm.now() <= end_time)
}

pub(crate) fn unlocked_stake(vm: &mut Vm, delegator: Address, to: U256) -> Result<U256, SfcError> {
    let whole = vm.stake_of(delegator, to)?;
    if is_locked_up(vm, delegator, to)? {
        let locked = vm.locked_stake(delegator, to)?;
        Ok(whole.saturating_sub(locked))
    } else {
        Ok(whole)
    }
}

// ----------------------------------------------------------------------
// Core stake motion
// ----------------------------------------------------------------------

/// Delegate with the validator-existence/activity and ratio-limit rules.
pub(crate) fn delegate_to(
    vm: &mut Vm,
    delegator: Address,
    to: U256,
    amount: U256,
) -> Result<(), SfcError> {
    if !vm.validator_exists(to)? {
        return Err(SfcError::revert("validator doesn't exist"));
    }
    if vm.validator_status(to)? != OK_STATUS {
        return Err(SfcError::revert("validator isn't active"));
    }
    raw_delegate(vm, delegator, to, amount, true)?;
    if !validator::delegations_within_limit(vm, to)? {
        return Err(SfcError::revert("validator's delegations limit is exceeded"));
    }
    Ok(())
}

/// Move `amount` into the delegation, keeping every aggregate in step.
pub(crate) fn raw_delegate(
    vm: &mut Vm,
    delegator: Address,
    to: U256,
    amount: U256,
    strict: bool,
) -> Result<(), SfcError> {
    if amount.is_zero() {
        return Err(SfcError::revert("zero amount"));
    }

    stash_rewards_internal(vm, delegator, to)?;

    let stake = vm.stake_of(delegator, to)?;
    vm.set_stake_of(delegator, to, stake + amount);
    let received = vm.validator_received_stake(to)?;
    vm.set_validator_field(to, layout::validator::RECEIVED_STAKE, received + amount);
    let total = vm.total_stake()? + amount;
    vm.set_total_stake(total);
    if vm.validator_status(to)? == OK_STATUS {
        let active = vm.total_active_stake()? + amount;
        vm.set_total_active_stake(active);
        metrics::SFC_TOTAL_ACTIVE_STAKE.set(active.saturating_to::<u128>() as f64);
    }
    metrics::SFC_TOTAL_STAKE.set(total.saturating_to::<u128>() as f64);

    validator::sync_validator(vm, to, false)?;
    vm.emit(
        SFC_ADDRESS,
        &ISFC::Delegated {
            delegator,
            toValidatorID: to,
            amount,
        },
    );
    let auth = vm.validator_auth(to)?;
    recount_votes(vm, delegator, auth, strict)
}

/// Move `amount` out of the delegation. The rule check afterwards may
/// deactivate the validator (withdrawn bit) via the sync.
pub(crate) fn raw_undelegate(
    vm: &mut Vm,
    delegator: Address,
    to: U256,
    amount: U256,
    strict: bool,
) -> Result<(), SfcError> {
    let stake = vm.stake_of(delegator, to)?;
    let stake = stake
        .checked_sub(amount)
        .ok_or_else(|| SfcError::revert("not enough stake"))?;
    vm.set_stake_of(delegator, to, stake);

    let received = vm.validator_received_stake(to)?;
    vm.set_validator_field(
        to,
        layout::validator::RECEIVED_STAKE,
        received.saturating_sub(amount),
    );
    let total = vm.total_stake()?.saturating_sub(amount);
    vm.set_total_stake(total);
    if vm.validator_status(to)? == OK_STATUS {
        let active = vm.total_active_stake()?.saturating_sub(amount);
        vm.set_total_active_stake(active);
        metrics::SFC_TOTAL_ACTIVE_STAKE.set(active.saturating_to::<u128>() as f64);
    }
    metrics::SFC_TOTAL_STAKE.set(total.saturating_to::<u128>() as f64);

    validator::sync_validator(vm, to, false)?;
    let auth = vm.validator_auth(to)?;
    recount_votes(vm, delegator, auth, strict)
}

// ----------------------------------------------------------------------
// Public operations
// ----------------------------------------------------------------------

pub(crate) fn delegate(vm: &mut Vm, caller: Address, to: U256, value: U256) -> HandlerResult {
    delegate_to(vm, caller, to, value)?;
    Ok(Vec::new())
}

pub(crate) fn undelegate(
    vm: &mut Vm,
    caller: Address,
    to: U256,
    wr_id: U256,
    amount: U256,
) -> HandlerResult {
    let delegator = caller;
    stash_rewards_internal(vm, delegator, to)?;

    if amount.is_zero() {
        return Err(SfcError::revert("zero amount"));
    }
    if amount > unlocked_stake(vm, delegator, to)? {
        return Err(SfcError::revert("not enough unlocked stake"));
    }
    check_allowed_to_withdraw(vm, delegator, to)?;
    if !vm
        .withdrawal_field(delegator, to, wr_id, layout::withdrawal::AMOUNT)?
        .is_zero()
    {
        return Err(SfcError::revert("wrID already exists"));
    }

    raw_undelegate(vm, delegator, to, amount, true)?;

    let epoch = vm.current_epoch()?;
    let time = vm.now();
    vm.set_withdrawal_field(delegator, to, wr_id, layout::withdrawal::EPOCH, epoch);
    vm.set_withdrawal_field(delegator, to, wr_id, layout::withdrawal::TIME, time);
    vm.set_withdrawal_field(delegator, to, wr_id, layout::withdrawal::AMOUNT, amount);

    vm.emit(
        SFC_ADDRESS,
        &ISFC::Undelegated {
            delegator,
            toValidatorID: to,
            wrID: wr_id,
            amount,
        },
    );
    Ok(Vec::new())
}

pub(crate) fn withdraw(vm: &mut Vm, caller: Address, to: U256, wr_id: U256) -> HandlerResult {
    let delegator = caller;

    let mut request_epoch = vm.withdrawal_field(delegator, to, wr_id, layout::withdrawal::EPOCH)?;
    if request_epoch.is_zero() {
        return Err(SfcError::revert("request doesn't exist"));
    }
    check_allowed_to_withdraw(vm, delegator, to)?;

    let mut request_time = vm.withdrawal_field(delegator, to, wr_id, layout::withdrawal::TIME)?;
    let deactivated_time = vm.validator_field(to, layout::validator::DEACTIVATED_TIME)?;
    if !deactivated_time.is_zero() {
        request_time = request_time.max(deactivated_time);
        request_epoch =
            request_epoch.max(vm.validator_field(to, layout::validator::DEACTIVATED_EPOCH)?);
    }

    let consts = vm.consts()?;
    if vm.now() < request_time + consts.withdrawal_period_time {
        return Err(SfcError::revert("not enough time passed"));
    }
    if vm.current_epoch()? < request_epoch + consts.withdrawal_period_epochs {
        return Err(SfcError::revert("not enough epochs passed"));
    }

    let amount = vm.withdrawal_field(delegator, to, wr_id, layout::withdrawal::AMOUNT)?;
    let is_cheater = !(vm.validator_status(to)? & DOUBLESIGN_BIT).is_zero();
    let refund_ratio = vm.slashing_refund_ratio(to)?;
    let penalty = slashing_penalty(amount, is_cheater, refund_ratio);

    vm.set_withdrawal_field(delegator, to, wr_id, layout::withdrawal::EPOCH, U256::ZERO);
    vm.set_withdrawal_field(delegator, to, wr_id, layout::withdrawal::TIME, U256::ZERO);
    vm.set_withdrawal_field(delegator, to, wr_id, layout::withdrawal::AMOUNT, U256::ZERO);

    let slashed = vm.total_slashed_stake()? + penalty;
    vm.set_total_slashed_stake(slashed);

    if amount <= penalty {
        return Err(SfcError::revert("stake is fully slashed"));
    }
    vm.state.transfer(SFC_ADDRESS, delegator, amount - penalty)?;
    burn_u2u(vm, penalty)?;

    vm.emit(
        SFC_ADDRESS,
        &ISFC::Withdrawn {
            delegator,
            toValidatorID: to,
            wrID: wr_id,
            amount,
        },
    );
    Ok(Vec::new())
}

// ----------------------------------------------------------------------
// Lockup
// ----------------------------------------------------------------------

pub(crate) fn lock_stake(
    vm: &mut Vm,
    caller: Address,
    to: U256,
    duration: U256,
    amount: U256,
    relock: bool,
) -> HandlerResult {
    let delegator = caller;
    if amount.is_zero() {
        return Err(SfcError::revert("zero amount"));
    }
    let locked_now = is_locked_up(vm, delegator, to)?;
    if relock && !locked_now {
        return Err(SfcError::revert("not locked up"));
    }
    if !relock && locked_now {
        return Err(SfcError::revert("already locked up"));
    }
    if amount > unlocked_stake(vm, delegator, to)? {
        return Err(SfcError::revert("not enough stake"));
    }
    if vm.validator_status(to)? != OK_STATUS {
        return Err(SfcError::revert("validator isn't active"));
    }

    let consts = vm.consts()?;
    if duration < consts.min_lockup_duration || duration > consts.max_lockup_duration {
        return Err(SfcError::revert("incorrect duration"));
    }
    let end_time = vm.now() + duration;
    let prev_duration = vm.lockup_field(delegator, to, layout::lockup::DURATION)?;
    if locked_now && duration < prev_duration {
        return Err(SfcError::revert("lockup duration cannot decrease"));
    }
    let auth = vm.validator_auth(to)?;
    if delegator != auth {
        let validator_lock_end = vm.lockup_field(auth, to, layout::lockup::END_TIME)?;
        if validator_lock_end < end_time {
            return Err(SfcError::revert("validator lockup period will end earlier"));
        }
    }

    stash_rewards_internal(vm, delegator, to)?;

    let locked = vm.locked_stake(delegator, to)? + amount;
    vm.set_lockup_field(delegator, to, layout::lockup::LOCKED_STAKE, locked);
    let from_epoch = vm.current_epoch()?;
    vm.set_lockup_field(delegator, to, layout::lockup::FROM_EPOCH, from_epoch);
    vm.set_lockup_field(delegator, to, layout::lockup::END_TIME, end_time);
    vm.set_lockup_field(delegator, to, layout::lockup::DURATION, duration);

    vm.emit(
        SFC_ADDRESS,
        &ISFC::LockedUpStake {
            delegator,
            validatorID: to,
            duration,
            amount,
        },
    );
    Ok(Vec::new())
}

/// Proportional share of the stashed lockup rewards forfeited by unlocking
/// `amount` of `total` locked stake early.
fn pop_unlock_penalty(
    vm: &mut Vm,
    delegator: Address,
    to: U256,
    amount: U256,
    total_locked: U256,
) -> Result<U256, SfcError> {
    if total_locked.is_zero() {
        return Ok(U256::ZERO);
    }
    let mut stashed = vm.stashed_lockup_rewards(delegator, to)?;
    let extra_share = stashed.lockup_extra * amount / total_locked;
    let base_share = stashed.lockup_base * amount / total_locked;
    let penalty = extra_share + base_share / U256::from(2);
    stashed.lockup_extra -= extra_share;
    stashed.lockup_base -= base_share;
    vm.set_stashed_lockup_rewards(delegator, to, stashed);
    Ok(penalty)
}

pub(crate) fn unlock_stake(vm: &mut Vm, caller: Address, to: U256, amount: U256) -> HandlerResult {
    let delegator = caller;
    if amount.is_zero() {
        return Err(SfcError::revert("zero amount"));
    }
    if !is_locked_up(vm, delegator, to)? {
        return Err(SfcError::revert("not locked up"));
    }
    let total_locked = vm.locked_stake(delegator, to)?;
    if amount > total_locked {
        return Err(SfcError::revert("not enough locked stake"));
    }
    check_allowed_to_withdraw(vm, delegator, to)?;

    stash_rewards_internal(vm, delegator, to)?;

    let mut penalty = pop_unlock_penalty(vm, delegator, to, amount, total_locked)?;
    if penalty > amount {
        penalty = amount;
    }
    vm.set_lockup_field(
        delegator,
        to,
        layout::lockup::LOCKED_STAKE,
        total_locked - amount,
    );
    if !penalty.is_zero() {
        raw_undelegate(vm, delegator, to, penalty, true)?;
        burn_u2u(vm, penalty)?;
    }

    vm.emit(
        SFC_ADDRESS,
        &ISFC::UnlockedStake {
            delegator,
            validatorID: to,
            amount,
            penalty,
        },
    );
    Ok(penalty.abi_encode())
}

// ----------------------------------------------------------------------
// Reward stashing
// ----------------------------------------------------------------------

/// The last sealed epoch a delegation can still earn for.
fn highest_payable_epoch(vm: &mut Vm, to: U256) -> Result<U256, SfcError> {
    let sealed = vm.current_sealed_epoch()?;
    let deactivated_epoch = vm.validator_field(to, layout::validator::DEACTIVATED_EPOCH)?;
    if deactivated_epoch.is_zero() {
        Ok(sealed)
    } else {
        Ok(sealed.min(deactivated_epoch))
    }
}

/// Highest sealed epoch whose end falls inside the delegation's lockup
/// period. Binary search over snapshot end times.
fn highest_lockup_epoch(vm: &mut Vm, delegator: Address, to: U256) -> Result<U256, SfcError> {
    let from_epoch = vm.lockup_field(delegator, to, layout::lockup::FROM_EPOCH)?;
    if from_epoch.is_zero() {
        return Ok(U256::ZERO);
    }
    let lock_end = vm.lockup_field(delegator, to, layout::lockup::END_TIME)?;
    let sealed = vm.current_sealed_epoch()?;
    if from_epoch > sealed {
        return Ok(U256::ZERO);
    }
    if vm.snapshot_field(sealed, layout::snapshot::END_TIME)? <= lock_end {
        return Ok(sealed);
    }
    if vm.snapshot_field(from_epoch, layout::snapshot::END_TIME)? > lock_end {
        return Ok(U256::ZERO);
    }
    // Invariant: endTime(lo) <= lockEnd < endTime(hi).
    let mut lo = from_epoch;
    let mut hi = sealed;
    while hi - lo > U256::from(1) {
        let mid = (lo + hi) >> 1;
        if vm.snapshot_field(mid, layout::snapshot::END_TIME)? <= lock_end {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

/// Reward earned by `stake` between the accumulator marks of two epochs.
fn new_rewards_of(
    vm: &mut Vm,
    stake: U256,
    to: U256,
    from_epoch: U256,
    to_epoch: U256,
) -> Result<U256, SfcError> {
    if from_epoch >= to_epoch {
        return Ok(U256::ZERO);
    }
    let from_rate = vm.snapshot_map(
        from_epoch,
        layout::snapshot::ACCUMULATED_REWARD_PER_TOKEN,
        to,
    )?;
    let to_rate = vm.snapshot_map(to_epoch, layout::snapshot::ACCUMULATED_REWARD_PER_TOKEN, to)?;
    Ok(to_rate.saturating_sub(from_rate) * stake / crate::DECIMAL_UNIT)
}

/// Rewards accrued since the stash mark, split by the lockup window.
fn new_rewards(vm: &mut Vm, delegator: Address, to: U256) -> Result<Rewards, SfcError> {
    let stashed_until = vm.stashed_until(delegator, to)?;
    let payable_until = highest_payable_epoch(vm, to)?;
    let mut locked_until = highest_lockup_epoch(vm, delegator, to)?;
    if locked_until > payable_until {
        locked_until = payable_until;
    }
    if locked_until < stashed_until {
        locked_until = stashed_until;
    }

    let whole_stake = vm.stake_of(delegator, to)?;
    let locked_stake = vm.locked_stake(delegator, to)?;
    let unlocked = whole_stake.saturating_sub(locked_stake);
    let lockup_duration = vm.lockup_field(delegator, to, layout::lockup::DURATION)?;

    let consts = vm.consts()?;

    // Inside the lockup window the locked part earns at the lockup scale.
    let full_locked = new_rewards_of(vm, locked_stake, to, stashed_until, locked_until)?;
    let full_unlocked = new_rewards_of(vm, unlocked, to, stashed_until, locked_until)?;
    // Past the lockup window the whole stake earns unscaled.
    let full_after = new_rewards_of(vm, whole_stake, to, locked_until, payable_until)?;

    let reward = scale_lockup_reward(
        full_locked,
        lockup_duration,
        consts.max_lockup_duration,
        consts.unlocked_reward_ratio,
    )
    .add(scale_lockup_reward(
        full_unlocked,
        U256::ZERO,
        consts.max_lockup_duration,
        consts.unlocked_reward_ratio,
    ))
    .add(scale_lockup_reward(
        full_after,
        U256::ZERO,
        consts.max_lockup_duration,
        consts.unlocked_reward_ratio,
    ));
    Ok(reward)
}

/// Roll the stash forward. Returns whether anything new was stashed.
pub(crate) fn stash_rewards_internal(
    vm: &mut Vm,
    delegator: Address,
    to: U256,
) -> Result<bool, SfcError> {
    let non_stashed = new_rewards(vm, delegator, to)?;
    let payable_until = highest_payable_epoch(vm, to)?;
    vm.set_stashed_until(delegator, to, payable_until);

    if non_stashed.is_zero() {
        return Ok(false);
    }
    let stash = vm.rewards_stash(delegator, to)?.add(non_stashed);
    vm.set_rewards_stash(delegator, to, stash);
    let stashed_lockup = vm.stashed_lockup_rewards(delegator, to)?.add(non_stashed);
    vm.set_stashed_lockup_rewards(delegator, to, stashed_lockup);
    Ok(true)
}

/// Public `stashRewards` entry: reverts when there is nothing to move.
pub(crate) fn stash_rewards(vm: &mut Vm, delegator: Address, to: U256) -> HandlerResult {
    if !stash_rewards_internal(vm, delegator, to)? {
        return Err(SfcError::revert("nothing to stash"));
    }
    Ok(Vec::new())
}

/// Stash plus not-yet-stashed pending rewards, as one total.
pub(crate) fn pending_rewards(
    vm: &mut Vm,
    delegator: Address,
    to: U256,
) -> Result<U256, SfcError> {
    let stash = vm.rewards_stash(delegator, to)?;
    let fresh = new_rewards(vm, delegator, to)?;
    Ok(stash.add(fresh).total())
}

fn claim_rewards_internal(vm: &mut Vm, delegator: Address, to: U256) -> Result<Rewards, SfcError> {
    check_allowed_to_withdraw(vm, delegator, to)?;
    stash_rewards_internal(vm, delegator, to)?;
    let rewards = vm.rewards_stash(delegator, to)?;
    if rewards.is_zero() {
        return Err(SfcError::revert("zero rewards"));
    }
    vm.set_rewards_stash(delegator, to, Rewards::default());
    mint_native_token(vm, rewards.total())?;
    Ok(rewards)
}

pub(crate) fn claim_rewards(vm: &mut Vm, caller: Address, to: U256) -> HandlerResult {
    let delegator = caller;
    let rewards = claim_rewards_internal(vm, delegator, to)?;
    vm.state.transfer(SFC_ADDRESS, delegator, rewards.total())?;
    vm.emit(
        SFC_ADDRESS,
        &ISFC::ClaimedRewards {
            delegator,
            toValidatorID: to,
            lockupExtraReward: rewards.lockup_extra,
            lockupBaseReward: rewards.lockup_base,
            unlockedReward: rewards.unlocked,
        },
    );
    Ok(Vec::new())
}

pub(crate) fn restake_rewards(vm: &mut Vm, caller: Address, to: U256) -> HandlerResult {
    let delegator = caller;
    let rewards = claim_rewards_internal(vm, delegator, to)?;

    delegate_to(vm, delegator, to, rewards.total())?;
    let relocked = rewards.lockup_extra + rewards.lockup_base;
    if !relocked.is_zero() {
        let locked = vm.locked_stake(delegator, to)? + relocked;
        vm.set_lockup_field(delegator, to, layout::lockup::LOCKED_STAKE, locked);
    }

    vm.emit(
        SFC_ADDRESS,
        &ISFC::RestakedRewards {
            delegator,
            toValidatorID: to,
            lockupExtraReward: rewards.lockup_extra,
            lockupBaseReward: rewards.lockup_base,
            unlockedReward: rewards.unlocked,
        },
    );
    Ok(Vec::new())
}

/// `setGenesisDelegation` driver callback.
#[allow(clippy::too_many_arguments)]
pub(crate) fn set_genesis_delegation(
    vm: &mut Vm,
    delegator: Address,
    to: U256,
    stake: U256,
    locked_stake: U256,
    lockup_from_epoch: U256,
    lockup_end_time: U256,
    lockup_duration: U256,
    early_unlock_penalty: U256,
    rewards: U256,
) -> HandlerResult {
    raw_delegate(vm, delegator, to, stake, false)?;
    let mut stash = vm.rewards_stash(delegator, to)?;
    stash.unlocked = rewards;
    vm.set_rewards_stash(delegator, to, stash);
    mint_native_token(vm, stake)?;

    if !locked_stake.is_zero() {
        if locked_stake > stake {
            return Err(SfcError::revert("locked stake is greater than the whole stake"));
        }
        vm.set_lockup_field(delegator, to, layout::lockup::LOCKED_STAKE, locked_stake);
        vm.set_lockup_field(delegator, to, layout::lockup::FROM_EPOCH, lockup_from_epoch);
        vm.set_lockup_field(delegator, to, layout::lockup::END_TIME, lockup_end_time);
        vm.set_lockup_field(delegator, to, layout::lockup::DURATION, lockup_duration);
        let mut stashed = vm.stashed_lockup_rewards(delegator, to)?;
        stashed.lockup_extra = early_unlock_penalty;
        vm.set_stashed_lockup_rewards(delegator, to, stashed);
        vm.emit(
            SFC_ADDRESS,
            &ISFC::LockedUpStake {
                delegator,
                validatorID: to,
                duration: lockup_duration,
                amount: locked_stake,
            },
        );
    }
    Ok(Vec::new())
}

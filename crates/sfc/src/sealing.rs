//! Epoch-sealing engine.
//!
//! `sealEpochValidators` commits the next validator set into the epoch
//! snapshot and pushes the gas-price floor to the node; `sealEpoch` then
//! closes the epoch: offline penalties, base/tx rewards, the gas-price
//! control loop, and the snapshot finalization, in that order. Every read
//! and write on this path goes through the epoch cache so the two calls
//! share their working set; the cache dies with the `currentSealedEpoch`
//! sentinel write that commits the boundary.

use crate::abi::INodeDriverAuth;
use crate::delegation::mint_native_token;
use crate::error::{HandlerResult, SfcError};
use crate::rewards::{
    self, base_reward_weight, commission_of, raw_base_reward, raw_tx_reward,
    reward_per_token_delta, scale_lockup_reward, tx_reward_weight,
};
use crate::validator::{set_validator_deactivated, sync_validator};
use crate::vm::Vm;
use crate::{OFFLINE_BIT, SFC_ADDRESS};
use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use u2u_layout::sfc as layout;
use u2u_metrics::sfc as metrics;

/// Epoch-cache-aware read/write of a per-validator snapshot mapping entry.
fn seal_read_map(vm: &mut Vm, epoch: U256, offset: u64, id: U256) -> Result<U256, SfcError> {
    let slot = layout::snapshot_mapping(&vm.chain.slots, epoch, offset, id);
    // Previous-epoch snapshots are sealed history; the cache key is the
    // epoch being sealed regardless of which snapshot the slot belongs to.
    let sealing = vm.chain.epoch_cache.lock().epoch().unwrap_or(epoch);
    vm.seal_read(sealing, slot)
}

fn seal_write_map(vm: &mut Vm, epoch: U256, offset: u64, id: U256, value: U256) {
    let slot = layout::snapshot_mapping(&vm.chain.slots, epoch, offset, id);
    let sealing = vm.chain.epoch_cache.lock().epoch().unwrap_or(epoch);
    vm.seal_write(sealing, slot, value);
}

fn seal_read_field(vm: &mut Vm, epoch: U256, offset: u64) -> Result<U256, SfcError> {
    let slot = layout::snapshot_field(&vm.chain.slots, epoch, offset);
    let sealing = vm.chain.epoch_cache.lock().epoch().unwrap_or(epoch);
    vm.seal_read(sealing, slot)
}

fn seal_write_field(vm: &mut Vm, epoch: U256, offset: u64, value: U256) {
    let slot = layout::snapshot_field(&vm.chain.slots, epoch, offset);
    let sealing = vm.chain.epoch_cache.lock().epoch().unwrap_or(epoch);
    vm.seal_write(sealing, slot, value);
}

/// `sealEpochValidators(nextValidatorIDs)` — driver-only.
pub(crate) fn seal_epoch_validators(vm: &mut Vm, next: &[U256]) -> HandlerResult {
    let epoch = vm.current_epoch()?;
    vm.chain.epoch_cache.lock().begin(epoch);

    let mut snapshot_total = seal_read_field(vm, epoch, layout::snapshot::TOTAL_STAKE)?;
    for id in next {
        let received = vm.validator_received_stake(*id)?;
        seal_write_map(vm, epoch, layout::snapshot::RECEIVED_STAKE, *id, received);
        snapshot_total += received;
    }
    seal_write_field(vm, epoch, layout::snapshot::TOTAL_STAKE, snapshot_total);
    vm.set_snapshot_validator_ids(epoch, next)?;

    // Propagate the freshly clamped floor into the node's tx pool.
    let min_gas_price = vm.min_gas_price()?;
    let driver_auth = vm.node_driver_auth()?;
    vm.call_sub(
        driver_auth,
        SFC_ADDRESS,
        U256::ZERO,
        INodeDriverAuth::updateMinGasPriceCall {
            minGasPrice: min_gas_price,
        }
        .abi_encode(),
    )?;

    tracing::debug!(epoch = %epoch, validators = next.len(), "sealed epoch validator set");
    Ok(Vec::new())
}

/// `sealEpoch(offlineTime, offlineBlocks, uptimes, originatedTxsFee,
/// epochGas)` — driver-only, atomic.
pub(crate) fn seal_epoch(
    vm: &mut Vm,
    offline_time: &[U256],
    offline_blocks: &[U256],
    uptimes: &[U256],
    originated_txs_fee: &[U256],
    epoch_gas: U256,
) -> HandlerResult {
    let epoch = vm.current_epoch()?;
    let prev_epoch = vm.current_sealed_epoch()?;
    vm.chain.epoch_cache.lock().begin(epoch);

    let validator_ids = vm.snapshot_validator_ids(epoch)?;
    if offline_time.len() != validator_ids.len()
        || offline_blocks.len() != validator_ids.len()
        || uptimes.len() != validator_ids.len()
        || originated_txs_fee.len() != validator_ids.len()
    {
        return Err(SfcError::EmptyRevert);
    }

    seal_offline(vm, epoch, &validator_ids, offline_time, offline_blocks)?;

    let prev_end = seal_read_field(vm, prev_epoch, layout::snapshot::END_TIME)?;
    let epoch_duration = if vm.now() > prev_end {
        vm.now() - prev_end
    } else {
        U256::from(1)
    };
    seal_rewards(
        vm,
        epoch,
        prev_epoch,
        epoch_duration,
        &validator_ids,
        uptimes,
        originated_txs_fee,
    )?;
    seal_min_gas_price(vm, epoch_duration, epoch_gas)?;

    // Commit the boundary; the sentinel write tears the epoch cache down.
    vm.set_current_sealed_epoch(epoch);
    let now = vm.now();
    vm.set_snapshot_field(epoch, layout::snapshot::END_TIME, now);
    let base_reward_per_second = vm.consts()?.base_reward_per_second;
    vm.set_snapshot_field(
        epoch,
        layout::snapshot::BASE_REWARD_PER_SECOND,
        base_reward_per_second,
    );
    let total_supply = vm.total_supply()?;
    vm.set_snapshot_field(epoch, layout::snapshot::TOTAL_SUPPLY, total_supply);

    metrics::SFC_EPOCHS_SEALED.inc();
    metrics::SFC_SEAL_VALIDATORS
        .with_label_values(&[])
        .observe(validator_ids.len() as f64);
    tracing::info!(
        epoch = %epoch,
        validators = validator_ids.len(),
        duration = %epoch_duration,
        "sealed epoch"
    );
    Ok(Vec::new())
}

/// Offline pass: punish validators past both offline thresholds, record the
/// per-validator offline counters into the snapshot.
fn seal_offline(
    vm: &mut Vm,
    epoch: U256,
    validator_ids: &[U256],
    offline_time: &[U256],
    offline_blocks: &[U256],
) -> Result<(), SfcError> {
    let consts = vm.consts()?;
    for (i, id) in validator_ids.iter().enumerate() {
        if offline_blocks[i] > consts.offline_penalty_threshold_blocks_num
            && offline_time[i] >= consts.offline_penalty_threshold_time
        {
            set_validator_deactivated(vm, *id, OFFLINE_BIT)?;
            sync_validator(vm, *id, false)?;
        }
        seal_write_map(vm, epoch, layout::snapshot::OFFLINE_TIME, *id, offline_time[i]);
        seal_write_map(
            vm,
            epoch,
            layout::snapshot::OFFLINE_BLOCKS,
            *id,
            offline_blocks[i],
        );
    }
    Ok(())
}

/// Rewards pass: weights, raw rewards, commission split, per-token
/// accumulators, epoch fee accounting and the treasury cut.
fn seal_rewards(
    vm: &mut Vm,
    epoch: U256,
    prev_epoch: U256,
    epoch_duration: U256,
    validator_ids: &[U256],
    uptimes: &[U256],
    accumulated_originated_txs_fee: &[U256],
) -> Result<(), SfcError> {
    let consts = vm.consts()?;
    let count = validator_ids.len();

    // First sweep: weights and the epoch fee.
    let mut tx_weights = Vec::with_capacity(count);
    let mut base_weights = Vec::with_capacity(count);
    let mut total_tx_weight = U256::ZERO;
    let mut total_base_weight = U256::ZERO;
    let mut epoch_fee = U256::ZERO;
    for (i, id) in validator_ids.iter().enumerate() {
        let prev_fee = seal_read_map(
            vm,
            prev_epoch,
            layout::snapshot::ACCUMULATED_ORIGINATED_TXS_FEE,
            *id,
        )?;
        let originated = accumulated_originated_txs_fee[i].saturating_sub(prev_fee);
        let tx_weight = tx_reward_weight(originated, uptimes[i], epoch_duration);
        tx_weights.push(tx_weight);
        total_tx_weight += tx_weight;
        epoch_fee += originated;

        let received = seal_read_map(vm, epoch, layout::snapshot::RECEIVED_STAKE, *id)?;
        let base_weight = base_reward_weight(received, uptimes[i], epoch_duration);
        base_weights.push(base_weight);
        total_base_weight += base_weight;
    }

    // Second sweep: per-validator rewards and accumulators.
    for (i, id) in validator_ids.iter().enumerate() {
        let raw_reward = raw_base_reward(
            epoch_duration,
            consts.base_reward_per_second,
            base_weights[i],
            total_base_weight,
        ) + raw_tx_reward(
            epoch_fee,
            tx_weights[i],
            total_tx_weight,
            consts.burnt_fee_share,
            consts.treasury_fee_share,
        );

        let commission_full = commission_of(raw_reward, consts.validator_commission);
        let auth = vm.validator_auth(*id)?;
        let self_stake = vm.stake_of(auth, *id)?;
        if !self_stake.is_zero() {
            let locked = vm.locked_stake(auth, *id)?;
            let locked_commission = commission_full * locked / self_stake;
            let unlocked_commission = commission_full - locked_commission;
            let duration = vm.lockup_field(auth, *id, layout::lockup::DURATION)?;
            let reward = scale_lockup_reward(
                locked_commission,
                duration,
                consts.max_lockup_duration,
                consts.unlocked_reward_ratio,
            )
            .add(scale_lockup_reward(
                unlocked_commission,
                U256::ZERO,
                consts.max_lockup_duration,
                consts.unlocked_reward_ratio,
            ));

            let stash = vm.rewards_stash(auth, *id)?.add(reward);
            vm.set_rewards_stash(auth, *id, stash);
            let stashed_lockup = vm.stashed_lockup_rewards(auth, *id)?.add(reward);
            vm.set_stashed_lockup_rewards(auth, *id, stashed_lockup);
        }

        let delegators_reward = raw_reward - commission_full;
        let received = seal_read_map(vm, epoch, layout::snapshot::RECEIVED_STAKE, *id)?;
        let delta = reward_per_token_delta(delegators_reward, received);
        let prev_rate = seal_read_map(
            vm,
            prev_epoch,
            layout::snapshot::ACCUMULATED_REWARD_PER_TOKEN,
            *id,
        )?;
        seal_write_map(
            vm,
            epoch,
            layout::snapshot::ACCUMULATED_REWARD_PER_TOKEN,
            *id,
            prev_rate + delta,
        );

        seal_write_map(
            vm,
            epoch,
            layout::snapshot::ACCUMULATED_ORIGINATED_TXS_FEE,
            *id,
            accumulated_originated_txs_fee[i],
        );
        let prev_uptime = seal_read_map(vm, prev_epoch, layout::snapshot::ACCUMULATED_UPTIME, *id)?;
        seal_write_map(
            vm,
            epoch,
            layout::snapshot::ACCUMULATED_UPTIME,
            *id,
            prev_uptime + uptimes[i],
        );
    }

    seal_write_field(vm, epoch, layout::snapshot::EPOCH_FEE, epoch_fee);
    seal_write_field(
        vm,
        epoch,
        layout::snapshot::TOTAL_BASE_REWARD_WEIGHT,
        total_base_weight,
    );
    seal_write_field(
        vm,
        epoch,
        layout::snapshot::TOTAL_TX_REWARD_WEIGHT,
        total_tx_weight,
    );

    // The epoch fee leaves the circulating supply; the treasury share is
    // minted back and transferred out.
    let supply = vm.total_supply()?;
    vm.set_total_supply(supply.saturating_sub(epoch_fee));

    let treasury = vm.treasury_address()?;
    if treasury != alloy_primitives::Address::ZERO {
        let fee_share = epoch_fee * consts.treasury_fee_share / crate::DECIMAL_UNIT;
        if !fee_share.is_zero() {
            mint_native_token(vm, fee_share)?;
            // A refusing treasury aborts the whole seal.
            vm.call_sub(treasury, SFC_ADDRESS, fee_share, Vec::new())?;
        }
    }
    Ok(())
}

/// Gas-price control loop, applied to the stored floor.
fn seal_min_gas_price(vm: &mut Vm, epoch_duration: U256, epoch_gas: U256) -> Result<(), SfcError> {
    let consts = vm.consts()?;
    let current = vm.min_gas_price()?;
    let next = rewards::next_min_gas_price(
        current,
        epoch_duration,
        epoch_gas,
        consts.target_gas_power_per_second,
        consts.gas_price_balancing_counterweight,
    );
    vm.set_min_gas_price(next);
    metrics::SFC_MIN_GAS_PRICE.set(next.saturating_to::<u128>() as f64);
    Ok(())
}

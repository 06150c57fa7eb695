//! Validator lifecycle: creation, deactivation, active-set sync.

use crate::abi::{INodeDriverAuth, ISFC};
use crate::delegation;
use crate::error::{HandlerResult, SfcError};
use crate::vm::Vm;
use crate::{DECIMAL_UNIT, OK_STATUS, SFC_ADDRESS, WITHDRAWN_BIT};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use u2u_layout::codec::address_to_word;
use u2u_layout::sfc as layout;
use u2u_metrics::sfc as metrics;

/// Self-stake of a validator: the delegation from its own auth address.
pub(crate) fn self_stake(vm: &mut Vm, id: U256) -> Result<U256, SfcError> {
    let auth = vm.validator_auth(id)?;
    vm.stake_of(auth, id)
}

/// Delegated-stake rule: `receivedStake ≤ selfStake·maxDelegatedRatio/unit`.
/// Exactly-equal counts as within the limit.
pub(crate) fn delegations_within_limit(vm: &mut Vm, id: U256) -> Result<bool, SfcError> {
    let self_stake = self_stake(vm, id)?;
    let received = vm.validator_received_stake(id)?;
    let limit = self_stake * vm.consts()?.max_delegated_ratio / DECIMAL_UNIT;
    Ok(received <= limit)
}

/// `createValidator(bytes pubkey) payable`
pub(crate) fn create_validator(
    vm: &mut Vm,
    caller: Address,
    value: U256,
    pubkey: &[u8],
) -> HandlerResult {
    if pubkey.is_empty() {
        return Err(SfcError::revert("empty pubkey"));
    }
    if value < vm.consts()?.min_self_stake {
        return Err(SfcError::revert("insufficient self-stake"));
    }
    if !vm.validator_id_of(caller)?.is_zero() {
        return Err(SfcError::revert("validator already exists"));
    }

    let id = vm.last_validator_id()? + U256::from(1);
    vm.set_last_validator_id(id);
    let created_epoch = vm.current_epoch()?;
    let created_time = vm.now();
    raw_create_validator(
        vm,
        caller,
        id,
        pubkey,
        OK_STATUS,
        created_epoch,
        created_time,
        U256::ZERO,
        U256::ZERO,
    )?;
    delegation::delegate_to(vm, caller, id, value)?;
    Ok(Vec::new())
}

/// `setGenesisValidator` driver callback: create with arbitrary status.
#[allow(clippy::too_many_arguments)]
pub(crate) fn set_genesis_validator(
    vm: &mut Vm,
    auth: Address,
    id: U256,
    pubkey: &[u8],
    status: U256,
    created_epoch: U256,
    created_time: U256,
    deactivated_epoch: U256,
    deactivated_time: U256,
) -> HandlerResult {
    raw_create_validator(
        vm,
        auth,
        id,
        pubkey,
        status,
        created_epoch,
        created_time,
        deactivated_epoch,
        deactivated_time,
    )?;
    if vm.last_validator_id()? < id {
        vm.set_last_validator_id(id);
    }
    Ok(Vec::new())
}

#[allow(clippy::too_many_arguments)]
fn raw_create_validator(
    vm: &mut Vm,
    auth: Address,
    id: U256,
    pubkey: &[u8],
    status: U256,
    created_epoch: U256,
    created_time: U256,
    deactivated_epoch: U256,
    deactivated_time: U256,
) -> Result<(), SfcError> {
    if vm.validator_exists(id)? {
        return Err(SfcError::revert("validator already exists"));
    }
    vm.set_validator_id_of(auth, id);
    vm.set_validator_field(id, layout::validator::STATUS, status);
    vm.set_validator_field(id, layout::validator::CREATED_EPOCH, created_epoch);
    vm.set_validator_field(id, layout::validator::CREATED_TIME, created_time);
    vm.set_validator_field(id, layout::validator::DEACTIVATED_EPOCH, deactivated_epoch);
    vm.set_validator_field(id, layout::validator::DEACTIVATED_TIME, deactivated_time);
    vm.set_validator_field(id, layout::validator::AUTH, address_to_word(auth));
    vm.set_validator_pubkey(id, pubkey)?;

    vm.emit(
        SFC_ADDRESS,
        &ISFC::CreatedValidator {
            validatorID: id,
            auth,
            createdEpoch: created_epoch,
            createdTime: created_time,
        },
    );
    if !deactivated_epoch.is_zero() {
        vm.emit(
            SFC_ADDRESS,
            &ISFC::DeactivatedValidator {
                validatorID: id,
                deactivatedEpoch: deactivated_epoch,
                deactivatedTime: deactivated_time,
            },
        );
    }
    if status != OK_STATUS {
        vm.emit(
            SFC_ADDRESS,
            &ISFC::ChangedValidatorStatus {
                validatorID: id,
                status,
            },
        );
    }
    metrics::SFC_VALIDATORS_CREATED.inc();
    Ok(())
}

/// `deactivateValidator(validatorID, status)` — driver-only entry.
pub(crate) fn deactivate_validator(vm: &mut Vm, id: U256, status: U256) -> HandlerResult {
    if status == OK_STATUS {
        return Err(SfcError::revert("wrong status"));
    }
    set_validator_deactivated(vm, id, status)?;
    sync_validator(vm, id, false)?;
    let auth = vm.validator_auth(id)?;
    delegation::recount_votes(vm, auth, auth, false)?;
    Ok(Vec::new())
}

/// OR-merge status bits; on the first transition to nonzero status, record
/// the deactivation epoch/time and pull the stake out of the active total.
pub(crate) fn set_validator_deactivated(
    vm: &mut Vm,
    id: U256,
    bits: U256,
) -> Result<(), SfcError> {
    let status = vm.validator_status(id)?;
    if status == OK_STATUS && bits != OK_STATUS {
        let received = vm.validator_received_stake(id)?;
        let active = vm.total_active_stake()?;
        vm.set_total_active_stake(active.saturating_sub(received));
    }

    let merged = status | bits;
    if merged != status {
        vm.set_validator_field(id, layout::validator::STATUS, merged);
        if vm
            .validator_field(id, layout::validator::DEACTIVATED_EPOCH)?
            .is_zero()
        {
            let epoch = vm.current_epoch()?;
            let time = vm.now();
            vm.set_validator_field(id, layout::validator::DEACTIVATED_EPOCH, epoch);
            vm.set_validator_field(id, layout::validator::DEACTIVATED_TIME, time);
            vm.emit(
                SFC_ADDRESS,
                &ISFC::DeactivatedValidator {
                    validatorID: id,
                    deactivatedEpoch: epoch,
                    deactivatedTime: time,
                },
            );
            metrics::SFC_VALIDATORS_DEACTIVATED.inc();
        }
        vm.emit(
            SFC_ADDRESS,
            &ISFC::ChangedValidatorStatus {
                validatorID: id,
                status: merged,
            },
        );
    }
    Ok(())
}

/// Recompute the active predicate and push the resulting weight to the node.
///
/// An active validator that violates the self-stake or delegation-ratio rule
/// is deactivated with the withdrawn bit; a validator whose only status bit
/// is the withdrawn bit and which satisfies the rules again is reactivated.
pub(crate) fn sync_validator(vm: &mut Vm, id: U256, sync_pubkey: bool) -> Result<(), SfcError> {
    if !vm.validator_exists(id)? {
        return Err(SfcError::revert("validator doesn't exist"));
    }

    let stake = self_stake(vm, id)?;
    let rules_ok = !stake.is_zero()
        && stake >= vm.consts()?.min_self_stake
        && delegations_within_limit(vm, id)?;
    let status = vm.validator_status(id)?;

    if !rules_ok && status == OK_STATUS {
        set_validator_deactivated(vm, id, WITHDRAWN_BIT)?;
    } else if rules_ok && status == WITHDRAWN_BIT {
        let received = vm.validator_received_stake(id)?;
        vm.set_validator_field(id, layout::validator::STATUS, OK_STATUS);
        vm.set_validator_field(id, layout::validator::DEACTIVATED_EPOCH, U256::ZERO);
        vm.set_validator_field(id, layout::validator::DEACTIVATED_TIME, U256::ZERO);
        let active = vm.total_active_stake()?;
        vm.set_total_active_stake(active + received);
        vm.emit(
            SFC_ADDRESS,
            &ISFC::ChangedValidatorStatus {
                validatorID: id,
                status: OK_STATUS,
            },
        );
    }

    let status = vm.validator_status(id)?;
    let weight = if status == OK_STATUS {
        vm.validator_received_stake(id)?
    } else {
        U256::ZERO
    };
    let driver_auth = vm.node_driver_auth()?;
    vm.call_sub(
        driver_auth,
        SFC_ADDRESS,
        U256::ZERO,
        INodeDriverAuth::updateValidatorWeightCall {
            validatorID: id,
            value: weight,
        }
        .abi_encode(),
    )?;
    if sync_pubkey && !weight.is_zero() {
        let pubkey = vm.validator_pubkey(id)?;
        vm.call_sub(
            driver_auth,
            SFC_ADDRESS,
            U256::ZERO,
            INodeDriverAuth::updateValidatorPubkeyCall {
                validatorID: id,
                pubkey: pubkey.into(),
            }
            .abi_encode(),
        )?;
    }
    Ok(())
}

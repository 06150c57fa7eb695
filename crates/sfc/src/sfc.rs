//! SFC precompile dispatcher: selector table, views, administration, and the
//! bridges into the delegation, validator and sealing engines.

use crate::abi::{decode_call, ISFC};
use crate::error::{into_precompile_result, HandlerResult, SfcError};
use crate::gas::{self, guarded};
use crate::rewards::slashing_penalty;
use crate::vm::{CallCtx, Vm};
use crate::{delegation, sealing, validator, DOUBLESIGN_BIT, SFC_ADDRESS};
use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use revm::precompile::PrecompileResult;
use u2u_layout::sfc as layout;
use u2u_metrics::sfc as metrics;

/// SFC contract version, `bytes3("305")`.
const VERSION: FixedBytes<3> = FixedBytes(*b"305");

fn only_owner(vm: &mut Vm, caller: Address) -> Result<(), SfcError> {
    vm.require_owner(SFC_ADDRESS, layout::slot::OWNER, caller)
}

fn only_driver(vm: &mut Vm, caller: Address) -> Result<(), SfcError> {
    if caller != vm.node_driver_auth()? {
        return Err(SfcError::revert("caller is not the NodeDriverAuth contract"));
    }
    Ok(())
}

fn initialize(vm: &mut Vm, call: ISFC::initializeCall) -> HandlerResult {
    if vm.sfc_initialized()? {
        return Err(SfcError::revert("already initialized"));
    }
    vm.set_sfc_initialized();
    vm.write_address(SFC_ADDRESS, layout::slot::OWNER, call.owner);
    vm.emit(
        SFC_ADDRESS,
        &ISFC::OwnershipTransferred {
            previousOwner: Address::ZERO,
            newOwner: call.owner,
        },
    );
    vm.set_current_sealed_epoch(call.sealedEpoch);
    vm.write_address(SFC_ADDRESS, layout::slot::NODE_DRIVER_AUTH, call.nodeDriver);
    vm.write_address(SFC_ADDRESS, layout::slot::LIB_ADDRESS, call.lib);
    vm.write_address(SFC_ADDRESS, layout::slot::CONSTS_MANAGER, call.consts);
    vm.set_total_supply(call.totalSupply);
    let now = vm.now();
    vm.set_snapshot_field(call.sealedEpoch, layout::snapshot::END_TIME, now);
    vm.set_min_gas_price(crate::rewards::MIN_GAS_PRICE_FLOOR);
    Ok(Vec::new())
}

fn transfer_ownership(vm: &mut Vm, caller: Address, new_owner: Address) -> HandlerResult {
    only_owner(vm, caller)?;
    if new_owner == Address::ZERO {
        return Err(SfcError::revert("Ownable: new owner is the zero address"));
    }
    let previous = vm.contract_owner(SFC_ADDRESS, layout::slot::OWNER)?;
    vm.write_address(SFC_ADDRESS, layout::slot::OWNER, new_owner);
    vm.emit(
        SFC_ADDRESS,
        &ISFC::OwnershipTransferred {
            previousOwner: previous,
            newOwner: new_owner,
        },
    );
    Ok(Vec::new())
}

fn renounce_ownership(vm: &mut Vm, caller: Address) -> HandlerResult {
    only_owner(vm, caller)?;
    let previous = vm.contract_owner(SFC_ADDRESS, layout::slot::OWNER)?;
    vm.write_address(SFC_ADDRESS, layout::slot::OWNER, Address::ZERO);
    vm.emit(
        SFC_ADDRESS,
        &ISFC::OwnershipTransferred {
            previousOwner: previous,
            newOwner: Address::ZERO,
        },
    );
    Ok(Vec::new())
}

fn mint_u2u(vm: &mut Vm, caller: Address, call: ISFC::mintU2UCall) -> HandlerResult {
    only_owner(vm, caller)?;
    delegation::mint_native_token(vm, call.amount)?;
    vm.state.transfer(SFC_ADDRESS, call.receiver, call.amount)?;
    vm.emit(
        SFC_ADDRESS,
        &ISFC::InflatedU2U {
            receiver: call.receiver,
            amount: call.amount,
            justification: call.justification,
        },
    );
    Ok(Vec::new())
}

fn update_slashing_refund_ratio(
    vm: &mut Vm,
    caller: Address,
    id: U256,
    ratio: U256,
) -> HandlerResult {
    only_owner(vm, caller)?;
    if (vm.validator_status(id)? & DOUBLESIGN_BIT).is_zero() {
        return Err(SfcError::revert("validator isn't slashed"));
    }
    if ratio > crate::DECIMAL_UNIT {
        return Err(SfcError::revert("must be less than or equal to 1.0"));
    }
    vm.set_slashing_refund_ratio(id, ratio);
    vm.emit(
        SFC_ADDRESS,
        &ISFC::UpdatedSlashingRefundRatio {
            validatorID: id,
            refundRatio: ratio,
        },
    );
    Ok(Vec::new())
}

fn update_address_slot(
    vm: &mut Vm,
    caller: Address,
    slot: U256,
    value: Address,
) -> HandlerResult {
    only_owner(vm, caller)?;
    vm.write_address(SFC_ADDRESS, slot, value);
    if slot == layout::slot::CONSTS_MANAGER {
        vm.chain.constants.mark_dirty();
    }
    Ok(Vec::new())
}

fn get_validator(vm: &mut Vm, id: U256) -> HandlerResult {
    let status = vm.validator_status(id)?;
    let deactivated_time = vm.validator_field(id, layout::validator::DEACTIVATED_TIME)?;
    let deactivated_epoch = vm.validator_field(id, layout::validator::DEACTIVATED_EPOCH)?;
    let received = vm.validator_received_stake(id)?;
    let created_epoch = vm.validator_field(id, layout::validator::CREATED_EPOCH)?;
    let created_time = vm.validator_field(id, layout::validator::CREATED_TIME)?;
    let auth = vm.validator_auth(id)?;
    Ok((
        status,
        deactivated_time,
        deactivated_epoch,
        received,
        created_epoch,
        created_time,
        auth,
    )
        .abi_encode_params())
}

fn get_epoch_snapshot(vm: &mut Vm, epoch: U256) -> HandlerResult {
    Ok((
        vm.snapshot_field(epoch, layout::snapshot::END_TIME)?,
        vm.snapshot_field(epoch, layout::snapshot::EPOCH_FEE)?,
        vm.snapshot_field(epoch, layout::snapshot::TOTAL_BASE_REWARD_WEIGHT)?,
        vm.snapshot_field(epoch, layout::snapshot::TOTAL_TX_REWARD_WEIGHT)?,
        vm.snapshot_field(epoch, layout::snapshot::BASE_REWARD_PER_SECOND)?,
        vm.snapshot_field(epoch, layout::snapshot::TOTAL_STAKE)?,
        vm.snapshot_field(epoch, layout::snapshot::TOTAL_SUPPLY)?,
    )
        .abi_encode_params())
}

pub(crate) fn dispatch(
    vm: &mut Vm,
    ctx: CallCtx,
    input: &[u8],
    gas_limit: u64,
) -> PrecompileResult {
    if input.len() < 4 {
        // The bytecode contract's fallback delegated into libAddress; the
        // delegation chain is not resolved natively.
        return into_precompile_result(0, Err(SfcError::EmptyRevert));
    }
    let selector = [input[0], input[1], input[2], input[3]];

    let track = |method: &str| {
        metrics::SFC_CALLS.with_label_values(&["sfc", method]).inc();
    };

    let (cost, outcome): (u64, HandlerResult) = if selector == ISFC::initializeCall::SELECTOR {
        track("initialize");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            decode_call::<ISFC::initializeCall>(input).and_then(|call| initialize(vm, call))
        })
    }
    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------
    else if selector == ISFC::ownerCall::SELECTOR {
        track("owner");
        guarded(gas_limit, gas::READ, || {
            Ok(vm
                .contract_owner(SFC_ADDRESS, layout::slot::OWNER)?
                .abi_encode())
        })
    } else if selector == ISFC::versionCall::SELECTOR {
        track("version");
        guarded(gas_limit, gas::READ, || Ok(VERSION.abi_encode()))
    } else if selector == ISFC::currentSealedEpochCall::SELECTOR {
        track("currentSealedEpoch");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.current_sealed_epoch()?.abi_encode())
        })
    } else if selector == ISFC::currentEpochCall::SELECTOR {
        track("currentEpoch");
        guarded(gas_limit, gas::READ, || Ok(vm.current_epoch()?.abi_encode()))
    } else if selector == ISFC::lastValidatorIDCall::SELECTOR {
        track("lastValidatorID");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.last_validator_id()?.abi_encode())
        })
    } else if selector == ISFC::totalStakeCall::SELECTOR {
        track("totalStake");
        guarded(gas_limit, gas::READ, || Ok(vm.total_stake()?.abi_encode()))
    } else if selector == ISFC::totalActiveStakeCall::SELECTOR {
        track("totalActiveStake");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.total_active_stake()?.abi_encode())
        })
    } else if selector == ISFC::totalSlashedStakeCall::SELECTOR {
        track("totalSlashedStake");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.total_slashed_stake()?.abi_encode())
        })
    } else if selector == ISFC::totalSupplyCall::SELECTOR {
        track("totalSupply");
        guarded(gas_limit, gas::READ, || Ok(vm.total_supply()?.abi_encode()))
    } else if selector == ISFC::minGasPriceCall::SELECTOR {
        track("minGasPrice");
        guarded(gas_limit, gas::READ, || Ok(vm.min_gas_price()?.abi_encode()))
    } else if selector == ISFC::treasuryAddressCall::SELECTOR {
        track("treasuryAddress");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.treasury_address()?.abi_encode())
        })
    } else if selector == ISFC::stakeTokenizerAddressCall::SELECTOR {
        track("stakeTokenizerAddress");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.stake_tokenizer_address()?.abi_encode())
        })
    } else if selector == ISFC::voteBookAddressCall::SELECTOR {
        track("voteBookAddress");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.vote_book_address()?.abi_encode())
        })
    } else if selector == ISFC::constsAddressCall::SELECTOR {
        track("constsAddress");
        guarded(gas_limit, gas::READ, || {
            Ok(vm.consts_manager_address()?.abi_encode())
        })
    } else if selector == ISFC::getValidatorCall::SELECTOR {
        track("getValidator");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getValidatorCall>(input)?;
            get_validator(vm, call.validatorID)
        })
    } else if selector == ISFC::getValidatorIDCall::SELECTOR {
        track("getValidatorID");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getValidatorIDCall>(input)?;
            Ok(vm.validator_id_of(call.auth)?.abi_encode())
        })
    } else if selector == ISFC::getValidatorPubkeyCall::SELECTOR {
        track("getValidatorPubkey");
        guarded(gas_limit, gas::READ + gas::PER_WORD * 4, || {
            let call = decode_call::<ISFC::getValidatorPubkeyCall>(input)?;
            let pubkey = vm.validator_pubkey(call.validatorID)?;
            Ok(Bytes::from(pubkey).abi_encode())
        })
    } else if selector == ISFC::getSelfStakeCall::SELECTOR {
        track("getSelfStake");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getSelfStakeCall>(input)?;
            Ok(validator::self_stake(vm, call.validatorID)?.abi_encode())
        })
    } else if selector == ISFC::isSlashedCall::SELECTOR {
        track("isSlashed");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::isSlashedCall>(input)?;
            let cheater = !(vm.validator_status(call.validatorID)? & DOUBLESIGN_BIT).is_zero();
            Ok(cheater.abi_encode())
        })
    } else if selector == ISFC::slashingRefundRatioCall::SELECTOR {
        track("slashingRefundRatio");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::slashingRefundRatioCall>(input)?;
            Ok(vm.slashing_refund_ratio(call.validatorID)?.abi_encode())
        })
    } else if selector == ISFC::getSlashingPenaltyCall::SELECTOR {
        track("getSlashingPenalty");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getSlashingPenaltyCall>(input)?;
            Ok(slashing_penalty(call.amount, call.isCheater, call.refundRatio).abi_encode())
        })
    } else if selector == ISFC::getStakeCall::SELECTOR {
        track("getStake");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getStakeCall>(input)?;
            Ok(vm.stake_of(call.delegator, call.toValidatorID)?.abi_encode())
        })
    } else if selector == ISFC::getLockupInfoCall::SELECTOR {
        track("getLockupInfo");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getLockupInfoCall>(input)?;
            let (d, v) = (call.delegator, call.toValidatorID);
            Ok((
                vm.lockup_field(d, v, layout::lockup::LOCKED_STAKE)?,
                vm.lockup_field(d, v, layout::lockup::FROM_EPOCH)?,
                vm.lockup_field(d, v, layout::lockup::END_TIME)?,
                vm.lockup_field(d, v, layout::lockup::DURATION)?,
            )
                .abi_encode_params())
        })
    } else if selector == ISFC::getLockedStakeCall::SELECTOR {
        track("getLockedStake");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getLockedStakeCall>(input)?;
            if delegation::is_locked_up(vm, call.delegator, call.toValidatorID)? {
                Ok(vm
                    .locked_stake(call.delegator, call.toValidatorID)?
                    .abi_encode())
            } else {
                Ok(U256::ZERO.abi_encode())
            }
        })
    } else if selector == ISFC::getUnlockedStakeCall::SELECTOR {
        track("getUnlockedStake");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getUnlockedStakeCall>(input)?;
            Ok(delegation::unlocked_stake(vm, call.delegator, call.toValidatorID)?.abi_encode())
        })
    } else if selector == ISFC::isLockedUpCall::SELECTOR {
        track("isLockedUp");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::isLockedUpCall>(input)?;
            Ok(delegation::is_locked_up(vm, call.delegator, call.toValidatorID)?.abi_encode())
        })
    } else if selector == ISFC::getWithdrawalRequestCall::SELECTOR {
        track("getWithdrawalRequest");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getWithdrawalRequestCall>(input)?;
            let (d, v, w) = (call.delegator, call.toValidatorID, call.wrID);
            Ok((
                vm.withdrawal_field(d, v, w, layout::withdrawal::EPOCH)?,
                vm.withdrawal_field(d, v, w, layout::withdrawal::TIME)?,
                vm.withdrawal_field(d, v, w, layout::withdrawal::AMOUNT)?,
            )
                .abi_encode_params())
        })
    } else if selector == ISFC::getStashedLockupRewardsCall::SELECTOR {
        track("getStashedLockupRewards");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getStashedLockupRewardsCall>(input)?;
            let stashed = vm.stashed_lockup_rewards(call.delegator, call.toValidatorID)?;
            Ok((stashed.lockup_extra, stashed.lockup_base, stashed.unlocked).abi_encode_params())
        })
    } else if selector == ISFC::stashedRewardsUntilEpochCall::SELECTOR {
        track("stashedRewardsUntilEpoch");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::stashedRewardsUntilEpochCall>(input)?;
            Ok(vm.stashed_until(call.delegator, call.toValidatorID)?.abi_encode())
        })
    } else if selector == ISFC::pendingRewardsCall::SELECTOR {
        track("pendingRewards");
        guarded(gas_limit, gas::READ * 4, || {
            let call = decode_call::<ISFC::pendingRewardsCall>(input)?;
            Ok(delegation::pending_rewards(vm, call.delegator, call.toValidatorID)?.abi_encode())
        })
    } else if selector == ISFC::getEpochSnapshotCall::SELECTOR {
        track("getEpochSnapshot");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getEpochSnapshotCall>(input)?;
            get_epoch_snapshot(vm, call.epoch)
        })
    } else if selector == ISFC::getEpochValidatorIDsCall::SELECTOR {
        track("getEpochValidatorIDs");
        guarded(gas_limit, gas::READ, || {
            let call = decode_call::<ISFC::getEpochValidatorIDsCall>(input)?;
            let ids = vm.snapshot_validator_ids(call.epoch)?;
            Ok(ids.abi_encode())
        })
    } else if let Some(offset) = epoch_map_view(selector) {
        track("epochSnapshotAccumulator");
        guarded(gas_limit, gas::READ, || {
            // All six accumulator getters share the (epoch, validatorID)
            // argument shape; decode past the selector.
            let call = ISFC::getEpochReceivedStakeCall::abi_decode_raw(&input[4..])
                .map_err(|_| SfcError::EmptyRevert)?;
            Ok(vm
                .snapshot_map(call.epoch, offset, call.validatorID)?
                .abi_encode())
        })
    }
    // ------------------------------------------------------------------
    // Staking operations
    // ------------------------------------------------------------------
    else if selector == ISFC::createValidatorCall::SELECTOR {
        track("createValidator");
        guarded(gas_limit, gas::CREATE_VALIDATOR, || {
            let call = decode_call::<ISFC::createValidatorCall>(input)?;
            validator::create_validator(vm, ctx.caller, ctx.value, &call.pubkey)
        })
    } else if selector == ISFC::delegateCall::SELECTOR {
        track("delegate");
        guarded(gas_limit, gas::DELEGATE, || {
            let call = decode_call::<ISFC::delegateCall>(input)?;
            delegation::delegate(vm, ctx.caller, call.toValidatorID, ctx.value)
        })
    } else if selector == ISFC::undelegateCall::SELECTOR {
        track("undelegate");
        guarded(gas_limit, gas::UNDELEGATE, || {
            let call = decode_call::<ISFC::undelegateCall>(input)?;
            delegation::undelegate(vm, ctx.caller, call.toValidatorID, call.wrID, call.amount)
        })
    } else if selector == ISFC::withdrawCall::SELECTOR {
        track("withdraw");
        guarded(gas_limit, gas::WITHDRAW, || {
            let call = decode_call::<ISFC::withdrawCall>(input)?;
            delegation::withdraw(vm, ctx.caller, call.toValidatorID, call.wrID)
        })
    } else if selector == ISFC::lockStakeCall::SELECTOR {
        track("lockStake");
        guarded(gas_limit, gas::LOCK_STAKE, || {
            let call = decode_call::<ISFC::lockStakeCall>(input)?;
            delegation::lock_stake(
                vm,
                ctx.caller,
                call.toValidatorID,
                call.lockupDuration,
                call.amount,
                false,
            )
        })
    } else if selector == ISFC::relockStakeCall::SELECTOR {
        track("relockStake");
        guarded(gas_limit, gas::LOCK_STAKE, || {
            let call = decode_call::<ISFC::relockStakeCall>(input)?;
            delegation::lock_stake(
                vm,
                ctx.caller,
                call.toValidatorID,
                call.lockupDuration,
                call.amount,
                true,
            )
        })
    } else if selector == ISFC::unlockStakeCall::SELECTOR {
        track("unlockStake");
        guarded(gas_limit, gas::UNLOCK_STAKE, || {
            let call = decode_call::<ISFC::unlockStakeCall>(input)?;
            delegation::unlock_stake(vm, ctx.caller, call.toValidatorID, call.amount)
        })
    } else if selector == ISFC::claimRewardsCall::SELECTOR {
        track("claimRewards");
        guarded(gas_limit, gas::CLAIM_REWARDS, || {
            let call = decode_call::<ISFC::claimRewardsCall>(input)?;
            delegation::claim_rewards(vm, ctx.caller, call.toValidatorID)
        })
    } else if selector == ISFC::restakeRewardsCall::SELECTOR {
        track("restakeRewards");
        guarded(gas_limit, gas::CLAIM_REWARDS, || {
            let call = decode_call::<ISFC::restakeRewardsCall>(input)?;
            delegation::restake_rewards(vm, ctx.caller, call.toValidatorID)
        })
    } else if selector == ISFC::stashRewardsCall::SELECTOR {
        track("stashRewards");
        guarded(gas_limit, gas::STASH_REWARDS, || {
            let call = decode_call::<ISFC::stashRewardsCall>(input)?;
            delegation::stash_rewards(vm, call.delegator, call.toValidatorID)
        })
    }
    // ------------------------------------------------------------------
    // Owner administration
    // ------------------------------------------------------------------
    else if selector == ISFC::transferOwnershipCall::SELECTOR {
        track("transferOwnership");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::transferOwnershipCall>(input)?;
            transfer_ownership(vm, ctx.caller, call.newOwner)
        })
    } else if selector == ISFC::renounceOwnershipCall::SELECTOR {
        track("renounceOwnership");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            renounce_ownership(vm, ctx.caller)
        })
    } else if selector == ISFC::mintU2UCall::SELECTOR {
        track("mintU2U");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::mintU2UCall>(input)?;
            mint_u2u(vm, ctx.caller, call)
        })
    } else if selector == ISFC::updateSlashingRefundRatioCall::SELECTOR {
        track("updateSlashingRefundRatio");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::updateSlashingRefundRatioCall>(input)?;
            update_slashing_refund_ratio(vm, ctx.caller, call.validatorID, call.refundRatio)
        })
    } else if selector == ISFC::updateTreasuryAddressCall::SELECTOR {
        track("updateTreasuryAddress");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::updateTreasuryAddressCall>(input)?;
            update_address_slot(vm, ctx.caller, layout::slot::TREASURY, call.treasury)
        })
    } else if selector == ISFC::updateStakeTokenizerAddressCall::SELECTOR {
        track("updateStakeTokenizerAddress");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::updateStakeTokenizerAddressCall>(input)?;
            update_address_slot(vm, ctx.caller, layout::slot::STAKE_TOKENIZER, call.tokenizer)
        })
    } else if selector == ISFC::updateVoteBookAddressCall::SELECTOR {
        track("updateVoteBookAddress");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::updateVoteBookAddressCall>(input)?;
            update_address_slot(vm, ctx.caller, layout::slot::VOTE_BOOK, call.voteBook)
        })
    } else if selector == ISFC::updateLibAddressCall::SELECTOR {
        track("updateLibAddress");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::updateLibAddressCall>(input)?;
            update_address_slot(vm, ctx.caller, layout::slot::LIB_ADDRESS, call.lib)
        })
    } else if selector == ISFC::updateConstsAddressCall::SELECTOR {
        track("updateConstsAddress");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<ISFC::updateConstsAddressCall>(input)?;
            update_address_slot(vm, ctx.caller, layout::slot::CONSTS_MANAGER, call.consts)
        })
    }
    // ------------------------------------------------------------------
    // Driver callbacks
    // ------------------------------------------------------------------
    else if selector == ISFC::setGenesisValidatorCall::SELECTOR {
        track("setGenesisValidator");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(vm, ctx.caller)?;
            let call = decode_call::<ISFC::setGenesisValidatorCall>(input)?;
            validator::set_genesis_validator(
                vm,
                call.auth,
                call.validatorID,
                &call.pubkey,
                call.status,
                call.createdEpoch,
                call.createdTime,
                call.deactivatedEpoch,
                call.deactivatedTime,
            )
        })
    } else if selector == ISFC::setGenesisDelegationCall::SELECTOR {
        track("setGenesisDelegation");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(vm, ctx.caller)?;
            let call = decode_call::<ISFC::setGenesisDelegationCall>(input)?;
            delegation::set_genesis_delegation(
                vm,
                call.delegator,
                call.toValidatorID,
                call.stake,
                call.lockedStake,
                call.lockupFromEpoch,
                call.lockupEndTime,
                call.lockupDuration,
                call.earlyUnlockPenalty,
                call.rewards,
            )
        })
    } else if selector == ISFC::deactivateValidatorCall::SELECTOR {
        track("deactivateValidator");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(vm, ctx.caller)?;
            let call = decode_call::<ISFC::deactivateValidatorCall>(input)?;
            validator::deactivate_validator(vm, call.validatorID, call.status)
        })
    } else if selector == ISFC::sealEpochValidatorsCall::SELECTOR {
        track("sealEpochValidators");
        let decoded = decode_call::<ISFC::sealEpochValidatorsCall>(input);
        let cost = gas::SEAL_VALIDATORS_BASE
            + gas::SEAL_VALIDATORS_PER_VALIDATOR
                * decoded.as_ref().map_or(0, |c| c.nextValidatorIDs.len() as u64);
        guarded(gas_limit, cost, || {
            only_driver(vm, ctx.caller)?;
            let call = decoded?;
            sealing::seal_epoch_validators(vm, &call.nextValidatorIDs)
        })
    } else if selector == ISFC::sealEpochCall::SELECTOR {
        track("sealEpoch");
        let decoded = decode_call::<ISFC::sealEpochCall>(input);
        let cost = gas::SEAL_EPOCH_BASE
            + gas::SEAL_EPOCH_PER_VALIDATOR
                * decoded.as_ref().map_or(0, |c| c.uptimes.len() as u64);
        guarded(gas_limit, cost, || {
            only_driver(vm, ctx.caller)?;
            let call = decoded?;
            sealing::seal_epoch(
                vm,
                &call.offlineTime,
                &call.offlineBlocks,
                &call.uptimes,
                &call.originatedTxsFee,
                call.epochGas,
            )
        })
    } else {
        metrics::SFC_UNKNOWN_SELECTORS.inc();
        (0, Err(SfcError::EmptyRevert))
    };

    into_precompile_result(cost, outcome)
}

/// The six per-validator epoch accumulator getters, mapped to their
/// snapshot field offset.
fn epoch_map_view(selector: [u8; 4]) -> Option<u64> {
    if selector == ISFC::getEpochReceivedStakeCall::SELECTOR {
        Some(layout::snapshot::RECEIVED_STAKE)
    } else if selector == ISFC::getEpochAccumulatedRewardPerTokenCall::SELECTOR {
        Some(layout::snapshot::ACCUMULATED_REWARD_PER_TOKEN)
    } else if selector == ISFC::getEpochAccumulatedUptimeCall::SELECTOR {
        Some(layout::snapshot::ACCUMULATED_UPTIME)
    } else if selector == ISFC::getEpochAccumulatedOriginatedTxsFeeCall::SELECTOR {
        Some(layout::snapshot::ACCUMULATED_ORIGINATED_TXS_FEE)
    } else if selector == ISFC::getEpochOfflineTimeCall::SELECTOR {
        Some(layout::snapshot::OFFLINE_TIME)
    } else if selector == ISFC::getEpochOfflineBlocksCall::SELECTOR {
        Some(layout::snapshot::OFFLINE_BLOCKS)
    } else {
        None
    }
}

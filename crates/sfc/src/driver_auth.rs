//! NodeDriverAuth precompile: the access-control gate between the contract
//! owner, the SFC and the raw driver. Owner paths administer code and
//! network rules; SFC paths mint and push validator metadata; driver paths
//! forward the node's block-boundary callbacks into the SFC.

use crate::abi::{decode_call, INodeDriver, INodeDriverAuth, ISFC};
use crate::error::{into_precompile_result, HandlerResult, SfcError};
use crate::gas::{self, guarded};
use crate::vm::{CallCtx, Vm};
use crate::{NODE_DRIVER_AUTH_ADDRESS, SFC_ADDRESS};
use alloy_primitives::{keccak256, Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use revm::precompile::PrecompileResult;
use u2u_layout::driver::driver_auth as layout;
use u2u_metrics::sfc as metrics;

fn sfc_address(vm: &mut Vm) -> Result<Address, SfcError> {
    vm.read_address(NODE_DRIVER_AUTH_ADDRESS, layout::SFC)
}

fn driver_address(vm: &mut Vm) -> Result<Address, SfcError> {
    vm.read_address(NODE_DRIVER_AUTH_ADDRESS, layout::DRIVER)
}

fn only_sfc(vm: &mut Vm, caller: Address) -> Result<(), SfcError> {
    if caller != sfc_address(vm)? {
        return Err(SfcError::revert("caller is not the SFC contract"));
    }
    Ok(())
}

fn only_driver(vm: &mut Vm, caller: Address) -> Result<(), SfcError> {
    if caller != driver_address(vm)? {
        return Err(SfcError::revert("caller is not the NodeDriver contract"));
    }
    Ok(())
}

fn only_owner(vm: &mut Vm, caller: Address) -> Result<(), SfcError> {
    vm.require_owner(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER, caller)
}

fn initialize(vm: &mut Vm, sfc: Address, driver: Address, owner: Address) -> HandlerResult {
    if vm.read_bool(NODE_DRIVER_AUTH_ADDRESS, layout::INITIALIZED)? {
        return Err(SfcError::revert("already initialized"));
    }
    vm.sstore(NODE_DRIVER_AUTH_ADDRESS, layout::INITIALIZED, U256::from(1));
    vm.write_address(NODE_DRIVER_AUTH_ADDRESS, layout::SFC, sfc);
    vm.write_address(NODE_DRIVER_AUTH_ADDRESS, layout::DRIVER, driver);
    vm.write_address(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER, owner);
    vm.emit(
        NODE_DRIVER_AUTH_ADDRESS,
        &INodeDriverAuth::OwnershipTransferred {
            previousOwner: Address::ZERO,
            newOwner: owner,
        },
    );
    Ok(Vec::new())
}

/// Forward a call to the driver, as the auth contract.
fn to_driver(vm: &mut Vm, input: Vec<u8>) -> HandlerResult {
    let driver = driver_address(vm)?;
    vm.call_sub(driver, NODE_DRIVER_AUTH_ADDRESS, U256::ZERO, input)?;
    Ok(Vec::new())
}

/// Forward a call to the SFC, as the auth contract.
fn to_sfc(vm: &mut Vm, input: Vec<u8>) -> HandlerResult {
    let sfc = sfc_address(vm)?;
    vm.call_sub(sfc, NODE_DRIVER_AUTH_ADDRESS, U256::ZERO, input)?;
    Ok(Vec::new())
}

fn is_contract(vm: &mut Vm, address: Address) -> Result<bool, SfcError> {
    Ok(!vm.state.code(address)?.is_empty())
}

/// Owner-controlled delegate-execute with code-hash pinning of both self and
/// the driver, detecting tampering by the executable.
fn execute_with_pins(
    vm: &mut Vm,
    executable: Address,
    new_owner: Address,
    self_code_hash: alloy_primitives::B256,
    driver_code_hash: alloy_primitives::B256,
) -> HandlerResult {
    let previous = vm.contract_owner(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER)?;
    vm.write_address(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER, executable);
    vm.emit(
        NODE_DRIVER_AUTH_ADDRESS,
        &INodeDriverAuth::OwnershipTransferred {
            previousOwner: previous,
            newOwner: executable,
        },
    );

    // "execute()" on the executable; an address without code is a no-op.
    let _ = vm.call_sub(
        executable,
        NODE_DRIVER_AUTH_ADDRESS,
        U256::ZERO,
        keccak256("execute()")[..4].to_vec(),
    );

    vm.write_address(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER, new_owner);
    vm.emit(
        NODE_DRIVER_AUTH_ADDRESS,
        &INodeDriverAuth::OwnershipTransferred {
            previousOwner: executable,
            newOwner: new_owner,
        },
    );

    let self_code = vm.state.code(NODE_DRIVER_AUTH_ADDRESS)?;
    if keccak256(&self_code) != self_code_hash {
        return Err(SfcError::revert("self code hash doesn't match"));
    }
    let driver = driver_address(vm)?;
    let driver_code = vm.state.code(driver)?;
    if keccak256(&driver_code) != driver_code_hash {
        return Err(SfcError::revert("driver code hash doesn't match"));
    }
    Ok(Vec::new())
}

pub(crate) fn dispatch(
    vm: &mut Vm,
    ctx: CallCtx,
    input: &[u8],
    gas_limit: u64,
) -> PrecompileResult {
    use INodeDriverAuth as A;

    if input.len() < 4 {
        return into_precompile_result(0, Err(SfcError::EmptyRevert));
    }
    let selector = [input[0], input[1], input[2], input[3]];

    let track = |method: &str| {
        metrics::SFC_CALLS
            .with_label_values(&["node_driver_auth", method])
            .inc();
    };

    let (cost, outcome): (u64, HandlerResult) = if selector == A::initializeCall::SELECTOR {
        track("initialize");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<A::initializeCall>(input)?;
            initialize(vm, call.sfc, call.driver, call.owner)
        })
    } else if selector == A::ownerCall::SELECTOR {
        track("owner");
        guarded(gas_limit, gas::READ, || {
            Ok(vm
                .contract_owner(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER)?
                .abi_encode())
        })
    } else if selector == A::transferOwnershipCall::SELECTOR {
        track("transferOwnership");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::transferOwnershipCall>(input)?;
            if call.newOwner == Address::ZERO {
                return Err(SfcError::revert("Ownable: new owner is the zero address"));
            }
            let previous = vm.contract_owner(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER)?;
            vm.write_address(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER, call.newOwner);
            vm.emit(
                NODE_DRIVER_AUTH_ADDRESS,
                &A::OwnershipTransferred {
                    previousOwner: previous,
                    newOwner: call.newOwner,
                },
            );
            Ok(Vec::new())
        })
    } else if selector == A::renounceOwnershipCall::SELECTOR {
        track("renounceOwnership");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            only_owner(vm, ctx.caller)?;
            let previous = vm.contract_owner(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER)?;
            vm.write_address(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER, Address::ZERO);
            vm.emit(
                NODE_DRIVER_AUTH_ADDRESS,
                &A::OwnershipTransferred {
                    previousOwner: previous,
                    newOwner: Address::ZERO,
                },
            );
            Ok(Vec::new())
        })
    }
    // ------------------------------------------------------------------
    // SFC-originated mutations
    // ------------------------------------------------------------------
    else if selector == A::incBalanceCall::SELECTOR {
        track("incBalance");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_sfc(vm, ctx.caller)?;
            let call = decode_call::<A::incBalanceCall>(input)?;
            if call.acc != sfc_address(vm)? {
                return Err(SfcError::revert("recipient is not the SFC contract"));
            }
            let balance = vm.state.balance(call.acc)?;
            to_driver(
                vm,
                INodeDriver::setBalanceCall {
                    acc: call.acc,
                    value: balance + call.diff,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::updateMinGasPriceCall::SELECTOR {
        track("updateMinGasPrice");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_sfc(vm, ctx.caller)?;
            let call = decode_call::<A::updateMinGasPriceCall>(input)?;
            // The floor is clamped to 10^6 Gwei, so it always fits a u64.
            let diff = serde_json::json!({
                "Economy": { "MinGasPrice": call.minGasPrice.saturating_to::<u64>() }
            });
            to_driver(
                vm,
                INodeDriver::updateNetworkRulesCall {
                    diff: diff.to_string().into_bytes().into(),
                }
                .abi_encode(),
            )
        })
    } else if selector == A::updateValidatorWeightCall::SELECTOR {
        track("updateValidatorWeight");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_sfc(vm, ctx.caller)?;
            let call = decode_call::<A::updateValidatorWeightCall>(input)?;
            to_driver(
                vm,
                INodeDriver::updateValidatorWeightCall {
                    validatorID: call.validatorID,
                    value: call.value,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::updateValidatorPubkeyCall::SELECTOR {
        track("updateValidatorPubkey");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_sfc(vm, ctx.caller)?;
            let call = decode_call::<A::updateValidatorPubkeyCall>(input)?;
            to_driver(
                vm,
                INodeDriver::updateValidatorPubkeyCall {
                    validatorID: call.validatorID,
                    pubkey: call.pubkey,
                }
                .abi_encode(),
            )
        })
    }
    // ------------------------------------------------------------------
    // Owner administration
    // ------------------------------------------------------------------
    else if selector == A::migrateToCall::SELECTOR {
        track("migrateTo");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::migrateToCall>(input)?;
            to_driver(
                vm,
                INodeDriver::setBackendCall {
                    backend: call.newDriverAuth,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::executeCall::SELECTOR {
        track("execute");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::executeCall>(input)?;
            let owner = vm.contract_owner(NODE_DRIVER_AUTH_ADDRESS, layout::OWNER)?;
            let self_hash = keccak256(vm.state.code(NODE_DRIVER_AUTH_ADDRESS)?);
            let driver = driver_address(vm)?;
            let driver_hash = keccak256(vm.state.code(driver)?);
            execute_with_pins(vm, call.executable, owner, self_hash, driver_hash)
        })
    } else if selector == A::mutExecuteCall::SELECTOR {
        track("mutExecute");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::mutExecuteCall>(input)?;
            execute_with_pins(
                vm,
                call.executable,
                call.newOwner,
                call.selfCodeHash,
                call.driverCodeHash,
            )
        })
    } else if selector == A::copyCodeCall::SELECTOR {
        track("copyCode");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::copyCodeCall>(input)?;
            to_driver(
                vm,
                INodeDriver::copyCodeCall {
                    acc: call.acc,
                    from: call.from,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::upgradeCodeCall::SELECTOR {
        track("upgradeCode");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::upgradeCodeCall>(input)?;
            if !is_contract(vm, call.acc)? || !is_contract(vm, call.from)? {
                return Err(SfcError::revert("copy isn't allowed"));
            }
            to_driver(
                vm,
                INodeDriver::copyCodeCall {
                    acc: call.acc,
                    from: call.from,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::incNonceCall::SELECTOR {
        track("incNonce");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::incNonceCall>(input)?;
            to_driver(
                vm,
                INodeDriver::incNonceCall {
                    acc: call.acc,
                    diff: call.diff,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::updateNetworkRulesCall::SELECTOR {
        track("updateNetworkRules");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::updateNetworkRulesCall>(input)?;
            to_driver(
                vm,
                INodeDriver::updateNetworkRulesCall { diff: call.diff }.abi_encode(),
            )
        })
    } else if selector == A::updateNetworkVersionCall::SELECTOR {
        track("updateNetworkVersion");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::updateNetworkVersionCall>(input)?;
            to_driver(
                vm,
                INodeDriver::updateNetworkVersionCall {
                    version: call.version,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::advanceEpochsCall::SELECTOR {
        track("advanceEpochs");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_owner(vm, ctx.caller)?;
            let call = decode_call::<A::advanceEpochsCall>(input)?;
            to_driver(vm, INodeDriver::advanceEpochsCall { num: call.num }.abi_encode())
        })
    }
    // ------------------------------------------------------------------
    // Driver callbacks → SFC
    // ------------------------------------------------------------------
    else if selector == A::setGenesisValidatorCall::SELECTOR {
        track("setGenesisValidator");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(vm, ctx.caller)?;
            let call = decode_call::<A::setGenesisValidatorCall>(input)?;
            to_sfc(
                vm,
                ISFC::setGenesisValidatorCall {
                    auth: call.auth,
                    validatorID: call.validatorID,
                    pubkey: call.pubkey,
                    status: call.status,
                    createdEpoch: call.createdEpoch,
                    createdTime: call.createdTime,
                    deactivatedEpoch: call.deactivatedEpoch,
                    deactivatedTime: call.deactivatedTime,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::setGenesisDelegationCall::SELECTOR {
        track("setGenesisDelegation");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(vm, ctx.caller)?;
            let call = decode_call::<A::setGenesisDelegationCall>(input)?;
            to_sfc(
                vm,
                ISFC::setGenesisDelegationCall {
                    delegator: call.delegator,
                    toValidatorID: call.toValidatorID,
                    stake: call.stake,
                    lockedStake: call.lockedStake,
                    lockupFromEpoch: call.lockupFromEpoch,
                    lockupEndTime: call.lockupEndTime,
                    lockupDuration: call.lockupDuration,
                    earlyUnlockPenalty: call.earlyUnlockPenalty,
                    rewards: call.rewards,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::deactivateValidatorCall::SELECTOR {
        track("deactivateValidator");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(vm, ctx.caller)?;
            let call = decode_call::<A::deactivateValidatorCall>(input)?;
            to_sfc(
                vm,
                ISFC::deactivateValidatorCall {
                    validatorID: call.validatorID,
                    status: call.status,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::sealEpochValidatorsCall::SELECTOR {
        track("sealEpochValidators");
        let decoded = decode_call::<A::sealEpochValidatorsCall>(input);
        let cost = gas::SEAL_VALIDATORS_BASE
            + gas::SEAL_VALIDATORS_PER_VALIDATOR
                * decoded.as_ref().map_or(0, |c| c.nextValidatorIDs.len() as u64);
        guarded(gas_limit, cost, || {
            only_driver(vm, ctx.caller)?;
            let call = decoded?;
            to_sfc(
                vm,
                ISFC::sealEpochValidatorsCall {
                    nextValidatorIDs: call.nextValidatorIDs,
                }
                .abi_encode(),
            )
        })
    } else if selector == A::sealEpochCall::SELECTOR {
        track("sealEpoch");
        let decoded = decode_call::<A::sealEpochCall>(input);
        let cost = gas::SEAL_EPOCH_BASE
            + gas::SEAL_EPOCH_PER_VALIDATOR * decoded.as_ref().map_or(0, |c| c.uptimes.len() as u64);
        guarded(gas_limit, cost, || {
            only_driver(vm, ctx.caller)?;
            let call = decoded?;
            to_sfc(
                vm,
                ISFC::sealEpochCall {
                    offlineTime: call.offlineTime,
                    offlineBlocks: call.offlineBlocks,
                    uptimes: call.uptimes,
                    originatedTxsFee: call.originatedTxsFee,
                    epochGas: call.usedGas,
                }
                .abi_encode(),
            )
        })
    } else {
        metrics::SFC_UNKNOWN_SELECTORS.inc();
        (0, Err(SfcError::EmptyRevert))
    };

    into_precompile_result(cost, outcome)
}


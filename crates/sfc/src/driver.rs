//! NodeDriver precompile: the node's block-boundary callback surface and the
//! backend's raw administration entry points. Everything here is a thin
//! dispatch wrapper — node calls forward to the backend (NodeDriverAuth),
//! backend calls forward to the EVMWriter or surface as events the node
//! consumes.

use crate::abi::{decode_call, IEVMWriter, INodeDriver, INodeDriverAuth};
use crate::error::{into_precompile_result, HandlerResult, SfcError};
use crate::gas::{self, guarded};
use crate::vm::{CallCtx, Vm};
use crate::{NODE_ADDRESS, NODE_DRIVER_ADDRESS};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use revm::precompile::PrecompileResult;
use u2u_layout::driver::node_driver as layout;
use u2u_metrics::sfc as metrics;

/// Epoch gas assumed by the legacy `sealEpoch` overload that predates the
/// gas-price control loop.
const LEGACY_EPOCH_GAS: u64 = 841_669_690;

fn backend(vm: &mut Vm) -> Result<Address, SfcError> {
    vm.read_address(NODE_DRIVER_ADDRESS, layout::BACKEND)
}

fn evm_writer(vm: &mut Vm) -> Result<Address, SfcError> {
    vm.read_address(NODE_DRIVER_ADDRESS, layout::EVM_WRITER)
}

fn only_node(caller: Address) -> Result<(), SfcError> {
    if caller != NODE_ADDRESS {
        return Err(SfcError::revert("not callable"));
    }
    Ok(())
}

fn only_backend(vm: &mut Vm, caller: Address) -> Result<(), SfcError> {
    if caller != backend(vm)? {
        return Err(SfcError::revert("caller is not the backend"));
    }
    Ok(())
}

fn initialize(vm: &mut Vm, backend_addr: Address, writer: Address) -> HandlerResult {
    if vm.read_bool(NODE_DRIVER_ADDRESS, layout::INITIALIZED)? {
        return Err(SfcError::revert("already initialized"));
    }
    vm.sstore(NODE_DRIVER_ADDRESS, layout::INITIALIZED, U256::from(1));
    vm.write_address(NODE_DRIVER_ADDRESS, layout::BACKEND, backend_addr);
    vm.write_address(NODE_DRIVER_ADDRESS, layout::EVM_WRITER, writer);
    vm.emit(
        NODE_DRIVER_ADDRESS,
        &INodeDriver::UpdatedBackend {
            backend: backend_addr,
        },
    );
    Ok(Vec::new())
}

/// Forward a raw mutation to the EVMWriter, as the driver.
fn to_writer(vm: &mut Vm, input: Vec<u8>) -> HandlerResult {
    let writer = evm_writer(vm)?;
    vm.call_sub(writer, NODE_DRIVER_ADDRESS, U256::ZERO, input)?;
    Ok(Vec::new())
}

/// Forward a node callback to the backend, as the driver.
fn to_backend(vm: &mut Vm, input: Vec<u8>) -> HandlerResult {
    let backend_addr = backend(vm)?;
    vm.call_sub(backend_addr, NODE_DRIVER_ADDRESS, U256::ZERO, input)?;
    Ok(Vec::new())
}

pub(crate) fn dispatch(
    vm: &mut Vm,
    ctx: CallCtx,
    input: &[u8],
    gas_limit: u64,
) -> PrecompileResult {
    use INodeDriver as D;

    if input.len() < 4 {
        return into_precompile_result(0, Err(SfcError::EmptyRevert));
    }
    let selector = [input[0], input[1], input[2], input[3]];

    let track = |method: &str| {
        metrics::SFC_CALLS
            .with_label_values(&["node_driver", method])
            .inc();
    };

    let (cost, outcome): (u64, HandlerResult) = if selector == D::initializeCall::SELECTOR {
        track("initialize");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            let call = decode_call::<D::initializeCall>(input)?;
            initialize(vm, call.backend, call.evmWriterAddress)
        })
    } else if selector == D::setBackendCall::SELECTOR {
        track("setBackend");
        guarded(gas_limit, gas::ADMIN_WRITE, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::setBackendCall>(input)?;
            vm.write_address(NODE_DRIVER_ADDRESS, layout::BACKEND, call.backend);
            vm.emit(
                NODE_DRIVER_ADDRESS,
                &D::UpdatedBackend {
                    backend: call.backend,
                },
            );
            Ok(Vec::new())
        })
    }
    // ------------------------------------------------------------------
    // Backend administration → EVMWriter / events
    // ------------------------------------------------------------------
    else if selector == D::setBalanceCall::SELECTOR {
        track("setBalance");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::setBalanceCall>(input)?;
            to_writer(
                vm,
                IEVMWriter::setBalanceCall {
                    acc: call.acc,
                    value: call.value,
                }
                .abi_encode(),
            )
        })
    } else if selector == D::copyCodeCall::SELECTOR {
        track("copyCode");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::copyCodeCall>(input)?;
            to_writer(
                vm,
                IEVMWriter::copyCodeCall {
                    acc: call.acc,
                    from: call.from,
                }
                .abi_encode(),
            )
        })
    } else if selector == D::swapCodeCall::SELECTOR {
        track("swapCode");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::swapCodeCall>(input)?;
            to_writer(
                vm,
                IEVMWriter::swapCodeCall {
                    acc: call.acc,
                    with: call.with,
                }
                .abi_encode(),
            )
        })
    } else if selector == D::setStorageCall::SELECTOR {
        track("setStorage");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::setStorageCall>(input)?;
            to_writer(
                vm,
                IEVMWriter::setStorageCall {
                    acc: call.acc,
                    key: call.key,
                    value: call.value,
                }
                .abi_encode(),
            )
        })
    } else if selector == D::incNonceCall::SELECTOR {
        track("incNonce");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::incNonceCall>(input)?;
            to_writer(
                vm,
                IEVMWriter::incNonceCall {
                    acc: call.acc,
                    diff: call.diff,
                }
                .abi_encode(),
            )
        })
    } else if selector == D::updateNetworkRulesCall::SELECTOR {
        track("updateNetworkRules");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::updateNetworkRulesCall>(input)?;
            vm.emit(NODE_DRIVER_ADDRESS, &D::UpdateNetworkRules { diff: call.diff });
            Ok(Vec::new())
        })
    } else if selector == D::updateNetworkVersionCall::SELECTOR {
        track("updateNetworkVersion");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::updateNetworkVersionCall>(input)?;
            vm.emit(
                NODE_DRIVER_ADDRESS,
                &D::UpdateNetworkVersion {
                    version: call.version,
                },
            );
            Ok(Vec::new())
        })
    } else if selector == D::advanceEpochsCall::SELECTOR {
        track("advanceEpochs");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::advanceEpochsCall>(input)?;
            vm.emit(NODE_DRIVER_ADDRESS, &D::AdvanceEpochs { num: call.num });
            Ok(Vec::new())
        })
    } else if selector == D::updateValidatorWeightCall::SELECTOR {
        track("updateValidatorWeight");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::updateValidatorWeightCall>(input)?;
            vm.emit(
                NODE_DRIVER_ADDRESS,
                &D::UpdateValidatorWeight {
                    validatorID: call.validatorID,
                    weight: call.value,
                },
            );
            Ok(Vec::new())
        })
    } else if selector == D::updateValidatorPubkeyCall::SELECTOR {
        track("updateValidatorPubkey");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_backend(vm, ctx.caller)?;
            let call = decode_call::<D::updateValidatorPubkeyCall>(input)?;
            vm.emit(
                NODE_DRIVER_ADDRESS,
                &D::UpdateValidatorPubkey {
                    validatorID: call.validatorID,
                    pubkey: call.pubkey,
                },
            );
            Ok(Vec::new())
        })
    }
    // ------------------------------------------------------------------
    // Node callbacks → backend
    // ------------------------------------------------------------------
    else if selector == D::setGenesisValidatorCall::SELECTOR {
        track("setGenesisValidator");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_node(ctx.caller)?;
            let call = decode_call::<D::setGenesisValidatorCall>(input)?;
            to_backend(
                vm,
                INodeDriverAuth::setGenesisValidatorCall {
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
    } else if selector == D::setGenesisDelegationCall::SELECTOR {
        track("setGenesisDelegation");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_node(ctx.caller)?;
            let call = decode_call::<D::setGenesisDelegationCall>(input)?;
            to_backend(
                vm,
                INodeDriverAuth::setGenesisDelegationCall {
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
    } else if selector == D::deactivateValidatorCall::SELECTOR {
        track("deactivateValidator");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_node(ctx.caller)?;
            let call = decode_call::<D::deactivateValidatorCall>(input)?;
            to_backend(
                vm,
                INodeDriverAuth::deactivateValidatorCall {
                    validatorID: call.validatorID,
                    status: call.status,
                }
                .abi_encode(),
            )
        })
    } else if selector == D::sealEpochValidatorsCall::SELECTOR {
        track("sealEpochValidators");
        let decoded = decode_call::<D::sealEpochValidatorsCall>(input);
        let cost = gas::SEAL_VALIDATORS_BASE
            + gas::SEAL_VALIDATORS_PER_VALIDATOR
                * decoded.as_ref().map_or(0, |c| c.nextValidatorIDs.len() as u64);
        guarded(gas_limit, cost, || {
            only_node(ctx.caller)?;
            let call = decoded?;
            to_backend(
                vm,
                INodeDriverAuth::sealEpochValidatorsCall {
                    nextValidatorIDs: call.nextValidatorIDs,
                }
                .abi_encode(),
            )
        })
    } else if selector == D::sealEpochCall::SELECTOR {
        track("sealEpoch");
        let decoded = decode_call::<D::sealEpochCall>(input);
        let cost = gas::SEAL_EPOCH_BASE
            + gas::SEAL_EPOCH_PER_VALIDATOR * decoded.as_ref().map_or(0, |c| c.uptimes.len() as u64);
        guarded(gas_limit, cost, || {
            only_node(ctx.caller)?;
            let call = decoded?;
            to_backend(
                vm,
                INodeDriverAuth::sealEpochCall {
                    offlineTime: call.offlineTime,
                    offlineBlocks: call.offlineBlocks,
                    uptimes: call.uptimes,
                    originatedTxsFee: call.originatedTxsFee,
                    usedGas: U256::from(LEGACY_EPOCH_GAS),
                }
                .abi_encode(),
            )
        })
    } else if selector == D::sealEpochV1Call::SELECTOR {
        track("sealEpochV1");
        let decoded = decode_call::<D::sealEpochV1Call>(input);
        let cost = gas::SEAL_EPOCH_BASE
            + gas::SEAL_EPOCH_PER_VALIDATOR * decoded.as_ref().map_or(0, |c| c.uptimes.len() as u64);
        guarded(gas_limit, cost, || {
            only_node(ctx.caller)?;
            let call = decoded?;
            to_backend(
                vm,
                INodeDriverAuth::sealEpochCall {
                    offlineTime: call.offlineTime,
                    offlineBlocks: call.offlineBlocks,
                    uptimes: call.uptimes,
                    originatedTxsFee: call.originatedTxsFee,
                    usedGas: call.usedGas,
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


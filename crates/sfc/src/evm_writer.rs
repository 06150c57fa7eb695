//! EVMWriter precompile: raw balance/code/nonce/storage mutation authority.
//! Callable only by the NodeDriver.

use crate::abi::{decode_call, IEVMWriter};
use crate::error::{into_precompile_result, HandlerResult, SfcError};
use crate::gas::{self, guarded};
use crate::vm::{CallCtx, Vm};
use crate::NODE_DRIVER_ADDRESS;
use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use revm::precompile::PrecompileResult;
use u2u_metrics::sfc as metrics;

fn only_driver(caller: Address) -> Result<(), SfcError> {
    if caller != NODE_DRIVER_ADDRESS {
        return Err(SfcError::revert("caller is not the NodeDriver contract"));
    }
    Ok(())
}

pub(crate) fn dispatch(
    vm: &mut Vm,
    ctx: CallCtx,
    input: &[u8],
    gas_limit: u64,
) -> PrecompileResult {
    use IEVMWriter as W;

    if input.len() < 4 {
        return into_precompile_result(0, Err(SfcError::EmptyRevert));
    }
    let selector = [input[0], input[1], input[2], input[3]];

    let track = |method: &str| {
        metrics::SFC_CALLS
            .with_label_values(&["evm_writer", method])
            .inc();
    };

    let (cost, outcome): (u64, HandlerResult) = if selector == W::setBalanceCall::SELECTOR {
        track("setBalance");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(ctx.caller)?;
            let call = decode_call::<W::setBalanceCall>(input)?;
            if call.acc == Address::ZERO {
                return Err(SfcError::revert("not callable"));
            }
            vm.state.set_balance(call.acc, call.value);
            Ok(Vec::new())
        })
    } else if selector == W::copyCodeCall::SELECTOR {
        track("copyCode");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(ctx.caller)?;
            let call = decode_call::<W::copyCodeCall>(input)?;
            let code = vm.state.code(call.from)?;
            vm.state.set_code(call.acc, code);
            Ok(Vec::new())
        })
    } else if selector == W::swapCodeCall::SELECTOR {
        track("swapCode");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(ctx.caller)?;
            let call = decode_call::<W::swapCodeCall>(input)?;
            let code_a = vm.state.code(call.acc)?;
            let code_b = vm.state.code(call.with)?;
            vm.state.set_code(call.acc, code_b);
            vm.state.set_code(call.with, code_a);
            Ok(Vec::new())
        })
    } else if selector == W::setStorageCall::SELECTOR {
        track("setStorage");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(ctx.caller)?;
            let call = decode_call::<W::setStorageCall>(input)?;
            vm.sstore(call.acc, call.key, call.value);
            Ok(Vec::new())
        })
    } else if selector == W::incNonceCall::SELECTOR {
        track("incNonce");
        guarded(gas_limit, gas::DRIVER_CALLBACK, || {
            only_driver(ctx.caller)?;
            let call = decode_call::<W::incNonceCall>(input)?;
            let nonce = vm.state.nonce(call.acc)?;
            vm.state
                .set_nonce(call.acc, nonce.saturating_add(call.diff.saturating_to::<u64>()));
            Ok(Vec::new())
        })
    } else {
        metrics::SFC_UNKNOWN_SELECTORS.inc();
        (0, Err(SfcError::EmptyRevert))
    };

    into_precompile_result(cost, outcome)
}


use std::sync::Arc;

use crate::error::{InvokeResult, illegal_argument, mismatched_types};
use crate::invoke::{
    form::{Adapter, Form},
    handle::MethodHandle,
    signature::Signature,
};

/// Pre-processes parameters `pos..` with unary `filters`; `None` leaves a
/// parameter untouched. Each filter must return exactly the kind of the
/// parameter it feeds, and the new parameter takes the filter's input kind.
pub fn filter_arguments(
    target: &MethodHandle,
    pos: usize,
    filters: Vec<Option<MethodHandle>>,
) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    if pos > signature.arity() || filters.len() > signature.arity() - pos {
        return Err(illegal_argument(format!(
            "too many filters: {} at {pos} for {signature}",
            filters.len()
        )));
    }
    let mut params = signature.params().to_vec();
    for (offset, filter) in filters.iter().enumerate() {
        let Some(filter) = filter else { continue };
        let slot = &params[pos + offset];
        let filter_signature = filter.signature();
        if filter_signature.arity() != 1 || filter_signature.ret() != slot {
            return Err(mismatched_types(
                "target and filter types",
                signature,
                filter_signature,
            ));
        }
        params[pos + offset] = filter_signature.params()[0].clone();
    }
    if filters.iter().all(Option::is_none) {
        return Ok(target.clone());
    }
    let new_signature = Signature::new(signature.ret().clone(), params)?;
    Ok(MethodHandle::new(
        new_signature,
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::Filter {
                pos,
                filters: Arc::from(filters),
            },
        },
    ))
}

/// Post-processes the result of `target` with `filter`, which takes the
/// target's return value, or nothing when the target returns void.
pub fn filter_return_value(target: &MethodHandle, filter: &MethodHandle) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    let filter_signature = filter.signature();
    let ret = signature.ret();
    let accepts = if ret.is_void() {
        filter_signature.arity() == 0
    } else {
        filter_signature.arity() == 1 && &filter_signature.params()[0] == ret
    };
    if !accepts {
        return Err(mismatched_types(
            "target and filter return types",
            signature,
            filter_signature,
        ));
    }
    Ok(MethodHandle::new(
        signature.change_return(filter_signature.ret().clone()),
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::FilterReturn {
                filter: filter.clone(),
            },
        },
    ))
}

/// Replaces the parameter at `pos` with the parameters of `collector`,
/// whose result feeds that slot. A void collector feeds nothing and its
/// parameters are inserted at `pos`.
pub fn collect_arguments(
    target: &MethodHandle,
    pos: usize,
    collector: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    let collector_signature = collector.signature();
    let collected = collector_signature.ret();
    let mut params = signature.params().to_vec();
    if collected.is_void() {
        if pos > params.len() {
            return Err(illegal_argument(format!(
                "collect position {pos} out of range for {signature}"
            )));
        }
    } else {
        match params.get(pos) {
            Some(slot) if slot == collected => {
                params.remove(pos);
            }
            Some(_) => {
                return Err(mismatched_types(
                    "target and collector types",
                    signature,
                    collector_signature,
                ));
            }
            None => {
                return Err(illegal_argument(format!(
                    "collect position {pos} out of range for {signature}"
                )));
            }
        }
    }
    params.splice(pos..pos, collector_signature.params().iter().cloned());
    let new_signature = Signature::new(signature.ret().clone(), params)?;
    Ok(MethodHandle::new(
        new_signature,
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::Collect {
                pos,
                collector: collector.clone(),
            },
        },
    ))
}

use crate::error::{InvokeResult, illegal_argument};
use crate::host::{
    convert::Conversion,
    kind::{Kind, require_array},
};
use crate::invoke::{form::Form, handle::MethodHandle, signature::Signature};

/// Replaces `count` parameters at `pos` with one array parameter whose
/// elements are spread into them at invocation.
pub fn as_spreader(
    target: &MethodHandle,
    pos: usize,
    array_kind: &Kind,
    count: usize,
) -> InvokeResult<MethodHandle> {
    let component = require_array(array_kind, "as_spreader")?;
    let signature = target.signature();
    if pos > signature.arity() || count > signature.arity() - pos {
        return Err(illegal_argument(format!(
            "bad spread array length: {count} at {pos} for {signature}"
        )));
    }
    let elements = signature.params()[pos..pos + count]
        .iter()
        .map(|param| {
            Conversion::plan(&component, param, false).ok_or_else(|| {
                illegal_argument(format!("cannot spread {array_kind} elements into {param}"))
            })
        })
        .collect::<InvokeResult<Vec<_>>>()?;
    let mut params = signature.params().to_vec();
    params.splice(pos..pos + count, [array_kind.clone()]);
    let new_signature = Signature::new(signature.ret().clone(), params)?;
    Ok(MethodHandle::new(
        new_signature,
        Form::Spreading {
            target: target.as_fixed_arity(),
            pos,
            count,
            elements,
        },
    ))
}

/// Replaces the array parameter at `pos` with `count` parameters of its
/// component kind, collected into a fresh array at invocation.
pub fn as_collector(
    target: &MethodHandle,
    pos: usize,
    array_kind: &Kind,
    count: usize,
) -> InvokeResult<MethodHandle> {
    let component = require_array(array_kind, "as_collector")?;
    let signature = target.signature();
    let slot = signature.param(pos).ok_or_else(|| {
        illegal_argument(format!("collect position {pos} out of range for {signature}"))
    })?;
    if !slot.is_array() || !slot.is_assignable_from(array_kind) {
        return Err(illegal_argument(format!(
            "array type {array_kind} not assignable to parameter {pos} of {signature}"
        )));
    }
    let mut params = signature.params().to_vec();
    params.splice(pos..pos + 1, std::iter::repeat_n(component.clone(), count));
    let new_signature = Signature::new(signature.ret().clone(), params)?;
    Ok(MethodHandle::new(
        new_signature,
        Form::Collecting {
            target: target.as_fixed_arity(),
            pos,
            count,
            component,
        },
    ))
}

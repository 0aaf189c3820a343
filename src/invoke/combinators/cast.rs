use std::sync::Arc;

use crate::error::{InvokeError, InvokeResult};
use crate::host::convert::Conversion;
use crate::invoke::{
    form::{Adapter, Form},
    handle::MethodHandle,
    signature::Signature,
};

/// Adapts `target` to `signature` using widening, boxing, unboxing and
/// checked reference casts. A varargs collector adapts to any arity by
/// collecting its trailing arguments.
pub fn as_type(target: &MethodHandle, signature: &Signature) -> InvokeResult<MethodHandle> {
    if target.signature() == signature {
        return Ok(target.clone());
    }
    if target.is_varargs_collector() && needs_collector(target, signature) {
        let arity = target.arity();
        if signature.arity() + 1 < arity {
            return Err(cannot_convert(target, signature));
        }
        let array_kind = target.signature().params()[arity - 1].clone();
        let collector = target.as_fixed_arity().as_collector(
            arity - 1,
            &array_kind,
            signature.arity() + 1 - arity,
        )?;
        return convert(&collector, signature, false);
    }
    convert(target, signature, false)
}

/// Like `as_type`, but also allows narrowing primitive conversions,
/// unchecked-until-invocation reference casts, and maps a null reference
/// to the zero value of a primitive slot.
pub fn explicit_cast_arguments(
    target: &MethodHandle,
    signature: &Signature,
) -> InvokeResult<MethodHandle> {
    let target = target.as_fixed_arity();
    if target.signature() == signature {
        return Ok(target);
    }
    convert(&target, signature, true)
}

fn needs_collector(target: &MethodHandle, signature: &Signature) -> bool {
    if signature.arity() != target.arity() {
        return true;
    }
    match (signature.last_param(), target.signature().last_param()) {
        (Some(offered), Some(array)) => !array.is_assignable_from(offered),
        _ => false,
    }
}

fn convert(target: &MethodHandle, signature: &Signature, explicit: bool) -> InvokeResult<MethodHandle> {
    let old = target.signature();
    if old.arity() != signature.arity() {
        return Err(cannot_convert(target, signature));
    }
    let params = signature
        .params()
        .iter()
        .zip(old.params())
        .map(|(from, to)| Conversion::plan(from, to, explicit))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| cannot_convert(target, signature))?;
    let ret = Conversion::plan(old.ret(), signature.ret(), explicit)
        .ok_or_else(|| cannot_convert(target, signature))?;
    Ok(MethodHandle::new(
        signature.clone(),
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::Convert {
                params: Arc::from(params),
                ret,
            },
        },
    ))
}

fn cannot_convert(target: &MethodHandle, signature: &Signature) -> InvokeError {
    InvokeError::WrongMethodType(format!("cannot convert {target} to {signature}"))
}

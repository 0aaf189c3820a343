use crate::error::{InvokeResult, illegal_argument};
use crate::host::{kind::Kind, value::Value};
use crate::invoke::{combinators::insert::bind_value, handle::MethodHandle, signature::Signature};

/// `()kind` returning `value`, converted to `kind` now.
pub fn constant(kind: Kind, value: Value) -> InvokeResult<MethodHandle> {
    if kind.is_void() {
        return Err(illegal_argument("constant of void type"));
    }
    let value = bind_value(value, &kind)?;
    let signature = Signature::new(kind, [])?;
    Ok(MethodHandle::from_fn("constant", signature, move |_| Ok(value.clone())))
}

/// `(kind)kind` returning its argument.
pub fn identity(kind: Kind) -> InvokeResult<MethodHandle> {
    if kind.is_void() {
        return Err(illegal_argument("identity of void type"));
    }
    let signature = Signature::new(kind.clone(), [kind])?;
    Ok(MethodHandle::from_fn("identity", signature, |args| {
        Ok(args.into_iter().next().unwrap_or(Value::Null))
    }))
}

/// `()kind` returning the zero value of `kind`; void returns nothing.
pub fn zero(kind: Kind) -> MethodHandle {
    let value = kind.zero();
    MethodHandle::from_fn("zero", Signature::trusted(kind, Vec::new()), move |_| {
        Ok(value.clone())
    })
}

/// A handle of `signature` that ignores its arguments and returns the zero
/// value of the return kind.
pub fn empty(signature: &Signature) -> MethodHandle {
    let value = signature.ret().zero();
    MethodHandle::from_fn("empty", signature.clone(), move |_| Ok(value.clone()))
}

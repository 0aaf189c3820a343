use crate::error::InvokeResult;
use crate::host::kind::{Kind, require_array};
use crate::invoke::{
    direct::{DirectOp, DirectTarget},
    handle::MethodHandle,
    signature::Signature,
};

fn array_handle(label: &str, signature: Signature, op: DirectOp) -> MethodHandle {
    MethodHandle::direct(signature, DirectTarget::synthetic(label, op), false)
}

/// `(int)array_kind` allocating a zero-filled array.
pub fn array_constructor(array_kind: &Kind) -> InvokeResult<MethodHandle> {
    let component = require_array(array_kind, "array_constructor")?;
    let signature = Signature::new(array_kind.clone(), [Kind::INT])?;
    Ok(array_handle("array_new", signature, DirectOp::ArrayNew(component)))
}

/// `(array_kind)int`.
pub fn array_length(array_kind: &Kind) -> InvokeResult<MethodHandle> {
    require_array(array_kind, "array_length")?;
    let signature = Signature::new(Kind::INT, [array_kind.clone()])?;
    Ok(array_handle("array_length", signature, DirectOp::ArrayLength))
}

/// `(array_kind, int)component`.
pub fn array_element_getter(array_kind: &Kind) -> InvokeResult<MethodHandle> {
    let component = require_array(array_kind, "array_element_getter")?;
    let signature = Signature::new(component, [array_kind.clone(), Kind::INT])?;
    Ok(array_handle("array_get", signature, DirectOp::ArrayGet))
}

/// `(array_kind, int, component)void`.
pub fn array_element_setter(array_kind: &Kind) -> InvokeResult<MethodHandle> {
    let component = require_array(array_kind, "array_element_setter")?;
    let signature = Signature::new(Kind::Void, [array_kind.clone(), Kind::INT, component])?;
    Ok(array_handle("array_set", signature, DirectOp::ArraySet))
}

use std::sync::Arc;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{convert::cast_primitive, kind::Kind, value::Value};
use crate::invoke::{
    form::{Adapter, Form},
    handle::MethodHandle,
};

/// Converts a value supplied at bind time into the representation of
/// `kind`, failing immediately instead of at invocation.
pub(crate) fn bind_value(value: Value, kind: &Kind) -> InvokeResult<Value> {
    match kind {
        Kind::Void => Err(illegal_argument("cannot bind a value to a void slot")),
        Kind::Prim(p) => match value.unboxed() {
            Some(inner) if inner.primitive().is_some_and(|from| from.widens_to(*p)) => {
                cast_primitive(inner, *p)
            }
            _ if value.is_null() => Err(InvokeError::NullPointer(format!(
                "cannot bind null to {p}"
            ))),
            _ => Err(InvokeError::ClassCast(format!(
                "cannot cast {} to {}",
                value.type_name(),
                p.wrapper().simple_name()
            ))),
        },
        Kind::Ref(class) => {
            let value = Value::boxed(value);
            if value.fits(kind) {
                Ok(value)
            } else {
                Err(InvokeError::ClassCast(format!(
                    "cannot cast {} to {}",
                    value.type_name(),
                    class.simple_name()
                )))
            }
        }
    }
}

/// Fixes `values` at parameters `pos..pos + values.len()` of `target`.
pub fn insert_arguments(
    target: &MethodHandle,
    pos: usize,
    values: Vec<Value>,
) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    if pos > signature.arity() {
        return Err(illegal_argument(format!(
            "insert position {pos} out of range for {signature}"
        )));
    }
    if values.len() > signature.arity() - pos {
        return Err(illegal_argument(format!(
            "too many values to insert: {} into {signature} at {pos}",
            values.len()
        )));
    }
    if values.is_empty() {
        return Ok(target.clone());
    }
    let bound = values
        .into_iter()
        .zip(&signature.params()[pos..])
        .map(|(value, kind)| bind_value(value, kind))
        .collect::<InvokeResult<Vec<_>>>()?;
    let new_signature = signature.drop_params(pos, pos + bound.len())?;
    Ok(MethodHandle::new(
        new_signature,
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::Insert {
                pos,
                values: Arc::from(bound),
            },
        },
    ))
}

/// Fixes the leading parameter, which must be a reference.
pub fn bind_to(target: &MethodHandle, value: Value) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    let leading = match signature.param(0) {
        Some(kind) if kind.is_reference() => kind,
        _ => {
            return Err(illegal_argument(format!(
                "no leading reference parameter to bind in {signature}"
            )));
        }
    };
    let value = bind_value(value, leading)?;
    Ok(MethodHandle::new(
        signature.drop_params(0, 1)?,
        Form::Bound {
            target: target.as_fixed_arity(),
            value,
        },
    ))
}

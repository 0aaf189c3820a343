use std::sync::Arc;

use crate::error::{InvokeResult, illegal_argument};
use crate::invoke::{
    form::{Adapter, Form},
    handle::MethodHandle,
    signature::Signature,
};

/// Reorders arguments: parameter `i` of `target` receives argument
/// `reorder[i]` of the new signature. Indices may repeat or be omitted.
pub fn permute_arguments(
    target: &MethodHandle,
    new_signature: &Signature,
    reorder: &[usize],
) -> InvokeResult<MethodHandle> {
    let old = target.signature();
    if reorder.len() != old.arity() {
        return Err(illegal_argument(format!(
            "bad reorder array: length {} for {old}",
            reorder.len()
        )));
    }
    if old.ret() != new_signature.ret() {
        return Err(illegal_argument(format!(
            "return types do not match: {old} and {new_signature}"
        )));
    }
    for (i, &index) in reorder.iter().enumerate() {
        let Some(kind) = new_signature.param(index) else {
            return Err(illegal_argument(format!(
                "index is out of bounds for new type: {index} in {new_signature}"
            )));
        };
        if kind != &old.params()[i] {
            return Err(illegal_argument(format!(
                "parameter types do not match after reorder: {old}, {new_signature} at {i}"
            )));
        }
    }
    Ok(MethodHandle::new(
        new_signature.clone(),
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::Permute {
                reorder: Arc::from(reorder),
            },
        },
    ))
}

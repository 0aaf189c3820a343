use crate::error::{InvokeResult, illegal_argument, mismatched_types};
use crate::invoke::{
    form::{Adapter, Form},
    handle::MethodHandle,
};

/// Runs `combiner` on the parameters starting at `pos`, then calls `target`
/// with the combiner's result inserted at `pos` ahead of the same
/// arguments. A void combiner inserts nothing.
///
/// The result takes the target's parameters minus the folded slot; the
/// combiner's parameters must be a window of those starting at `pos`.
pub fn fold_arguments(
    target: &MethodHandle,
    pos: usize,
    combiner: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    let combiner_signature = combiner.signature();
    let folded = combiner_signature.ret();

    let new_signature = if folded.is_void() {
        signature.clone()
    } else {
        match signature.param(pos) {
            Some(slot) if slot == folded => signature.drop_params(pos, pos + 1)?,
            Some(_) => {
                return Err(mismatched_types(
                    "target and combiner types",
                    signature,
                    combiner_signature,
                ));
            }
            None => {
                return Err(illegal_argument(format!(
                    "fold position {pos} out of range for {signature}"
                )));
            }
        }
    };
    let window = new_signature
        .params()
        .get(pos..pos + combiner_signature.arity());
    if window != Some(combiner_signature.params()) {
        return Err(mismatched_types(
            "target and combiner types",
            signature,
            combiner_signature,
        ));
    }
    Ok(MethodHandle::new(
        new_signature,
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::Fold {
                pos,
                combiner: combiner.clone(),
            },
        },
    ))
}

use crate::error::{InvokeResult, illegal_argument};
use crate::host::kind::Kind;
use crate::invoke::{
    form::{Adapter, Form},
    handle::MethodHandle,
};

/// Accepts and ignores extra parameters of `kinds` at `pos`.
pub fn drop_arguments(target: &MethodHandle, pos: usize, kinds: &[Kind]) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    if pos > signature.arity() {
        return Err(illegal_argument(format!(
            "drop position {pos} out of range for {signature}"
        )));
    }
    let new_signature = signature.insert_params(pos, kinds)?;
    if kinds.is_empty() {
        return Ok(target.clone());
    }
    Ok(MethodHandle::new(
        new_signature,
        Form::Adapted {
            target: target.as_fixed_arity(),
            adapter: Adapter::Drop {
                pos,
                count: kinds.len(),
            },
        },
    ))
}

/// Drops parameters so that `target` accepts the first `skip` of its own
/// parameters followed by `new_kinds`.
///
/// The parameters of `target` after `skip` must appear in `new_kinds`
/// starting at `pos`; every other entry of `new_kinds` is ignored.
pub fn drop_arguments_to_match(
    target: &MethodHandle,
    skip: usize,
    new_kinds: &[Kind],
    pos: usize,
) -> InvokeResult<MethodHandle> {
    let params = target.signature().params();
    if skip > params.len() {
        return Err(illegal_argument(format!(
            "skip {skip} out of range for {}",
            target.signature()
        )));
    }
    if pos > new_kinds.len() {
        return Err(illegal_argument(format!(
            "position {pos} out of range for {} new parameters",
            new_kinds.len()
        )));
    }
    let kept = &params[skip..];
    let window_end = pos + kept.len();
    if window_end > new_kinds.len() || &new_kinds[pos..window_end] != kept {
        return Err(illegal_argument(format!(
            "argument lists do not match: {kept:?} not found at {pos} in {new_kinds:?}"
        )));
    }
    let leading = drop_arguments(target, skip, &new_kinds[..pos])?;
    let arity = leading.arity();
    drop_arguments(&leading, arity, &new_kinds[window_end..])
}

/// Discards the return value of `target`.
pub fn drop_return(target: &MethodHandle) -> InvokeResult<MethodHandle> {
    let signature = target.signature().change_return(Kind::Void);
    super::as_type(target, &signature)
}

use std::sync::Arc;

use crate::error::{InvokeResult, illegal_argument, mismatched_types};
use crate::host::kind::Kind;
use crate::invoke::{form::Form, handle::MethodHandle};

/// Calls `then` when `test` returns true and `otherwise` when it returns
/// false. `test` sees a prefix of the arguments.
pub fn guard_with_test(
    test: &MethodHandle,
    then: &MethodHandle,
    otherwise: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    let test_signature = test.signature();
    if test_signature.ret() != &Kind::BOOLEAN {
        return Err(illegal_argument(format!(
            "guard type is not a predicate: {test_signature}"
        )));
    }
    let signature = then.signature();
    if signature != otherwise.signature() {
        return Err(mismatched_types(
            "target and fallback types",
            signature,
            otherwise.signature(),
        ));
    }
    if !signature.params().starts_with(test_signature.params()) {
        return Err(mismatched_types(
            "target and test types",
            signature,
            test_signature,
        ));
    }
    Ok(MethodHandle::new(
        signature.clone(),
        Form::Guarded {
            test: test.clone(),
            then: then.as_fixed_arity(),
            otherwise: otherwise.as_fixed_arity(),
        },
    ))
}

/// Selects `targets[i]` by the leading int argument `i`, or `fallback` when
/// `i` is out of range. Every case receives all arguments, selector included.
pub fn table_switch(fallback: &MethodHandle, targets: &[MethodHandle]) -> InvokeResult<MethodHandle> {
    if targets.is_empty() {
        return Err(illegal_argument("table switch needs at least one target"));
    }
    let signature = fallback.signature();
    if signature.param(0) != Some(&Kind::INT) {
        return Err(illegal_argument(format!(
            "case selector must be a leading int parameter: {signature}"
        )));
    }
    if let Some(mismatch) = targets.iter().find(|t| t.signature() != signature) {
        return Err(mismatched_types(
            "case and fallback types",
            signature,
            mismatch.signature(),
        ));
    }
    let cases: Vec<MethodHandle> = targets.iter().map(MethodHandle::as_fixed_arity).collect();
    Ok(MethodHandle::new(
        signature.clone(),
        Form::Switch {
            fallback: fallback.as_fixed_arity(),
            targets: Arc::from(cases),
        },
    ))
}

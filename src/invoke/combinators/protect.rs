use crate::error::{InvokeError, InvokeResult, illegal_argument, mismatched_types};
use crate::host::{class::ClassRef, kind::Kind, value::Value};
use crate::invoke::{form::Form, handle::MethodHandle, signature::Signature};

/// Runs `target`; if it fails with an instance of `exception`, runs
/// `handler` on the throwable followed by a prefix of the arguments.
pub fn catch_exception(
    target: &MethodHandle,
    exception: &ClassRef,
    handler: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    let exception_kind = Kind::class(exception);
    if !exception_kind.is_throwable() {
        return Err(illegal_argument(format!(
            "{} is not a throwable class",
            exception.name()
        )));
    }
    let signature = target.signature();
    let handler_signature = handler.signature();
    match handler_signature.param(0) {
        Some(first) if first.is_reference() && first.is_assignable_from(&exception_kind) => {}
        _ => {
            return Err(mismatched_types(
                "handler and exception types",
                handler_signature,
                exception.name(),
            ));
        }
    }
    if handler_signature.ret() != signature.ret()
        || !signature.params().starts_with(&handler_signature.params()[1..])
    {
        return Err(mismatched_types(
            "target and handler types",
            signature,
            handler_signature,
        ));
    }
    Ok(MethodHandle::new(
        signature.clone(),
        Form::Catching {
            target: target.as_fixed_arity(),
            exception: exception.clone(),
            handler: handler.as_fixed_arity(),
        },
    ))
}

/// Runs `target`, then always runs `cleanup` with the throwable (or null),
/// the result (or its zero value when the target returns a value) and a
/// prefix of the arguments. A failure of the target is rethrown after a
/// successful cleanup; otherwise the cleanup's result is returned.
pub fn try_finally(target: &MethodHandle, cleanup: &MethodHandle) -> InvokeResult<MethodHandle> {
    let signature = target.signature();
    let cleanup_signature = cleanup.signature();
    let ret = signature.ret();
    if cleanup_signature.ret() != ret {
        return Err(illegal_argument(format!(
            "target and cleanup return types must match: {signature} and {cleanup_signature}"
        )));
    }
    if cleanup_signature.param(0) != Some(&Kind::throwable()) {
        return Err(illegal_argument(format!(
            "cleanup first argument and Throwable must match: {cleanup_signature}"
        )));
    }
    let leading = if ret.is_void() {
        1
    } else {
        if cleanup_signature.param(1) != Some(ret) {
            return Err(illegal_argument(format!(
                "cleanup second argument and target return type must match: {cleanup_signature} and {signature}"
            )));
        }
        2
    };
    if !signature
        .params()
        .starts_with(&cleanup_signature.params()[leading..])
    {
        return Err(illegal_argument(format!(
            "cleanup parameters after (Throwable, result) and target parameter list prefix must match: {cleanup_signature} and {signature}"
        )));
    }
    Ok(MethodHandle::new(
        signature.clone(),
        Form::Finally {
            target: target.as_fixed_arity(),
            cleanup: cleanup.as_fixed_arity(),
        },
    ))
}

/// A handle of signature `(exception)ret` that throws its argument.
pub fn throw_exception(ret: Kind, exception: &Kind) -> InvokeResult<MethodHandle> {
    if !exception.is_throwable() {
        return Err(illegal_argument(format!("{exception} is not a throwable type")));
    }
    let signature = Signature::new(ret, [exception.clone()])?;
    Ok(MethodHandle::from_fn("throw", signature, |args| {
        match args.into_iter().next() {
            Some(Value::Object(throwable)) => Err(InvokeError::from_throwable(throwable)),
            _ => Err(InvokeError::NullPointer("cannot throw null".into())),
        }
    }))
}

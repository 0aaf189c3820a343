//! Handles that invoke a handle passed as their leading argument.

use std::fmt;
use std::sync::OnceLock;

use dashmap::DashMap;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{kind::Kind, value::Value};
use crate::invoke::{
    form::Form,
    handle::MethodHandle,
    signature::{MAX_ARITY, Signature},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InvokerKind {
    Exact,
    Generic,
}

impl InvokerKind {
    pub(crate) fn run(self, target_type: &Signature, mut args: Vec<Value>) -> InvokeResult<Value> {
        let handle = match args.first() {
            Some(Value::Handle(handle)) => handle.clone(),
            Some(Value::Null) | None => {
                return Err(InvokeError::NullPointer("invoked handle is null".into()));
            }
            Some(other) => {
                return Err(InvokeError::ClassCast(format!(
                    "{} is not a MethodHandle",
                    other.type_name()
                )));
            }
        };
        args.remove(0);
        match self {
            InvokerKind::Exact => {
                if handle.signature() != target_type {
                    return Err(InvokeError::WrongMethodType(format!(
                        "expected {target_type} but found {}",
                        handle.signature()
                    )));
                }
                handle.invoke_basic(args)
            }
            InvokerKind::Generic => handle.as_type(target_type)?.invoke_basic(args),
        }
    }
}

impl fmt::Display for InvokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokerKind::Exact => f.write_str("exact"),
            InvokerKind::Generic => f.write_str("generic"),
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
enum Flavor {
    Exact,
    Generic,
    Spread(usize),
}

fn cache() -> &'static DashMap<(Signature, Flavor), MethodHandle> {
    static CACHE: OnceLock<DashMap<(Signature, Flavor), MethodHandle>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

fn cached(
    signature: &Signature,
    flavor: Flavor,
    build: impl FnOnce() -> InvokeResult<MethodHandle>,
) -> InvokeResult<MethodHandle> {
    let key = (signature.clone(), flavor);
    if let Some(found) = cache().get(&key) {
        return Ok(found.clone());
    }
    let built = build()?;
    Ok(cache().entry(key).or_insert(built).clone())
}

fn check_room(signature: &Signature) -> InvokeResult<()> {
    if signature.arity() >= MAX_ARITY {
        return Err(illegal_argument(format!(
            "no room for an invoked handle in a signature of arity {}",
            signature.arity()
        )));
    }
    Ok(())
}

fn build(signature: &Signature, kind: InvokerKind) -> InvokeResult<MethodHandle> {
    check_room(signature)?;
    let invoker_type = signature.insert_params(0, &[Kind::handle()])?;
    Ok(MethodHandle::new(
        invoker_type,
        Form::Invoker {
            kind,
            target_type: signature.clone(),
        },
    ))
}

/// `(MethodHandle, params...)ret` invoking its first argument exactly.
pub fn exact_invoker(signature: &Signature) -> InvokeResult<MethodHandle> {
    cached(signature, Flavor::Exact, || build(signature, InvokerKind::Exact))
}

/// `(MethodHandle, params...)ret` adapting its first argument to
/// `signature` before invoking it.
pub fn invoker(signature: &Signature) -> InvokeResult<MethodHandle> {
    cached(signature, Flavor::Generic, || build(signature, InvokerKind::Generic))
}

/// Like `invoker`, but the parameters after the first `leading` ones are
/// passed as a single `Object[]`.
pub fn spread_invoker(signature: &Signature, leading: usize) -> InvokeResult<MethodHandle> {
    check_room(signature)?;
    if leading > signature.arity() {
        return Err(illegal_argument(format!(
            "leading argument count {leading} out of range for {signature}"
        )));
    }
    cached(signature, Flavor::Spread(leading), || {
        let base = invoker(signature)?;
        base.as_spreader(1 + leading, &Kind::object_array(), signature.arity() - leading)
    })
}

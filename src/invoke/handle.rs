use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config;
use crate::error::{InvokeError, InvokeResult, arity_mismatch, illegal_argument};
use crate::host::{
    class::{CallContext, ClassRef, NativeFn},
    convert::coerce_argument,
    kind::{Kind, require_array},
    value::Value,
};
use crate::invoke::{
    combinators,
    describe::HandleDescription,
    direct::{DirectTarget, MemberInfo},
    form::Form,
    signature::Signature,
};
use crate::telemetry;

struct HandleData {
    signature: Signature,
    form: Form,
    varargs: bool,
}

/// A typed, immutable reference to a computation.
///
/// Cloning is cheap: handles share their strategy tree.
#[derive(Clone)]
pub struct MethodHandle(Arc<HandleData>);

impl MethodHandle {
    pub(crate) fn new(signature: Signature, form: Form) -> MethodHandle {
        telemetry::record_handle();
        MethodHandle(Arc::new(HandleData {
            signature,
            form,
            varargs: false,
        }))
    }

    pub(crate) fn direct(signature: Signature, target: DirectTarget, varargs: bool) -> MethodHandle {
        telemetry::record_handle();
        MethodHandle(Arc::new(HandleData {
            signature,
            form: Form::Direct(target),
            varargs,
        }))
    }

    /// Direct handle over a Rust closure. The closure receives arguments
    /// that fit `signature` and must return a value of its return kind.
    pub fn from_fn<F>(name: &str, signature: Signature, body: F) -> MethodHandle
    where
        F: Fn(Vec<Value>) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        let body: NativeFn = Arc::new(move |_: &CallContext, args: Vec<Value>| body(args));
        MethodHandle::direct(signature, DirectTarget::native(name, body), false)
    }

    pub(crate) fn form(&self) -> &Form {
        &self.0.form
    }

    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    pub fn arity(&self) -> usize {
        self.0.signature.arity()
    }

    pub fn is_varargs_collector(&self) -> bool {
        self.0.varargs
    }

    /// Member behind a direct handle, if it was resolved from one.
    pub(crate) fn member(&self) -> Option<&MemberInfo> {
        match &self.0.form {
            Form::Direct(target) => target.member.as_ref(),
            _ => None,
        }
    }

    /// Class a caller-sensitive direct handle was resolved for.
    pub(crate) fn caller(&self) -> Option<&ClassRef> {
        match &self.0.form {
            Form::Direct(target) => target.caller.as_ref(),
            _ => None,
        }
    }

    pub fn same_handle(&self, other: &MethodHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Invokes with arguments whose runtime shapes must match the signature
    /// exactly. No conversion of any kind is applied.
    pub fn invoke_exact(&self, args: Vec<Value>) -> InvokeResult<Value> {
        let signature = self.signature();
        if args.len() != signature.arity() {
            return Err(arity_mismatch(signature.arity(), args.len()));
        }
        if let Some((index, value)) = args
            .iter()
            .zip(signature.params())
            .enumerate()
            .find_map(|(i, (value, kind))| (!value.fits(kind)).then_some((i, value)))
        {
            return Err(InvokeError::WrongMethodType(format!(
                "expected {signature} but argument {index} is {}",
                value.type_name()
            )));
        }
        self.invoke_basic(args)
    }

    /// Invokes after converting each argument to its slot by the widening,
    /// boxing and unboxing rules. A varargs collector whose trailing
    /// arguments do not already form its array collects them first.
    pub fn invoke(&self, args: Vec<Value>) -> InvokeResult<Value> {
        if self.is_varargs_collector() && self.needs_collection(&args) {
            let arity = self.arity();
            if args.len() + 1 < arity {
                return Err(arity_mismatch(arity - 1, args.len()));
            }
            let array_kind = self.signature().params()[arity - 1].clone();
            let collector =
                self.as_fixed_arity()
                    .as_collector(arity - 1, &array_kind, args.len() + 1 - arity)?;
            return collector.invoke(args);
        }
        let signature = self.signature();
        if args.len() != signature.arity() {
            return Err(arity_mismatch(signature.arity(), args.len()));
        }
        let coerced = args
            .into_iter()
            .zip(signature.params())
            .map(|(value, kind)| coerce_argument(value, kind))
            .collect::<InvokeResult<Vec<_>>>()?;
        self.invoke_basic(coerced)
    }

    fn needs_collection(&self, args: &[Value]) -> bool {
        if args.len() != self.arity() {
            return true;
        }
        match (args.last(), self.signature().last_param()) {
            (Some(last), Some(kind)) => !last.fits(kind),
            _ => false,
        }
    }

    pub(crate) fn invoke_basic(&self, args: Vec<Value>) -> InvokeResult<Value> {
        if config::trace_enabled() {
            trace!(
                signature = %self.signature(),
                strategy = self.0.form.strategy(),
                "invoke"
            );
        }
        let result = self.0.form.run(args)?;
        let ret = self.signature().ret();
        if ret.is_void() {
            return Ok(Value::Void);
        }
        if !result.fits(ret) {
            return Err(InvokeError::WrongMethodType(format!(
                "{} returned {} where {ret} was expected",
                self.0.form.strategy(),
                result.type_name()
            )));
        }
        Ok(result)
    }

    /// Adapts this handle to `signature` with the `as_type` conversions.
    pub fn as_type(&self, signature: &Signature) -> InvokeResult<MethodHandle> {
        combinators::as_type(self, signature)
    }

    /// Fixes the leading reference argument.
    pub fn bind_to(&self, value: Value) -> InvokeResult<MethodHandle> {
        combinators::bind_to(self, value)
    }

    pub fn as_spreader(&self, pos: usize, array_kind: &Kind, count: usize) -> InvokeResult<MethodHandle> {
        combinators::as_spreader(self, pos, array_kind, count)
    }

    pub fn as_collector(&self, pos: usize, array_kind: &Kind, count: usize) -> InvokeResult<MethodHandle> {
        combinators::as_collector(self, pos, array_kind, count)
    }

    /// Marks this handle as collecting trailing arguments into its last,
    /// array-typed parameter when invoked generically.
    pub fn as_varargs_collector(&self, array_kind: &Kind) -> InvokeResult<MethodHandle> {
        require_array(array_kind, "as_varargs_collector")?;
        let last = self.signature().last_param().ok_or_else(|| {
            illegal_argument(format!("{} has no trailing array parameter", self.signature()))
        })?;
        if !last.is_array() || !last.is_assignable_from(array_kind) {
            return Err(illegal_argument(format!(
                "array type {array_kind} is not assignable to trailing parameter {last}"
            )));
        }
        if self.is_varargs_collector() && last == array_kind {
            return Ok(self.clone());
        }
        Ok(self.with_varargs_flag(true))
    }

    pub fn as_fixed_arity(&self) -> MethodHandle {
        if self.is_varargs_collector() {
            self.with_varargs_flag(false)
        } else {
            self.clone()
        }
    }

    pub fn with_varargs(&self, varargs: bool) -> InvokeResult<MethodHandle> {
        if !varargs {
            return Ok(self.as_fixed_arity());
        }
        match self.signature().last_param() {
            Some(last) if last.is_array() => self.as_varargs_collector(&last.clone()),
            _ => Err(illegal_argument(format!(
                "not an array parameter list for varargs: {}",
                self.signature()
            ))),
        }
    }

    fn with_varargs_flag(&self, varargs: bool) -> MethodHandle {
        telemetry::record_handle();
        MethodHandle(Arc::new(HandleData {
            signature: self.0.signature.clone(),
            form: self.0.form.clone(),
            varargs,
        }))
    }

    pub fn describe(&self) -> HandleDescription {
        HandleDescription::of(self)
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodHandle{}", self.signature())
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self, self.0.form.strategy())
    }
}

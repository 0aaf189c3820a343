//! Resolution of methods, constructors and fields into direct handles.

use std::sync::Arc;

use tracing::debug;

use crate::error::{InvokeError, InvokeResult};
use crate::host::{
    class::{Class, ClassRef, FieldDef, MethodDef, Modifiers},
    kind::Kind,
    value::Value,
};
use crate::invoke::{
    direct::{DirectOp, DirectTarget, MemberInfo, RefKind},
    handle::MethodHandle,
    signature::Signature,
};
use crate::lookup::{AccessModes, Lookup, access::same_package};

impl Lookup {
    /// Handle on the static method `name` of `refc`.
    pub fn find_static(
        &self,
        refc: &ClassRef,
        name: &str,
        signature: &Signature,
    ) -> InvokeResult<MethodHandle> {
        let (declaring, method) = resolve_method(refc, name, signature)?;
        if !method.is_static() {
            return Err(InvokeError::IllegalAccess(format!(
                "expected a static method: {declaring}.{name}{signature}"
            )));
        }
        self.check_access(refc, &declaring, name, method.modifiers())?;
        self.static_handle(&declaring, method)
    }

    /// Handle on the instance method `name` of `refc`, dispatched on the
    /// receiver's runtime class. The receiver becomes the leading parameter.
    pub fn find_virtual(
        &self,
        refc: &ClassRef,
        name: &str,
        signature: &Signature,
    ) -> InvokeResult<MethodHandle> {
        let (declaring, method) = resolve_method(refc, name, signature)?;
        if method.is_static() {
            return Err(InvokeError::IllegalAccess(format!(
                "expected a non-static method: {declaring}.{name}{signature}"
            )));
        }
        self.check_access(refc, &declaring, name, method.modifiers())?;
        self.virtual_handle(refc, &declaring, method)
    }

    /// Handle on `name` as seen by a super call from `special_caller`,
    /// bypassing overrides. Only the lookup class itself may be the
    /// special caller, and only with private access.
    pub fn find_special(
        &self,
        refc: &ClassRef,
        name: &str,
        signature: &Signature,
        special_caller: &ClassRef,
    ) -> InvokeResult<MethodHandle> {
        self.check_special_caller(special_caller)?;
        let (declaring, method) = resolve_method(refc, name, signature)?;
        if method.is_static() {
            return Err(InvokeError::IllegalAccess(format!(
                "expected a non-static method: {declaring}.{name}{signature}"
            )));
        }
        self.check_access(refc, &declaring, name, method.modifiers())?;
        self.special_handle(&declaring, method, special_caller)
    }

    /// Handle that allocates a `refc` and runs the constructor matching
    /// `signature`, which must return void. The handle returns the object.
    pub fn find_constructor(
        &self,
        refc: &ClassRef,
        signature: &Signature,
    ) -> InvokeResult<MethodHandle> {
        if !signature.ret().is_void() {
            return Err(InvokeError::NoSuchMethod(format!(
                "constructor type must return void: {signature}"
            )));
        }
        if refc.is_array() {
            return Err(InvokeError::NoSuchMethod(format!(
                "array class {refc} has no constructors"
            )));
        }
        let init = refc.declared_constructor(signature).ok_or_else(|| {
            InvokeError::NoSuchMethod(format!("no constructor {refc}.<init>{signature}"))
        })?;
        self.check_access(refc, refc, "<init>", init.modifiers())?;
        self.constructor_handle(refc, init)
    }

    /// Handle reading the instance field `name`: `(refc)kind`.
    pub fn find_getter(&self, refc: &ClassRef, name: &str, kind: &Kind) -> InvokeResult<MethodHandle> {
        let (declaring, field) = resolve_field(refc, name, kind, false)?;
        self.check_access(refc, &declaring, name, field.modifiers())?;
        field_handle(refc, &declaring, &field, RefKind::GetField)
    }

    /// Handle writing the instance field `name`: `(refc, kind)void`.
    pub fn find_setter(&self, refc: &ClassRef, name: &str, kind: &Kind) -> InvokeResult<MethodHandle> {
        let (declaring, field) = resolve_field(refc, name, kind, false)?;
        self.check_access(refc, &declaring, name, field.modifiers())?;
        check_writable(&declaring, &field)?;
        field_handle(refc, &declaring, &field, RefKind::PutField)
    }

    /// Handle reading the static field `name`: `()kind`.
    pub fn find_static_getter(
        &self,
        refc: &ClassRef,
        name: &str,
        kind: &Kind,
    ) -> InvokeResult<MethodHandle> {
        let (declaring, field) = resolve_field(refc, name, kind, true)?;
        self.check_access(refc, &declaring, name, field.modifiers())?;
        field_handle(refc, &declaring, &field, RefKind::GetStatic)
    }

    /// Handle writing the static field `name`: `(kind)void`.
    pub fn find_static_setter(
        &self,
        refc: &ClassRef,
        name: &str,
        kind: &Kind,
    ) -> InvokeResult<MethodHandle> {
        let (declaring, field) = resolve_field(refc, name, kind, true)?;
        self.check_access(refc, &declaring, name, field.modifiers())?;
        check_writable(&declaring, &field)?;
        field_handle(refc, &declaring, &field, RefKind::PutStatic)
    }

    /// Resolves `name` in the lookup class's domain and checks that this
    /// lookup can see it.
    pub fn find_class(&self, name: &str) -> InvokeResult<ClassRef> {
        let domain = self.lookup_class().domain().ok_or_else(|| {
            InvokeError::IllegalState(format!("domain of {} is gone", self.lookup_class()))
        })?;
        let class = domain
            .find_class(name)
            .ok_or_else(|| InvokeError::Linkage(format!("class {name} not found")))?;
        self.access_class(&class)
    }

    /// Returns `target` if this lookup can see it.
    pub fn access_class(&self, target: &ClassRef) -> InvokeResult<ClassRef> {
        if self.can_access_class(target) {
            return Ok(target.clone());
        }
        Err(InvokeError::IllegalAccess(format!(
            "class {target} is not accessible from {self}"
        )))
    }

    /// Virtual handle on `name` resolved against `receiver`'s class, with
    /// the receiver already bound.
    pub fn bind(&self, receiver: Value, name: &str, signature: &Signature) -> InvokeResult<MethodHandle> {
        let class = match &receiver {
            Value::Null => {
                return Err(InvokeError::NullPointer(format!(
                    "cannot bind {name} to a null receiver"
                )));
            }
            value => value.runtime_class().ok_or_else(|| {
                InvokeError::ClassCast(format!("{} is not a receiver", value.type_name()))
            })?,
        };
        let handle = self.find_virtual(&class, name, signature)?;
        let bound = handle.as_fixed_arity().bind_to(receiver)?;
        if handle.is_varargs_collector() {
            return bound.with_varargs(true);
        }
        Ok(bound)
    }

    pub(crate) fn check_special_caller(&self, special_caller: &ClassRef) -> InvokeResult<()> {
        if !self.lookup_modes().contains(AccessModes::PRIVATE)
            || special_caller != self.lookup_class()
        {
            return Err(InvokeError::IllegalAccess(format!(
                "no private access for invokespecial: {special_caller}, from {self}"
            )));
        }
        Ok(())
    }

    pub(crate) fn static_handle(
        &self,
        declaring: &ClassRef,
        method: Arc<MethodDef>,
    ) -> InvokeResult<MethodHandle> {
        let caller = self.check_caller_sensitive(declaring, method.name(), method.modifiers())?;
        let signature = method.signature().clone();
        let member = method_member(declaring, &method, RefKind::InvokeStatic);
        let varargs = method.is_varargs();
        let target = DirectTarget::member(DirectOp::Static(method), member, caller);
        debug!(member = %target.label, lookup = %self, "resolved static method");
        direct_handle(signature, target, varargs)
    }

    pub(crate) fn virtual_handle(
        &self,
        refc: &ClassRef,
        declaring: &ClassRef,
        method: Arc<MethodDef>,
    ) -> InvokeResult<MethodHandle> {
        let caller = self.check_caller_sensitive(declaring, method.name(), method.modifiers())?;
        let receiver = self.receiver_kind(refc, declaring, method.modifiers());
        let signature = method.signature().insert_params(0, &[receiver])?;
        let ref_kind = if declaring.is_interface() {
            RefKind::InvokeInterface
        } else {
            RefKind::InvokeVirtual
        };
        let member = method_member(declaring, &method, ref_kind);
        let varargs = method.is_varargs();
        let op = if method.modifiers().is_private() {
            DirectOp::Special(method)
        } else {
            DirectOp::Virtual(method)
        };
        let target = DirectTarget::member(op, member, caller);
        debug!(member = %target.label, lookup = %self, "resolved virtual method");
        direct_handle(signature, target, varargs)
    }

    pub(crate) fn special_handle(
        &self,
        declaring: &ClassRef,
        method: Arc<MethodDef>,
        special_caller: &ClassRef,
    ) -> InvokeResult<MethodHandle> {
        let caller = self.check_caller_sensitive(declaring, method.name(), method.modifiers())?;
        let signature = method
            .signature()
            .insert_params(0, &[Kind::class(special_caller)])?;
        let member = method_member(declaring, &method, RefKind::InvokeSpecial);
        let varargs = method.is_varargs();
        let target = DirectTarget::member(DirectOp::Special(method), member, caller);
        debug!(member = %target.label, lookup = %self, "resolved special method");
        direct_handle(signature, target, varargs)
    }

    pub(crate) fn constructor_handle(
        &self,
        class: &ClassRef,
        init: Arc<MethodDef>,
    ) -> InvokeResult<MethodHandle> {
        if class.modifiers().contains(Modifiers::ABSTRACT) {
            return Err(InvokeError::IllegalAccess(format!(
                "cannot instantiate abstract class {class}"
            )));
        }
        let signature = init.signature().change_return(Kind::class(class));
        let member = method_member(class, &init, RefKind::NewInvokeSpecial);
        let varargs = init.is_varargs();
        let op = DirectOp::Construct {
            class: class.clone(),
            init,
        };
        let target = DirectTarget::member(op, member, None);
        debug!(member = %target.label, lookup = %self, "resolved constructor");
        direct_handle(signature, target, varargs)
    }

    /// Protected instance members reached from a subclass in another
    /// package may only be invoked on receivers of the lookup class.
    fn receiver_kind(&self, refc: &ClassRef, declaring: &ClassRef, modifiers: Modifiers) -> Kind {
        let lookup_class = self.lookup_class();
        if modifiers.is_protected()
            && !same_package(declaring, lookup_class)
            && lookup_class.is_subclass_of(declaring)
            && !lookup_class.is_interface()
        {
            return Kind::class(lookup_class);
        }
        Kind::class(refc)
    }
}

pub(crate) fn resolve_method(
    refc: &ClassRef,
    name: &str,
    signature: &Signature,
) -> InvokeResult<(ClassRef, Arc<MethodDef>)> {
    if name == "<init>" {
        return Err(InvokeError::NoSuchMethod(format!(
            "{refc}.{name}{signature} is a constructor"
        )));
    }
    Class::resolve_method(refc, name, signature)
        .ok_or_else(|| InvokeError::NoSuchMethod(format!("no method {refc}.{name}{signature}")))
}

fn resolve_field(
    refc: &ClassRef,
    name: &str,
    kind: &Kind,
    want_static: bool,
) -> InvokeResult<(ClassRef, Arc<FieldDef>)> {
    let (declaring, field) = Class::resolve_field(refc, name)
        .ok_or_else(|| InvokeError::NoSuchField(format!("no field {refc}.{name}")))?;
    if field.kind() != kind {
        return Err(InvokeError::NoSuchField(format!(
            "field {declaring}.{name} has type {}, not {kind}",
            field.kind()
        )));
    }
    if field.is_static() != want_static {
        let expected = if want_static { "a static" } else { "an instance" };
        return Err(InvokeError::IllegalAccess(format!(
            "expected {expected} field: {declaring}.{name}"
        )));
    }
    Ok((declaring, field))
}

pub(crate) fn check_writable(declaring: &ClassRef, field: &FieldDef) -> InvokeResult<()> {
    if field.modifiers().is_final() {
        return Err(InvokeError::IllegalAccess(format!(
            "field {declaring}.{} is final",
            field.name()
        )));
    }
    Ok(())
}

fn method_member(declaring: &ClassRef, method: &MethodDef, ref_kind: RefKind) -> MemberInfo {
    MemberInfo {
        declaring: declaring.clone(),
        name: method.name.clone(),
        ref_kind,
        method_type: method.signature().clone(),
        modifiers: method.modifiers(),
    }
}

/// Builds the accessor handle for `field`. `refc` types the receiver of
/// instance accessors.
pub(crate) fn field_handle(
    refc: &ClassRef,
    declaring: &ClassRef,
    field: &FieldDef,
    ref_kind: RefKind,
) -> InvokeResult<MethodHandle> {
    let kind = field.kind().clone();
    let receiver = Kind::class(refc);
    let (signature, method_type, op) = match ref_kind {
        RefKind::GetField => (
            Signature::new(kind.clone(), [receiver])?,
            Signature::new(kind, [])?,
            DirectOp::GetField(field.slot),
        ),
        RefKind::PutField => (
            Signature::new(Kind::Void, [receiver, kind.clone()])?,
            Signature::new(Kind::Void, [kind])?,
            DirectOp::PutField(field.slot),
        ),
        RefKind::GetStatic => (
            Signature::new(kind.clone(), [])?,
            Signature::new(kind, [])?,
            DirectOp::GetStatic {
                class: declaring.clone(),
                slot: field.slot,
            },
        ),
        _ => (
            Signature::new(Kind::Void, [kind.clone()])?,
            Signature::new(Kind::Void, [kind])?,
            DirectOp::PutStatic {
                class: declaring.clone(),
                slot: field.slot,
            },
        ),
    };
    let member = MemberInfo {
        declaring: declaring.clone(),
        name: field.name().into(),
        ref_kind,
        method_type,
        modifiers: field.modifiers(),
    };
    Ok(MethodHandle::direct(
        signature,
        DirectTarget::member(op, member, None),
        false,
    ))
}

fn direct_handle(signature: Signature, target: DirectTarget, varargs: bool) -> InvokeResult<MethodHandle> {
    let varargs = varargs && signature.last_param().is_some_and(Kind::is_array);
    Ok(MethodHandle::direct(signature, target, varargs))
}

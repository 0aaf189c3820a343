//! Direct targets: concrete computations a handle bottoms out in.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{InvokeError, InvokeResult};
use crate::host::{
    class::{CallContext, Class, ClassRef, MethodDef, Modifiers, NativeFn},
    kind::Kind,
    object::{ArrayObject, Instance},
    value::Value,
};
use crate::invoke::signature::Signature;

/// How a direct handle reaches its member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RefKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl RefKind {
    pub fn name(self) -> &'static str {
        match self {
            RefKind::GetField => "getField",
            RefKind::GetStatic => "getStatic",
            RefKind::PutField => "putField",
            RefKind::PutStatic => "putStatic",
            RefKind::InvokeVirtual => "invokeVirtual",
            RefKind::InvokeStatic => "invokeStatic",
            RefKind::InvokeSpecial => "invokeSpecial",
            RefKind::NewInvokeSpecial => "newInvokeSpecial",
            RefKind::InvokeInterface => "invokeInterface",
        }
    }

    pub fn is_field(self) -> bool {
        matches!(
            self,
            RefKind::GetField | RefKind::GetStatic | RefKind::PutField | RefKind::PutStatic
        )
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Symbolic description of the member behind a direct handle.
#[derive(Clone)]
pub struct MemberInfo {
    pub(crate) declaring: ClassRef,
    pub(crate) name: Arc<str>,
    pub(crate) ref_kind: RefKind,
    pub(crate) method_type: Signature,
    pub(crate) modifiers: Modifiers,
}

impl MemberInfo {
    pub fn declaring_class(&self) -> &ClassRef {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ref_kind(&self) -> RefKind {
        self.ref_kind
    }

    /// Member type without a receiver. Fields report their accessor shape:
    /// `()T` for getters and `(T)void` for setters.
    pub fn method_type(&self) -> &Signature {
        &self.method_type
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_varargs(&self) -> bool {
        self.modifiers.contains(Modifiers::VARARGS)
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{}:{}",
            self.ref_kind,
            self.declaring.name(),
            self.name,
            self.method_type
        )
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[derive(Clone)]
pub(crate) enum DirectOp {
    Native(NativeFn),
    Static(Arc<MethodDef>),
    Virtual(Arc<MethodDef>),
    Special(Arc<MethodDef>),
    Construct { class: ClassRef, init: Arc<MethodDef> },
    GetField(usize),
    PutField(usize),
    GetStatic { class: ClassRef, slot: usize },
    PutStatic { class: ClassRef, slot: usize },
    ArrayNew(Kind),
    ArrayLength,
    ArrayGet,
    ArraySet,
}

#[derive(Clone)]
pub(crate) struct DirectTarget {
    pub(crate) label: Arc<str>,
    pub(crate) op: DirectOp,
    pub(crate) member: Option<MemberInfo>,
    pub(crate) caller: Option<ClassRef>,
}

impl DirectTarget {
    pub(crate) fn native(label: &str, body: NativeFn) -> DirectTarget {
        DirectTarget {
            label: label.into(),
            op: DirectOp::Native(body),
            member: None,
            caller: None,
        }
    }

    pub(crate) fn member(op: DirectOp, member: MemberInfo, caller: Option<ClassRef>) -> DirectTarget {
        DirectTarget {
            label: format!("{}.{}", member.declaring.name(), member.name).into(),
            op,
            member: Some(member),
            caller,
        }
    }

    pub(crate) fn synthetic(label: &str, op: DirectOp) -> DirectTarget {
        DirectTarget {
            label: label.into(),
            op,
            member: None,
            caller: None,
        }
    }

    pub(crate) fn invoke(&self, mut args: Vec<Value>) -> InvokeResult<Value> {
        let context = CallContext::new(self.caller.clone());
        match &self.op {
            DirectOp::Native(body) => body(&context, args),
            DirectOp::Static(method) | DirectOp::Special(method) => {
                if matches!(self.op, DirectOp::Special(_)) {
                    receiver(&args, &self.label)?;
                }
                method.call(&context, args)
            }
            DirectOp::Virtual(method) => {
                let class = receiver(&args, &self.label)?;
                let selected = Class::select_implementation(&class, &method.name, &method.signature)
                    .ok_or_else(|| {
                        InvokeError::Linkage(format!(
                            "no implementation of {}{} in {}",
                            method.name,
                            method.signature,
                            class.name()
                        ))
                    })?;
                selected.call(&context, args)
            }
            DirectOp::Construct { class, init } => {
                let object = Instance::new(class);
                args.insert(0, Value::Object(object.clone()));
                init.call(&context, args)?;
                Ok(Value::Object(object))
            }
            DirectOp::GetField(slot) => instance(&args, &self.label)?.field(*slot),
            DirectOp::PutField(slot) => {
                let object = instance(&args, &self.label)?.clone();
                let value = args.pop().unwrap_or(Value::Null);
                object.set_field(*slot, value)?;
                Ok(Value::Void)
            }
            DirectOp::GetStatic { class, slot } => class.static_value(*slot),
            DirectOp::PutStatic { class, slot } => {
                let value = args.pop().unwrap_or(Value::Null);
                class.set_static_value(*slot, value)?;
                Ok(Value::Void)
            }
            DirectOp::ArrayNew(component) => {
                let length = index_arg(&args, 0)?;
                Ok(Value::Array(ArrayObject::new(component, length)?))
            }
            DirectOp::ArrayLength => Ok(Value::Int(array(&args)?.len() as i32)),
            DirectOp::ArrayGet => array(&args)?.get(index_arg(&args, 1)?),
            DirectOp::ArraySet => {
                let target = array(&args)?.clone();
                let index = index_arg(&args, 1)?;
                let value = args.pop().unwrap_or(Value::Null);
                target.set(index, value)?;
                Ok(Value::Void)
            }
        }
    }
}

fn receiver(args: &[Value], label: &str) -> InvokeResult<ClassRef> {
    match args.first() {
        Some(Value::Null) | None => Err(InvokeError::NullPointer(format!(
            "cannot invoke {label} on a null receiver"
        ))),
        Some(value) => value.runtime_class().ok_or_else(|| {
            InvokeError::ClassCast(format!("{} is not a receiver", value.type_name()))
        }),
    }
}

fn instance<'a>(args: &'a [Value], label: &str) -> InvokeResult<&'a Arc<Instance>> {
    match args.first() {
        Some(Value::Object(object)) => Ok(object),
        Some(Value::Null) | None => Err(InvokeError::NullPointer(format!(
            "cannot access {label} on a null receiver"
        ))),
        Some(other) => Err(InvokeError::ClassCast(format!(
            "{} has no field {label}",
            other.type_name()
        ))),
    }
}

fn array(args: &[Value]) -> InvokeResult<&Arc<ArrayObject>> {
    match args.first() {
        Some(Value::Array(array)) => Ok(array),
        Some(Value::Null) | None => Err(InvokeError::NullPointer("array is null".into())),
        Some(other) => Err(InvokeError::ClassCast(format!(
            "{} is not an array",
            other.type_name()
        ))),
    }
}

fn index_arg(args: &[Value], position: usize) -> InvokeResult<i64> {
    match args.get(position) {
        Some(Value::Int(i)) => Ok(i64::from(*i)),
        Some(other) => Err(InvokeError::WrongMethodType(format!(
            "expected int index, got {}",
            other.type_name()
        ))),
        None => Err(InvokeError::ArityMismatch {
            expected: position + 1,
            actual: args.len(),
        }),
    }
}

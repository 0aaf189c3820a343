use std::fmt;
use std::sync::Arc;

use crate::host::{
    builtins,
    class::ClassRef,
    kind::{Kind, Primitive},
    object::{ArrayRef, ObjectRef},
};
use crate::invoke::handle::MethodHandle;

#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Null,
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// A primitive in its wrapper object.
    Boxed(Arc<Value>),
    Str(Arc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Handle(MethodHandle),
}

impl Value {
    pub fn string(s: &str) -> Value {
        Value::Str(s.into())
    }

    pub fn boxed(value: Value) -> Value {
        match value {
            primitive if primitive.primitive().is_some() => Value::Boxed(Arc::new(primitive)),
            other => other,
        }
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Value::Boolean(_) => Some(Primitive::Boolean),
            Value::Byte(_) => Some(Primitive::Byte),
            Value::Char(_) => Some(Primitive::Char),
            Value::Short(_) => Some(Primitive::Short),
            Value::Int(_) => Some(Primitive::Int),
            Value::Long(_) => Some(Primitive::Long),
            Value::Float(_) => Some(Primitive::Float),
            Value::Double(_) => Some(Primitive::Double),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boxed(_)
                | Value::Str(_)
                | Value::Array(_)
                | Value::Object(_)
                | Value::Handle(_)
        )
    }

    /// Class of a non-null reference.
    pub fn runtime_class(&self) -> Option<ClassRef> {
        match self {
            Value::Boxed(inner) => inner.primitive().map(|p| p.wrapper()),
            Value::Str(_) => Some(builtins::core().string.clone()),
            Value::Array(array) => Some(array.class().clone()),
            Value::Object(object) => Some(object.class().clone()),
            Value::Handle(_) => Some(builtins::core().method_handle.clone()),
            _ => None,
        }
    }

    /// Whether the value already has the representation a slot of `kind`
    /// holds, with no conversion at all.
    pub fn fits(&self, kind: &Kind) -> bool {
        match kind {
            Kind::Void => matches!(self, Value::Void),
            Kind::Prim(p) => self.primitive() == Some(*p),
            Kind::Ref(class) => match self {
                Value::Null => true,
                other => other
                    .runtime_class()
                    .is_some_and(|rc| rc.is_subclass_of(class)),
            },
        }
    }

    /// Display name of the value's runtime shape.
    pub fn type_name(&self) -> String {
        match self {
            Value::Void => "void".to_string(),
            Value::Null => "null".to_string(),
            other => match other.primitive() {
                Some(p) => p.name().to_string(),
                None => other
                    .runtime_class()
                    .map(|class| class.simple_name())
                    .unwrap_or_default(),
            },
        }
    }

    /// Payload of a primitive or boxed primitive.
    pub fn unboxed(&self) -> Option<&Value> {
        match self {
            Value::Boxed(inner) => Some(inner),
            other if other.primitive().is_some() => Some(other),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.unboxed()? {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self.unboxed()? {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self.unboxed()? {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self.unboxed()? {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&MethodHandle> {
        match self {
            Value::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    /// Reference identity for objects, value equality for everything else.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Handle(a), Value::Handle(b)) => a.same_handle(b),
            (a, b) => a == b,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Boxed(a), Value::Boxed(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a.to_vec() == b.to_vec(),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Handle(a), Value::Handle(b)) => a.same_handle(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Char(c) => match char::from_u32(u32::from(*c)) {
                Some(ch) => write!(f, "{ch}"),
                None => write!(f, "\\u{c:04x}"),
            },
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::Boxed(inner) => write!(f, "{inner}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(array) => {
                let items: Vec<String> = array.to_vec().iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Object(object) => match object.message() {
                Some(message) if object.is_throwable() => {
                    write!(f, "{}: {}", object.class().name(), message)
                }
                _ => write!(f, "{object:?}"),
            },
            Value::Handle(handle) => write!(f, "{handle}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<MethodHandle> for Value {
    fn from(value: MethodHandle) -> Self {
        Value::Handle(value)
    }
}

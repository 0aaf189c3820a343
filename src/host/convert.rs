//! Value conversions between slot kinds.
//!
//! `Conversion::plan` decides statically whether a kind may be converted to
//! another (the rules behind `as_type`, or the looser explicit-cast rules),
//! and `Conversion::apply` performs the runtime part, which may still fail
//! for reference casts and unboxing.

use crate::error::{InvokeError, InvokeResult};
use crate::host::{
    builtins,
    class::ClassRef,
    kind::{Kind, Primitive},
    value::Value,
};

#[derive(Clone, Copy)]
enum Numeric {
    Integral(i64),
    Floating(f64),
}

fn numeric(value: &Value) -> Option<Numeric> {
    Some(match value {
        Value::Boolean(b) => Numeric::Integral(i64::from(*b)),
        Value::Byte(v) => Numeric::Integral(i64::from(*v)),
        Value::Char(v) => Numeric::Integral(i64::from(*v)),
        Value::Short(v) => Numeric::Integral(i64::from(*v)),
        Value::Int(v) => Numeric::Integral(i64::from(*v)),
        Value::Long(v) => Numeric::Integral(*v),
        Value::Float(v) => Numeric::Floating(f64::from(*v)),
        Value::Double(v) => Numeric::Floating(*v),
        _ => return None,
    })
}

/// Casting conversion between primitives, including narrowing and the
/// boolean low-bit rule. Floating values narrow through `int` first.
pub(crate) fn cast_primitive(value: &Value, to: Primitive) -> InvokeResult<Value> {
    let Some(source) = numeric(value) else {
        return Err(InvokeError::ClassCast(format!(
            "cannot convert {} to {to}",
            value.type_name()
        )));
    };
    let as_int = |n: Numeric| match n {
        Numeric::Integral(v) => v as i32,
        Numeric::Floating(v) => v as i32,
    };
    Ok(match to {
        Primitive::Boolean => Value::Boolean(as_int(source) & 1 != 0),
        Primitive::Byte => Value::Byte(as_int(source) as i8),
        Primitive::Char => Value::Char(as_int(source) as u16),
        Primitive::Short => Value::Short(as_int(source) as i16),
        Primitive::Int => Value::Int(as_int(source)),
        Primitive::Long => Value::Long(match source {
            Numeric::Integral(v) => v,
            Numeric::Floating(v) => v as i64,
        }),
        Primitive::Float => Value::Float(match source {
            Numeric::Integral(v) => v as f32,
            Numeric::Floating(v) => v as f32,
        }),
        Primitive::Double => Value::Double(match source {
            Numeric::Integral(v) => v as f64,
            Numeric::Floating(v) => v,
        }),
    })
}

#[derive(Debug, Clone)]
pub(crate) enum Conversion {
    Identity,
    Primitive(Primitive),
    /// Box a primitive, then check the wrapper against `check` if present.
    Box { check: Option<ClassRef> },
    Unbox { to: Primitive, explicit: bool },
    Cast(ClassRef),
    Discard,
    Zero(Kind),
}

impl Conversion {
    /// Plans the conversion of a `from` value into a `to` slot, or `None`
    /// when no conversion exists under the chosen rules.
    pub(crate) fn plan(from: &Kind, to: &Kind, explicit: bool) -> Option<Conversion> {
        if from == to {
            return Some(Conversion::Identity);
        }
        match (from, to) {
            (_, Kind::Void) => Some(Conversion::Discard),
            (Kind::Void, to) => Some(Conversion::Zero(to.clone())),
            (Kind::Prim(f), Kind::Prim(t)) => {
                (explicit || f.widens_to(*t)).then_some(Conversion::Primitive(*t))
            }
            (Kind::Prim(f), Kind::Ref(t)) => {
                if f.wrapper().is_subclass_of(t) {
                    Some(Conversion::Box { check: None })
                } else if explicit {
                    Some(Conversion::Box {
                        check: Some(t.clone()),
                    })
                } else {
                    None
                }
            }
            (Kind::Ref(f), Kind::Prim(t)) => {
                if explicit {
                    return Some(Conversion::Unbox {
                        to: *t,
                        explicit: true,
                    });
                }
                let convertible = match builtins::unwrap_class(f) {
                    Some(wrapped) => wrapped.widens_to(*t),
                    None => t.wrapper().is_subclass_of(f),
                };
                convertible.then_some(Conversion::Unbox {
                    to: *t,
                    explicit: false,
                })
            }
            (Kind::Ref(f), Kind::Ref(t)) => {
                if f.is_subclass_of(t) {
                    Some(Conversion::Identity)
                } else {
                    Some(Conversion::Cast(t.clone()))
                }
            }
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        matches!(self, Conversion::Identity)
    }

    pub(crate) fn apply(&self, value: Value) -> InvokeResult<Value> {
        match self {
            Conversion::Identity => Ok(value),
            Conversion::Primitive(to) => cast_primitive(&value, *to),
            Conversion::Box { check } => {
                let boxed = Value::boxed(value);
                if let Some(target) = check {
                    check_cast(&boxed, target)?;
                }
                Ok(boxed)
            }
            Conversion::Unbox { to, explicit } => unbox(&value, *to, *explicit),
            Conversion::Cast(target) => {
                check_cast(&value, target)?;
                Ok(value)
            }
            Conversion::Discard => Ok(Value::Void),
            Conversion::Zero(kind) => Ok(kind.zero()),
        }
    }
}

fn check_cast(value: &Value, target: &ClassRef) -> InvokeResult<()> {
    match value.runtime_class() {
        None => Ok(()),
        Some(class) if class.is_subclass_of(target) => Ok(()),
        Some(class) => Err(InvokeError::ClassCast(format!(
            "cannot cast {} to {}",
            class.name(),
            target.name()
        ))),
    }
}

fn unbox(value: &Value, to: Primitive, explicit: bool) -> InvokeResult<Value> {
    match value {
        Value::Null if explicit => Ok(to.zero()),
        Value::Null => Err(InvokeError::NullPointer(format!(
            "cannot unbox null to {to}"
        ))),
        Value::Boxed(inner) => match inner.primitive() {
            Some(from) if explicit || from.widens_to(to) => cast_primitive(inner, to),
            _ => Err(InvokeError::ClassCast(format!(
                "cannot cast {} to {}",
                value.type_name(),
                to.wrapper().simple_name()
            ))),
        },
        other if other.primitive().is_some() => cast_primitive(other, to),
        other => Err(InvokeError::ClassCast(format!(
            "cannot cast {} to {}",
            other.type_name(),
            to.wrapper().simple_name()
        ))),
    }
}

/// Converts an argument of a generic invocation into its slot, treating the
/// value's runtime shape as its static type.
pub(crate) fn coerce_argument(value: Value, to: &Kind) -> InvokeResult<Value> {
    match to {
        Kind::Void => Err(InvokeError::WrongMethodType(
            "cannot pass a value to a void slot".into(),
        )),
        Kind::Prim(p) => match value.unboxed().and_then(Value::primitive) {
            Some(from) if from.widens_to(*p) => {
                let primitive = value.unboxed().cloned().unwrap_or(Value::Null);
                cast_primitive(&primitive, *p)
            }
            _ if value.is_null() => Err(InvokeError::NullPointer(format!(
                "cannot unbox null to {p}"
            ))),
            _ => Err(InvokeError::WrongMethodType(format!(
                "cannot convert {} to {p}",
                value.type_name()
            ))),
        },
        Kind::Ref(class) => match value.primitive() {
            Some(from) if from.wrapper().is_subclass_of(class) => Ok(Value::boxed(value)),
            Some(from) => Err(InvokeError::WrongMethodType(format!(
                "cannot convert {from} to {}",
                class.simple_name()
            ))),
            None => {
                check_cast(&value, class)?;
                Ok(value)
            }
        },
    }
}

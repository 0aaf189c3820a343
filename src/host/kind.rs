use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{InvokeResult, illegal_argument};
use crate::host::{builtins, class::{Class, ClassRef}, value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn descriptor(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Byte => 'B',
            Primitive::Char => 'C',
            Primitive::Short => 'S',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
        }
    }

    pub fn from_descriptor(c: char) -> Option<Primitive> {
        Primitive::ALL.into_iter().find(|p| p.descriptor() == c)
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Primitive::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn zero(self) -> Value {
        match self {
            Primitive::Boolean => Value::Boolean(false),
            Primitive::Byte => Value::Byte(0),
            Primitive::Char => Value::Char(0),
            Primitive::Short => Value::Short(0),
            Primitive::Int => Value::Int(0),
            Primitive::Long => Value::Long(0),
            Primitive::Float => Value::Float(0.0),
            Primitive::Double => Value::Double(0.0),
        }
    }

    pub fn wrapper(self) -> ClassRef {
        builtins::wrapper(self)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Char | Primitive::Short | Primitive::Int | Primitive::Long
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Primitive::Float | Primitive::Double)
    }

    /// Identity or a primitive widening conversion.
    pub fn widens_to(self, to: Primitive) -> bool {
        use Primitive::*;
        if self == to {
            return true;
        }
        matches!(
            (self, to),
            (Byte, Short | Int | Long | Float | Double)
                | (Short, Int | Long | Float | Double)
                | (Char, Int | Long | Float | Double)
                | (Int, Long | Float | Double)
                | (Long, Float | Double)
                | (Float, Double)
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of a parameter or return slot.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Void,
    Prim(Primitive),
    Ref(ClassRef),
}

impl Kind {
    pub const BOOLEAN: Kind = Kind::Prim(Primitive::Boolean);
    pub const BYTE: Kind = Kind::Prim(Primitive::Byte);
    pub const CHAR: Kind = Kind::Prim(Primitive::Char);
    pub const SHORT: Kind = Kind::Prim(Primitive::Short);
    pub const INT: Kind = Kind::Prim(Primitive::Int);
    pub const LONG: Kind = Kind::Prim(Primitive::Long);
    pub const FLOAT: Kind = Kind::Prim(Primitive::Float);
    pub const DOUBLE: Kind = Kind::Prim(Primitive::Double);

    pub fn object() -> Kind {
        Kind::Ref(builtins::core().object.clone())
    }

    pub fn string() -> Kind {
        Kind::Ref(builtins::core().string.clone())
    }

    pub fn throwable() -> Kind {
        Kind::Ref(builtins::core().throwable.clone())
    }

    pub fn handle() -> Kind {
        Kind::Ref(builtins::core().method_handle.clone())
    }

    pub fn class(class: &ClassRef) -> Kind {
        Kind::Ref(class.clone())
    }

    /// Array kind with `component` elements.
    pub fn array_of(component: &Kind) -> InvokeResult<Kind> {
        Class::array_of(component).map(Kind::Ref)
    }

    pub fn object_array() -> Kind {
        Kind::Ref(Class::array_class(&Kind::object()))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Kind::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Kind::Prim(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Kind::Ref(_))
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Kind::Prim(p) => Some(*p),
            _ => None,
        }
    }

    pub fn class_ref(&self) -> Option<&ClassRef> {
        match self {
            Kind::Ref(class) => Some(class),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.component().is_some()
    }

    pub fn component(&self) -> Option<&Kind> {
        self.class_ref().and_then(|class| class.component())
    }

    pub fn is_object(&self) -> bool {
        self.class_ref().is_some_and(|class| class.is_root())
    }

    pub fn is_throwable(&self) -> bool {
        self.class_ref()
            .is_some_and(|class| class.is_subclass_of(&builtins::core().throwable))
    }

    /// Default value a slot of this kind holds before assignment.
    pub fn zero(&self) -> Value {
        match self {
            Kind::Void => Value::Void,
            Kind::Prim(p) => p.zero(),
            Kind::Ref(_) => Value::Null,
        }
    }

    /// Boxed counterpart of a primitive kind; references are unchanged.
    pub fn wrapped(&self) -> Kind {
        match self {
            Kind::Prim(p) => Kind::Ref(p.wrapper()),
            other => other.clone(),
        }
    }

    /// Primitive counterpart of a wrapper kind; anything else is unchanged.
    pub fn unwrapped(&self) -> Kind {
        match self {
            Kind::Ref(class) => match builtins::unwrap_class(class) {
                Some(p) => Kind::Prim(p),
                None => self.clone(),
            },
            other => other.clone(),
        }
    }

    /// Maps every reference kind to `Object`, keeping primitives and void.
    pub fn erased(&self) -> Kind {
        match self {
            Kind::Ref(_) => Kind::object(),
            other => other.clone(),
        }
    }

    /// Whether a value statically typed `other` may be stored in this slot
    /// without conversion.
    pub fn is_assignable_from(&self, other: &Kind) -> bool {
        match (self, other) {
            (Kind::Ref(to), Kind::Ref(from)) => from.is_subclass_of(to),
            (a, b) => a == b,
        }
    }

    pub fn descriptor(&self) -> String {
        match self {
            Kind::Void => "V".to_string(),
            Kind::Prim(p) => p.descriptor().to_string(),
            Kind::Ref(class) => class.descriptor(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Void => f.write_str("void"),
            Kind::Prim(p) => f.write_str(p.name()),
            Kind::Ref(class) => f.write_str(&class.simple_name()),
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Ref(class) => write!(f, "{}", class.name()),
            other => write!(f, "{other}"),
        }
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{self:?}"))
    }
}

pub(crate) fn require_array(kind: &Kind, what: &str) -> InvokeResult<Kind> {
    match kind.component() {
        Some(component) => Ok(component.clone()),
        None => Err(illegal_argument(format!("{what}: not an array type: {kind}"))),
    }
}

//! Declarations from which a `ClassDomain` defines new classes.

use std::sync::Arc;

use crate::error::InvokeResult;
use crate::host::{
    class::{CallContext, Modifiers, NativeFn},
    kind::Kind,
    value::Value,
};
use crate::invoke::signature::Signature;

#[derive(Clone)]
pub struct FieldSpec {
    pub(crate) name: Arc<str>,
    pub(crate) kind: Kind,
    pub(crate) modifiers: Modifiers,
    pub(crate) initial: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: &str, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Modifiers::NONE,
            initial: None,
        }
    }

    pub fn with(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers | modifiers;
        self
    }

    pub fn public(self) -> Self {
        self.with(Modifiers::PUBLIC)
    }

    pub fn private(self) -> Self {
        self.with(Modifiers::PRIVATE)
    }

    pub fn protected(self) -> Self {
        self.with(Modifiers::PROTECTED)
    }

    pub fn as_static(self) -> Self {
        self.with(Modifiers::STATIC)
    }

    /// Initial value of a static field.
    pub fn initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }
}

#[derive(Clone)]
pub struct MethodSpec {
    pub(crate) name: Arc<str>,
    pub(crate) signature: Signature,
    pub(crate) modifiers: Modifiers,
    pub(crate) body: Option<NativeFn>,
}

impl MethodSpec {
    /// A method whose body ignores the call context. Instance methods receive
    /// the receiver as the first argument.
    pub fn new<F>(name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        let body: NativeFn = Arc::new(move |_: &CallContext, args: Vec<Value>| body(args));
        Self {
            name: name.into(),
            signature,
            modifiers: Modifiers::NONE,
            body: Some(body),
        }
    }

    /// A caller-sensitive method: the body observes the class it was resolved for.
    pub fn caller_sensitive<F>(name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallContext, Vec<Value>) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            modifiers: Modifiers::CALLER_SENSITIVE,
            body: Some(Arc::new(body)),
        }
    }

    pub fn abstract_method(name: &str, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
            modifiers: Modifiers::ABSTRACT,
            body: None,
        }
    }

    /// A constructor. `signature` must return void; the body receives the
    /// fresh instance first and initializes it.
    pub fn constructor<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        Self::new("<init>", signature, body)
    }

    pub fn with(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers | modifiers;
        self
    }

    pub fn public(self) -> Self {
        self.with(Modifiers::PUBLIC)
    }

    pub fn private(self) -> Self {
        self.with(Modifiers::PRIVATE)
    }

    pub fn protected(self) -> Self {
        self.with(Modifiers::PROTECTED)
    }

    pub fn as_static(self) -> Self {
        self.with(Modifiers::STATIC)
    }

    pub fn varargs(self) -> Self {
        self.with(Modifiers::VARARGS)
    }
}

/// A class declared by name. Supertypes are named and resolved when the
/// class is defined.
#[derive(Clone)]
pub struct ClassDefinition {
    pub(crate) name: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) superclass: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) nest_host: Option<String>,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) methods: Vec<MethodSpec>,
    pub(crate) constructors: Vec<MethodSpec>,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::NONE,
            superclass: None,
            interfaces: Vec::new(),
            nest_host: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    pub fn with(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers | modifiers;
        self
    }

    pub fn public(self) -> Self {
        self.with(Modifiers::PUBLIC)
    }

    pub fn interface(self) -> Self {
        self.with(Modifiers::INTERFACE | Modifiers::ABSTRACT)
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Places the class in the nest hosted by `host`.
    pub fn nest_host(mut self, host: impl Into<String>) -> Self {
        self.nest_host = Some(host.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor(mut self, constructor: MethodSpec) -> Self {
        self.constructors.push(constructor);
        self
    }
}

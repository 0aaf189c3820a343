use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::BitOr;
use std::sync::{
    Arc, OnceLock, RwLock, Weak,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{
    builtins,
    definition::{FieldSpec, MethodSpec},
    domain::ClassDomain,
    kind::Kind,
    module::ModuleRef,
    value::Value,
};
use crate::invoke::signature::Signature;

pub type ClassRef = Arc<Class>;

/// Body of a host method. Instance methods receive the receiver first.
pub type NativeFn = Arc<dyn Fn(&CallContext, Vec<Value>) -> InvokeResult<Value> + Send + Sync>;

/// Information a running method may ask about its invocation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    caller: Option<ClassRef>,
}

impl CallContext {
    pub fn new(caller: Option<ClassRef>) -> Self {
        Self { caller }
    }

    /// Class a caller-sensitive method was resolved for, if any.
    pub fn caller(&self) -> Option<&ClassRef> {
        self.caller.as_ref()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    pub const STATIC: Modifiers = Modifiers(0x0008);
    pub const FINAL: Modifiers = Modifiers(0x0010);
    pub const VARARGS: Modifiers = Modifiers(0x0080);
    pub const INTERFACE: Modifiers = Modifiers(0x0200);
    pub const ABSTRACT: Modifiers = Modifiers(0x0400);
    pub const CALLER_SENSITIVE: Modifiers = Modifiers(0x1000);

    const NAMES: [(Modifiers, &'static str); 9] = [
        (Modifiers::PUBLIC, "public"),
        (Modifiers::PRIVATE, "private"),
        (Modifiers::PROTECTED, "protected"),
        (Modifiers::STATIC, "static"),
        (Modifiers::FINAL, "final"),
        (Modifiers::VARARGS, "varargs"),
        (Modifiers::INTERFACE, "interface"),
        (Modifiers::ABSTRACT, "abstract"),
        (Modifiers::CALLER_SENSITIVE, "caller-sensitive"),
    ];

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub const fn without(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    pub const fn is_public(self) -> bool {
        self.contains(Modifiers::PUBLIC)
    }

    pub const fn is_private(self) -> bool {
        self.contains(Modifiers::PRIVATE)
    }

    pub const fn is_protected(self) -> bool {
        self.contains(Modifiers::PROTECTED)
    }

    pub const fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    pub const fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }

    /// No access keyword at all: visible within the package only.
    pub const fn is_package_private(self) -> bool {
        self.0 & (Modifiers::PUBLIC.0 | Modifiers::PRIVATE.0 | Modifiers::PROTECTED.0) == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.with(rhs)
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Modifiers::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("package")
        } else {
            f.write_str(&names.join(" "))
        }
    }
}

pub struct FieldDef {
    pub(crate) name: Arc<str>,
    pub(crate) kind: Kind,
    pub(crate) modifiers: Modifiers,
    pub(crate) slot: usize,
}

impl FieldDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {}", self.modifiers, self.kind, self.name)
    }
}

/// A method or constructor. The signature never includes the receiver; a
/// constructor's signature returns void.
pub struct MethodDef {
    pub(crate) name: Arc<str>,
    pub(crate) signature: Signature,
    pub(crate) modifiers: Modifiers,
    pub(crate) body: Option<NativeFn>,
}

impl MethodDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }

    pub fn is_varargs(&self) -> bool {
        self.modifiers.contains(Modifiers::VARARGS)
    }

    pub fn is_caller_sensitive(&self) -> bool {
        self.modifiers.contains(Modifiers::CALLER_SENSITIVE)
    }

    pub fn is_constructor(&self) -> bool {
        &*self.name == "<init>"
    }

    pub(crate) fn call(&self, context: &CallContext, args: Vec<Value>) -> InvokeResult<Value> {
        match &self.body {
            Some(body) => body(context, args),
            None => Err(InvokeError::Linkage(format!(
                "abstract method {}{} has no implementation",
                self.name, self.signature
            ))),
        }
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}{}", self.modifiers, self.name, self.signature)
    }
}

#[derive(Default)]
pub struct Members {
    fields: Vec<Arc<FieldDef>>,
    methods: Vec<Arc<MethodDef>>,
    constructors: Vec<Arc<MethodDef>>,
    layout: Vec<Kind>,
    statics: RwLock<Vec<Value>>,
}

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct ClassShell {
    pub name: Arc<str>,
    pub modifiers: Modifiers,
    pub superclass: Option<ClassRef>,
    pub interfaces: Vec<ClassRef>,
    pub component: Option<Kind>,
    pub module: ModuleRef,
    pub nest_host: Option<Arc<str>>,
    pub domain: Weak<ClassDomain>,
}

/// A nominal host type.
pub struct Class {
    id: u64,
    name: Arc<str>,
    modifiers: Modifiers,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    component: Option<Kind>,
    module: ModuleRef,
    nest_host: Option<Arc<str>>,
    domain: Weak<ClassDomain>,
    members: OnceLock<Members>,
}

static EMPTY_MEMBERS: OnceLock<Members> = OnceLock::new();

fn array_classes() -> &'static DashMap<Kind, ClassRef> {
    static ARRAYS: OnceLock<DashMap<Kind, ClassRef>> = OnceLock::new();
    ARRAYS.get_or_init(DashMap::new)
}

impl Class {
    pub(crate) fn from_shell(shell: ClassShell) -> ClassRef {
        Arc::new(Class {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: shell.name,
            modifiers: shell.modifiers,
            superclass: shell.superclass,
            interfaces: shell.interfaces,
            component: shell.component,
            module: shell.module,
            nest_host: shell.nest_host,
            domain: shell.domain,
            members: OnceLock::new(),
        })
    }

    /// Lays out fields and registers methods. Runs once per class.
    pub(crate) fn install_members(
        class: &ClassRef,
        fields: Vec<FieldSpec>,
        methods: Vec<MethodSpec>,
        constructors: Vec<MethodSpec>,
    ) -> InvokeResult<()> {
        let mut layout = class
            .superclass
            .as_ref()
            .map(|sup| sup.instance_layout().to_vec())
            .unwrap_or_default();
        let mut statics = Vec::new();
        let mut field_defs: Vec<Arc<FieldDef>> = Vec::with_capacity(fields.len());
        for spec in fields {
            if field_defs.iter().any(|f| f.name == spec.name) {
                return Err(InvokeError::Linkage(format!(
                    "duplicate field {} in {}",
                    spec.name, class.name
                )));
            }
            let slot = if spec.modifiers.is_static() {
                statics.push(spec.initial.clone().unwrap_or_else(|| spec.kind.zero()));
                statics.len() - 1
            } else {
                layout.push(spec.kind.clone());
                layout.len() - 1
            };
            field_defs.push(Arc::new(FieldDef {
                name: spec.name,
                kind: spec.kind,
                modifiers: spec.modifiers,
                slot,
            }));
        }

        let method_defs = Self::method_defs(class, methods)?;
        let constructor_defs = Self::method_defs(class, constructors)?;

        let members = Members {
            fields: field_defs,
            methods: method_defs,
            constructors: constructor_defs,
            layout,
            statics: RwLock::new(statics),
        };
        class.members.set(members).map_err(|_| {
            InvokeError::IllegalState(format!("members of {} already installed", class.name))
        })
    }

    fn method_defs(class: &ClassRef, specs: Vec<MethodSpec>) -> InvokeResult<Vec<Arc<MethodDef>>> {
        let mut defs: Vec<Arc<MethodDef>> = Vec::with_capacity(specs.len());
        for spec in specs {
            if defs
                .iter()
                .any(|m| m.name == spec.name && m.signature == spec.signature)
            {
                return Err(InvokeError::Linkage(format!(
                    "duplicate method {}{} in {}",
                    spec.name, spec.signature, class.name
                )));
            }
            defs.push(Arc::new(MethodDef {
                name: spec.name,
                signature: spec.signature,
                modifiers: spec.modifiers,
                body: spec.body,
            }));
        }
        Ok(defs)
    }

    /// Interned array class with the given component kind.
    pub fn array_of(component: &Kind) -> InvokeResult<ClassRef> {
        if component.is_void() {
            return Err(illegal_argument("array component cannot be void"));
        }
        Ok(Self::array_class(component))
    }

    pub(crate) fn array_class(component: &Kind) -> ClassRef {
        array_classes()
            .entry(component.clone())
            .or_insert_with(|| {
                let core = builtins::core();
                let (module, domain, visible) = match component {
                    Kind::Ref(class) => (
                        class.module.clone(),
                        class.domain.clone(),
                        class.modifiers.is_public(),
                    ),
                    _ => (core.module.clone(), Arc::downgrade(&core.domain), true),
                };
                let access = if visible { Modifiers::PUBLIC } else { Modifiers::NONE };
                let class = Class::from_shell(ClassShell {
                    name: format!("{component:?}[]").into(),
                    modifiers: access | Modifiers::FINAL | Modifiers::ABSTRACT,
                    superclass: Some(core.object.clone()),
                    interfaces: Vec::new(),
                    component: Some(component.clone()),
                    module,
                    nest_host: None,
                    domain,
                });
                let _ = class.members.set(Members::default());
                class
            })
            .clone()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn simple_name(&self) -> String {
        match &self.component {
            Some(component) => format!("{component}[]"),
            None => self
                .name
                .rsplit_once('.')
                .map(|(_, simple)| simple.to_string())
                .unwrap_or_else(|| self.name.to_string()),
        }
    }

    pub fn package(&self) -> &str {
        match &self.component {
            Some(Kind::Ref(class)) => class.package(),
            Some(_) => builtins::CORE_PACKAGE,
            None => self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or(""),
        }
    }

    pub fn descriptor(&self) -> String {
        match &self.component {
            Some(component) => format!("[{}", component.descriptor()),
            None => format!("L{};", self.name.replace('.', "/")),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.is_public()
    }

    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[ClassRef] {
        &self.interfaces
    }

    pub fn component(&self) -> Option<&Kind> {
        self.component.as_ref()
    }

    pub fn is_array(&self) -> bool {
        self.component.is_some()
    }

    /// The root of the hierarchy, `core.Object`.
    pub fn is_root(&self) -> bool {
        self.superclass.is_none() && self.component.is_none() && !self.is_interface()
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub(crate) fn domain(&self) -> Option<Arc<ClassDomain>> {
        self.domain.upgrade()
    }

    /// Name of the class hosting this class's nest.
    pub fn nest_host_name(&self) -> &str {
        self.nest_host.as_deref().unwrap_or(&self.name)
    }

    pub fn is_nestmate_of(&self, other: &Class) -> bool {
        self == other
            || (self.nest_host_name() == other.nest_host_name()
                && self.package() == other.package()
                && self.domain.ptr_eq(&other.domain))
    }

    pub fn is_subclass_of(&self, other: &Class) -> bool {
        if self == other || other.is_root() {
            return true;
        }
        if let (Some(a), Some(b)) = (&self.component, &other.component) {
            return match (a, b) {
                (Kind::Ref(a), Kind::Ref(b)) => a.is_subclass_of(b),
                (a, b) => a == b,
            };
        }
        if self
            .superclass
            .as_ref()
            .is_some_and(|sup| sup.is_subclass_of(other))
        {
            return true;
        }
        self.interfaces.iter().any(|i| i.is_subclass_of(other))
    }

    pub fn is_assignable_from(&self, other: &Class) -> bool {
        other.is_subclass_of(self)
    }

    fn members(&self) -> &Members {
        self.members
            .get()
            .unwrap_or_else(|| EMPTY_MEMBERS.get_or_init(Members::default))
    }

    pub fn declared_fields(&self) -> &[Arc<FieldDef>] {
        &self.members().fields
    }

    pub fn declared_methods(&self) -> &[Arc<MethodDef>] {
        &self.members().methods
    }

    pub fn declared_constructors(&self) -> &[Arc<MethodDef>] {
        &self.members().constructors
    }

    /// Kinds of every instance slot, inherited slots first.
    pub fn instance_layout(&self) -> &[Kind] {
        &self.members().layout
    }

    pub fn declared_method(&self, name: &str, signature: &Signature) -> Option<Arc<MethodDef>> {
        self.declared_methods()
            .iter()
            .find(|m| &*m.name == name && &m.signature == signature)
            .cloned()
    }

    pub fn declared_field(&self, name: &str) -> Option<Arc<FieldDef>> {
        self.declared_fields()
            .iter()
            .find(|f| &*f.name == name)
            .cloned()
    }

    pub fn declared_constructor(&self, signature: &Signature) -> Option<Arc<MethodDef>> {
        self.declared_constructors()
            .iter()
            .find(|c| &c.signature == signature)
            .cloned()
    }

    /// Finds a method by name and signature in `class`, its superclasses, then
    /// its superinterfaces. Returns the declaring class with the method.
    pub fn resolve_method(
        class: &ClassRef,
        name: &str,
        signature: &Signature,
    ) -> Option<(ClassRef, Arc<MethodDef>)> {
        let mut current = Some(class);
        while let Some(c) = current {
            if let Some(method) = c.declared_method(name, signature) {
                return Some((c.clone(), method));
            }
            current = c.superclass.as_ref();
        }
        Self::resolve_interface_method(class, name, signature)
    }

    fn resolve_interface_method(
        class: &ClassRef,
        name: &str,
        signature: &Signature,
    ) -> Option<(ClassRef, Arc<MethodDef>)> {
        let mut current = Some(class);
        while let Some(c) = current {
            for iface in &c.interfaces {
                if let Some(method) = iface.declared_method(name, signature) {
                    return Some((iface.clone(), method));
                }
                if let Some(found) = Self::resolve_interface_method(iface, name, signature) {
                    return Some(found);
                }
            }
            current = c.superclass.as_ref();
        }
        None
    }

    /// Selects the implementation a virtual call on an instance of `class`
    /// runs: the most specific concrete override, else a concrete interface
    /// method.
    pub fn select_implementation(
        class: &ClassRef,
        name: &str,
        signature: &Signature,
    ) -> Option<Arc<MethodDef>> {
        let mut current = Some(class);
        while let Some(c) = current {
            if let Some(method) = c.declared_method(name, signature)
                && !method.is_static()
                && !method.is_abstract()
            {
                return Some(method);
            }
            current = c.superclass.as_ref();
        }
        Self::resolve_interface_method(class, name, signature).map(|(_, method)| method)
    }

    pub fn resolve_field(class: &ClassRef, name: &str) -> Option<(ClassRef, Arc<FieldDef>)> {
        if let Some(field) = class.declared_field(name) {
            return Some((class.clone(), field));
        }
        for iface in &class.interfaces {
            if let Some(found) = Self::resolve_field(iface, name) {
                return Some(found);
            }
        }
        class
            .superclass
            .as_ref()
            .and_then(|sup| Self::resolve_field(sup, name))
    }

    pub(crate) fn static_value(&self, slot: usize) -> InvokeResult<Value> {
        let statics = self
            .members()
            .statics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        statics.get(slot).cloned().ok_or_else(|| {
            InvokeError::IllegalState(format!("static slot {slot} missing in {}", self.name))
        })
    }

    pub(crate) fn set_static_value(&self, slot: usize, value: Value) -> InvokeResult<()> {
        let mut statics = self
            .members()
            .statics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match statics.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(InvokeError::IllegalState(format!(
                "static slot {slot} missing in {}",
                self.name
            ))),
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.name)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

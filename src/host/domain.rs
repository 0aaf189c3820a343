use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::debug;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{
    builtins,
    class::{Class, ClassRef, ClassShell, Modifiers},
    definition::ClassDefinition,
    kind::{Kind, Primitive},
    module::{Module, ModuleDefinition, ModuleRef},
};
use crate::telemetry;

/// A class-loading domain: a namespace of classes and modules that
/// delegates name resolution to its parent first.
pub struct ClassDomain {
    name: Arc<str>,
    parent: Option<Arc<ClassDomain>>,
    classes: DashMap<Arc<str>, ClassRef>,
    modules: RwLock<Vec<ModuleRef>>,
    unnamed: ModuleRef,
    self_ref: Weak<ClassDomain>,
}

impl ClassDomain {
    /// The domain holding the well-known `core` classes.
    pub fn boot() -> Arc<ClassDomain> {
        builtins::core().domain.clone()
    }

    /// A fresh domain whose parent is the boot domain.
    pub fn new(name: &str) -> Arc<ClassDomain> {
        Self::create(name, Some(Self::boot()))
    }

    pub fn with_parent(name: &str, parent: &Arc<ClassDomain>) -> Arc<ClassDomain> {
        Self::create(name, Some(parent.clone()))
    }

    pub(crate) fn create(name: &str, parent: Option<Arc<ClassDomain>>) -> Arc<ClassDomain> {
        Arc::new_cyclic(|self_ref| ClassDomain {
            name: name.into(),
            parent,
            classes: DashMap::new(),
            modules: RwLock::new(Vec::new()),
            unnamed: Module::unnamed(),
            self_ref: self_ref.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ClassDomain>> {
        self.parent.as_ref()
    }

    pub fn unnamed_module(&self) -> &ModuleRef {
        &self.unnamed
    }

    pub fn define_module(&self, definition: ModuleDefinition) -> InvokeResult<ModuleRef> {
        let mut modules = self
            .modules
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if modules.iter().any(|m| m.name() == definition.name) {
            return Err(illegal_argument(format!(
                "module {} already defined in {}",
                definition.name, self.name
            )));
        }
        for package in &definition.packages {
            if let Some(owner) = modules.iter().find(|m| m.contains_package(package)) {
                return Err(illegal_argument(format!(
                    "package {package} already belongs to {}",
                    owner.name()
                )));
            }
        }
        let module = Module::from_definition(definition);
        debug!(module = module.name(), domain = %self.name, "defined module");
        modules.push(module.clone());
        Ok(module)
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleRef> {
        let modules = self
            .modules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        modules
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.find_module(name)))
    }

    /// Module owning `package` in this domain, else the unnamed module.
    pub fn module_of_package(&self, package: &str) -> ModuleRef {
        let modules = self
            .modules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        modules
            .iter()
            .find(|m| m.contains_package(package))
            .cloned()
            .unwrap_or_else(|| self.unnamed.clone())
    }

    /// Resolves a class name through the parent chain, then locally.
    /// `name[]` resolves the array class of `name`.
    pub fn find_class(&self, name: &str) -> Option<ClassRef> {
        if let Some(component) = name.strip_suffix("[]") {
            let component = match Primitive::from_name(component) {
                Some(p) => Kind::Prim(p),
                None => Kind::Ref(self.find_class(component)?),
            };
            return Some(Class::array_class(&component));
        }
        if let Some(found) = self.parent.as_ref().and_then(|p| p.find_class(name)) {
            return Some(found);
        }
        self.classes.get(name).map(|entry| entry.value().clone())
    }

    pub(crate) fn install_module(&self, module: ModuleRef) {
        self.modules
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(module);
    }

    pub(crate) fn register(&self, class: ClassRef) {
        self.classes.insert(class.name().into(), class);
    }

    pub(crate) fn weak(&self) -> Weak<ClassDomain> {
        self.self_ref.clone()
    }

    /// Defines a class from `definition`, resolving its supertypes by name.
    ///
    /// Unresolvable or illegal supertypes and duplicate names are link
    /// errors. The boot domain accepts no new classes.
    pub fn define_class(&self, definition: ClassDefinition) -> InvokeResult<ClassRef> {
        let name = definition.name.clone();
        if self.parent.is_none() {
            return Err(InvokeError::IllegalAccess(format!(
                "cannot define {name} in sealed domain {}",
                self.name
            )));
        }
        if name.is_empty() || name.starts_with('.') || name.ends_with('.') || name.contains("[]") {
            return Err(InvokeError::Linkage(format!("malformed class name '{name}'")));
        }
        if self.find_class(&name).is_some() {
            return Err(InvokeError::Linkage(format!(
                "duplicate class definition for {name} in {}",
                self.name
            )));
        }

        let is_interface = definition.modifiers.contains(Modifiers::INTERFACE);
        let superclass = if is_interface {
            None
        } else {
            let super_name = definition
                .superclass
                .clone()
                .unwrap_or_else(|| builtins::OBJECT.to_string());
            let sup = self.resolve_dependency(&name, &super_name)?;
            if sup.is_interface() {
                return Err(InvokeError::Linkage(format!(
                    "class {name} has interface {super_name} as superclass"
                )));
            }
            if sup.is_final() {
                return Err(InvokeError::Linkage(format!(
                    "class {name} cannot inherit from final class {super_name}"
                )));
            }
            if !sup.is_public() && sup.package() != definition.package() {
                return Err(InvokeError::Linkage(format!(
                    "class {name} cannot access its superclass {super_name}"
                )));
            }
            Some(sup)
        };

        let mut interfaces = Vec::with_capacity(definition.interfaces.len());
        for iface_name in &definition.interfaces {
            let iface = self.resolve_dependency(&name, iface_name)?;
            if !iface.is_interface() {
                return Err(InvokeError::Linkage(format!(
                    "class {name} cannot implement class {iface_name}"
                )));
            }
            interfaces.push(iface);
        }

        let class = Class::from_shell(ClassShell {
            name: name.as_str().into(),
            modifiers: definition.modifiers,
            superclass,
            interfaces,
            component: None,
            module: self.module_of_package(definition.package()),
            nest_host: definition.nest_host.map(Arc::from),
            domain: self.weak(),
        });
        Class::install_members(
            &class,
            definition.fields,
            definition.methods,
            definition.constructors,
        )?;

        match self.classes.entry(name.as_str().into()) {
            Entry::Occupied(_) => {
                return Err(InvokeError::Linkage(format!(
                    "duplicate class definition for {name} in {}",
                    self.name
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(class.clone());
            }
        }
        telemetry::record_class_definition();
        debug!(class = %name, domain = %self.name, module = class.module().name(), "defined class");
        Ok(class)
    }

    fn resolve_dependency(&self, defining: &str, name: &str) -> InvokeResult<ClassRef> {
        self.find_class(name).ok_or_else(|| {
            InvokeError::Linkage(format!(
                "no class definition found for {name} (required by {defining})"
            ))
        })
    }
}

impl fmt::Debug for ClassDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain {}", self.name)
    }
}

use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

pub type ModuleRef = Arc<Module>;

static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub package: Arc<str>,
    /// `None` exports to everyone.
    pub to: Option<Arc<str>>,
}

/// A named group of packages with explicit exports and reads. The unnamed
/// module of a domain reads and exports everything.
pub struct Module {
    id: u64,
    name: Option<Arc<str>>,
    packages: Vec<Arc<str>>,
    exports: Vec<Export>,
    reads: Vec<Arc<str>>,
}

/// Declaration handed to `ClassDomain::define_module`.
#[derive(Debug, Clone, Default)]
pub struct ModuleDefinition {
    pub(crate) name: String,
    pub(crate) packages: Vec<String>,
    pub(crate) exports: Vec<(String, Option<String>)>,
    pub(crate) reads: Vec<String>,
}

impl ModuleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.packages.push(package.into());
        self
    }

    pub fn exports(mut self, package: impl Into<String>) -> Self {
        self.exports.push((package.into(), None));
        self
    }

    pub fn exports_to(mut self, package: impl Into<String>, module: impl Into<String>) -> Self {
        self.exports.push((package.into(), Some(module.into())));
        self
    }

    pub fn reads(mut self, module: impl Into<String>) -> Self {
        self.reads.push(module.into());
        self
    }
}

impl Module {
    pub(crate) fn unnamed() -> ModuleRef {
        Arc::new(Module {
            id: NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed),
            name: None,
            packages: Vec::new(),
            exports: Vec::new(),
            reads: Vec::new(),
        })
    }

    pub(crate) fn from_definition(definition: ModuleDefinition) -> ModuleRef {
        Arc::new(Module {
            id: NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed),
            name: Some(definition.name.into()),
            packages: definition.packages.into_iter().map(Arc::from).collect(),
            exports: definition
                .exports
                .into_iter()
                .map(|(package, to)| Export {
                    package: package.into(),
                    to: to.map(Arc::from),
                })
                .collect(),
            reads: definition.reads.into_iter().map(Arc::from).collect(),
        })
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn packages(&self) -> &[Arc<str>] {
        &self.packages
    }

    pub fn contains_package(&self, package: &str) -> bool {
        self.packages.iter().any(|p| &**p == package)
    }

    /// Exported to every module.
    pub fn is_exported(&self, package: &str) -> bool {
        !self.is_named()
            || self
                .exports
                .iter()
                .any(|e| &*e.package == package && e.to.is_none())
    }

    pub fn is_exported_to(&self, package: &str, other: &Module) -> bool {
        if self == other || self.is_exported(package) {
            return true;
        }
        other.is_named()
            && self
                .exports
                .iter()
                .any(|e| &*e.package == package && e.to.as_deref() == Some(other.name()))
    }

    pub fn can_read(&self, other: &Module) -> bool {
        if self == other || !self.is_named() {
            return true;
        }
        match &other.name {
            Some(name) => {
                &**name == crate::host::builtins::CORE_MODULE
                    || self.reads.iter().any(|r| r == name)
            }
            None => false,
        }
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Module {}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {}", self.name())
    }
}

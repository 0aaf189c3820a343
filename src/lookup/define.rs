use tracing::debug;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{class::ClassRef, definition::ClassDefinition, domain::ClassDomain};
use crate::lookup::{AccessModes, Lookup};

impl Lookup {
    /// Defines a class in `domain` and returns the full-privilege lookup of
    /// the new class. Outside the crate this is the only source of a
    /// full-privilege lookup.
    pub fn define_in(domain: &ClassDomain, definition: ClassDefinition) -> InvokeResult<Lookup> {
        let class = domain.define_class(definition)?;
        debug!(class = %class, domain = domain.name(), "issued full lookup to definer");
        Ok(Lookup::for_class(&class))
    }

    /// Defines a class in the lookup class's domain and package.
    ///
    /// Requires `PACKAGE` access; the definition must name a class in the
    /// lookup class's package.
    pub fn define_class(&self, definition: ClassDefinition) -> InvokeResult<ClassRef> {
        if !self.lookup_modes().contains(AccessModes::PACKAGE) {
            return Err(InvokeError::IllegalAccess(format!(
                "{self} does not have package access"
            )));
        }
        let package = self.lookup_class().package();
        if definition.package() != package {
            return Err(illegal_argument(format!(
                "class {} not in same package as lookup class {}",
                definition.name(),
                self.lookup_class()
            )));
        }
        let domain = self.lookup_class().domain().ok_or_else(|| {
            InvokeError::IllegalState(format!("domain of {} is gone", self.lookup_class()))
        })?;
        let class = domain.define_class(definition)?;
        debug!(class = %class, lookup = %self, "defined class through lookup");
        Ok(class)
    }
}

//! Lookups: access-checked factories for direct handles.
//!
//! A `Lookup` pairs a lookup class with the access modes it may exercise.
//! Every resolution checks the member against those modes before a handle
//! is produced, so holding a handle never implies more access than the
//! lookup that created it.

pub mod access;
mod define;
pub mod reflect;
mod resolve;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{
    builtins,
    class::{ClassRef, Modifiers},
};

pub use access::AccessModes;
pub use reflect::{ReflectedConstructor, ReflectedField, ReflectedMethod};

use access::{is_class_accessible, is_member_accessible, same_package};

#[derive(Clone)]
pub struct Lookup {
    class: ClassRef,
    prev: Option<ClassRef>,
    modes: AccessModes,
}

impl Lookup {
    /// Full-privilege lookup for code of `class`. Outside the crate this is
    /// only handed to the definer of a class, through `Lookup::define_in`.
    pub(crate) fn for_class(class: &ClassRef) -> Lookup {
        Lookup {
            class: class.clone(),
            prev: None,
            modes: AccessModes::FULL,
        }
    }

    /// Minimal lookup: public members of public types in unconditionally
    /// exported packages.
    pub fn public_lookup() -> Lookup {
        Lookup {
            class: builtins::core().object.clone(),
            prev: None,
            modes: AccessModes::UNCONDITIONAL,
        }
    }

    pub fn lookup_class(&self) -> &ClassRef {
        &self.class
    }

    /// Class this lookup teleported from when crossing a module boundary.
    pub fn previous_lookup_class(&self) -> Option<&ClassRef> {
        self.prev.as_ref()
    }

    pub fn lookup_modes(&self) -> AccessModes {
        self.modes
    }

    pub fn has_full_privilege_access(&self) -> bool {
        self.modes
            .contains(AccessModes::PRIVATE | AccessModes::MODULE)
    }

    /// A lookup on the same class without `mode` and the modes it implies.
    ///
    /// Dropping `PUBLIC` leaves at most `UNCONDITIONAL`. `MODULE` takes
    /// `PACKAGE` and `PRIVATE` with it, `PACKAGE` takes `PRIVATE`. Any drop
    /// also loses `ORIGINAL`.
    pub fn drop_lookup_mode(&self, mode: AccessModes) -> InvokeResult<Lookup> {
        if !AccessModes::is_single(mode) {
            return Err(illegal_argument(format!(
                "{mode} is not a valid mode to drop"
            )));
        }
        let mut modes = self.modes & !(mode | AccessModes::ORIGINAL);
        // A public-only lookup keeps UNCONDITIONAL until it is dropped by name.
        let privileged = if self.is_public_only() {
            AccessModes::NONE
        } else {
            AccessModes::UNCONDITIONAL
        };
        if mode == AccessModes::PUBLIC {
            modes = modes & AccessModes::UNCONDITIONAL;
        } else if mode == AccessModes::MODULE {
            modes = modes & !(AccessModes::PACKAGE | AccessModes::PRIVATE | privileged);
        } else if mode == AccessModes::PACKAGE {
            modes = modes & !(AccessModes::PRIVATE | privileged);
        } else if mode == AccessModes::PRIVATE {
            modes = modes & !privileged;
        }
        if modes == self.modes {
            return Ok(self.clone());
        }
        Ok(Lookup {
            class: self.class.clone(),
            prev: self.prev.clone(),
            modes,
        })
    }

    /// Moves this lookup to `target`, keeping only the access both classes
    /// share.
    pub fn in_class(&self, target: &ClassRef) -> Lookup {
        if target == &self.class {
            return self.clone();
        }
        let mut prev = self.prev.clone();
        let mut modes = self.modes & !(AccessModes::ORIGINAL | AccessModes::UNCONDITIONAL);
        if self.is_public_only() {
            modes = AccessModes::UNCONDITIONAL;
        } else if self.class.module() != target.module() {
            if let Some(plc) = &prev
                && plc.module() != target.module()
            {
                modes = AccessModes::NONE;
            }
            modes = modes
                & !(AccessModes::MODULE | AccessModes::PACKAGE | AccessModes::PRIVATE);
            prev = Some(self.class.clone());
        }
        if modes.contains(AccessModes::PACKAGE) && !same_package(&self.class, target) {
            modes = modes & !(AccessModes::PACKAGE | AccessModes::PRIVATE);
        }
        if modes.contains(AccessModes::PRIVATE) && !self.class.is_nestmate_of(target) {
            modes = modes & !AccessModes::PRIVATE;
        }
        if modes.intersects(AccessModes::PUBLIC | AccessModes::UNCONDITIONAL)
            && !is_class_accessible(target, &self.class, self.prev.as_deref(), self.modes)
        {
            modes = AccessModes::NONE;
        }
        debug!(from = %self, to = %target, modes = %modes, "teleported lookup");
        Lookup {
            class: target.clone(),
            prev,
            modes,
        }
    }

    /// Full access to `target` on behalf of `caller`, which must hold full
    /// privilege and be allowed to see into `target`'s package.
    pub fn private_lookup_in(target: &ClassRef, caller: &Lookup) -> InvokeResult<Lookup> {
        if target.is_array() {
            return Err(illegal_argument(format!("{target} is an array class")));
        }
        if !caller.has_full_privilege_access() {
            return Err(InvokeError::IllegalAccess(format!(
                "caller {caller} does not have private and module access"
            )));
        }
        let caller_module = caller.class.module();
        let target_module = target.module();
        if !caller_module.can_read(target_module) {
            return Err(InvokeError::IllegalAccess(format!(
                "{} does not read {}",
                caller_module.name(),
                target_module.name()
            )));
        }
        if !target_module.is_exported_to(target.package(), caller_module) {
            return Err(InvokeError::IllegalAccess(format!(
                "{} does not open {} to {}",
                target_module.name(),
                target.package(),
                caller_module.name()
            )));
        }
        let mut modes = AccessModes::PUBLIC
            | AccessModes::MODULE
            | AccessModes::PACKAGE
            | AccessModes::PRIVATE;
        let mut prev = None;
        if caller_module != target_module {
            modes = modes & !AccessModes::MODULE;
            prev = Some(caller.prev.clone().unwrap_or_else(|| caller.class.clone()));
        }
        debug!(caller = %caller, target = %target, "private lookup");
        Ok(Lookup {
            class: target.clone(),
            prev,
            modes,
        })
    }

    /// Describes this lookup's class, origin and modes.
    pub fn describe(&self) -> LookupDescription {
        LookupDescription {
            lookup_class: self.class.name().to_string(),
            previous_lookup_class: self.prev.as_ref().map(|c| c.name().to_string()),
            modes: self.modes,
        }
    }

    fn is_public_only(&self) -> bool {
        self.modes.contains(AccessModes::UNCONDITIONAL)
            && !self.modes.contains(AccessModes::PUBLIC)
    }

    fn can_access_class(&self, target: &ClassRef) -> bool {
        is_class_accessible(target, &self.class, self.prev.as_deref(), self.modes)
    }

    /// Checks that a member of `declaring` with `modifiers`, referenced via
    /// `referenced`, is accessible from this lookup.
    pub(crate) fn check_access(
        &self,
        referenced: &ClassRef,
        declaring: &ClassRef,
        name: &str,
        modifiers: Modifiers,
    ) -> InvokeResult<()> {
        if is_member_accessible(
            referenced,
            declaring,
            modifiers,
            &self.class,
            self.prev.as_deref(),
            self.modes,
        ) {
            return Ok(());
        }
        let reason = if !self.can_access_class(referenced) {
            format!("class {referenced} is not accessible")
        } else if modifiers.is_private() {
            "member is private".to_string()
        } else if modifiers.is_protected() {
            "member is protected".to_string()
        } else if modifiers.is_package_private() {
            "member is package-private".to_string()
        } else {
            "member is not accessible".to_string()
        };
        Err(InvokeError::IllegalAccess(format!(
            "{reason}: {declaring}.{name}, from {self}"
        )))
    }

    /// Caller-sensitive members need the original lookup of their caller.
    pub(crate) fn check_caller_sensitive(
        &self,
        declaring: &ClassRef,
        name: &str,
        modifiers: Modifiers,
    ) -> InvokeResult<Option<ClassRef>> {
        if !modifiers.contains(Modifiers::CALLER_SENSITIVE) {
            return Ok(None);
        }
        if !self.modes.contains(AccessModes::ORIGINAL) {
            return Err(InvokeError::IllegalAccess(format!(
                "attempt to look up caller-sensitive method {declaring}.{name} from {self}"
            )));
        }
        Ok(Some(self.class.clone()))
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class.name())?;
        if let Some(prev) = &self.prev {
            write!(f, "/{}", prev.name())?;
        }
        if self.modes == AccessModes::FULL {
            return Ok(());
        }
        write!(f, "/{}", self.modes)
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lookup({self})")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupDescription {
    pub lookup_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_lookup_class: Option<String>,
    pub modes: AccessModes,
}

#[cfg(test)]
mod access_test;
#[cfg(test)]
mod lookup_test;
#[cfg(test)]
mod resolve_test;

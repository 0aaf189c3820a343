//! Access modes and the visibility rules lookups enforce.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::host::{
    class::{Class, Modifiers},
    kind::Kind,
    module::Module,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessModes(u8);

impl AccessModes {
    pub const NONE: AccessModes = AccessModes(0);
    pub const PUBLIC: AccessModes = AccessModes(0x01);
    pub const PRIVATE: AccessModes = AccessModes(0x02);
    pub const PACKAGE: AccessModes = AccessModes(0x08);
    pub const MODULE: AccessModes = AccessModes(0x10);
    pub const UNCONDITIONAL: AccessModes = AccessModes(0x20);
    pub const ORIGINAL: AccessModes = AccessModes(0x40);

    /// Every mode a lookup created for its own class holds.
    pub const FULL: AccessModes = AccessModes(0x01 | 0x02 | 0x08 | 0x10 | 0x20 | 0x40);

    const NAMES: [(AccessModes, &'static str); 6] = [
        (AccessModes::PUBLIC, "public"),
        (AccessModes::MODULE, "module"),
        (AccessModes::PACKAGE, "package"),
        (AccessModes::PRIVATE, "private"),
        (AccessModes::UNCONDITIONAL, "unconditional"),
        (AccessModes::ORIGINAL, "original"),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: AccessModes) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: AccessModes) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether `mode` names exactly one mode.
    pub fn is_single(mode: AccessModes) -> bool {
        AccessModes::NAMES.iter().any(|(m, _)| *m == mode)
    }

    pub fn names(self) -> Vec<&'static str> {
        AccessModes::NAMES
            .iter()
            .filter(|(mode, _)| self.contains(*mode))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for AccessModes {
    type Output = AccessModes;

    fn bitor(self, rhs: AccessModes) -> AccessModes {
        AccessModes(self.0 | rhs.0)
    }
}

impl BitAnd for AccessModes {
    type Output = AccessModes;

    fn bitand(self, rhs: AccessModes) -> AccessModes {
        AccessModes(self.0 & rhs.0)
    }
}

impl Not for AccessModes {
    type Output = AccessModes;

    fn not(self) -> AccessModes {
        AccessModes(!self.0 & AccessModes::FULL.0)
    }
}

impl fmt::Display for AccessModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl fmt::Debug for AccessModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessModes({self})")
    }
}

impl Serialize for AccessModes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

/// Same package of the same class domain.
pub(crate) fn same_package(a: &Class, b: &Class) -> bool {
    if a.package() != b.package() {
        return false;
    }
    match (a.domain(), b.domain()) {
        (Some(x), Some(y)) => Arc::ptr_eq(&x, &y),
        _ => false,
    }
}

fn same_module(a: &Class, b: &Class) -> bool {
    a.module() == b.module()
}

/// Whether `target` is visible from `lookup_class` (hopping from
/// `prev_class`, if any) under `modes`.
pub(crate) fn is_class_accessible(
    target: &Class,
    lookup_class: &Class,
    prev_class: Option<&Class>,
    modes: AccessModes,
) -> bool {
    if modes.is_empty() {
        return false;
    }
    if let Some(component) = target.component() {
        return match component {
            Kind::Ref(element) => is_class_accessible(element, lookup_class, prev_class, modes),
            _ => true,
        };
    }
    if target.is_public() {
        let target_module = target.module();
        let package = target.package();
        if modes.contains(AccessModes::UNCONDITIONAL) && !modes.contains(AccessModes::PUBLIC) {
            return target_module.is_exported(package);
        }
        if same_module(lookup_class, target) && prev_class.is_none() {
            return true;
        }
        if modes.contains(AccessModes::UNCONDITIONAL) && target_module.is_exported(package) {
            return true;
        }
        let visible_from = |module: &Module| {
            module == target_module.as_ref()
                || (module.can_read(target_module) && target_module.is_exported_to(package, module))
        };
        let from_lookup = visible_from(lookup_class.module().as_ref());
        return match prev_class {
            None => from_lookup,
            Some(prev) => from_lookup && visible_from(prev.module().as_ref()),
        };
    }
    modes.contains(AccessModes::PACKAGE) && same_package(lookup_class, target)
}

/// Whether a member of `declaring` with `modifiers`, referenced through
/// `referenced`, is accessible from `lookup_class` under `modes`.
///
/// Protected members are visible from the same package with `PACKAGE`, or
/// from a subclass with `PRIVATE`.
pub(crate) fn is_member_accessible(
    referenced: &Class,
    declaring: &Class,
    modifiers: Modifiers,
    lookup_class: &Class,
    prev_class: Option<&Class>,
    modes: AccessModes,
) -> bool {
    if !is_class_accessible(referenced, lookup_class, prev_class, modes) {
        return false;
    }
    if declaring == lookup_class && modes.contains(AccessModes::PRIVATE) {
        return true;
    }
    if modifiers.is_public() {
        return true;
    }
    if modifiers.is_protected() {
        if modes.contains(AccessModes::PACKAGE) && same_package(declaring, lookup_class) {
            return true;
        }
        return modes.contains(AccessModes::PRIVATE) && lookup_class.is_subclass_of(declaring);
    }
    if modifiers.is_private() {
        return modes.contains(AccessModes::PRIVATE) && declaring.is_nestmate_of(lookup_class);
    }
    modes.contains(AccessModes::PACKAGE) && same_package(declaring, lookup_class)
}

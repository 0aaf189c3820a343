//! The host type model: kinds, classes, modules, class domains, values and
//! the conversions between them.

pub mod builtins;
pub mod class;
pub(crate) mod convert;
pub mod definition;
pub mod domain;
pub mod kind;
pub mod module;
pub mod object;
pub mod value;

pub use class::{CallContext, Class, ClassRef, FieldDef, MethodDef, Modifiers, NativeFn};
pub use definition::{ClassDefinition, FieldSpec, MethodSpec};
pub use domain::ClassDomain;
pub use kind::{Kind, Primitive};
pub use module::{Module, ModuleDefinition, ModuleRef};
pub use object::{ArrayObject, ArrayRef, Instance, ObjectRef};
pub use value::Value;

#[cfg(test)]
mod class_test;

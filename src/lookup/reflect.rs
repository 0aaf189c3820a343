//! Reflected members and their conversion into handles.
//!
//! Unreflecting a member is checked exactly as resolving it by name would
//! be. Reflection never widens what a lookup may reach.

use std::fmt;
use std::sync::Arc;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{
    class::{Class, ClassRef, FieldDef, MethodDef},
    kind::Kind,
};
use crate::invoke::{
    direct::{MemberInfo, RefKind},
    handle::MethodHandle,
    signature::Signature,
};
use crate::lookup::{
    Lookup,
    resolve::{check_writable, field_handle, resolve_method},
};

#[derive(Clone)]
pub struct ReflectedMethod {
    declaring: ClassRef,
    method: Arc<MethodDef>,
}

impl ReflectedMethod {
    /// Reflects the method `name` visible through `class`.
    pub fn of(class: &ClassRef, name: &str, signature: &Signature) -> InvokeResult<Self> {
        let (declaring, method) = resolve_method(class, name, signature)?;
        Ok(Self { declaring, method })
    }

    pub fn declaring_class(&self) -> &ClassRef {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        self.method.name()
    }

    pub fn signature(&self) -> &Signature {
        self.method.signature()
    }
}

impl fmt::Debug for ReflectedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:?}", self.declaring, self.method)
    }
}

#[derive(Clone)]
pub struct ReflectedConstructor {
    declaring: ClassRef,
    constructor: Arc<MethodDef>,
}

impl ReflectedConstructor {
    /// Reflects the constructor of `class` taking `params`.
    pub fn of(class: &ClassRef, params: &[Kind]) -> InvokeResult<Self> {
        let signature = Signature::new(Kind::Void, params.iter().cloned())?;
        let constructor = class.declared_constructor(&signature).ok_or_else(|| {
            InvokeError::NoSuchMethod(format!("no constructor {class}.<init>{signature}"))
        })?;
        Ok(Self {
            declaring: class.clone(),
            constructor,
        })
    }

    pub fn declaring_class(&self) -> &ClassRef {
        &self.declaring
    }

    pub fn signature(&self) -> &Signature {
        self.constructor.signature()
    }
}

impl fmt::Debug for ReflectedConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:?}", self.declaring, self.constructor)
    }
}

/// A field obtained by reflection. An accessible instance field may be
/// written through `unreflect_setter` even when it is final.
#[derive(Clone)]
pub struct ReflectedField {
    declaring: ClassRef,
    field: Arc<FieldDef>,
    accessible: bool,
}

impl ReflectedField {
    pub fn of(class: &ClassRef, name: &str) -> InvokeResult<Self> {
        let (declaring, field) = Class::resolve_field(class, name)
            .ok_or_else(|| InvokeError::NoSuchField(format!("no field {class}.{name}")))?;
        Ok(Self {
            declaring,
            field,
            accessible: false,
        })
    }

    pub fn declaring_class(&self) -> &ClassRef {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn kind(&self) -> &Kind {
        self.field.kind()
    }

    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    /// Marking the field accessible needs a full-privilege `caller` whose
    /// module can see into the declaring package.
    pub fn set_accessible(&mut self, accessible: bool, caller: &Lookup) -> InvokeResult<()> {
        if accessible && !caller.can_open(&self.declaring) {
            return Err(InvokeError::IllegalAccess(format!(
                "{caller} cannot make {}.{} accessible",
                self.declaring,
                self.field.name()
            )));
        }
        self.accessible = accessible;
        Ok(())
    }
}

impl fmt::Debug for ReflectedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:?}", self.declaring, self.field)
    }
}

impl Lookup {
    fn can_open(&self, declaring: &ClassRef) -> bool {
        let caller_module = self.lookup_class().module();
        let target_module = declaring.module();
        self.has_full_privilege_access()
            && caller_module.can_read(target_module)
            && target_module.is_exported_to(declaring.package(), caller_module)
    }

    /// Handle on a reflected method: static methods take their declared
    /// parameters, instance methods take the receiver first and dispatch
    /// virtually.
    pub fn unreflect(&self, method: &ReflectedMethod) -> InvokeResult<MethodHandle> {
        let ReflectedMethod { declaring, method } = method;
        self.check_access(declaring, declaring, method.name(), method.modifiers())?;
        if method.is_static() {
            self.static_handle(declaring, method.clone())
        } else {
            self.virtual_handle(declaring, declaring, method.clone())
        }
    }

    /// Handle on a reflected method that bypasses overrides, as a super call
    /// from `special_caller`.
    pub fn unreflect_special(
        &self,
        method: &ReflectedMethod,
        special_caller: &ClassRef,
    ) -> InvokeResult<MethodHandle> {
        self.check_special_caller(special_caller)?;
        let ReflectedMethod { declaring, method } = method;
        if method.is_static() {
            return Err(InvokeError::IllegalAccess(format!(
                "expected a non-static method: {declaring}.{}",
                method.name()
            )));
        }
        self.check_access(declaring, declaring, method.name(), method.modifiers())?;
        self.special_handle(declaring, method.clone(), special_caller)
    }

    pub fn unreflect_constructor(
        &self,
        constructor: &ReflectedConstructor,
    ) -> InvokeResult<MethodHandle> {
        let ReflectedConstructor {
            declaring,
            constructor,
        } = constructor;
        self.check_access(declaring, declaring, "<init>", constructor.modifiers())?;
        self.constructor_handle(declaring, constructor.clone())
    }

    pub fn unreflect_getter(&self, field: &ReflectedField) -> InvokeResult<MethodHandle> {
        let ReflectedField {
            declaring, field, ..
        } = field;
        self.check_access(declaring, declaring, field.name(), field.modifiers())?;
        let ref_kind = if field.is_static() {
            RefKind::GetStatic
        } else {
            RefKind::GetField
        };
        field_handle(declaring, declaring, field, ref_kind)
    }

    /// Final fields are writable only through an accessible, non-static
    /// reflected field.
    pub fn unreflect_setter(&self, field: &ReflectedField) -> InvokeResult<MethodHandle> {
        let ReflectedField {
            declaring,
            field,
            accessible,
        } = field;
        self.check_access(declaring, declaring, field.name(), field.modifiers())?;
        if !*accessible || field.is_static() {
            check_writable(declaring, field)?;
        }
        let ref_kind = if field.is_static() {
            RefKind::PutStatic
        } else {
            RefKind::PutField
        };
        field_handle(declaring, declaring, field, ref_kind)
    }

    /// Symbolic member behind a direct handle this lookup could have
    /// produced itself.
    pub fn reveal_direct(&self, handle: &MethodHandle) -> InvokeResult<MemberInfo> {
        let member = handle
            .member()
            .ok_or_else(|| illegal_argument(format!("not a direct method handle: {handle}")))?;
        let declaring = member.declaring_class();
        if !self.can_access_member(declaring, member) {
            return Err(illegal_argument(format!(
                "access to {member} denied from {self}"
            )));
        }
        if let Some(caller) = handle.caller()
            && caller != self.lookup_class()
        {
            return Err(illegal_argument(format!(
                "caller-sensitive {member} was resolved for {caller}, not {}",
                self.lookup_class()
            )));
        }
        Ok(member.clone())
    }

    fn can_access_member(&self, declaring: &ClassRef, member: &MemberInfo) -> bool {
        self.check_access(declaring, declaring, member.name(), member.modifiers())
            .is_ok()
    }
}

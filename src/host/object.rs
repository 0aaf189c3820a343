use std::fmt;
use std::sync::{
    Arc, OnceLock, RwLock,
    atomic::{AtomicU64, Ordering},
};

use crate::error::{InvokeError, InvokeResult};
use crate::host::{
    builtins,
    class::{Class, ClassRef},
    kind::Kind,
    value::Value,
};

pub type ObjectRef = Arc<Instance>;
pub type ArrayRef = Arc<ArrayObject>;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// An instance of a non-array class. Fields are laid out per
/// `Class::instance_layout`.
pub struct Instance {
    identity: u64,
    class: ClassRef,
    fields: RwLock<Vec<Value>>,
    message: OnceLock<Arc<str>>,
}

impl Instance {
    pub fn new(class: &ClassRef) -> ObjectRef {
        let fields = class.instance_layout().iter().map(Kind::zero).collect();
        Arc::new(Instance {
            identity: NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed),
            class: class.clone(),
            fields: RwLock::new(fields),
            message: OnceLock::new(),
        })
    }

    /// A throwable of `class` carrying `message`.
    pub fn throwable(class: &ClassRef, message: Option<Arc<str>>) -> ObjectRef {
        let object = Instance::new(class);
        if let Some(message) = message {
            let _ = object.message.set(message);
        }
        object
    }

    pub fn identity(&self) -> u64 {
        self.identity
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn is_throwable(&self) -> bool {
        self.class.is_subclass_of(&builtins::core().throwable)
    }

    pub fn message(&self) -> Option<Arc<str>> {
        self.message.get().cloned()
    }

    /// Sets the detail message once; later calls are ignored.
    pub(crate) fn init_message(&self, message: Arc<str>) {
        let _ = self.message.set(message);
    }

    pub fn field(&self, slot: usize) -> InvokeResult<Value> {
        let fields = self
            .fields
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        fields.get(slot).cloned().ok_or_else(|| missing_slot(&self.class, slot))
    }

    pub fn set_field(&self, slot: usize, value: Value) -> InvokeResult<()> {
        let mut fields = self
            .fields
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match fields.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(missing_slot(&self.class, slot)),
        }
    }

    /// Reads a field by name, searching the class hierarchy.
    pub fn field_named(&self, name: &str) -> InvokeResult<Value> {
        match Class::resolve_field(&self.class, name) {
            Some((_, field)) if !field.is_static() => self.field(field.slot),
            _ => Err(InvokeError::NoSuchField(format!("{}.{name}", self.class.name()))),
        }
    }
}

fn missing_slot(class: &ClassRef, slot: usize) -> InvokeError {
    InvokeError::IllegalState(format!("instance slot {slot} missing in {}", class.name()))
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class.name(), self.identity)
    }
}

/// A fixed-length array with typed elements.
pub struct ArrayObject {
    class: ClassRef,
    component: Kind,
    elements: RwLock<Vec<Value>>,
}

impl ArrayObject {
    pub fn new(component: &Kind, length: i64) -> InvokeResult<ArrayRef> {
        if length < 0 {
            return Err(InvokeError::NegativeArraySize(length));
        }
        let elements = vec![component.zero(); length as usize];
        Self::from_values(component, elements)
    }

    /// Wraps `elements` without converting them; callers store values that
    /// already fit the component kind.
    pub fn from_values(component: &Kind, elements: Vec<Value>) -> InvokeResult<ArrayRef> {
        let class = Class::array_of(component)?;
        Ok(Arc::new(ArrayObject {
            class,
            component: component.clone(),
            elements: RwLock::new(elements),
        }))
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn component(&self) -> &Kind {
        &self.component
    }

    pub fn len(&self) -> usize {
        self.elements
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: i64) -> InvokeResult<Value> {
        let elements = self
            .elements
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        usize::try_from(index)
            .ok()
            .and_then(|i| elements.get(i).cloned())
            .ok_or(InvokeError::IndexOutOfBounds {
                index,
                length: elements.len(),
            })
    }

    /// Stores `value`, which must fit the component kind exactly.
    pub fn set(&self, index: i64, value: Value) -> InvokeResult<()> {
        if !value.fits(&self.component) {
            return Err(InvokeError::ClassCast(format!(
                "cannot store {} into {}",
                value.type_name(),
                self.class.simple_name()
            )));
        }
        let mut elements = self
            .elements
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let length = elements.len();
        match usize::try_from(index).ok().and_then(|i| elements.get_mut(i)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(InvokeError::IndexOutOfBounds { index, length }),
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.elements
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl fmt::Debug for ArrayObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

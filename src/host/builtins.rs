//! Well-known classes of the boot domain.
//!
//! Everything here is created once, on first use, and lives for the rest of
//! the process.

use std::sync::{Arc, OnceLock};

use crate::error::{InvokeError, InvokeResult};
use crate::host::{
    class::{Class, ClassRef, ClassShell, Modifiers},
    convert,
    definition::{FieldSpec, MethodSpec},
    domain::ClassDomain,
    kind::{Kind, Primitive},
    module::{Module, ModuleDefinition, ModuleRef},
    object::{ArrayRef, Instance, ObjectRef},
    value::Value,
};
use crate::invoke::signature::Signature;

pub const CORE_MODULE: &str = "core";
pub const CORE_PACKAGE: &str = "core";
pub const OBJECT: &str = "core.Object";

pub struct Core {
    pub domain: Arc<ClassDomain>,
    pub module: ModuleRef,
    pub object: ClassRef,
    pub string: ClassRef,
    pub char_sequence: ClassRef,
    pub number: ClassRef,
    pub wrappers: [ClassRef; 8],
    pub method_handle: ClassRef,
    pub iterator: ClassRef,
    pub iterable: ClassRef,
    pub array_iterator: ClassRef,
    pub reflection: ClassRef,
    pub throwable: ClassRef,
    pub exception: ClassRef,
    pub runtime_exception: ClassRef,
    pub error: ClassRef,
    pub linkage_error: ClassRef,
    pub bootstrap_error: ClassRef,
    pub reflective_operation: ClassRef,
    pub illegal_access: ClassRef,
    pub no_such_method: ClassRef,
    pub no_such_field: ClassRef,
    pub illegal_argument: ClassRef,
    pub null_pointer: ClassRef,
    pub class_cast: ClassRef,
    pub wrong_method_type: ClassRef,
    pub arity_mismatch: ClassRef,
    pub illegal_state: ClassRef,
    pub unsupported_operation: ClassRef,
    pub index_out_of_bounds: ClassRef,
    pub array_index_out_of_bounds: ClassRef,
    pub negative_array_size: ClassRef,
    pub arithmetic: ClassRef,
}

pub fn core() -> &'static Core {
    static CORE: OnceLock<Core> = OnceLock::new();
    CORE.get_or_init(boot)
}

pub fn wrapper(primitive: Primitive) -> ClassRef {
    core().wrappers[primitive as usize].clone()
}

/// Iterator over the elements of `array`, boxing primitive elements.
pub(crate) fn array_iterator(array: ArrayRef) -> InvokeResult<ObjectRef> {
    let iterator = Instance::new(&core().array_iterator);
    iterator.set_field(ARRAY_SLOT, Value::Array(array))?;
    Ok(iterator)
}

const ARRAY_SLOT: usize = 0;
const INDEX_SLOT: usize = 1;

fn iterator_state(args: &[Value]) -> InvokeResult<(ObjectRef, ArrayRef, i32)> {
    let Some(Value::Object(this)) = args.first() else {
        return Err(InvokeError::NullPointer("iterator receiver".into()));
    };
    let Value::Array(array) = this.field(ARRAY_SLOT)? else {
        return Err(InvokeError::IllegalState("iterator has no array".into()));
    };
    let index = this.field(INDEX_SLOT)?.as_int().unwrap_or(0);
    Ok((this.clone(), array, index))
}

/// Primitive boxed by `class`, if it is a wrapper class.
pub fn unwrap_class(class: &ClassRef) -> Option<Primitive> {
    core()
        .wrappers
        .iter()
        .position(|w| w == class)
        .map(|i| Primitive::ALL[i])
}

struct Boot {
    domain: Arc<ClassDomain>,
    module: ModuleRef,
}

impl Boot {
    fn class(
        &self,
        simple: &str,
        modifiers: Modifiers,
        superclass: Option<&ClassRef>,
        interfaces: &[&ClassRef],
    ) -> ClassRef {
        let class = Class::from_shell(ClassShell {
            name: format!("{CORE_PACKAGE}.{simple}").into(),
            modifiers,
            superclass: superclass.cloned(),
            interfaces: interfaces.iter().map(|c| (*c).clone()).collect(),
            component: None,
            module: self.module.clone(),
            nest_host: None,
            domain: self.domain.weak(),
        });
        self.domain.register(class.clone());
        class
    }

    fn throwable(&self, simple: &str, superclass: &ClassRef) -> ClassRef {
        self.class(simple, Modifiers::PUBLIC, Some(superclass), &[])
    }
}

fn install(class: &ClassRef, fields: Vec<FieldSpec>, methods: Vec<MethodSpec>, constructors: Vec<MethodSpec>) {
    if let Err(err) = Class::install_members(class, fields, methods, constructors) {
        tracing::error!(class = class.name(), %err, "failed to install builtin members");
    }
}

fn sig(ret: Kind, params: &[Kind]) -> Signature {
    Signature::trusted(ret, params.to_vec())
}

fn receiver_str(args: &[Value]) -> InvokeResult<&str> {
    match args.first() {
        Some(Value::Str(s)) => Ok(s),
        Some(Value::Null) | None => Err(InvokeError::NullPointer("string receiver".into())),
        Some(other) => Err(InvokeError::ClassCast(format!(
            "{} is not a String",
            other.type_name()
        ))),
    }
}

fn receiver_number(args: &[Value], to: Primitive) -> InvokeResult<Value> {
    match args.first() {
        Some(Value::Boxed(inner)) => convert::cast_primitive(inner, to),
        Some(Value::Null) | None => Err(InvokeError::NullPointer("number receiver".into())),
        Some(other) => Err(InvokeError::ClassCast(format!(
            "{} is not a Number",
            other.type_name()
        ))),
    }
}

fn boot() -> Core {
    let domain = ClassDomain::create("boot", None);
    let module = Module::from_definition(
        ModuleDefinition::new(CORE_MODULE)
            .package(CORE_PACKAGE)
            .exports(CORE_PACKAGE),
    );
    domain.install_module(module.clone());
    let b = Boot { domain, module };

    let public = Modifiers::PUBLIC;
    let public_final = Modifiers::PUBLIC | Modifiers::FINAL;
    let public_interface = Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT;

    let object = b.class("Object", public, None, &[]);
    let char_sequence = b.class("CharSequence", public_interface, None, &[]);
    let string = b.class("String", public_final, Some(&object), &[&char_sequence]);
    let number = b.class("Number", public | Modifiers::ABSTRACT, Some(&object), &[]);
    let wrappers = Primitive::ALL.map(|p| {
        let simple = match p {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Char => "Character",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        };
        let superclass = if matches!(p, Primitive::Boolean | Primitive::Char) {
            &object
        } else {
            &number
        };
        b.class(simple, public_final, Some(superclass), &[])
    });
    let method_handle = b.class("MethodHandle", public | Modifiers::ABSTRACT, Some(&object), &[]);
    let iterator = b.class("Iterator", public_interface, None, &[]);
    let iterable = b.class("Iterable", public_interface, None, &[]);
    let array_iterator = b.class("ArrayIterator", public_final, Some(&object), &[&iterator]);
    let reflection = b.class("Reflection", public_final, Some(&object), &[]);

    let throwable = b.class("Throwable", public, Some(&object), &[]);
    let exception = b.throwable("Exception", &throwable);
    let runtime_exception = b.throwable("RuntimeException", &exception);
    let error = b.throwable("Error", &throwable);
    let linkage_error = b.throwable("LinkageError", &error);
    let bootstrap_error = b.throwable("BootstrapMethodError", &linkage_error);
    let reflective_operation = b.throwable("ReflectiveOperationException", &exception);
    let illegal_access = b.throwable("IllegalAccessException", &reflective_operation);
    let no_such_method = b.throwable("NoSuchMethodException", &reflective_operation);
    let no_such_field = b.throwable("NoSuchFieldException", &reflective_operation);
    let illegal_argument = b.throwable("IllegalArgumentException", &runtime_exception);
    let null_pointer = b.throwable("NullPointerException", &runtime_exception);
    let class_cast = b.throwable("ClassCastException", &runtime_exception);
    let wrong_method_type = b.throwable("WrongMethodTypeException", &runtime_exception);
    let arity_mismatch = b.throwable("ArityMismatchException", &wrong_method_type);
    let illegal_state = b.throwable("IllegalStateException", &runtime_exception);
    let unsupported_operation = b.throwable("UnsupportedOperationException", &runtime_exception);
    let index_out_of_bounds = b.throwable("IndexOutOfBoundsException", &runtime_exception);
    let array_index_out_of_bounds =
        b.throwable("ArrayIndexOutOfBoundsException", &index_out_of_bounds);
    let negative_array_size = b.throwable("NegativeArraySizeException", &runtime_exception);
    let arithmetic = b.throwable("ArithmeticException", &runtime_exception);

    let object_kind = Kind::Ref(object.clone());
    let string_kind = Kind::Ref(string.clone());

    install(
        &object,
        vec![],
        vec![
            MethodSpec::new("toString", sig(string_kind.clone(), &[]), |args| {
                Ok(Value::string(&args.first().cloned().unwrap_or(Value::Null).to_string()))
            })
            .public(),
            MethodSpec::new(
                "equals",
                sig(Kind::BOOLEAN, &[object_kind.clone()]),
                |args| match (args.first(), args.get(1)) {
                    (Some(a), Some(b)) => Ok(Value::Boolean(a.same(b))),
                    _ => Ok(Value::Boolean(false)),
                },
            )
            .public(),
        ],
        vec![MethodSpec::constructor(sig(Kind::Void, &[]), |_| Ok(Value::Void)).public()],
    );
    install(
        &char_sequence,
        vec![],
        vec![MethodSpec::abstract_method("length", sig(Kind::INT, &[])).public()],
        vec![],
    );
    install(
        &string,
        vec![],
        vec![
            MethodSpec::new("length", sig(Kind::INT, &[]), |args| {
                Ok(Value::Int(receiver_str(&args)?.encode_utf16().count() as i32))
            })
            .public(),
            MethodSpec::new("isEmpty", sig(Kind::BOOLEAN, &[]), |args| {
                Ok(Value::Boolean(receiver_str(&args)?.is_empty()))
            })
            .public(),
            MethodSpec::new("concat", sig(string_kind.clone(), &[string_kind.clone()]), |args| {
                let head = receiver_str(&args)?;
                match args.get(1) {
                    Some(Value::Str(tail)) => Ok(Value::string(&format!("{head}{tail}"))),
                    _ => Err(InvokeError::NullPointer("concat argument".into())),
                }
            })
            .public(),
            MethodSpec::new("valueOf", sig(string_kind.clone(), &[object_kind.clone()]), |args| {
                Ok(Value::string(&args.first().cloned().unwrap_or(Value::Null).to_string()))
            })
            .public()
            .as_static(),
        ],
        vec![],
    );
    install(
        &number,
        vec![],
        vec![
            MethodSpec::new("intValue", sig(Kind::INT, &[]), |args| {
                receiver_number(&args, Primitive::Int)
            })
            .public(),
            MethodSpec::new("longValue", sig(Kind::LONG, &[]), |args| {
                receiver_number(&args, Primitive::Long)
            })
            .public(),
            MethodSpec::new("doubleValue", sig(Kind::DOUBLE, &[]), |args| {
                receiver_number(&args, Primitive::Double)
            })
            .public(),
        ],
        vec![],
    );
    for (p, class) in Primitive::ALL.iter().zip(wrappers.iter()) {
        let p = *p;
        let mut methods = vec![
            MethodSpec::new("valueOf", sig(Kind::Ref(class.clone()), &[Kind::Prim(p)]), |args| {
                Ok(Value::boxed(args.into_iter().next().unwrap_or(Value::Null)))
            })
            .public()
            .as_static(),
        ];
        if p == Primitive::Int {
            methods.push(
                MethodSpec::new("parseInt", sig(Kind::INT, &[string_kind.clone()]), |args| {
                    let text = receiver_str(&args)?;
                    text.trim().parse::<i32>().map(Value::Int).map_err(|_| {
                        InvokeError::IllegalArgument(format!("for input string: \"{text}\""))
                    })
                })
                .public()
                .as_static(),
            );
            methods.push(
                MethodSpec::new("compare", sig(Kind::INT, &[Kind::INT, Kind::INT]), |args| {
                    match (args.first(), args.get(1)) {
                        (Some(Value::Int(a)), Some(Value::Int(b))) => Ok(Value::Int(a.cmp(b) as i32)),
                        _ => Err(InvokeError::IllegalArgument("compare expects two ints".into())),
                    }
                })
                .public()
                .as_static(),
            );
        }
        install(class, vec![], methods, vec![]);
    }
    install(
        &iterator,
        vec![],
        vec![
            MethodSpec::abstract_method("hasNext", sig(Kind::BOOLEAN, &[])).public(),
            MethodSpec::abstract_method("next", sig(object_kind.clone(), &[])).public(),
        ],
        vec![],
    );
    install(
        &iterable,
        vec![],
        vec![
            MethodSpec::abstract_method("iterator", sig(Kind::Ref(iterator.clone()), &[])).public(),
        ],
        vec![],
    );
    install(
        &array_iterator,
        vec![
            FieldSpec::new("array", object_kind.clone()).private(),
            FieldSpec::new("index", Kind::INT).private(),
        ],
        vec![
            MethodSpec::new("hasNext", sig(Kind::BOOLEAN, &[]), |args| {
                let (_, array, index) = iterator_state(&args)?;
                Ok(Value::Boolean((index as usize) < array.len()))
            })
            .public(),
            MethodSpec::new("next", sig(object_kind.clone(), &[]), |args| {
                let (this, array, index) = iterator_state(&args)?;
                let element = array.get(i64::from(index))?;
                this.set_field(INDEX_SLOT, Value::Int(index + 1))?;
                Ok(Value::boxed(element))
            })
            .public(),
        ],
        vec![],
    );
    install(
        &reflection,
        vec![],
        vec![
            MethodSpec::caller_sensitive("callerName", sig(string_kind.clone(), &[]), |context, _| {
                Ok(match context.caller() {
                    Some(class) => Value::string(class.name()),
                    None => Value::Null,
                })
            })
            .public()
            .as_static(),
        ],
        vec![],
    );
    install(&method_handle, vec![], vec![], vec![]);

    install(
        &throwable,
        vec![],
        vec![
            MethodSpec::new("getMessage", sig(string_kind.clone(), &[]), |args| {
                Ok(match args.first() {
                    Some(Value::Object(this)) => match this.message() {
                        Some(message) => Value::Str(message),
                        None => Value::Null,
                    },
                    _ => return Err(InvokeError::NullPointer("throwable receiver".into())),
                })
            })
            .public(),
        ],
        throwable_constructors(&string_kind),
    );
    for class in [
        &exception,
        &runtime_exception,
        &error,
        &linkage_error,
        &bootstrap_error,
        &reflective_operation,
        &illegal_access,
        &no_such_method,
        &no_such_field,
        &illegal_argument,
        &null_pointer,
        &class_cast,
        &wrong_method_type,
        &arity_mismatch,
        &illegal_state,
        &unsupported_operation,
        &index_out_of_bounds,
        &array_index_out_of_bounds,
        &negative_array_size,
        &arithmetic,
    ] {
        install(class, vec![], vec![], throwable_constructors(&string_kind));
    }

    Core {
        domain: b.domain,
        module: b.module,
        object,
        string,
        char_sequence,
        number,
        wrappers,
        method_handle,
        iterator,
        iterable,
        array_iterator,
        reflection,
        throwable,
        exception,
        runtime_exception,
        error,
        linkage_error,
        bootstrap_error,
        reflective_operation,
        illegal_access,
        no_such_method,
        no_such_field,
        illegal_argument,
        null_pointer,
        class_cast,
        wrong_method_type,
        arity_mismatch,
        illegal_state,
        unsupported_operation,
        index_out_of_bounds,
        array_index_out_of_bounds,
        negative_array_size,
        arithmetic,
    }
}

fn throwable_constructors(string_kind: &Kind) -> Vec<MethodSpec> {
    vec![
        MethodSpec::constructor(sig(Kind::Void, &[]), |_| Ok(Value::Void)).public(),
        MethodSpec::constructor(sig(Kind::Void, &[string_kind.clone()]), |args| {
            if let (Some(Value::Object(this)), Some(Value::Str(message))) = (args.first(), args.get(1)) {
                this.init_message(message.clone());
            }
            Ok(Value::Void)
        })
        .public(),
    ]
}

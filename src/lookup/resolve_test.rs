use std::sync::Arc;

use crate::error::InvokeError;
use crate::host::{
    builtins,
    class::{Class, ClassRef, Modifiers},
    definition::{ClassDefinition, FieldSpec, MethodSpec},
    domain::ClassDomain,
    kind::Kind,
    module::ModuleDefinition,
    value::Value,
};
use crate::invoke::{
    direct::RefKind,
    signature::{Signature, method_type},
};
use crate::lookup::{AccessModes, Lookup, ReflectedConstructor, ReflectedField, ReflectedMethod};

struct World {
    _domain: Arc<ClassDomain>,
    named: ClassRef,
    counter: ClassRef,
    special: ClassRef,
    shape: ClassRef,
    main: ClassRef,
    child: ClassRef,
}

fn mt(ret: Kind, params: &[Kind]) -> Signature {
    method_type(ret, params).unwrap()
}

fn receiver_value(args: &[Value]) -> Value {
    args[0]
        .as_object()
        .map(|object| object.field_named("value").unwrap_or(Value::Int(-1)))
        .unwrap_or(Value::Int(-1))
}

fn world() -> World {
    let domain = ClassDomain::new("app");
    domain
        .define_module(ModuleDefinition::new("m.lib").package("lib").exports("lib"))
        .unwrap();
    domain
        .define_module(ModuleDefinition::new("m.app").package("app").reads("m.lib"))
        .unwrap();
    let string = Kind::string();
    let named = domain
        .define_class(
            ClassDefinition::new("lib.Named")
                .public()
                .interface()
                .method(MethodSpec::abstract_method("name", mt(string.clone(), &[])).public()),
        )
        .unwrap();
    let counter = domain
        .define_class(
            ClassDefinition::new("lib.Counter")
                .public()
                .implements("lib.Named")
                .field(FieldSpec::new("value", Kind::INT).public())
                .field(FieldSpec::new("secret", Kind::INT).private())
                .field(FieldSpec::new("serial", Kind::INT).public().with(Modifiers::FINAL))
                .field(FieldSpec::new("total", Kind::INT).public().as_static().initial(Value::Int(5)))
                .field(
                    FieldSpec::new("LIMIT", Kind::INT)
                        .public()
                        .as_static()
                        .with(Modifiers::FINAL)
                        .initial(Value::Int(10)),
                )
                .constructor(
                    MethodSpec::constructor(mt(Kind::Void, &[Kind::INT]), |args| {
                        if let Some(this) = args[0].as_object() {
                            this.set_field(0, args[1].clone())?;
                        }
                        Ok(Value::Void)
                    })
                    .public(),
                )
                .method(
                    MethodSpec::new("twice", mt(Kind::INT, &[Kind::INT]), |args| {
                        Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
                    })
                    .public()
                    .as_static(),
                )
                .method(MethodSpec::new("get", mt(Kind::INT, &[]), |args| Ok(receiver_value(&args))).public())
                .method(MethodSpec::new("hidden", mt(Kind::INT, &[]), |_| Ok(Value::Int(99))).private())
                .method(MethodSpec::new("bump", mt(Kind::INT, &[]), |_| Ok(Value::Int(1))).protected())
                .method(
                    MethodSpec::new("describe", mt(string.clone(), &[]), |_| Ok(Value::string("counter")))
                        .public(),
                )
                .method(MethodSpec::new("name", mt(string.clone(), &[]), |_| Ok(Value::string("c"))).public()),
        )
        .unwrap();
    let special = domain
        .define_class(
            ClassDefinition::new("lib.Special")
                .public()
                .extends("lib.Counter")
                .constructor(MethodSpec::constructor(mt(Kind::Void, &[]), |_| Ok(Value::Void)).public())
                .method(
                    MethodSpec::new("describe", mt(string.clone(), &[]), |_| Ok(Value::string("special")))
                        .public(),
                ),
        )
        .unwrap();
    let shape = domain
        .define_class(
            ClassDefinition::new("lib.Shape")
                .public()
                .with(Modifiers::ABSTRACT)
                .constructor(MethodSpec::constructor(mt(Kind::Void, &[]), |_| Ok(Value::Void)).public()),
        )
        .unwrap();
    let main = domain.define_class(ClassDefinition::new("app.Main").public()).unwrap();
    let child = domain
        .define_class(ClassDefinition::new("app.Child").public().extends("lib.Counter"))
        .unwrap();
    World {
        _domain: domain,
        named,
        counter,
        special,
        shape,
        main,
        child,
    }
}

fn new_counter(w: &World, value: i32) -> Value {
    Lookup::for_class(&w.main)
        .find_constructor(&w.counter, &mt(Kind::Void, &[Kind::INT]))
        .unwrap()
        .invoke_exact(vec![Value::Int(value)])
        .unwrap()
}

#[test]
fn find_static_invokes_the_method() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let twice = lookup
        .find_static(&w.counter, "twice", &mt(Kind::INT, &[Kind::INT]))
        .unwrap();
    assert_eq!(twice.signature().to_string(), "(int)int");
    assert_eq!(twice.invoke_exact(vec![Value::Int(21)]).unwrap(), Value::Int(42));

    let info = lookup.reveal_direct(&twice).unwrap();
    assert_eq!(info.ref_kind(), RefKind::InvokeStatic);
    assert_eq!(info.name(), "twice");
    assert_eq!(info.declaring_class(), &w.counter);
}

#[test]
fn find_static_rejects_wrong_members() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let err = lookup
        .find_static(&w.counter, "get", &mt(Kind::INT, &[]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));

    let err = lookup
        .find_static(&w.counter, "absent", &mt(Kind::INT, &[]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::NoSuchMethod(_)));

    let err = lookup
        .find_static(&w.counter, "<init>", &mt(Kind::Void, &[Kind::INT]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::NoSuchMethod(_)));
}

#[test]
fn constructor_and_virtual_getter() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let make = lookup
        .find_constructor(&w.counter, &mt(Kind::Void, &[Kind::INT]))
        .unwrap();
    assert_eq!(make.signature().to_string(), "(int)Counter");
    let counter = make.invoke_exact(vec![Value::Int(7)]).unwrap();

    let get = lookup
        .find_virtual(&w.counter, "get", &mt(Kind::INT, &[]))
        .unwrap();
    assert_eq!(get.signature().to_string(), "(Counter)int");
    assert_eq!(get.invoke_exact(vec![counter]).unwrap(), Value::Int(7));
    assert!(matches!(
        get.invoke_exact(vec![Value::Null]).unwrap_err(),
        InvokeError::NullPointer(_)
    ));
}

#[test]
fn find_constructor_failures() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let err = lookup
        .find_constructor(&w.counter, &mt(Kind::INT, &[Kind::INT]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::NoSuchMethod(_)));

    let err = lookup
        .find_constructor(&w.counter, &mt(Kind::Void, &[Kind::LONG]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::NoSuchMethod(_)));

    let counters = Class::array_of(&Kind::class(&w.counter)).unwrap();
    let err = lookup
        .find_constructor(&counters, &mt(Kind::Void, &[]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::NoSuchMethod(_)));

    let err = lookup
        .find_constructor(&w.shape, &mt(Kind::Void, &[]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

#[test]
fn virtual_dispatch_and_special_calls() {
    let w = world();
    let describe_sig = mt(Kind::string(), &[]);
    let special = Lookup::for_class(&w.main)
        .find_constructor(&w.special, &mt(Kind::Void, &[]))
        .unwrap()
        .invoke_exact(vec![])
        .unwrap();

    let describe = Lookup::for_class(&w.main)
        .find_virtual(&w.counter, "describe", &describe_sig)
        .unwrap();
    let result = describe.invoke_exact(vec![special.clone()]).unwrap();
    assert_eq!(result.as_str(), Some("special"));

    let own = Lookup::for_class(&w.special);
    let super_call = own
        .find_special(&w.counter, "describe", &describe_sig, &w.special)
        .unwrap();
    assert_eq!(super_call.signature().to_string(), "(Special)String");
    assert_eq!(
        super_call.invoke_exact(vec![special]).unwrap().as_str(),
        Some("counter")
    );
    assert_eq!(
        own.reveal_direct(&super_call).unwrap().ref_kind(),
        RefKind::InvokeSpecial
    );

    let err = Lookup::for_class(&w.main)
        .find_special(&w.counter, "describe", &describe_sig, &w.special)
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

#[test]
fn interface_methods_dispatch_to_implementations() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let name = lookup
        .find_virtual(&w.named, "name", &mt(Kind::string(), &[]))
        .unwrap();
    assert_eq!(name.signature().to_string(), "(Named)String");
    assert_eq!(
        lookup.reveal_direct(&name).unwrap().ref_kind(),
        RefKind::InvokeInterface
    );
    let result = name.invoke_exact(vec![new_counter(&w, 1)]).unwrap();
    assert_eq!(result.as_str(), Some("c"));
}

#[test]
fn private_members_need_private_access() {
    let w = world();
    let hidden_sig = mt(Kind::INT, &[]);
    let err = Lookup::for_class(&w.main)
        .find_virtual(&w.counter, "hidden", &hidden_sig)
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    assert!(err.message().starts_with("member is private: lib.Counter.hidden"));

    let own = Lookup::for_class(&w.counter)
        .find_virtual(&w.counter, "hidden", &hidden_sig)
        .unwrap();
    assert_eq!(own.invoke_exact(vec![new_counter(&w, 0)]).unwrap(), Value::Int(99));
}

#[test]
fn protected_members_from_a_subclass_take_its_receiver() {
    let w = world();
    let bump_sig = mt(Kind::INT, &[]);
    let bump = Lookup::for_class(&w.child)
        .find_virtual(&w.counter, "bump", &bump_sig)
        .unwrap();
    assert_eq!(bump.signature().to_string(), "(Child)int");

    let err = Lookup::for_class(&w.main)
        .find_virtual(&w.counter, "bump", &bump_sig)
        .unwrap_err();
    assert!(err.message().starts_with("member is protected"));

    let same_package = Lookup::for_class(&w.special)
        .find_virtual(&w.counter, "bump", &bump_sig)
        .unwrap();
    assert_eq!(same_package.signature().to_string(), "(Counter)int");
}

#[test]
fn static_field_accessors() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let get = lookup.find_static_getter(&w.counter, "total", &Kind::INT).unwrap();
    let set = lookup.find_static_setter(&w.counter, "total", &Kind::INT).unwrap();
    assert_eq!(get.signature().to_string(), "()int");
    assert_eq!(set.signature().to_string(), "(int)void");
    assert_eq!(get.invoke_exact(vec![]).unwrap(), Value::Int(5));
    set.invoke_exact(vec![Value::Int(9)]).unwrap();
    assert_eq!(get.invoke_exact(vec![]).unwrap(), Value::Int(9));

    let err = lookup
        .find_static_setter(&w.counter, "LIMIT", &Kind::INT)
        .unwrap_err();
    assert!(err.message().contains("is final"));

    let err = lookup.find_getter(&w.counter, "total", &Kind::INT).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

#[test]
fn instance_field_accessors() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let counter = new_counter(&w, 3);
    let get = lookup.find_getter(&w.counter, "value", &Kind::INT).unwrap();
    let set = lookup.find_setter(&w.counter, "value", &Kind::INT).unwrap();
    assert_eq!(get.signature().to_string(), "(Counter)int");
    assert_eq!(set.signature().to_string(), "(Counter,int)void");
    set.invoke_exact(vec![counter.clone(), Value::Int(12)]).unwrap();
    assert_eq!(get.invoke_exact(vec![counter]).unwrap(), Value::Int(12));

    let info = lookup.reveal_direct(&set).unwrap();
    assert_eq!(info.ref_kind(), RefKind::PutField);
    assert_eq!(info.method_type().to_string(), "(int)void");

    let err = lookup.find_getter(&w.counter, "value", &Kind::LONG).unwrap_err();
    assert!(matches!(err, InvokeError::NoSuchField(_)));
    let err = lookup.find_getter(&w.counter, "secret", &Kind::INT).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    let err = lookup.find_getter(&w.counter, "missing", &Kind::INT).unwrap_err();
    assert!(matches!(err, InvokeError::NoSuchField(_)));
}

#[test]
fn bind_fixes_the_receiver() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let bound = lookup
        .bind(new_counter(&w, 4), "get", &mt(Kind::INT, &[]))
        .unwrap();
    assert_eq!(bound.signature().to_string(), "()int");
    assert_eq!(bound.invoke_exact(vec![]).unwrap(), Value::Int(4));

    let err = lookup
        .bind(Value::Null, "get", &mt(Kind::INT, &[]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::NullPointer(_)));

    let err = lookup.reveal_direct(&bound).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));
}

#[test]
fn caller_sensitive_methods_see_the_lookup_class() {
    let w = world();
    let reflection = &builtins::core().reflection;
    let sig = mt(Kind::string(), &[]);
    let lookup = Lookup::for_class(&w.main);
    let caller_name = lookup.find_static(reflection, "callerName", &sig).unwrap();
    assert_eq!(
        caller_name.invoke_exact(vec![]).unwrap().as_str(),
        Some("app.Main")
    );
    assert!(lookup.reveal_direct(&caller_name).is_ok());

    let other = Lookup::for_class(&w.child);
    let err = other.reveal_direct(&caller_name).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));
}

#[test]
fn caller_sensitive_methods_need_the_original_lookup() {
    let w = world();
    let reflection = &builtins::core().reflection;
    let sig = mt(Kind::string(), &[]);

    let err = Lookup::public_lookup()
        .find_static(reflection, "callerName", &sig)
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));

    let narrowed = Lookup::for_class(&w.main)
        .drop_lookup_mode(AccessModes::ORIGINAL)
        .unwrap();
    assert!(narrowed.find_static(reflection, "callerName", &sig).is_err());

    let teleported = Lookup::private_lookup_in(&w.counter, &Lookup::for_class(&w.main)).unwrap();
    assert!(teleported.find_static(reflection, "callerName", &sig).is_err());
}

#[test]
fn unreflect_checks_access_like_resolution() {
    let w = world();
    let hidden = ReflectedMethod::of(&w.counter, "hidden", &mt(Kind::INT, &[])).unwrap();
    assert!(Lookup::for_class(&w.main).unreflect(&hidden).is_err());

    let handle = Lookup::for_class(&w.counter).unreflect(&hidden).unwrap();
    assert_eq!(handle.signature().to_string(), "(Counter)int");
    assert_eq!(handle.invoke_exact(vec![new_counter(&w, 0)]).unwrap(), Value::Int(99));

    let twice = ReflectedMethod::of(&w.counter, "twice", &mt(Kind::INT, &[Kind::INT])).unwrap();
    let handle = Lookup::public_lookup().unreflect(&twice).unwrap();
    assert_eq!(handle.signature().to_string(), "(int)int");
}

#[test]
fn reflection_never_grants_caller_sensitivity() {
    let reflection = &builtins::core().reflection;
    let caller_name =
        ReflectedMethod::of(reflection, "callerName", &mt(Kind::string(), &[])).unwrap();
    let err = Lookup::public_lookup().unreflect(&caller_name).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

#[test]
fn setting_accessible_needs_full_privilege() {
    let w = world();
    let mut secret = ReflectedField::of(&w.counter, "secret").unwrap();
    let err = secret
        .set_accessible(true, &Lookup::public_lookup())
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    let narrowed = Lookup::for_class(&w.main)
        .drop_lookup_mode(AccessModes::PRIVATE)
        .unwrap();
    assert!(secret.set_accessible(true, &narrowed).is_err());
    assert!(!secret.is_accessible());

    secret.set_accessible(true, &Lookup::for_class(&w.main)).unwrap();
    assert!(secret.is_accessible());
    secret.set_accessible(false, &Lookup::public_lookup()).unwrap();
    assert!(!secret.is_accessible());
}

#[test]
fn accessible_fields_still_need_access_to_unreflect() {
    let w = world();
    let mut secret = ReflectedField::of(&w.counter, "secret").unwrap();
    secret.set_accessible(true, &Lookup::for_class(&w.main)).unwrap();
    for lookup in [Lookup::public_lookup(), Lookup::for_class(&w.main)] {
        let err = lookup.unreflect_getter(&secret).unwrap_err();
        assert!(matches!(err, InvokeError::IllegalAccess(_)));
        assert!(lookup.unreflect_setter(&secret).is_err());
    }
}

#[test]
fn unreflected_fields_and_constructors() {
    let w = world();
    let owner = Lookup::for_class(&w.counter);

    let secret = ReflectedField::of(&w.counter, "secret").unwrap();
    let get = owner.unreflect_getter(&secret).unwrap();
    let set = owner.unreflect_setter(&secret).unwrap();
    let counter = new_counter(&w, 0);
    set.invoke_exact(vec![counter.clone(), Value::Int(31)]).unwrap();
    assert_eq!(get.invoke_exact(vec![counter]).unwrap(), Value::Int(31));

    let mut serial = ReflectedField::of(&w.counter, "serial").unwrap();
    assert!(owner.unreflect_setter(&serial).is_err());
    serial.set_accessible(true, &owner).unwrap();
    let stamp = owner.unreflect_setter(&serial).unwrap();
    let counter = new_counter(&w, 0);
    stamp.invoke_exact(vec![counter.clone(), Value::Int(7)]).unwrap();
    let read = owner.unreflect_getter(&serial).unwrap();
    assert_eq!(read.invoke_exact(vec![counter]).unwrap(), Value::Int(7));

    let mut limit = ReflectedField::of(&w.counter, "LIMIT").unwrap();
    limit.set_accessible(true, &owner).unwrap();
    assert!(owner.unreflect_setter(&limit).is_err());
    let read = owner.unreflect_getter(&limit).unwrap();
    assert_eq!(read.invoke_exact(vec![]).unwrap(), Value::Int(10));

    let init = ReflectedConstructor::of(&w.counter, &[Kind::INT]).unwrap();
    let make = Lookup::for_class(&w.main).unreflect_constructor(&init).unwrap();
    assert_eq!(make.signature().to_string(), "(int)Counter");
}

#[test]
fn unreflect_special_requires_the_caller() {
    let w = world();
    let describe =
        ReflectedMethod::of(&w.counter, "describe", &mt(Kind::string(), &[])).unwrap();
    let handle = Lookup::for_class(&w.special)
        .unreflect_special(&describe, &w.special)
        .unwrap();
    assert_eq!(handle.signature().to_string(), "(Special)String");
    assert!(
        Lookup::for_class(&w.main)
            .unreflect_special(&describe, &w.special)
            .is_err()
    );
}

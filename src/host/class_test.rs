use crate::host::{
    builtins,
    class::{Class, Modifiers},
    kind::{Kind, Primitive},
};
use crate::invoke::signature::method_type;

#[test]
fn everything_is_an_object() {
    let core = builtins::core();
    assert!(core.string.is_subclass_of(&core.object));
    assert!(core.iterator.is_subclass_of(&core.object));
    assert!(Class::array_of(&Kind::INT).unwrap().is_subclass_of(&core.object));
    assert!(!core.object.is_subclass_of(&core.string));
}

#[test]
fn interfaces_and_superclasses_are_supertypes() {
    let core = builtins::core();
    assert!(core.string.is_subclass_of(&core.char_sequence));
    assert!(core.wrappers[Primitive::Int as usize].is_subclass_of(&core.number));
    assert!(!core.wrappers[Primitive::Boolean as usize].is_subclass_of(&core.number));
    assert!(core.arity_mismatch.is_subclass_of(&core.wrong_method_type));
    assert!(core.bootstrap_error.is_subclass_of(&core.error));
}

#[test]
fn array_classes_are_interned_and_covariant() {
    let strings = Class::array_of(&Kind::string()).unwrap();
    assert_eq!(strings, Class::array_of(&Kind::string()).unwrap());
    assert_eq!(strings.name(), "core.String[]");
    assert_eq!(strings.simple_name(), "String[]");
    assert_eq!(strings.descriptor(), "[Lcore/String;");
    assert!(strings.is_subclass_of(&Class::array_of(&Kind::object()).unwrap()));

    let ints = Class::array_of(&Kind::INT).unwrap();
    assert_eq!(ints.simple_name(), "int[]");
    assert_eq!(ints.package(), "core");
    assert!(!ints.is_subclass_of(&Class::array_of(&Kind::LONG).unwrap()));
}

#[test]
fn void_is_not_an_array_component() {
    assert!(Class::array_of(&Kind::Void).is_err());
}

#[test]
fn modifiers_render_their_flags() {
    let modifiers = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
    assert_eq!(format!("{modifiers:?}"), "public static final");
    assert_eq!(format!("{:?}", Modifiers::NONE), "package");
    assert!(Modifiers::NONE.is_package_private());
    assert!(!modifiers.without(Modifiers::STATIC).is_static());
}

#[test]
fn resolves_inherited_methods() {
    let core = builtins::core();
    let to_string = method_type(Kind::string(), &[]).unwrap();
    let (declaring, method) = Class::resolve_method(&core.illegal_argument, "toString", &to_string)
        .expect("inherited from Object");
    assert_eq!(declaring, core.object);
    assert!(!method.is_static());

    let length = method_type(Kind::INT, &[]).unwrap();
    let (declaring, _) = Class::resolve_method(&core.string, "length", &length).unwrap();
    assert_eq!(declaring, core.string);
    assert!(Class::resolve_method(&core.string, "size", &length).is_none());
}

#[test]
fn selects_concrete_implementation_over_interface() {
    let core = builtins::core();
    let length = method_type(Kind::INT, &[]).unwrap();
    let method = Class::select_implementation(&core.string, "length", &length).unwrap();
    assert!(!method.is_abstract());
}

#[test]
fn kinds_display_simple_names() {
    assert_eq!(Kind::string().to_string(), "String");
    assert_eq!(Kind::INT.to_string(), "int");
    assert_eq!(Kind::Void.to_string(), "void");
    assert_eq!(Kind::object_array().to_string(), "Object[]");
    assert_eq!(Kind::INT.wrapped().to_string(), "Integer");
    assert_eq!(Kind::INT.wrapped().unwrapped(), Kind::INT);
    assert_eq!(Kind::string().erased(), Kind::object());
}

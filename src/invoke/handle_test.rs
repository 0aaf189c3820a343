use crate::error::InvokeError;
use crate::host::{kind::Kind, object::ArrayObject, value::Value};
use crate::invoke::{handle::MethodHandle, signature::method_type};

fn add() -> MethodHandle {
    let sig = method_type(Kind::INT, &[Kind::INT, Kind::INT]).unwrap();
    MethodHandle::from_fn("add", sig, |args| {
        Ok(Value::Int(args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0)))
    })
}

fn joiner() -> MethodHandle {
    let sig = method_type(Kind::string(), &[Kind::string(), Kind::object_array()]).unwrap();
    MethodHandle::from_fn("join", sig, |args| {
        let head = args[0].as_str().unwrap_or_default().to_string();
        let tail: Vec<String> = match &args[1] {
            Value::Array(array) => array.to_vec().iter().map(|v| v.to_string()).collect(),
            _ => vec![],
        };
        Ok(Value::string(&format!("{head}{}", tail.join(","))))
    })
}

#[test]
fn invoke_exact_runs_matching_arguments() {
    let result = add().invoke_exact(vec![Value::Int(2), Value::Int(3)]).unwrap();
    assert_eq!(result, Value::Int(5));
}

#[test]
fn invoke_exact_rejects_any_conversion() {
    let err = add()
        .invoke_exact(vec![Value::Int(2), Value::boxed(Value::Int(3))])
        .unwrap_err();
    assert!(matches!(err, InvokeError::WrongMethodType(_)));

    let err = add().invoke_exact(vec![Value::Int(2)]).unwrap_err();
    assert!(matches!(
        err,
        InvokeError::ArityMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[test]
fn invoke_unboxes_and_widens() {
    let result = add()
        .invoke(vec![Value::boxed(Value::Int(2)), Value::Short(3)])
        .unwrap();
    assert_eq!(result, Value::Int(5));

    let err = add().invoke(vec![Value::Long(2), Value::Int(3)]).unwrap_err();
    assert!(matches!(err, InvokeError::WrongMethodType(_)));

    let err = add().invoke(vec![Value::Null, Value::Int(3)]).unwrap_err();
    assert!(matches!(err, InvokeError::NullPointer(_)));
}

#[test]
fn wrong_return_shape_is_reported() {
    let sig = method_type(Kind::INT, &[]).unwrap();
    let liar = MethodHandle::from_fn("liar", sig, |_| Ok(Value::string("nope")));
    let err = liar.invoke_exact(vec![]).unwrap_err();
    assert!(matches!(err, InvokeError::WrongMethodType(_)));
}

#[test]
fn void_handles_return_void() {
    let sig = method_type(Kind::Void, &[]).unwrap();
    let noisy = MethodHandle::from_fn("noisy", sig, |_| Ok(Value::Int(7)));
    assert_eq!(noisy.invoke_exact(vec![]).unwrap(), Value::Void);
}

#[test]
fn varargs_collector_gathers_trailing_arguments() {
    let join = joiner().as_varargs_collector(&Kind::object_array()).unwrap();
    assert!(join.is_varargs_collector());

    let result = join
        .invoke(vec![Value::string("n="), Value::Int(1), Value::string("b")])
        .unwrap();
    assert_eq!(result.as_str(), Some("n=1,b"));

    let result = join.invoke(vec![Value::string("none")]).unwrap();
    assert_eq!(result.as_str(), Some("none"));
}

#[test]
fn varargs_collector_passes_an_existing_array_through() {
    let join = joiner().as_varargs_collector(&Kind::object_array()).unwrap();
    let array = ArrayObject::from_values(&Kind::object(), vec![Value::string("x")]).unwrap();
    let result = join
        .invoke(vec![Value::string("a:"), Value::Array(array)])
        .unwrap();
    assert_eq!(result.as_str(), Some("a:x"));
}

#[test]
fn fixed_arity_drops_collection() {
    let join = joiner().as_varargs_collector(&Kind::object_array()).unwrap();
    let fixed = join.as_fixed_arity();
    assert!(!fixed.is_varargs_collector());
    assert_eq!(fixed.signature(), join.signature());
    assert!(
        fixed
            .invoke(vec![Value::string("a"), Value::Int(1), Value::Int(2)])
            .is_err()
    );
    assert!(fixed.as_fixed_arity().same_handle(&fixed));
}

#[test]
fn varargs_needs_trailing_array() {
    let err = add().as_varargs_collector(&Kind::object_array()).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));
    assert!(add().with_varargs(true).is_err());
    assert!(joiner().with_varargs(true).unwrap().is_varargs_collector());
    assert!(!add().with_varargs(false).unwrap().is_varargs_collector());
}

#[test]
fn bind_to_needs_a_reference_parameter() {
    let err = add().bind_to(Value::Int(1)).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));

    let bound = joiner().bind_to(Value::string("p:")).unwrap();
    assert_eq!(bound.signature().to_string(), "(Object[])String");
}

#[test]
fn display_and_debug_show_signature_and_strategy() {
    let handle = add();
    assert_eq!(handle.to_string(), "MethodHandle(int,int)int");
    assert_eq!(format!("{handle:?}"), "MethodHandle(int,int)int[direct]");
    assert_eq!(handle.arity(), 2);
}

#[test]
fn describe_renders_the_strategy_tree() {
    let bound = joiner().bind_to(Value::string("p")).unwrap();
    let description = bound.describe();
    assert_eq!(description.strategy, "bound");
    assert_eq!(description.children.len(), 1);
    assert_eq!(
        description.to_string(),
        "bound (Object[])String [value=p]\n  direct (String,Object[])String [join]\n"
    );
    let json = description.to_json().unwrap();
    assert!(json.contains("\"strategy\": \"bound\""));
}

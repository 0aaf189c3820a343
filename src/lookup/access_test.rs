use std::sync::Arc;

use crate::host::{
    class::{Class, ClassRef, Modifiers},
    definition::ClassDefinition,
    domain::ClassDomain,
    kind::Kind,
    module::ModuleDefinition,
};
use crate::lookup::access::{AccessModes, is_class_accessible, is_member_accessible, same_package};

struct World {
    _domain: Arc<ClassDomain>,
    api: ClassRef,
    inner: ClassRef,
    internal: ClassRef,
    secret: ClassRef,
    main: ClassRef,
    sub: ClassRef,
    tool: ClassRef,
}

fn world() -> World {
    let domain = ClassDomain::new("app");
    domain
        .define_module(
            ModuleDefinition::new("m.lib")
                .package("lib")
                .package("lib.hidden")
                .exports("lib"),
        )
        .unwrap();
    domain
        .define_module(ModuleDefinition::new("m.app").package("app").reads("m.lib"))
        .unwrap();
    domain
        .define_module(ModuleDefinition::new("m.other").package("other"))
        .unwrap();
    let define = |definition: ClassDefinition| domain.define_class(definition).unwrap();
    let api = define(ClassDefinition::new("lib.Api").public());
    let inner = define(ClassDefinition::new("lib.Api$Inner").nest_host("lib.Api"));
    let internal = define(ClassDefinition::new("lib.Internal"));
    let secret = define(ClassDefinition::new("lib.hidden.Secret").public());
    let main = define(ClassDefinition::new("app.Main").public());
    let sub = define(ClassDefinition::new("app.Sub").public().extends("lib.Api"));
    let tool = define(ClassDefinition::new("other.Tool").public());
    World {
        _domain: domain,
        api,
        inner,
        internal,
        secret,
        main,
        sub,
        tool,
    }
}

#[test]
fn modes_render_in_fixed_order() {
    assert_eq!(
        AccessModes::FULL.to_string(),
        "public|module|package|private|unconditional|original"
    );
    assert_eq!(AccessModes::NONE.to_string(), "none");
    assert_eq!(
        format!("{:?}", AccessModes::PRIVATE | AccessModes::PUBLIC),
        "AccessModes(public|private)"
    );
    let json = serde_json::to_string(&(AccessModes::PUBLIC | AccessModes::MODULE)).unwrap();
    assert_eq!(json, r#"["public","module"]"#);
}

#[test]
fn mode_algebra_stays_within_known_bits() {
    let without_public = !AccessModes::PUBLIC;
    assert!(!without_public.contains(AccessModes::PUBLIC));
    assert!(without_public.contains(AccessModes::PRIVATE | AccessModes::ORIGINAL));
    assert_eq!(without_public.bits() & !AccessModes::FULL.bits(), 0);
    assert!(AccessModes::is_single(AccessModes::MODULE));
    assert!(!AccessModes::is_single(AccessModes::NONE));
    assert!(!AccessModes::is_single(AccessModes::PUBLIC | AccessModes::PRIVATE));
}

#[test]
fn same_package_requires_the_same_domain() {
    let w = world();
    assert!(same_package(&w.api, &w.internal));
    assert!(!same_package(&w.api, &w.secret));

    let elsewhere = ClassDomain::new("elsewhere");
    let twin = elsewhere
        .define_class(ClassDefinition::new("lib.Twin").public())
        .unwrap();
    assert!(!same_package(&w.api, &twin));
}

#[test]
fn exported_public_classes_are_visible_across_modules() {
    let w = world();
    assert!(is_class_accessible(&w.api, &w.main, None, AccessModes::FULL));
    assert!(!is_class_accessible(&w.secret, &w.main, None, AccessModes::FULL));
    assert!(is_class_accessible(&w.secret, &w.api, None, AccessModes::FULL));
}

#[test]
fn readability_matters_without_unconditional_access() {
    let w = world();
    let qualified = AccessModes::FULL & !AccessModes::UNCONDITIONAL;
    assert!(is_class_accessible(&w.api, &w.tool, None, AccessModes::FULL));
    assert!(!is_class_accessible(&w.api, &w.tool, None, qualified));
    assert!(is_class_accessible(&w.api, &w.main, None, qualified));
}

#[test]
fn public_only_modes_see_unconditional_exports() {
    let w = world();
    assert!(is_class_accessible(&w.api, &w.tool, None, AccessModes::UNCONDITIONAL));
    assert!(!is_class_accessible(&w.secret, &w.api, None, AccessModes::UNCONDITIONAL));
}

#[test]
fn package_private_classes_need_package_access() {
    let w = world();
    assert!(is_class_accessible(&w.internal, &w.api, None, AccessModes::FULL));
    assert!(!is_class_accessible(&w.internal, &w.main, None, AccessModes::FULL));
    assert!(!is_class_accessible(&w.internal, &w.api, None, AccessModes::PUBLIC | AccessModes::MODULE));
    assert!(!is_class_accessible(&w.api, &w.api, None, AccessModes::NONE));
}

#[test]
fn arrays_follow_their_element_class() {
    let w = world();
    let secrets = Class::array_of(&Kind::class(&w.secret)).unwrap();
    let apis = Class::array_of(&Kind::class(&w.api)).unwrap();
    let ints = Class::array_of(&Kind::INT).unwrap();
    assert!(!is_class_accessible(&secrets, &w.main, None, AccessModes::FULL));
    assert!(is_class_accessible(&apis, &w.main, None, AccessModes::FULL));
    assert!(is_class_accessible(&ints, &w.tool, None, AccessModes::PUBLIC));
}

#[test]
fn member_visibility_by_modifier() {
    let w = world();
    let full = AccessModes::FULL;
    let check = |modifiers, lookup: &ClassRef, modes| {
        is_member_accessible(&w.api, &w.api, modifiers, lookup, None, modes)
    };
    assert!(check(Modifiers::PUBLIC, &w.main, full));
    assert!(!check(Modifiers::NONE, &w.main, full));
    assert!(check(Modifiers::NONE, &w.internal, full));
    assert!(!check(Modifiers::PRIVATE, &w.main, full));
    assert!(check(Modifiers::PRIVATE, &w.api, full));
    assert!(check(Modifiers::PRIVATE, &w.inner, full));
    assert!(!check(Modifiers::PRIVATE, &w.inner, full & !AccessModes::PRIVATE));
}

#[test]
fn protected_members_reach_subclasses_and_package() {
    let w = world();
    let full = AccessModes::FULL;
    let protected = Modifiers::PROTECTED;
    assert!(is_member_accessible(&w.api, &w.api, protected, &w.sub, None, full));
    assert!(is_member_accessible(&w.api, &w.api, protected, &w.internal, None, full));
    assert!(!is_member_accessible(&w.api, &w.api, protected, &w.main, None, full));
    assert!(!is_member_accessible(
        &w.api,
        &w.api,
        protected,
        &w.sub,
        None,
        full & !AccessModes::PRIVATE
    ));
}

#[test]
fn members_of_inaccessible_classes_are_hidden() {
    let w = world();
    assert!(!is_member_accessible(
        &w.secret,
        &w.secret,
        Modifiers::PUBLIC,
        &w.main,
        None,
        AccessModes::FULL
    ));
}

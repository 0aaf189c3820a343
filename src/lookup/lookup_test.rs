use std::sync::Arc;

use crate::error::InvokeError;
use crate::host::{
    builtins,
    class::{Class, ClassRef},
    definition::ClassDefinition,
    domain::ClassDomain,
    kind::Kind,
    module::ModuleDefinition,
};
use crate::lookup::{AccessModes, Lookup};

struct World {
    domain: Arc<ClassDomain>,
    main: ClassRef,
    helper: ClassRef,
    api: ClassRef,
    secret: ClassRef,
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
    let main = define(ClassDefinition::new("app.Main").public());
    let helper = define(ClassDefinition::new("app.Helper"));
    let api = define(ClassDefinition::new("lib.Api").public());
    let secret = define(ClassDefinition::new("lib.hidden.Secret").public());
    let tool = define(ClassDefinition::new("other.Tool").public());
    World {
        domain,
        main,
        helper,
        api,
        secret,
        tool,
    }
}

#[test]
fn full_lookup_holds_every_mode() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    assert_eq!(lookup.lookup_modes(), AccessModes::FULL);
    assert!(lookup.has_full_privilege_access());
    assert!(lookup.previous_lookup_class().is_none());
    assert_eq!(lookup.to_string(), "app.Main");
    assert_eq!(format!("{lookup:?}"), "Lookup(app.Main)");
}

#[test]
fn public_lookup_is_unconditional_only() {
    let lookup = Lookup::public_lookup();
    assert_eq!(lookup.lookup_class(), &builtins::core().object);
    assert_eq!(lookup.lookup_modes(), AccessModes::UNCONDITIONAL);
    assert!(!lookup.has_full_privilege_access());
    assert_eq!(lookup.to_string(), "core.Object/unconditional");
    assert!(lookup.find_class("core.String").is_ok());
}

#[test]
fn dropping_modes_narrows_monotonically() {
    let w = world();
    let full = Lookup::for_class(&w.main);

    let no_package = full.drop_lookup_mode(AccessModes::PACKAGE).unwrap();
    assert_eq!(no_package.lookup_modes(), AccessModes::PUBLIC | AccessModes::MODULE);
    assert_eq!(no_package.to_string(), "app.Main/public|module");

    let public = no_package.drop_lookup_mode(AccessModes::MODULE).unwrap();
    assert_eq!(public.lookup_modes(), AccessModes::PUBLIC);

    let none = public.drop_lookup_mode(AccessModes::PUBLIC).unwrap();
    assert_eq!(none.lookup_modes(), AccessModes::NONE);
    let still_none = none.drop_lookup_mode(AccessModes::PUBLIC).unwrap();
    assert_eq!(still_none.lookup_modes(), AccessModes::NONE);
}

#[test]
fn dropping_single_modes_from_a_full_lookup() {
    let w = world();
    let full = Lookup::for_class(&w.main);
    let modes = |mode| full.drop_lookup_mode(mode).unwrap().lookup_modes();

    assert_eq!(
        modes(AccessModes::PRIVATE),
        AccessModes::PUBLIC | AccessModes::MODULE | AccessModes::PACKAGE
    );
    assert_eq!(modes(AccessModes::MODULE), AccessModes::PUBLIC);
    assert_eq!(modes(AccessModes::PUBLIC), AccessModes::UNCONDITIONAL);
    assert_eq!(modes(AccessModes::ORIGINAL), AccessModes::FULL & !AccessModes::ORIGINAL);
    assert_eq!(
        modes(AccessModes::UNCONDITIONAL),
        AccessModes::FULL & !(AccessModes::UNCONDITIONAL | AccessModes::ORIGINAL)
    );
}

#[test]
fn public_lookup_keeps_unconditional_until_dropped() {
    let lookup = Lookup::public_lookup();
    let same = lookup.drop_lookup_mode(AccessModes::PRIVATE).unwrap();
    assert_eq!(same.lookup_modes(), AccessModes::UNCONDITIONAL);
    let gone = lookup.drop_lookup_mode(AccessModes::UNCONDITIONAL).unwrap();
    assert_eq!(gone.lookup_modes(), AccessModes::NONE);
}

#[test]
fn dropping_several_modes_at_once_is_rejected() {
    let w = world();
    let err = Lookup::for_class(&w.main)
        .drop_lookup_mode(AccessModes::PUBLIC | AccessModes::PRIVATE)
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));
}

#[test]
fn in_class_within_a_package_loses_private() {
    let w = world();
    let moved = Lookup::for_class(&w.main).in_class(&w.helper);
    assert_eq!(moved.lookup_class(), &w.helper);
    assert_eq!(
        moved.lookup_modes(),
        AccessModes::PUBLIC | AccessModes::MODULE | AccessModes::PACKAGE
    );
    assert!(moved.previous_lookup_class().is_none());
}

#[test]
fn in_class_to_the_same_class_changes_nothing() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    assert_eq!(lookup.in_class(&w.main).lookup_modes(), AccessModes::FULL);
}

#[test]
fn in_class_across_modules_records_the_origin() {
    let w = world();
    let moved = Lookup::for_class(&w.main).in_class(&w.api);
    assert_eq!(moved.lookup_modes(), AccessModes::PUBLIC);
    assert_eq!(moved.previous_lookup_class(), Some(&w.main));
    assert_eq!(moved.to_string(), "lib.Api/app.Main/public");

    let json = serde_json::to_string(&moved.describe()).unwrap();
    assert_eq!(
        json,
        r#"{"lookup_class":"lib.Api","previous_lookup_class":"app.Main","modes":["public"]}"#
    );

    let third = moved.in_class(&w.tool);
    assert_eq!(third.lookup_modes(), AccessModes::NONE);
}

#[test]
fn in_class_to_an_invisible_class_has_no_access() {
    let w = world();
    let moved = Lookup::for_class(&w.main).in_class(&w.secret);
    assert_eq!(moved.lookup_modes(), AccessModes::NONE);
    assert_eq!(moved.to_string(), "lib.hidden.Secret/app.Main/none");
}

#[test]
fn public_lookup_moves_stay_public_only() {
    let w = world();
    let moved = Lookup::public_lookup().in_class(&w.api);
    assert_eq!(moved.lookup_modes(), AccessModes::UNCONDITIONAL);
    assert!(moved.previous_lookup_class().is_none());
}

#[test]
fn private_lookup_in_another_module() {
    let w = world();
    let caller = Lookup::for_class(&w.main);
    let private = Lookup::private_lookup_in(&w.api, &caller).unwrap();
    assert_eq!(
        private.lookup_modes(),
        AccessModes::PUBLIC | AccessModes::PACKAGE | AccessModes::PRIVATE
    );
    assert_eq!(private.previous_lookup_class(), Some(&w.main));
    assert!(!private.lookup_modes().contains(AccessModes::ORIGINAL));
}

#[test]
fn private_lookup_in_the_same_module_keeps_module_access() {
    let w = world();
    let caller = Lookup::for_class(&w.main);
    let private = Lookup::private_lookup_in(&w.helper, &caller).unwrap();
    assert!(private.has_full_privilege_access());
    assert!(private.previous_lookup_class().is_none());
}

#[test]
fn private_lookup_in_requires_capability() {
    let w = world();
    let caller = Lookup::for_class(&w.main);

    let err = Lookup::private_lookup_in(&w.secret, &caller).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));

    let err = Lookup::private_lookup_in(&w.tool, &caller).unwrap_err();
    assert!(err.message().contains("does not read"));

    let weak = caller.drop_lookup_mode(AccessModes::PRIVATE).unwrap();
    let err = Lookup::private_lookup_in(&w.api, &weak).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));

    let apis = Class::array_of(&Kind::class(&w.api)).unwrap();
    let err = Lookup::private_lookup_in(&apis, &caller).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));
}

#[test]
fn find_class_checks_visibility() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    assert_eq!(lookup.find_class("lib.Api").unwrap(), w.api);
    assert_eq!(lookup.find_class("app.Helper").unwrap(), w.helper);

    let err = lookup.find_class("lib.hidden.Secret").unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));

    let err = lookup.find_class("app.Missing").unwrap_err();
    assert!(err.is_linkage());

    let outsider = Lookup::for_class(&w.tool);
    assert!(outsider.access_class(&w.helper).is_err());
}

#[test]
fn define_class_in_the_lookup_package() {
    let w = world();
    let lookup = Lookup::for_class(&w.main);
    let generated = lookup
        .define_class(ClassDefinition::new("app.Generated").public())
        .unwrap();
    assert_eq!(generated.module(), w.main.module());
    assert_eq!(w.domain.find_class("app.Generated"), Some(generated));

    let err = lookup
        .define_class(ClassDefinition::new("lib.Intruder"))
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));

    let err = lookup
        .define_class(ClassDefinition::new("app.Orphan").extends("app.Nowhere"))
        .unwrap_err();
    assert!(err.is_linkage());

    let weak = lookup.drop_lookup_mode(AccessModes::PACKAGE).unwrap();
    let err = weak
        .define_class(ClassDefinition::new("app.Denied"))
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

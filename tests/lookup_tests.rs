use std::sync::Arc;

use linkage::combinators::filter_return_value;
use linkage::lookup::{ReflectedField, ReflectedMethod};
use linkage::host::{
    ClassDefinition, ClassDomain, ClassRef, FieldSpec, Kind, MethodSpec, ModuleDefinition, Value,
    builtins,
};
use linkage::{AccessModes, InvokeError, Lookup, MethodHandle, Signature, method_type};

struct Bank {
    _domain: Arc<ClassDomain>,
    account: ClassRef,
    ledger: ClassRef,
    main: ClassRef,
    util: ClassRef,
    app: Lookup,
    owner: Lookup,
}

fn mt(ret: Kind, params: &[Kind]) -> Signature {
    method_type(ret, params).unwrap()
}

fn balance_of(this: &Value) -> i64 {
    this.as_object()
        .and_then(|object| object.field(0).ok())
        .and_then(|value| value.as_long())
        .unwrap_or(0)
}

fn bank() -> Bank {
    let domain = ClassDomain::new("bank");
    domain
        .define_module(
            ModuleDefinition::new("m.lib")
                .package("lib")
                .package("lib.internal")
                .exports("lib"),
        )
        .unwrap();
    domain
        .define_module(ModuleDefinition::new("m.app").package("app").reads("m.lib"))
        .unwrap();
    let owner = Lookup::define_in(
        &domain,
        ClassDefinition::new("lib.Account")
            .public()
            .field(FieldSpec::new("balance", Kind::LONG).private())
            .field(FieldSpec::new("owner", Kind::string()).public())
            .constructor(
                MethodSpec::constructor(mt(Kind::Void, &[Kind::string()]), |args| {
                    if let Some(this) = args[0].as_object() {
                        this.set_field(1, args[1].clone())?;
                    }
                    Ok(Value::Void)
                })
                .public(),
            )
            .method(
                MethodSpec::new("deposit", mt(Kind::LONG, &[Kind::LONG]), |args| {
                    let total = balance_of(&args[0]) + args[1].as_long().unwrap_or(0);
                    if let Some(this) = args[0].as_object() {
                        this.set_field(0, Value::Long(total))?;
                    }
                    Ok(Value::Long(total))
                })
                .public(),
            )
            .method(
                MethodSpec::new("balance", mt(Kind::LONG, &[]), |args| {
                    Ok(Value::Long(balance_of(&args[0])))
                })
                .public(),
            )
            .method(MethodSpec::new("audit", mt(Kind::string(), &[]), |_| {
                Ok(Value::string("clean"))
            })),
    )
    .unwrap();
    let account = owner.lookup_class().clone();
    let ledger = domain
        .define_class(
            ClassDefinition::new("lib.internal.Ledger").public().method(
                MethodSpec::new("count", mt(Kind::INT, &[]), |_| Ok(Value::Int(3)))
                    .public()
                    .as_static(),
            ),
        )
        .unwrap();
    let app = Lookup::define_in(&domain, ClassDefinition::new("app.Main").public()).unwrap();
    let main = app.lookup_class().clone();
    let util = domain
        .define_class(
            ClassDefinition::new("tools.Util").public().method(
                MethodSpec::new("ping", mt(Kind::string(), &[]), |_| Ok(Value::string("pong")))
                    .public()
                    .as_static(),
            ),
        )
        .unwrap();
    Bank {
        _domain: domain,
        account,
        ledger,
        main,
        util,
        app,
        owner,
    }
}

fn open(bank: &Bank, owner: &str) -> Value {
    bank.app
        .find_constructor(&bank.account, &mt(Kind::Void, &[Kind::string()]))
        .unwrap()
        .invoke_exact(vec![Value::string(owner)])
        .unwrap()
}

#[test]
fn handles_from_another_module_work_end_to_end() {
    let bank = bank();
    let lookup = bank.app.clone();
    let account_kind = Kind::class(&bank.account);
    let deposit = lookup
        .find_virtual(&bank.account, "deposit", &mt(Kind::LONG, &[Kind::LONG]))
        .unwrap();
    assert_eq!(
        deposit.signature(),
        &mt(Kind::LONG, &[account_kind.clone(), Kind::LONG])
    );
    let account = open(&bank, "ada");
    deposit
        .invoke_exact(vec![account.clone(), Value::Long(40)])
        .unwrap();
    let total = deposit
        .invoke_exact(vec![account.clone(), Value::Long(2)])
        .unwrap();
    assert_eq!(total, Value::Long(42));

    let owner = lookup
        .find_getter(&bank.account, "owner", &Kind::string())
        .unwrap();
    assert_eq!(owner.invoke_exact(vec![account.clone()]).unwrap().as_str(), Some("ada"));

    let bound = lookup
        .bind(account.clone(), "balance", &mt(Kind::LONG, &[]))
        .unwrap();
    assert_eq!(bound.signature().to_string(), "()long");
    assert_eq!(bound.invoke_exact(vec![]).unwrap(), Value::Long(42));
}

#[test]
fn unexported_packages_stay_closed_to_other_modules() {
    let bank = bank();
    let lookup = bank.app.clone();
    let err = lookup
        .find_static(&bank.ledger, "count", &mt(Kind::INT, &[]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    assert!(err.message().contains("is not accessible"));

    let err = lookup
        .find_virtual(&bank.account, "audit", &mt(Kind::string(), &[]))
        .unwrap_err();
    assert!(err.message().starts_with("member is package-private"));
    let err = lookup
        .find_getter(&bank.account, "balance", &Kind::LONG)
        .unwrap_err();
    assert!(err.message().starts_with("member is private"));
}

#[test]
fn dropping_modes_shrinks_access_step_by_step() {
    let bank = bank();
    let full = bank.owner.clone();
    assert!(full.find_getter(&bank.account, "balance", &Kind::LONG).is_ok());

    let no_private = full.drop_lookup_mode(AccessModes::PRIVATE).unwrap();
    assert_eq!(
        no_private.lookup_modes(),
        AccessModes::PUBLIC | AccessModes::MODULE | AccessModes::PACKAGE
    );
    assert!(no_private.find_getter(&bank.account, "balance", &Kind::LONG).is_err());
    assert!(
        no_private
            .find_virtual(&bank.account, "audit", &mt(Kind::string(), &[]))
            .is_ok()
    );

    let no_package = no_private.drop_lookup_mode(AccessModes::PACKAGE).unwrap();
    assert!(
        no_package
            .find_virtual(&bank.account, "audit", &mt(Kind::string(), &[]))
            .is_err()
    );
    assert!(
        no_package
            .find_static(&bank.ledger, "count", &mt(Kind::INT, &[]))
            .is_ok()
    );

    let public = no_package.drop_lookup_mode(AccessModes::MODULE).unwrap();
    assert_eq!(public.lookup_modes(), AccessModes::PUBLIC);
    assert!(
        public
            .find_virtual(&bank.account, "deposit", &mt(Kind::LONG, &[Kind::LONG]))
            .is_ok()
    );

    let none = public.drop_lookup_mode(AccessModes::PUBLIC).unwrap();
    assert!(none.lookup_modes().is_empty());
    assert!(matches!(
        none.access_class(&bank.account),
        Err(InvokeError::IllegalAccess(_))
    ));
    assert_eq!(none.to_string(), "lib.Account/none");
}

#[test]
fn teleporting_across_modules_keeps_public_access_only() {
    let bank = bank();
    let moved = bank.app.in_class(&bank.account);
    assert_eq!(moved.to_string(), "lib.Account/app.Main/public");
    assert_eq!(moved.previous_lookup_class(), Some(&bank.main));
    assert!(
        moved
            .find_virtual(&bank.account, "deposit", &mt(Kind::LONG, &[Kind::LONG]))
            .is_ok()
    );
    assert!(moved.find_getter(&bank.account, "balance", &Kind::LONG).is_err());
    assert!(moved.access_class(&bank.ledger).is_err());
}

#[test]
fn private_lookup_in_opens_the_target_class() {
    let bank = bank();
    let caller = bank.app.clone();
    let private = Lookup::private_lookup_in(&bank.account, &caller).unwrap();
    assert_eq!(private.lookup_class(), &bank.account);
    assert_eq!(private.previous_lookup_class(), Some(&bank.main));
    assert!(!private.lookup_modes().contains(AccessModes::MODULE));

    let account = open(&bank, "grace");
    let deposit = private
        .find_virtual(&bank.account, "deposit", &mt(Kind::LONG, &[Kind::LONG]))
        .unwrap();
    deposit.invoke_exact(vec![account.clone(), Value::Long(9)]).unwrap();
    let balance = private
        .find_getter(&bank.account, "balance", &Kind::LONG)
        .unwrap();
    assert_eq!(balance.invoke_exact(vec![account]).unwrap(), Value::Long(9));

    let weakened = caller.drop_lookup_mode(AccessModes::MODULE).unwrap();
    let err = Lookup::private_lookup_in(&bank.account, &weakened).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    let err = Lookup::private_lookup_in(&bank.ledger, &caller).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

#[test]
fn public_lookup_sees_only_unconditional_exports() {
    let bank = bank();
    let public = Lookup::public_lookup();
    assert!(public.access_class(&bank.account).is_ok());
    assert!(public.access_class(&bank.util).is_ok());
    assert!(public.access_class(&bank.ledger).is_err());
    assert!(public.access_class(&bank.main).is_err());

    let ping = public
        .find_static(&bank.util, "ping", &mt(Kind::string(), &[]))
        .unwrap();
    assert_eq!(ping.invoke_exact(vec![]).unwrap().as_str(), Some("pong"));
}

#[test]
fn revealed_handles_name_their_member() {
    let bank = bank();
    let lookup = bank.app.clone();
    let deposit = lookup
        .find_virtual(&bank.account, "deposit", &mt(Kind::LONG, &[Kind::LONG]))
        .unwrap();
    let member = lookup.reveal_direct(&deposit).unwrap();
    assert_eq!(member.name(), "deposit");
    assert_eq!(member.declaring_class(), &bank.account);

    let adapted = filter_return_value(&deposit, &describe_long()).unwrap();
    let err = lookup.reveal_direct(&adapted).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalArgument(_)));
}

fn describe_long() -> MethodHandle {
    MethodHandle::from_fn("describe", mt(Kind::string(), &[Kind::LONG]), |args| {
        Ok(Value::string(&format!("{} credits", args[0])))
    })
}

struct Vault {
    _domain: Arc<ClassDomain>,
    vault: ClassRef,
    keeper: Lookup,
    app: Lookup,
}

fn vault() -> Vault {
    let domain = ClassDomain::new("vault");
    domain
        .define_module(ModuleDefinition::new("m.secret").package("secret"))
        .unwrap();
    domain
        .define_module(ModuleDefinition::new("m.app").package("app").reads("m.secret"))
        .unwrap();
    let keeper = Lookup::define_in(
        &domain,
        ClassDefinition::new("secret.Vault")
            .public()
            .field(
                FieldSpec::new("code", Kind::INT)
                    .private()
                    .as_static()
                    .initial(Value::Int(42)),
            )
            .method(
                MethodSpec::new("open", mt(Kind::INT, &[]), |_| Ok(Value::Int(42)))
                    .private()
                    .as_static(),
            ),
    )
    .unwrap();
    let app = Lookup::define_in(&domain, ClassDefinition::new("app.Thief").public()).unwrap();
    Vault {
        _domain: domain,
        vault: keeper.lookup_class().clone(),
        keeper,
        app,
    }
}

#[test]
fn full_lookups_belong_to_the_definer() {
    let v = vault();
    assert!(v.keeper.has_full_privilege_access());
    assert!(v.keeper.lookup_modes().contains(AccessModes::ORIGINAL));
    let open = v
        .keeper
        .find_static(&v.vault, "open", &mt(Kind::INT, &[]))
        .unwrap();
    assert_eq!(open.invoke_exact(vec![]).unwrap(), Value::Int(42));

    for lookup in [v.app.clone(), Lookup::public_lookup()] {
        let err = lookup
            .find_static(&v.vault, "open", &mt(Kind::INT, &[]))
            .unwrap_err();
        assert!(matches!(err, InvokeError::IllegalAccess(_)));
    }
    let err = Lookup::private_lookup_in(&v.vault, &v.app).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

#[test]
fn the_boot_domain_mints_no_lookups() {
    let err = Lookup::define_in(&ClassDomain::boot(), ClassDefinition::new("core.Spy").public())
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    assert!(ClassDomain::boot().find_class("core.Spy").is_none());

    let reflection = &builtins::core().reflection;
    let err = Lookup::public_lookup()
        .find_static(reflection, "callerName", &mt(Kind::string(), &[]))
        .unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
}

#[test]
fn reflection_cannot_open_a_closed_package() {
    let v = vault();
    let open = ReflectedMethod::of(&v.vault, "open", &mt(Kind::INT, &[])).unwrap();
    for lookup in [v.app.clone(), Lookup::public_lookup()] {
        let err = lookup.unreflect(&open).unwrap_err();
        assert!(matches!(err, InvokeError::IllegalAccess(_)));
    }
    assert!(v.keeper.unreflect(&open).is_ok());

    let mut code = ReflectedField::of(&v.vault, "code").unwrap();
    let err = code.set_accessible(true, &v.app).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    assert!(code.set_accessible(true, &Lookup::public_lookup()).is_err());

    code.set_accessible(true, &v.keeper).unwrap();
    let err = Lookup::public_lookup().unreflect_getter(&code).unwrap_err();
    assert!(matches!(err, InvokeError::IllegalAccess(_)));
    let read = v.keeper.unreflect_getter(&code).unwrap();
    assert_eq!(read.invoke_exact(vec![]).unwrap(), Value::Int(42));
}

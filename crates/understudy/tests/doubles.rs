//! Double construction and call forwarding.
//!
//! Declares a small set of production types, builds doubles of them through
//! the session API and checks what calls through the doubles do.

use understudy::{
    CallFrame, ConfigOption, DoubleError, DoubleInstance, DoubleKind, DoubleSession, MethodDef,
    Parameter, TypeDef, TypeHint, Value,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn session() -> DoubleSession {
    let s = DoubleSession::new();
    let declare = |def: TypeDef| {
        let name = def.name.clone();
        s.declare(def).unwrap_or_else(|e| panic!("declare `{name}` failed: {e}"));
    };

    declare(TypeDef::interface("Renderer")
        .method(MethodDef::public("render").param(Parameter::new("text").typed(TypeHint::String)))
        .method(MethodDef::public("flush")));

    declare(TypeDef::class("Greeter")
        .property("greeting", "hello")
        .method(MethodDef::public("foo").returning("foo"))
        .method(MethodDef::public("double")
            .param(Parameter::new("n").typed(TypeHint::Int))
            .body(|f| Ok(Value::Int(f.arg(0).as_int().unwrap_or(0) * 2))))
        .method(MethodDef::public("greet")
            .param(Parameter::new("name").typed(TypeHint::String).with_default("world"))
            .body(|f| {
                let greeting = f.this()?.get("greeting").unwrap_or(Value::Null);
                let name = f.arg(0);
                Ok(Value::from(format!(
                    "{} {}",
                    greeting.as_str().unwrap_or_default(),
                    name.as_str().unwrap_or_default()
                )))
            }))
        .method(MethodDef::public("bump")
            .param(Parameter::new("n").typed(TypeHint::Int).by_ref())
            .body(|f| {
                let n = f.arg(0).as_int().unwrap_or(0);
                f.set_arg(0, n + 1);
                Ok(Value::Null)
            }))
        .method(MethodDef::public("sum")
            .param(Parameter::new("nums").typed(TypeHint::Int).variadic())
            .body(|f| Ok(Value::Int(f.args().iter().filter_map(Value::as_int).sum()))))
        .method(MethodDef::public("twice").body(|f| {
            f.call_self("foo", vec![])?;
            f.call_self("foo", vec![])
        }))
        .method(MethodDef::protected("secret").returning("secret"))
        .method(MethodDef::public("reveal").body(|f| f.call_self("secret", vec![])))
        .method(MethodDef::public("make").static_().returning("made")));

    declare(TypeDef::class("Engine")
        .property("fuel", 0)
        .method(MethodDef::public("__construct")
            .param(Parameter::new("fuel").typed(TypeHint::Int))
            .body(|f| {
                let fuel = f.arg(0);
                f.this()?.set("fuel", fuel);
                Ok(Value::Null)
            }))
        .method(MethodDef::public("fuel").body(|f| Ok(f.this()?.get("fuel").unwrap_or(Value::Null)))));

    declare(TypeDef::class("Vault").final_()
        .method(MethodDef::public("open").returning("opened"))
        .method(MethodDef::public("code").final_().returning(1234)));

    declare(TypeDef::mixin("Counter")
        .property("count", 0)
        .method(MethodDef::public("increment").body(|f| {
            let this = f.this()?;
            let n = this.get("count").and_then(|v| v.as_int()).unwrap_or(0) + 1;
            this.set("count", n);
            Ok(Value::Int(n))
        }))
        .method(MethodDef::public("step").abstract_()));

    declare(TypeDef::class("Shape").abstract_()
        .method(MethodDef::public("area").returns(TypeHint::Float))
        .method(MethodDef::public("describe").body(|f| {
            let area = f.call_self("area", vec![])?;
            Ok(Value::from(format!("area {area}")))
        })));

    s
}

fn mock(s: &DoubleSession, original: &str) -> DoubleInstance {
    s.mock(original).get_instance().unwrap_or_else(|e| panic!("mock of `{original}` failed: {e}"))
}

fn call(instance: &DoubleInstance, method: &str, args: Vec<Value>) -> Value {
    instance.call(method, args).unwrap_or_else(|e| panic!("call to `{method}` failed: {e}"))
}

// ─── Mocks ───────────────────────────────────────────────────────────────────

#[test]
fn mock_behaves_like_original() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    assert_eq!(call(&greeter, "foo", vec![]), Value::from("foo"));
    assert_eq!(call(&greeter, "double", vec![Value::from(21)]), Value::from(42));
    assert_eq!(call(&greeter, "greet", vec![Value::from("Ada")]), Value::from("hello Ada"));
    assert!(s.types().instance_of(&greeter.as_value(), "Greeter"));
    assert!(s.teardown().is_ok());
}

#[test]
fn mock_fills_defaults() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    assert_eq!(call(&greeter, "greet", vec![]), Value::from("hello world"));
    // only passed arguments are recorded
    let log = greeter.double_type().calls("greet");
    assert_eq!(log.args_of(1), Some(&[][..]));
}

#[test]
fn mock_forwards_variadics() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    let args = vec![Value::from(1), Value::from(2), Value::from(3)];
    assert_eq!(call(&greeter, "sum", args.clone()), Value::from(6));
    assert_eq!(greeter.double_type().calls("sum").args_of(1), Some(&args[..]));
}

#[test]
fn mock_writes_back_by_reference() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    let mut args = vec![Value::from(1)];
    greeter.call_with("bump", &mut args).unwrap();
    assert_eq!(args[0], Value::from(2));
}

#[test]
fn stub_writes_back_by_reference() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    greeter.method("bump").unwrap()
        .stub(understudy::stubs::return_callback(|args| {
            args[0] = Value::from(100);
            Ok(Value::from(true))
        }))
        .unwrap();
    let mut args = vec![Value::from(1)];
    assert_eq!(greeter.call_with("bump", &mut args).unwrap(), Value::from(true));
    assert_eq!(args[0], Value::from(100));
}

#[test]
fn self_calls_go_through_the_double() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    greeter.method("foo").unwrap().stub("stubbed").unwrap();
    assert_eq!(call(&greeter, "twice", vec![]), Value::from("stubbed"));
    assert_eq!(greeter.double_type().call_count("foo"), 2);
    assert_eq!(greeter.double_type().call_count("twice"), 1);
}

#[test]
fn static_methods_are_forwarded() {
    let s = session();
    let double = s.mock("Greeter").get_type().unwrap();
    assert_eq!(double.call_static("make", vec![]).unwrap(), Value::from("made"));
    double.method("make").unwrap().stub("faked").unwrap();
    assert_eq!(double.call_static("make", vec![]).unwrap(), Value::from("faked"));
    assert_eq!(double.call_count("make"), 2);
}

// ─── Dummies ─────────────────────────────────────────────────────────────────

#[test]
fn dummy_returns_null() {
    let s = session();
    let greeter = s.dummy("Greeter").get_instance().unwrap();
    assert_eq!(call(&greeter, "foo", vec![]), Value::Null);
    assert_eq!(call(&greeter, "double", vec![Value::from(2)]), Value::Null);
    greeter.method("foo").unwrap().mock().unwrap();
    assert_eq!(call(&greeter, "foo", vec![]), Value::from("foo"));
}

#[test]
fn interface_double_generates_dummies() {
    let s = session();
    let renderer = s.mock("Renderer").get_instance().unwrap();
    assert_eq!(call(&renderer, "render", vec![Value::from("x")]), Value::Null);
    assert_eq!(call(&renderer, "flush", vec![]), Value::Null);
    assert!(s.types().instance_of(&renderer.as_value(), "Renderer"));
    assert!(renderer.double_type().definition().base.is_none());
}

// ─── Signatures ──────────────────────────────────────────────────────────────

#[test]
fn parameter_types_are_enforced_before_dispatch() {
    let s = session();
    let renderer = s.dummy("Renderer").get_instance().unwrap();
    let err = renderer.call("render", vec![Value::from(1)]).unwrap_err();
    assert!(matches!(err, DoubleError::Type(_)));
    assert_eq!(renderer.double_type().call_count("render"), 0);
}

#[test]
fn too_few_arguments() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    let err = greeter.call("double", vec![]).unwrap_err();
    assert!(matches!(err, DoubleError::Type(_)));
}

// ─── Constructors ────────────────────────────────────────────────────────────

#[test]
fn get_instance_skips_constructor() {
    let s = session();
    let engine = mock(&s, "Engine");
    assert_eq!(call(&engine, "fuel", vec![]), Value::from(0));
    assert_eq!(s.instance_count(), 1);
}

#[test]
fn get_instance_with_runs_constructor() {
    let s = session();
    let engine = s.mock("Engine").get_instance_with(vec![Value::from(5)]).unwrap();
    assert_eq!(call(&engine, "fuel", vec![]), Value::from(5));
    assert_eq!(engine.double_type().calls("__construct").args_of(1), Some(&[Value::from(5)][..]));
}

// ─── Final, abstract and mixin originals ─────────────────────────────────────

#[test]
fn final_class_double_stands_in_for_original() {
    let s = session();
    let vault = mock(&s, "Vault");
    assert!(s.types().instance_of(&vault.as_value(), "Vault"));
    assert_eq!(call(&vault, "code", vec![]), Value::from(1234));
    vault.method("code").unwrap().stub(1).unwrap();
    assert_eq!(call(&vault, "code", vec![]), Value::from(1));
}

#[test]
fn final_class_rejected_when_disabled() {
    let s = session();
    s.configure(ConfigOption::AllowFinalDoubles, false);
    let err = s.mock("Vault").get_type().unwrap_err();
    assert!(matches!(err, DoubleError::Config(_)));

    let ok = s.mock("Vault").set_config(ConfigOption::AllowFinalDoubles, true).get_type();
    assert!(ok.is_ok());
}

#[test]
fn abstract_methods_default_to_dummy() {
    let s = session();
    let shape = mock(&s, "Shape");
    assert_eq!(call(&shape, "describe", vec![]), Value::from("area null"));
    shape.method("area").unwrap().stub(2.5).unwrap();
    assert_eq!(call(&shape, "describe", vec![]), Value::from("area 2.5"));
}

#[test]
fn mixin_double() {
    let s = session();
    let counter = mock(&s, "Counter");
    assert!(s.types().instance_of(&counter.as_value(), "Counter"));
    assert_eq!(call(&counter, "increment", vec![]), Value::from(1));
    assert_eq!(call(&counter, "increment", vec![]), Value::from(2));
    assert_eq!(call(&counter, "step", vec![]), Value::Null);
}

#[test]
fn added_mixin_and_interface() {
    let s = session();
    let engine = s.dummy("Engine")
        .add_interface("Renderer")
        .add_mixin("Counter")
        .get_instance()
        .unwrap();
    assert!(s.types().instance_of(&engine.as_value(), "Renderer"));
    assert!(s.types().instance_of(&engine.as_value(), "Counter"));
    // concrete mixin methods are applied as-is
    assert_eq!(call(&engine, "increment", vec![]), Value::from(1));
    assert!(engine.method("step").is_ok());
    assert!(engine.method("render").is_ok());
}

// ─── Parity with the original ────────────────────────────────────────────────

/// `foo` body that prefixes whatever the parent's `foo` returns.
fn prefixed(prefix: &'static str) -> impl Fn(&mut CallFrame<'_>) -> understudy::Result<Value> {
    move |f| {
        let up = f.call_parent("foo", vec![])?;
        Ok(Value::from(format!("{prefix}+{}", up.as_str().unwrap_or_default())))
    }
}

/// `same($other)` body: equal when both carry the same amount.
fn same_amount(f: &mut CallFrame<'_>) -> understudy::Result<Value> {
    let mine = f.this()?.get("amount");
    let theirs = f.arg(0).as_object().and_then(|o| o.get("amount"));
    Ok(Value::Bool(mine == theirs))
}

fn declare_parity_types(s: &DoubleSession) {
    for def in [
        TypeDef::class("Top").method(MethodDef::public("foo").returning("top")),
        TypeDef::class("Base").extends("Top")
            .method(MethodDef::public("foo").body(prefixed("base")))
            .method(MethodDef::public("locked").final_().returning("locked")),
        TypeDef::class("Child").extends("Base").method(MethodDef::public("foo").body(prefixed("child"))),
        TypeDef::class("Kid").extends("Child").method(MethodDef::public("foo").body(prefixed("kid"))),
        TypeDef::class("Money")
            .property("amount", 5)
            .method(MethodDef::public("same")
                .param(Parameter::new("other").typed(TypeHint::SelfType))
                .body(same_amount))
            .method(MethodDef::public("add")
                .param(Parameter::new("other").typed(TypeHint::named("Money")))
                .returning("added")),
        TypeDef::class("Coin")
            .property("amount", 1)
            .method(MethodDef::public("same")
                .param(Parameter::new("other").typed(TypeHint::SelfType))
                .body(same_amount))
            .method(MethodDef::public("mint").final_().returning("minted")),
    ] {
        s.declare(def).unwrap();
    }
}

/// Same call on a real instance and on a fresh mock; both results.
fn on_both(s: &DoubleSession, original: &str, method: &str, args: Vec<Value>) -> (understudy::Result<Value>, understudy::Result<Value>) {
    let real = s.types().instantiate(original, vec![]).unwrap();
    let expected = s.types().call(&real, method, args.clone());
    let actual = mock(s, original).call(method, args);
    (expected, actual)
}

#[test]
fn mock_accepts_self_typed_arguments() {
    let s = DoubleSession::new();
    declare_parity_types(&s);
    let real = s.types().instantiate("Money", vec![]).unwrap();

    let (expected, actual) = on_both(&s, "Money", "same", vec![real.clone()]);
    assert_eq!(expected.unwrap(), Value::Bool(true));
    assert_eq!(actual.unwrap(), Value::Bool(true));

    // another double of the original is accepted as well
    let other = mock(&s, "Money");
    assert_eq!(call(&mock(&s, "Money"), "same", vec![other.as_value()]), Value::Bool(true));

    let (expected, actual) = on_both(&s, "Money", "same", vec![Value::from(5)]);
    assert!(matches!(expected, Err(DoubleError::Type(_))));
    assert!(matches!(actual, Err(DoubleError::Type(_))));
}

#[test]
fn mock_accepts_named_type_arguments() {
    let s = DoubleSession::new();
    declare_parity_types(&s);
    let real = s.types().instantiate("Money", vec![]).unwrap();
    let (expected, actual) = on_both(&s, "Money", "add", vec![real]);
    assert_eq!(expected.unwrap(), Value::from("added"));
    assert_eq!(actual.unwrap(), Value::from("added"));
}

#[test]
fn stripped_clone_accepts_self_typed_arguments() {
    let s = DoubleSession::new();
    declare_parity_types(&s);
    let real = s.types().instantiate("Coin", vec![]).unwrap();
    let (expected, actual) = on_both(&s, "Coin", "same", vec![real]);
    assert_eq!(expected.unwrap(), Value::Bool(true));
    assert_eq!(actual.unwrap(), Value::Bool(true));
    assert_eq!(call(&mock(&s, "Coin"), "mint", vec![]), Value::from("minted"));
}

#[test]
fn call_parent_walks_cloned_layers() {
    let s = DoubleSession::new();
    declare_parity_types(&s);
    let (expected, actual) = on_both(&s, "Child", "foo", vec![]);
    assert_eq!(expected.unwrap(), Value::from("child+base+top"));
    assert_eq!(actual.unwrap(), Value::from("child+base+top"));
}

#[test]
fn call_parent_below_the_final_layer() {
    let s = DoubleSession::new();
    declare_parity_types(&s);
    let (expected, actual) = on_both(&s, "Kid", "foo", vec![]);
    assert_eq!(expected.unwrap(), Value::from("kid+child+base+top"));
    assert_eq!(actual.unwrap(), Value::from("kid+child+base+top"));

    let kid = mock(&s, "Kid");
    assert_eq!(call(&kid, "locked", vec![]), Value::from("locked"));
    for layer in ["Kid", "Child", "Base", "Top"] {
        assert!(s.types().instance_of(&kid.as_value(), layer), "{layer}");
    }
}

// ─── Visibility ──────────────────────────────────────────────────────────────

#[test]
fn protected_methods_are_not_configurable() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    assert!(matches!(greeter.method("secret").unwrap_err(), DoubleError::NotAllowed(_)));
    assert!(matches!(greeter.call("secret", vec![]).unwrap_err(), DoubleError::NotAllowed(_)));
    assert_eq!(call(&greeter, "reveal", vec![]), Value::from("secret"));
}

#[test]
fn protected_methods_configurable_when_allowed() {
    let s = session();
    let greeter = s.mock("Greeter")
        .set_config(ConfigOption::AllowProtectedMethods, true)
        .get_instance()
        .unwrap();
    greeter.method("secret").unwrap().stub("exposed").unwrap();
    assert_eq!(call(&greeter, "reveal", vec![]), Value::from("exposed"));
}

#[test]
fn unknown_method_is_lookup_error() {
    let s = session();
    let greeter = mock(&s, "Greeter");
    assert!(matches!(greeter.method("nope").unwrap_err(), DoubleError::Lookup(_)));
}

// ─── Names and aliases ───────────────────────────────────────────────────────

#[test]
fn named_double_conflicts_even_after_teardown() {
    let s = session();
    let first = s.mock("Greeter").set_name("Fake\\Greeter").get_type().unwrap();
    assert_eq!(first.name(), "Fake\\Greeter");
    assert!(s.double("\\Fake\\Greeter").is_some());

    let again = s.mock("Greeter").set_name("Fake\\Greeter").get_type().unwrap_err();
    assert!(matches!(again, DoubleError::Conflict(_)));

    s.teardown().unwrap();
    assert!(s.doubles().is_empty());
    let after = s.mock("Greeter").set_name("Fake\\Greeter").get_type().unwrap_err();
    assert!(matches!(after, DoubleError::Conflict(_)));
}

#[test]
fn generated_names_are_unique() {
    let s = session();
    let a = s.mock("Greeter").get_type().unwrap();
    let b = s.mock("Greeter").get_type().unwrap();
    assert_ne!(a.name(), b.name());
    assert_eq!(s.doubles().len(), 2);
}

#[test]
fn alias_of_missing_type() {
    let s = session();
    let mailer = s.alias("Legacy\\Mailer")
        .add_interface("Renderer")
        .add_method("send")
        .add_method("static:instance")
        .get_instance()
        .unwrap();
    assert_eq!(mailer.double_type().name(), "Legacy\\Mailer");
    assert!(s.types().instance_of(&mailer.as_value(), "Legacy\\Mailer"));
    assert_eq!(call(&mailer, "send", vec![Value::from("hi")]), Value::Null);
    assert_eq!(mailer.double_type().call_static("instance", vec![]).unwrap(), Value::Null);
}

#[test]
fn alias_of_loaded_type() {
    let s = session();
    let err = s.alias("Greeter").get_type().unwrap_err();
    assert!(matches!(err, DoubleError::Conflict(_)));
}

#[test]
fn build_from_target_string() {
    let s = session();
    let double = s
        .build_from(DoubleKind::Dummy, "Fake\\Renderer:Renderer[static:create, reset]")
        .unwrap()
        .get_type()
        .unwrap();
    assert_eq!(double.name(), "Fake\\Renderer");
    assert_eq!(double.call_static("create", vec![]).unwrap(), Value::Null);
    assert!(double.method("reset").is_ok());
    assert!(double.method("render").is_ok());
}

#[test]
fn invalid_builder_option_surfaces_on_get_type() {
    let s = session();
    let err = s.mock("Greeter").add_method("static:").get_type().unwrap_err();
    assert!(matches!(err, DoubleError::InvalidArgument(_)));

    let err = s.mock("Greeter").set_config_key("allow_everything", true).get_type().unwrap_err();
    assert!(matches!(err, DoubleError::InvalidArgument(_)));
}

#[test]
fn added_method_clashing_with_original() {
    let s = session();
    let err = s.mock("Greeter").add_method("foo").get_type().unwrap_err();
    assert!(matches!(err, DoubleError::Conflict(_)));
}

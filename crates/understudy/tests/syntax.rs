//! Double target strings, end to end: parse → build → call.

use understudy::analysis::RawMethodSpec;
use understudy::syntax::{parse_method_spec, parse_target};
use understudy::{DoubleError, DoubleKind, DoubleSession, MethodDef, TypeDef, Value};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn method(name: &str, is_static: bool) -> RawMethodSpec {
    RawMethodSpec { name: name.into(), is_static }
}

fn session() -> DoubleSession {
    let s = DoubleSession::new();
    s.declare(TypeDef::class("App\\Clock").method(MethodDef::public("now").returning(100))).unwrap();
    s
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

#[test]
fn qualified_target_with_everything() {
    let target = parse_target("\\Test\\FakeClock : \\App\\Clock [ tick, static:create ]").unwrap();
    assert_eq!(target.name.as_deref(), Some("Test\\FakeClock"));
    assert_eq!(target.original, "App\\Clock");
    assert_eq!(target.methods, vec![method("tick", false), method("create", true)]);
}

#[test]
fn method_spec_forms() {
    assert_eq!(parse_method_spec("run").unwrap(), method("run", false));
    assert_eq!(parse_method_spec(" static : run ").unwrap(), method("run", true));
    assert!(matches!(parse_method_spec("a b").unwrap_err(), DoubleError::InvalidArgument(_)));
    assert!(matches!(parse_method_spec("").unwrap_err(), DoubleError::InvalidArgument(_)));
}

#[test]
fn error_reports_column() {
    let err = parse_target("App\\Clock[now;]").unwrap_err();
    assert!(err.to_string().contains("column 14"), "{err}");
}

// ─── Building ────────────────────────────────────────────────────────────────

#[test]
fn build_from_generated_name() {
    let s = session();
    let clock = s.build_from(DoubleKind::Mock, "\\App\\Clock[tick]").unwrap().get_instance().unwrap();
    assert!(clock.double_type().name().starts_with("Double_"));
    assert!(clock.double_type().name().ends_with("_App_Clock"));
    assert_eq!(clock.call("now", vec![]).unwrap(), Value::from(100));
    assert_eq!(clock.call("tick", vec![]).unwrap(), Value::Null);
}

#[test]
fn build_from_rejects_bad_target() {
    let s = session();
    assert!(s.build_from(DoubleKind::Mock, "App\\Clock[").is_err());
}

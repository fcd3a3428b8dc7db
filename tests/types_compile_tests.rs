// ABOUTME: Trybuild runner for compile-time type safety tests.
// ABOUTME: Verifies that invalid state transitions fail to compile.

#[test]
fn promote_not_available_on_planned() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/promote_on_planned.rs");
}

#[test]
fn rollback_not_available_on_promoted() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/rollback_on_promoted.rs");
}

#[test]
fn rollback_not_available_on_planned() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/rollback_on_planned.rs");
}

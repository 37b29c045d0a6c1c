//! End-to-end demonstration scenarios against [`State`].
//!
//! Each test drives a full select/apply/branch/ret session and then calls the synthesized
//! function on fresh inputs, checking the computed result rather than the inferred signature's
//! exact structure — a synthesized signature may legitimately come out more polymorphic than any
//! one example implies, so asserting behavior is the stable thing to pin down here.
//!
//! Unifier laws live in `unifier.rs`; façade rollback and mode transitions live in
//! `state_facade.rs`.

use examplar::{Primitive, State, Value};
use pretty_assertions::assert_eq;

// ============================================================================
// Higher-order: abstracting the applied operator itself
// ============================================================================

#[test]
fn selecting_an_operator_as_a_variable_abstracts_over_it() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(20)).unwrap();
    state.create_function().unwrap();

    state.select(&r0, true).unwrap();
    state.select("+", true).unwrap();
    let temp0 = state.apply("+", true).unwrap();

    state.select(&temp0, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    let f0 = function_name.unwrap();

    let a = state.create_register(Value::Int(20)).unwrap();
    state.select(&a, false).unwrap();
    state.select("+", false).unwrap();
    let out = state.apply(&f0, false).unwrap();
    assert_eq!(state.get_register(&out).unwrap(), Value::Int(40));

    let b = state.create_register(Value::Int(20)).unwrap();
    state.select(&b, false).unwrap();
    state.select("*", false).unwrap();
    let out = state.apply(&f0, false).unwrap();
    assert_eq!(state.get_register(&out).unwrap(), Value::Int(400));

    let c = state.create_register(Value::Bool(true)).unwrap();
    state.select(&c, false).unwrap();
    state.select("and", false).unwrap();
    let out = state.apply(&f0, false).unwrap();
    assert_eq!(state.get_register(&out).unwrap(), Value::Bool(true));
}

// ============================================================================
// Branch: two examples recorded across a single `ret`/`cont` pair
// ============================================================================

#[test]
fn branching_on_a_computed_condition_demonstrates_both_paths() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(4)).unwrap();
    state.create_function().unwrap();

    // Example 1: 4 is even -> [0, 0]
    state.select(&r0, true).unwrap();
    let two = state.create_register(Value::Int(2)).unwrap();
    state.select(&two, false).unwrap();
    let temp0 = state.apply("%", false).unwrap();
    let zero = state.create_register(Value::Int(0)).unwrap();
    state.select(&temp0, false).unwrap();
    state.select(&zero, false).unwrap();
    let temp1 = state.apply("==", false).unwrap();

    state.select(&temp1, true).unwrap();
    state.branch().unwrap();

    let even_list = state.create_list(vec![Primitive::Int(0), Primitive::Int(0)]).unwrap();
    state.select(&even_list, false).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(function_name.is_none());
    assert_eq!(remaining.len(), 1);
    assert_eq!(state.current_mode(), "BETWEEN");

    // Example 2: 3 is odd -> [1, 1]
    state.update_register(&r0, Value::Int(3)).unwrap();
    state.cont().unwrap();

    state.select(&r0, true).unwrap();
    state.select(&two, false).unwrap();
    let temp0b = state.apply("%", false).unwrap();
    assert_eq!(temp0b, temp0, "replaying a recorded instruction reuses its temp name");
    state.select(&temp0b, false).unwrap();
    state.select(&zero, false).unwrap();
    let temp1b = state.apply("==", false).unwrap();
    assert_eq!(temp1b, temp1);

    state.select(&temp1b, true).unwrap();
    state.branch().unwrap();

    let odd_list = state.create_list(vec![Primitive::Int(1), Primitive::Int(1)]).unwrap();
    state.select(&odd_list, false).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    let f0 = function_name.unwrap();
    assert_eq!(state.current_mode(), "INTERACTIVE");

    let input = state.create_register(Value::Int(7)).unwrap();
    state.select(&input, false).unwrap();
    let out = state.apply(&f0, false).unwrap();
    assert_eq!(state.get_list(&out).unwrap(), vec![Primitive::Int(1), Primitive::Int(1)]);

    let input = state.create_register(Value::Int(10)).unwrap();
    state.select(&input, false).unwrap();
    let out = state.apply(&f0, false).unwrap();
    assert_eq!(state.get_list(&out).unwrap(), vec![Primitive::Int(0), Primitive::Int(0)]);
}

// ============================================================================
// Map / filter over a built-in, applying a previously synthesized function
// ============================================================================

#[test]
fn map_and_filter_apply_a_function_elementwise() {
    let mut state = State::new();

    // f0 = \x. x + 1
    let r0 = state.create_register(Value::Int(0)).unwrap();
    state.create_function().unwrap();
    state.select(&r0, true).unwrap();
    let one = state.create_register(Value::Int(1)).unwrap();
    state.select(&one, false).unwrap();
    let temp0 = state.apply("+", false).unwrap();
    state.select(&temp0, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    let f0 = function_name.unwrap();

    let nums = state.create_list(vec![Primitive::Int(1), Primitive::Int(2), Primitive::Int(3)]).unwrap();
    state.select(&f0, false).unwrap();
    state.select(&nums, false).unwrap();
    let mapped = state.apply("map", false).unwrap();
    assert_eq!(
        state.get_list(&mapped).unwrap(),
        vec![Primitive::Int(2), Primitive::Int(3), Primitive::Int(4)]
    );

    let bools = state.create_list(vec![Primitive::Bool(true), Primitive::Bool(false), Primitive::Bool(true)]).unwrap();
    state.select("not", false).unwrap();
    state.select(&bools, false).unwrap();
    let filtered = state.apply("map", false).unwrap();
    assert_eq!(
        state.get_list(&filtered).unwrap(),
        vec![Primitive::Bool(false), Primitive::Bool(true), Primitive::Bool(false)]
    );

    state.select("not", false).unwrap();
    state.select(&bools, false).unwrap();
    let kept = state.apply("filter", false).unwrap();
    assert_eq!(state.get_list(&kept).unwrap(), vec![Primitive::Bool(false)]);
}

// ============================================================================
// Recursive map: a user-defined isEmpty helper, then a self-recursive map
// ============================================================================

#[test]
fn recursive_map_synthesizes_and_runs_over_a_helper_predicate() {
    let mut state = State::new();

    // isEmpty(xs) = len(xs) == 0
    let empty = state.create_list(Vec::new()).unwrap();
    state.create_function().unwrap();
    state.select(&empty, true).unwrap();
    let temp_len = state.apply("len", false).unwrap();
    let zero = state.create_register(Value::Int(0)).unwrap();
    state.select(&temp_len, false).unwrap();
    state.select(&zero, false).unwrap();
    let temp_eq = state.apply("==", false).unwrap();
    state.select(&temp_eq, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    let is_empty = function_name.unwrap();

    // map(xs, f): recursive, base case xs == [] -> [], else cons(f(head xs), map(tail xs, f))
    let xs = state.create_list(Vec::new()).unwrap();
    state.create_function().unwrap();

    // Example 1: xs = []
    state.select(&xs, true).unwrap();
    let temp_a = state.apply(&is_empty, false).unwrap();
    state.select(&temp_a, true).unwrap();
    state.branch().unwrap();

    let ret_empty = state.create_list(Vec::new()).unwrap();
    state.select(&ret_empty, false).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(function_name.is_none());
    assert_eq!(remaining.len(), 1);

    // Example 2: xs = [true]
    state.update_list(&xs, vec![Primitive::Bool(true)]).unwrap();
    state.cont().unwrap();

    state.select(&xs, true).unwrap();
    let temp_a2 = state.apply(&is_empty, false).unwrap();
    assert_eq!(temp_a2, temp_a);
    state.select(&temp_a2, true).unwrap();
    state.branch().unwrap();

    state.select(&xs, true).unwrap();
    let temp_head = state.apply("head", false).unwrap();

    state.select(&temp_head, true).unwrap();
    let temp_f = state.apply("not", true).unwrap();

    state.select(&xs, true).unwrap();
    let temp_tail = state.apply("tail", false).unwrap();

    state.select(&temp_tail, true).unwrap();
    state.select("not", true).unwrap();
    let temp_rec = state.recurse().unwrap();

    state.select(&temp_f, true).unwrap();
    state.select(&temp_rec, true).unwrap();
    let temp_cons = state.apply("cons", false).unwrap();

    state.select(&temp_cons, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    let map_fn = function_name.unwrap();

    let input = state.create_list(vec![Primitive::Bool(true), Primitive::Bool(false)]).unwrap();
    state.select(&input, false).unwrap();
    state.select("not", false).unwrap();
    let out = state.apply(&map_fn, false).unwrap();
    assert_eq!(state.get_list(&out).unwrap(), vec![Primitive::Bool(false), Primitive::Bool(true)]);

    let empty_call = state.create_list(Vec::new()).unwrap();
    state.select(&empty_call, false).unwrap();
    state.select("not", false).unwrap();
    let out = state.apply(&map_fn, false).unwrap();
    assert!(state.get_list(&out).unwrap().is_empty());
}

// ============================================================================
// Conditional map: selecting between two function-valued inputs on a flag
// ============================================================================

#[test]
fn conditional_function_selection_picks_between_two_function_inputs() {
    let mut state = State::new();

    // g0 = \x. x, a fully generic identity, used as the "do nothing" branch below.
    let seed = state.create_register(Value::Bool(true)).unwrap();
    state.create_function().unwrap();
    state.select(&seed, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    let identity = function_name.unwrap();

    let xs = state.create_list(vec![Primitive::Bool(true), Primitive::Bool(false), Primitive::Bool(true)]).unwrap();
    let flag = state.create_register(Value::Bool(true)).unwrap();
    state.create_function().unwrap();

    // Example 1: flag = true -> map(not, xs)
    state.select(&flag, true).unwrap();
    state.branch().unwrap();

    state.select("not", true).unwrap();
    state.select(&xs, true).unwrap();
    let temp0 = state.apply("map", false).unwrap();
    state.select(&temp0, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(function_name.is_none());
    assert_eq!(remaining.len(), 1);

    // Example 2: flag = false -> map(identity, xs)
    state.update_register(&flag, Value::Bool(false)).unwrap();
    state.cont().unwrap();

    state.select(&flag, true).unwrap();
    state.branch().unwrap();

    state.select(&identity, true).unwrap();
    state.select(&xs, true).unwrap();
    let temp0b = state.apply("map", false).unwrap();
    assert_eq!(temp0b, temp0);
    state.select(&temp0b, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    let conditional = function_name.unwrap();

    let call_xs = state.create_list(vec![Primitive::Bool(false), Primitive::Bool(true), Primitive::Bool(false)]).unwrap();

    let true_flag = state.create_register(Value::Bool(true)).unwrap();
    state.select(&true_flag, false).unwrap();
    state.select("not", false).unwrap();
    state.select(&call_xs, false).unwrap();
    state.select(&identity, false).unwrap();
    let out = state.apply(&conditional, false).unwrap();
    assert_eq!(
        state.get_list(&out).unwrap(),
        vec![Primitive::Bool(true), Primitive::Bool(false), Primitive::Bool(true)]
    );

    let false_flag = state.create_register(Value::Bool(false)).unwrap();
    state.select(&false_flag, false).unwrap();
    state.select("not", false).unwrap();
    state.select(&call_xs, false).unwrap();
    state.select(&identity, false).unwrap();
    let out = state.apply(&conditional, false).unwrap();
    assert_eq!(state.get_list(&out).unwrap(), vec![Primitive::Bool(false), Primitive::Bool(true), Primitive::Bool(false)]);
}

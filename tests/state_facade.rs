//! Black-box coverage of the `State` façade's transactional rollback and its three-mode
//! transition matrix (interactive / demonstration / between).

use examplar::{State, Value};
use pretty_assertions::assert_eq;

// ============================================================================
// Mode transitions
// ============================================================================

#[test]
fn a_fresh_state_starts_interactive() {
    let state = State::new();
    assert_eq!(state.current_mode(), "INTERACTIVE");
}

#[test]
fn create_function_moves_interactive_to_demonstration() {
    let mut state = State::new();
    assert_eq!(state.current_mode(), "INTERACTIVE");
    state.create_function().unwrap();
    assert_eq!(state.current_mode(), "DEMONSTRATION");
}

#[test]
fn create_function_is_rejected_while_already_demonstrating() {
    let mut state = State::new();
    state.create_function().unwrap();
    assert!(state.create_function().is_err());
    assert_eq!(state.current_mode(), "DEMONSTRATION");
}

#[test]
fn ret_with_remaining_examples_moves_demonstration_to_between_and_cont_resumes_it() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Bool(true)).unwrap();
    state.create_function().unwrap();

    state.select(&r0, true).unwrap();
    state.branch().unwrap();
    let ret_val = state.create_register(Value::Bool(true)).unwrap();
    state.select(&ret_val, false).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(function_name.is_none());
    assert!(!remaining.is_empty());
    assert_eq!(state.current_mode(), "BETWEEN");

    state.cont().unwrap();
    assert_eq!(state.current_mode(), "DEMONSTRATION");
}

#[test]
fn ret_completing_every_example_moves_between_back_to_interactive() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(1)).unwrap();
    state.create_function().unwrap();
    state.select(&r0, true).unwrap();
    let (remaining, function_name) = state.ret().unwrap();
    assert!(remaining.is_empty());
    assert!(function_name.is_some());
    assert_eq!(state.current_mode(), "INTERACTIVE");
}

#[test]
fn apply_and_recurse_and_branch_require_demonstration_mode() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(1)).unwrap();
    state.select(&r0, false).unwrap();
    assert!(state.recurse().is_err());
    assert!(state.branch().is_err());
    assert_eq!(state.current_mode(), "INTERACTIVE");
}

#[test]
fn cont_is_rejected_outside_between_mode() {
    let mut state = State::new();
    assert!(state.cont().is_err());
    state.create_function().unwrap();
    assert!(state.cont().is_err());
}

// ============================================================================
// Transactional rollback: a failed call must leave every piece of state untouched
// ============================================================================

#[test]
fn a_failed_apply_in_interactive_mode_does_not_store_a_partial_result() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(0)).unwrap();
    state.select(&r0, false).unwrap();
    let registers_before = state.get_register_names();

    assert!(state.apply("+", false).is_err()); // "+" needs two arguments

    assert_eq!(state.get_register_names(), registers_before);
    assert_eq!(state.current_mode(), "INTERACTIVE");
}

#[test]
fn a_failed_branch_does_not_clear_the_selection_or_change_mode() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(1)).unwrap();
    state.create_function().unwrap();
    state.select(&r0, true).unwrap();
    state.select(&r0, true).unwrap();

    assert!(state.branch().is_err()); // branch needs exactly one selected element

    assert_eq!(state.current_mode(), "DEMONSTRATION");
    assert_eq!(state.get_selected().len(), 2);
}

#[test]
fn a_failed_ret_leaves_the_demonstration_in_progress() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(1)).unwrap();
    state.create_function().unwrap();
    state.select(&r0, true).unwrap();
    state.select(&r0, true).unwrap();

    assert!(state.ret().is_err()); // ret also needs exactly one selected element

    assert_eq!(state.current_mode(), "DEMONSTRATION");
    assert_eq!(state.get_selected().len(), 2);
}

#[test]
fn deleting_an_input_in_use_during_demonstration_is_rejected_and_leaves_it_intact() {
    let mut state = State::new();
    let r0 = state.create_register(Value::Int(1)).unwrap();
    state.create_function().unwrap();
    state.select(&r0, true).unwrap();
    state.select(&r0, true).unwrap();
    state.apply("+", false).unwrap();

    assert!(state.delete_register(&r0).is_err());
    assert!(state.is_valid_register(&r0));
    assert_eq!(state.current_mode(), "DEMONSTRATION");
}

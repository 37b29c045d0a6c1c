//! The façade: the single entry point embedding applications drive. Wraps registers, lists,
//! functions, and the in-progress demonstration (if any) behind a three-mode state machine, and
//! gives every mutating call transactional snapshot/restore so a mid-call error never leaves the
//! engine in a partially-updated state.

use std::fmt;

use strum::IntoEnumIterator;

use crate::builtins::{BuiltinFunction, BuiltinOp};
use crate::config::EngineLimits;
use crate::demonstration::Demonstration;
use crate::error::Error;
use crate::function::Function;
use crate::functions::Functions;
use crate::lists::Lists;
use crate::registers::Registers;
use crate::tree::Path;
use crate::types::Type;
use crate::value::{Primitive, Value, infer_value_type};

/// The façade's three-mode state machine (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// No demonstration in progress; every register/list/function operation is unrestricted.
    Interactive,
    /// A demonstration is being recorded; names used as inputs are gated against mutation.
    Demonstration,
    /// Between two examples of the same demonstration: mutation is allowed again, but `apply` and
    /// friends are unavailable until `cont` resumes recording.
    Between,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interactive => "INTERACTIVE",
            Self::Demonstration => "DEMONSTRATION",
            Self::Between => "BETWEEN",
        };
        write!(f, "{name}")
    }
}

/// Mutable engine state: registers, lists, functions, and (if one is in progress) a
/// demonstration, plus the current selection and mode.
#[derive(Debug, Clone)]
pub struct State {
    registers: Registers,
    lists: Lists,
    functions: Functions,
    current_demonstration: Option<Demonstration>,
    mode: Mode,
    /// `(name, is_variable)` pairs, in selection order.
    selected: Vec<(String, bool)>,
    next_unique_id: u64,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(EngineLimits::default())
    }

    #[must_use]
    pub fn with_limits(limits: EngineLimits) -> Self {
        let mut next_unique_id = 0;
        let mut builtins = indexmap::IndexMap::default();
        for op in BuiltinOp::iter() {
            let name: &'static str = op.into();
            builtins.insert(name.to_string(), BuiltinFunction::new(op, next_unique_id));
            next_unique_id += 1;
        }
        Self {
            registers: Registers::new(),
            lists: Lists::new(),
            functions: Functions::with_builtins(builtins).with_limits(limits),
            current_demonstration: None,
            mode: Mode::Interactive,
            selected: Vec::new(),
            next_unique_id,
        }
    }

    fn next_unique_id(&mut self) -> u64 {
        let id = self.next_unique_id;
        self.next_unique_id += 1;
        id
    }

    // ---- Introspection -------------------------------------------------

    #[must_use]
    pub fn get_builtins(&self) -> indexmap::IndexMap<String, BuiltinFunction, ahash::RandomState> {
        self.functions.get_builtins()
    }

    /// # Errors
    /// `Error::UnknownName` if `name` is not a register, list, function, or (while a demonstration
    /// is running) temporary.
    pub fn get_value(&self, name: &str) -> Result<Value, Error> {
        if let Ok(v) = self.registers.get(name) {
            return Ok(v.clone());
        }
        if let Ok(v) = self.lists.get(name) {
            return Ok(Value::List(v.clone()));
        }
        if let Ok(f) = self.functions.get(name) {
            return Ok(Value::Function(crate::function::FunctionId {
                name: name.to_string(),
                signature: f.signature().clone(),
                unique_id: f.unique_id(),
            }));
        }
        if let Some(demo) = &self.current_demonstration {
            if let Ok(v) = demo.get_temp(name) {
                return v.ok_or_else(|| Error::unknown_name(name));
            }
        }
        Err(Error::unknown_name(name))
    }

    /// # Errors
    /// `Error::UnknownName` if `name` is not a valid temporary of the current demonstration.
    pub fn get_computation(&self, name: &str) -> Result<Vec<String>, Error> {
        if !self.is_valid_temporary(name) {
            return Err(Error::unknown_name(name));
        }
        #[allow(clippy::unwrap_used)]
        self.current_demonstration.as_ref().unwrap().get_temp_computation(name)
    }

    #[must_use]
    pub fn current_mode(&self) -> String {
        self.mode.to_string()
    }

    #[must_use]
    pub fn get_selected(&self) -> Vec<(String, bool)> {
        self.selected.clone()
    }

    // ---- Registers -------------------------------------------------------

    /// # Errors
    /// `Error::UnsupportedType` if `value` is not `Num`/`Bool`.
    pub fn create_register(&mut self, value: Value) -> Result<String, Error> {
        self.registers.create(value)
    }

    /// # Errors
    /// `Error::UnknownName` if `register` does not exist. `Error::RuntimeError` in
    /// demonstration/between mode if `register` is still used as a demonstration input.
    pub fn delete_register(&mut self, register: &str) -> Result<(), Error> {
        if !self.mode_is_interactive() {
            self.check_not_used(register)?;
        }
        self.registers.delete(register)?;
        self.drop_selected(register);
        Ok(())
    }

    /// # Errors
    /// `Error::UnknownName` if `register` does not exist. `Error::UnsupportedType` if `value` is
    /// not `Num`/`Bool`. `Error::RuntimeError` in demonstration mode if `register` is in use.
    pub fn update_register(&mut self, register: &str, value: Value) -> Result<(), Error> {
        if self.mode == Mode::Demonstration {
            self.check_not_used(register)?;
        }
        self.registers.update(register, value)
    }

    /// # Errors
    /// `Error::UnknownName` if `register` does not exist.
    pub fn get_register(&self, register: &str) -> Result<Value, Error> {
        self.registers.get(register).cloned()
    }

    #[must_use]
    pub fn get_register_names(&self) -> Vec<String> {
        self.registers.names()
    }

    #[must_use]
    pub fn is_valid_register(&self, register: &str) -> bool {
        self.registers.is_valid(register)
    }

    // ---- Lists -------------------------------------------------------

    /// # Errors
    /// `Error::UnsupportedType` if `value` contains heterogeneous or unsupported elements.
    pub fn create_list(&mut self, value: Vec<Primitive>) -> Result<String, Error> {
        self.lists.create(value)
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist.
    pub fn get_list(&self, name: &str) -> Result<Vec<Primitive>, Error> {
        self.lists.get(name).cloned()
    }

    #[must_use]
    pub fn get_list_names(&self) -> Vec<String> {
        self.lists.names()
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::IndexOutOfRange` if `index` is
    /// invalid.
    pub fn get_list_element(&self, name: &str, index: usize) -> Result<Primitive, Error> {
        self.lists.get_element(name, index)
    }

    /// # Errors
    /// Same as `Lists::update`, plus `Error::RuntimeError` in demonstration mode if `name` is in
    /// use.
    pub fn update_list(&mut self, name: &str, value: Vec<Primitive>) -> Result<(), Error> {
        if self.mode == Mode::Demonstration {
            self.check_not_used(name)?;
        }
        self.lists.update(name, value)
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::RuntimeError` in
    /// demonstration/between mode if `name` is in use.
    pub fn delete_list(&mut self, name: &str) -> Result<(), Error> {
        if !self.mode_is_interactive() {
            self.check_not_used(name)?;
        }
        self.lists.delete(name)?;
        self.drop_selected(name);
        Ok(())
    }

    /// # Errors
    /// Same as `Lists::append`, plus `Error::RuntimeError` in demonstration mode if `name` is in
    /// use.
    pub fn append_to_list(&mut self, name: &str, value: Primitive) -> Result<usize, Error> {
        if self.mode == Mode::Demonstration {
            self.check_not_used(name)?;
        }
        self.lists.append(name, value)
    }

    /// # Errors
    /// Same as `Lists::insert_element`, plus `Error::RuntimeError` in demonstration mode if `name`
    /// is in use.
    pub fn insert_list_element(&mut self, name: &str, value: Primitive, index: usize) -> Result<(), Error> {
        if self.mode == Mode::Demonstration {
            self.check_not_used(name)?;
        }
        self.lists.insert_element(name, value, index)
    }

    /// # Errors
    /// Same as `Lists::update_element`, plus `Error::RuntimeError` in demonstration mode if `name`
    /// is in use.
    pub fn update_list_element(&mut self, name: &str, value: Primitive, index: usize) -> Result<(), Error> {
        if self.mode == Mode::Demonstration {
            self.check_not_used(name)?;
        }
        self.lists.update_element(name, value, index)
    }

    /// # Errors
    /// Same as `Lists::delete_element`, plus `Error::RuntimeError` in demonstration mode if `name`
    /// is in use.
    pub fn delete_list_element(&mut self, name: &str, index: usize) -> Result<(), Error> {
        if self.mode == Mode::Demonstration {
            self.check_not_used(name)?;
        }
        self.lists.delete_element(name, index)
    }

    #[must_use]
    pub fn is_valid_list(&self, name: &str) -> bool {
        self.lists.is_valid(name)
    }

    // ---- Functions -------------------------------------------------------

    #[must_use]
    pub fn get_custom_function_names(&self) -> Vec<String> {
        self.functions.get_custom_names()
    }

    /// Leave interactive mode and start recording a new demonstration.
    ///
    /// # Errors
    /// `Error::ModeError` if a demonstration is already in progress.
    pub fn create_function(&mut self) -> Result<(), Error> {
        if !self.mode_is_interactive() {
            return Err(Error::mode("cannot create a new function in demonstration/between mode"));
        }
        self.mode = Mode::Demonstration;
        self.current_demonstration = Some(Demonstration::new());
        Ok(())
    }

    /// Delete a previously synthesized custom function. Left disallowed while a demonstration is
    /// in progress: deleting a function another in-flight demonstration depends on (directly, or
    /// transitively through a constant capturing it) would leave that demonstration's recorded
    /// constraints referring to a name that no longer resolves.
    ///
    /// # Errors
    /// `Error::ModeError` if a demonstration is in progress. `Error::UnknownName` if
    /// `function_name` is not a registered custom function.
    pub fn delete_function(&mut self, function_name: &str) -> Result<(), Error> {
        if !self.mode_is_interactive() {
            return Err(Error::mode("cannot delete a function in demonstration/between mode"));
        }
        self.functions.delete_function(function_name)
    }

    // ---- Interaction / demonstration --------------------------------------

    /// Select `identifier` (a register, list, function, or temporary) for the next `apply`,
    /// `recurse`, `branch`, or `ret` call. `is_variable` is ignored outside demonstration mode,
    /// and forced to `true` when `identifier` is a temporary (its value may depend on the inputs).
    ///
    /// # Errors
    /// `Error::ModeError` never (selection works in every mode); `Error::UnknownName` if
    /// `identifier` is not a valid name.
    pub fn select(&mut self, identifier: &str, is_variable: bool) -> Result<usize, Error> {
        if !self.is_valid_name(identifier) {
            return Err(Error::unknown_name(identifier));
        }
        let is_variable = match &self.current_demonstration {
            Some(demo) if demo.is_valid_temp(identifier) => true,
            _ => is_variable,
        };
        self.selected.push((identifier.to_string(), is_variable));
        Ok(self.selected.len() - 1)
    }

    /// # Errors
    /// `Error::IndexOutOfRange` if `idx` is not a valid position in the current selection.
    pub fn unselect(&mut self, idx: usize) -> Result<(), Error> {
        if idx >= self.selected.len() {
            return Err(Error::IndexOutOfRange { index: idx, len: self.selected.len() });
        }
        self.selected.remove(idx);
        Ok(())
    }

    pub fn unselect_all(&mut self) {
        self.selected.clear();
    }

    /// Apply `function_name` to the current selection. In interactive/between mode this computes
    /// the result and stores it in a fresh register or list; in demonstration mode it records the
    /// application as an instruction and returns the temporary it was bound to.
    ///
    /// # Errors
    /// Any error the lookup, type-check, or `compute` of `function_name` can raise, or
    /// `Error::InvariantMismatch` in demonstration mode if this call replays differently from the
    /// instruction already recorded at the cursor. The engine is left unchanged on error.
    pub fn apply(&mut self, function_name: &str, is_variable: bool) -> Result<String, Error> {
        let snapshot = self.clone();
        match self.try_apply(function_name, is_variable) {
            Ok(name) => Ok(name),
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    fn try_apply(&mut self, function_name: &str, is_variable: bool) -> Result<String, Error> {
        match self.mode {
            Mode::Interactive | Mode::Between => {
                let result = self.get_apply_result(function_name)?;
                #[allow(clippy::unwrap_used)]
                let identifier = self.store_value(result.unwrap())?;
                self.unselect_all();
                Ok(identifier)
            }
            Mode::Demonstration => {
                let result = self.get_apply_result(function_name)?;
                let mut selected = self.selected.clone();
                selected.push((function_name.to_string(), is_variable));
                let mut expr = self.add_to_function_context(&selected)?;
                let callee = expr.pop().unwrap_or_default();
                expr.insert(0, callee);

                #[allow(clippy::unwrap_used)]
                let demo = self.current_demonstration.as_mut().unwrap();
                let identifier = demo.add_function_application(expr, result)?;
                self.unselect_all();
                Ok(identifier)
            }
        }
    }

    /// Apply `self` (a recursive call back into the demonstration currently under construction) to
    /// the current selection.
    ///
    /// # Errors
    /// `Error::ModeError` if not in demonstration mode. Any error `apply` can raise.
    pub fn recurse(&mut self) -> Result<String, Error> {
        self.check_demonstration()?;
        let snapshot = self.clone();
        match self.try_recurse() {
            Ok(name) => Ok(name),
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    fn try_recurse(&mut self) -> Result<String, Error> {
        let selected = self.selected.clone();
        let mut expr = self.add_to_function_context(&selected)?;
        expr.insert(0, "self".to_string());
        let result = self.get_apply_result("self")?;

        #[allow(clippy::unwrap_used)]
        let demo = self.current_demonstration.as_mut().unwrap();
        let temp_name = demo.add_recursive_application(expr, result)?;
        self.unselect_all();
        Ok(temp_name)
    }

    /// Branch on the single currently selected element, which must be a variable of type `Bool`.
    ///
    /// # Errors
    /// `Error::ModeError` if not in demonstration mode. `Error::RuntimeError` if the selection is
    /// not exactly one element, or that element is a constant. `Error::UnsupportedType` if the
    /// selected value is not `Bool`. `Error::InvariantMismatch` on a replay mismatch.
    pub fn branch(&mut self) -> Result<(), Error> {
        self.check_demonstration()?;
        let snapshot = self.clone();
        match self.try_branch() {
            Ok(()) => Ok(()),
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    fn try_branch(&mut self) -> Result<(), Error> {
        if self.selected.len() != 1 {
            return Err(Error::runtime(format!(
                "expected exactly one element to be selected, got {}",
                self.selected.len()
            )));
        }
        let (name, is_variable) = self.selected[0].clone();
        if !is_variable {
            return Err(Error::runtime("cannot branch on something that is definitely a constant"));
        }

        let cond_value = self.get_value(&name)?;
        let selected_type = infer_value_type(&cond_value);
        if selected_type != Type::Bool {
            return Err(Error::UnsupportedType { ty: selected_type });
        }
        let Value::Bool(cond_bool) = cond_value else { unreachable!() };

        let context_names = self.add_to_function_context(&self.selected.clone())?;
        #[allow(clippy::unwrap_used)]
        let cond_name = context_names.into_iter().next().unwrap();

        #[allow(clippy::unwrap_used)]
        let demo = self.current_demonstration.as_mut().unwrap();
        demo.branch(&cond_name, cond_bool)?;
        self.unselect_all();
        Ok(())
    }

    /// Return the single currently selected element as the result of this example.
    ///
    /// # Returns
    /// If any branch outcomes remain undemonstrated, their paths; otherwise the name the newly
    /// synthesized function was registered under.
    ///
    /// # Errors
    /// `Error::ModeError` if not in demonstration mode. `Error::RuntimeError` if the selection is
    /// not exactly one element. `Error::NoSolution`/`Error::UnsupportedType` if synthesizing the
    /// final function fails. `Error::InvariantMismatch` on a replay mismatch.
    pub fn ret(&mut self) -> Result<(Vec<Path>, Option<String>), Error> {
        self.check_demonstration()?;
        let snapshot = self.clone();
        match self.try_ret() {
            Ok(result) => Ok(result),
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    fn try_ret(&mut self) -> Result<(Vec<Path>, Option<String>), Error> {
        if self.selected.len() != 1 {
            return Err(Error::runtime(format!(
                "expected exactly one element to be selected, got {}",
                self.selected.len()
            )));
        }
        let context_names = self.add_to_function_context(&self.selected.clone())?;
        #[allow(clippy::unwrap_used)]
        let ret_name = context_names.into_iter().next().unwrap();

        #[allow(clippy::unwrap_used)]
        let demo = self.current_demonstration.as_mut().unwrap();
        demo.ret(&ret_name)?;
        self.unselect_all();

        #[allow(clippy::unwrap_used)]
        let demo = self.current_demonstration.as_ref().unwrap();
        let remaining = demo.remaining_examples();

        if remaining.is_empty() {
            let unique_id = self.next_unique_id();
            #[allow(clippy::unwrap_used)]
            let demo = self.current_demonstration.as_ref().unwrap();
            let f = demo.generate_function(unique_id)?;
            let function_name = self.functions.add_function(f);
            self.current_demonstration = None;
            self.mode = Mode::Interactive;
            Ok((remaining, Some(function_name)))
        } else {
            #[allow(clippy::unwrap_used)]
            let demo = self.current_demonstration.as_mut().unwrap();
            demo.prepare();
            self.mode = Mode::Between;
            Ok((remaining, None))
        }
    }

    /// Resume recording after `ret` left remaining examples to demonstrate.
    ///
    /// # Errors
    /// `Error::ModeError` if not in between mode.
    pub fn cont(&mut self) -> Result<(), Error> {
        if self.mode != Mode::Between {
            return Err(Error::mode("check for being in between mode failed"));
        }
        self.mode = Mode::Demonstration;
        Ok(())
    }

    #[must_use]
    pub fn is_valid_temporary(&self, name: &str) -> bool {
        self.mode == Mode::Demonstration
            && self.current_demonstration.as_ref().is_some_and(|d| d.is_valid_temp(name))
    }

    #[must_use]
    pub fn get_temp_names(&self) -> Vec<String> {
        self.current_demonstration.as_ref().map(Demonstration::get_temp_names).unwrap_or_default()
    }

    // ---- Private helpers ---------------------------------------------------

    fn mode_is_interactive(&self) -> bool {
        self.mode == Mode::Interactive
    }

    fn check_demonstration(&self) -> Result<(), Error> {
        if self.mode != Mode::Demonstration {
            return Err(Error::mode("check for being in demonstration mode failed"));
        }
        Ok(())
    }

    fn is_valid_name(&self, name: &str) -> bool {
        self.registers.is_valid(name)
            || self.lists.is_valid(name)
            || self.functions.is_valid(name)
            || (self.mode == Mode::Demonstration
                && self.current_demonstration.as_ref().is_some_and(|d| d.is_valid_name(name)))
    }

    fn is_used(&self, name: &str) -> Result<bool, Error> {
        self.check_demonstration()?;
        #[allow(clippy::unwrap_used)]
        Ok(self.current_demonstration.as_ref().unwrap().is_used(name))
    }

    fn check_not_used(&self, name: &str) -> Result<(), Error> {
        if self.is_used(name)? {
            return Err(Error::runtime(format!("cannot change {name}, since it is still used")));
        }
        Ok(())
    }

    fn store_value(&mut self, value: Value) -> Result<String, Error> {
        match infer_value_type(&value) {
            Type::Num | Type::Bool => self.registers.create(value),
            Type::List(_) => {
                let Value::List(elements) = value else { unreachable!() };
                self.lists.create(elements)
            }
            ty => Err(Error::UnsupportedType { ty }),
        }
    }

    fn drop_selected(&mut self, name: &str) {
        self.selected.retain(|(n, _)| n != name);
    }

    /// Resolve `function_name` and apply it to the currently selected values, converting the
    /// unknown sentinel and (for `self`) an incomplete recursive call the way spec.md §7 requires.
    fn get_apply_result(&self, function_name: &str) -> Result<Option<Value>, Error> {
        let names: Vec<String> = self.selected.iter().map(|(name, _)| name.clone()).collect();
        let args: Vec<Value> = names.iter().map(|n| self.get_value(n)).collect::<Result<_, _>>()?;
        let args: Vec<Option<Value>> = args.into_iter().map(Some).collect();

        if function_name == "self" {
            #[allow(clippy::unwrap_used)]
            let demo = self.current_demonstration.as_ref().unwrap();
            let f = demo.generate_function(self.next_unique_id_peek())?;
            return match f.input_context(&args) {
                Err(Error::NoneAsFunArg) => Ok(None),
                Err(e) => Err(e),
                Ok(validated) => match f.compute(&validated, &self.functions, 0) {
                    Ok(v) => Ok(v),
                    Err(Error::IndexOutOfRange { .. }) => Ok(None),
                    Err(e) => Err(e),
                },
            };
        }

        self.functions.call(function_name, args, 0)
    }

    /// `get_apply_result` needs a unique id to construct a throwaway `CustomFunction` from the
    /// in-progress demonstration, but doing so must not actually consume one (the demonstration is
    /// not finished yet, and a real id is assigned only once in `try_ret`). Re-using the next id
    /// without bumping the counter keeps repeated speculative applies collision-free against each
    /// other (all the same id) while never colliding with an id already handed out to a real
    /// function.
    fn next_unique_id_peek(&self) -> u64 {
        self.next_unique_id
    }

    /// Given a selection (name, is_variable) list, register each name with the demonstration
    /// (as an input, a constant, or pass through unchanged if it is already a temporary) and
    /// return the resulting context names in the same order.
    fn add_to_function_context(&mut self, names: &[(String, bool)]) -> Result<Vec<String>, Error> {
        let mut context_names = Vec::with_capacity(names.len());
        for (name, is_variable) in names {
            #[allow(clippy::unwrap_used)]
            let demo = self.current_demonstration.as_ref().unwrap();
            if demo.is_valid_temp(name) {
                context_names.push(name.clone());
                continue;
            }

            if *is_variable {
                #[allow(clippy::unwrap_used)]
                let demo = self.current_demonstration.as_mut().unwrap();
                context_names.push(demo.add_input(name));
            } else {
                let value = self.get_value(name)?;
                #[allow(clippy::unwrap_used)]
                let demo = self.current_demonstration.as_mut().unwrap();
                context_names.push(demo.add_constant(value));
            }
        }
        Ok(context_names)
    }
}

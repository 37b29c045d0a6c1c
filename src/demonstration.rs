//! Tracks everything needed to synthesize a function from a sequence of demonstrated examples:
//! the names bound to inputs/constants/temporaries, the accumulated type constraints, and the
//! branch tree recording every instruction across every example demonstrated so far.

use ahash::RandomState;
use indexmap::IndexMap;

use crate::custom_function::CustomFunction;
use crate::error::Error;
use crate::tree::{Instruction, NodeId, Path, Tree};
use crate::types::{Equation, Type, alpha_conversion};
use crate::unify::unify;
use crate::value::{Value, infer_value_type};

/// Prefix for the fresh type variables this module allocates internally (distinct from
/// `value.rs`'s `z`/`y` prefixes, which are scoped to a single `input_context` call).
const ABSTRACT_TYPE_PREFIX: &str = "w";
/// Name of the type variable standing for the synthesized function's own signature while
/// `generate_function` runs unification.
const ABSTRACT_TYPE_SIG: &str = "w_sig";
/// Name of the type variable standing for the synthesized function's return type.
const ABSTRACT_TYPE_OUTPUT: &str = "w_out";

type TempEntry = (Vec<String>, Option<Value>);

/// Recording state for one function currently under construction by demonstration.
#[derive(Debug, Clone)]
pub struct Demonstration {
    constants: IndexMap<String, Value, RandomState>,
    next_id_constants: usize,

    /// Maps a name from outside the demonstration (a register, list, or function) to the `inN`
    /// name it was bound to the first time it was selected as a variable.
    inputs: IndexMap<String, String, RandomState>,
    next_id_inputs: usize,

    types: IndexMap<String, Type, RandomState>,
    next_id_type: usize,

    /// Maps a temporary's name to the expression that computed it and, if known, its value. A
    /// `None` value is the unknown sentinel, not a missing entry.
    temps: IndexMap<String, TempEntry, RandomState>,
    next_id_temps: usize,
    /// Whether `next_id_temps` still needs to be reconciled against the previous example's
    /// temporary count — see `switch_next_id_temps`.
    new_branch: bool,
    prev_next_id_temps: usize,

    /// `(node, position)` of every recorded self-call, so a newly introduced input can be
    /// retroactively forwarded to calls recorded before that input existed.
    recursive_calls: Vec<(NodeId, usize)>,

    tree: Tree,
    current_node: NodeId,
    block_counter: usize,

    constraints: Vec<Equation>,
}

impl Default for Demonstration {
    fn default() -> Self {
        Self::new()
    }
}

impl Demonstration {
    #[must_use]
    pub fn new() -> Self {
        Self {
            constants: IndexMap::default(),
            next_id_constants: 0,
            inputs: IndexMap::default(),
            next_id_inputs: 0,
            types: IndexMap::default(),
            next_id_type: 0,
            temps: IndexMap::default(),
            next_id_temps: 0,
            new_branch: true,
            prev_next_id_temps: 0,
            recursive_calls: Vec::new(),
            tree: Tree::new(),
            current_node: Tree::root(),
            block_counter: 0,
            constraints: Vec::new(),
        }
    }

    /// Whether `name` (a name from outside the demonstration) has been selected as a variable.
    #[must_use]
    pub fn is_used(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// # Errors
    /// `Error::UnknownName` if `name` is not a recorded temporary.
    pub fn get_temp(&self, name: &str) -> Result<Option<Value>, Error> {
        self.temps.get(name).map(|(_, v)| v.clone()).ok_or_else(|| Error::unknown_name(name))
    }

    #[must_use]
    pub fn get_temp_names(&self) -> Vec<String> {
        self.temps.keys().cloned().collect()
    }

    /// # Errors
    /// `Error::UnknownName` if `name` is not a recorded temporary.
    pub fn get_temp_computation(&self, name: &str) -> Result<Vec<String>, Error> {
        self.temps.get(name).map(|(expr, _)| expr.clone()).ok_or_else(|| Error::unknown_name(name))
    }

    /// Return the internal name for constant `value`, registering it as a new constant the first
    /// time it is seen. A `Value::Function` short-circuits this: rather than allocate a redundant
    /// `const_i` wrapper around a name the function already owns in its registry, this records the
    /// function's own name directly (see DESIGN.md).
    pub fn add_constant(&mut self, value: Value) -> String {
        if let Value::Function(handle) = &value {
            let name = handle.name.clone();
            if !self.types.contains_key(&name) {
                let (converted, next_offset) =
                    alpha_conversion(handle.signature.clone(), ABSTRACT_TYPE_PREFIX, self.next_id_type);
                self.types.insert(name.clone(), converted);
                self.next_id_type = next_offset;
            }
            return name;
        }

        for (existing_name, existing_value) in &self.constants {
            if *existing_value == value {
                return existing_name.clone();
            }
        }

        let const_name = format!("const{}", self.next_id_constants);
        let const_type = infer_value_type(&value);
        self.constants.insert(const_name.clone(), value);
        self.next_id_constants += 1;

        let (converted, next_offset) = alpha_conversion(const_type, ABSTRACT_TYPE_PREFIX, self.next_id_type);
        self.types.insert(const_name.clone(), converted);
        self.next_id_type = next_offset;
        const_name
    }

    /// Return the `inN` name for `s_in` (a register/list/function name from outside the
    /// demonstration), assigning a fresh one the first time it is selected as a variable. Every
    /// self-call recorded before this input existed is retroactively widened to pass it along, so
    /// the synthesized function keeps forwarding its full argument list to itself.
    pub fn add_input(&mut self, s_in: &str) -> String {
        if let Some(existing) = self.inputs.get(s_in) {
            return existing.clone();
        }

        let input_name = format!("in{}", self.next_id_inputs);
        self.inputs.insert(s_in.to_string(), input_name.clone());
        self.next_id_inputs += 1;

        for &(node, pos) in &self.recursive_calls {
            #[allow(clippy::unwrap_used)]
            self.tree.push_arg(node, pos, input_name.clone()).unwrap();
            // `temps` holds its own copy of the expression (unlike the Python original, where the
            // list object is shared between the tree instruction and the temp entry) — re-sync it
            // so `get_temp_computation` reflects the widened call too.
            #[allow(clippy::unwrap_used)]
            if let Instruction::Apply { temp, expr } = self.tree.get_instruction(node, pos).unwrap().clone() {
                if let Some(entry) = self.temps.get_mut(&temp) {
                    entry.0 = expr;
                }
            }
        }

        self.types.insert(input_name.clone(), Type::var(format!("{ABSTRACT_TYPE_PREFIX}{}", self.next_id_type)));
        self.next_id_type += 1;

        input_name
    }

    /// Record a non-recursive function application, returning the temporary name it was bound to.
    ///
    /// # Errors
    /// `Error::InvariantMismatch` if this instruction does not match the one already recorded at
    /// the current cursor position (replaying a previous example). `Error::UnknownName` if `expr`
    /// references a name with no recorded type.
    pub fn add_function_application(&mut self, expr: Vec<String>, result: Option<Value>) -> Result<String, Error> {
        let temp_name = self.record_application(expr.clone(), result)?;
        self.add_application_constraint(&expr, &temp_name)?;
        Ok(temp_name)
    }

    /// Record a recursive (`self`) function application, returning the temporary name it was
    /// bound to. Unlike `add_function_application`, the constraint ties the function's full input
    /// signature to the arguments of this call, since a recursive call must pass exactly what the
    /// function itself receives.
    ///
    /// # Errors
    /// Same as `add_function_application`.
    pub fn add_recursive_application(&mut self, expr: Vec<String>, result: Option<Value>) -> Result<String, Error> {
        let temp_name = self.record_application(expr.clone(), result)?;
        self.recursive_calls.push((self.current_node, self.block_counter - 1));

        let mut lhs_types: Vec<Type> = self.inputs.values().map(|name| self.types[name].clone()).collect();
        lhs_types.push(Type::var(ABSTRACT_TYPE_OUTPUT));
        let lhs = Type::combine_into_app(lhs_types)?;

        let mut rhs_types: Vec<Type> =
            expr[1..].iter().map(|k| self.types.get(k).cloned().ok_or_else(|| Error::unknown_name(k))).collect::<Result<_, _>>()?;
        rhs_types.push(self.types[&temp_name].clone());
        let rhs = Type::combine_into_app(rhs_types)?;

        self.constraints.push((lhs, rhs));
        Ok(temp_name)
    }

    fn record_application(&mut self, expr: Vec<String>, result: Option<Value>) -> Result<String, Error> {
        self.switch_next_id_temps();
        let temp_name = format!("temp{}", self.next_id_temps);
        let instr = Instruction::Apply { temp: temp_name.clone(), expr };

        self.add_instruction(instr.clone())?;
        self.block_counter += 1;

        let Instruction::Apply { expr, .. } = instr else { unreachable!() };
        self.temps.insert(temp_name.clone(), (expr, result));
        self.next_id_temps += 1;

        if !self.types.contains_key(&temp_name) {
            self.types.insert(temp_name.clone(), Type::var(format!("{ABSTRACT_TYPE_PREFIX}{}", self.next_id_type)));
            self.next_id_type += 1;
        }

        Ok(temp_name)
    }

    fn add_application_constraint(&mut self, expr: &[String], temp_name: &str) -> Result<(), Error> {
        let lhs = self.types.get(&expr[0]).cloned().ok_or_else(|| Error::unknown_name(&expr[0]))?;
        let mut rhs_types: Vec<Type> =
            expr[1..].iter().map(|k| self.types.get(k).cloned().ok_or_else(|| Error::unknown_name(k))).collect::<Result<_, _>>()?;
        rhs_types.push(self.types[temp_name].clone());
        let rhs = Type::combine_into_app(rhs_types)?;
        self.constraints.push((lhs, rhs));
        Ok(())
    }

    /// Record a branch on `cond_name` (already evaluated to `cond_value`) and descend into the
    /// corresponding child of the branch tree, creating it if this is the first example to take
    /// that path.
    ///
    /// # Errors
    /// `Error::InvariantMismatch` if this instruction does not match the one already recorded.
    pub fn branch(&mut self, cond_name: &str, cond_value: bool) -> Result<(), Error> {
        let cond_type = self.types.get(cond_name).cloned().ok_or_else(|| Error::unknown_name(cond_name))?;
        self.constraints.push((cond_type, Type::Bool));
        self.add_instruction(Instruction::Branch { cond: cond_name.to_string() })?;

        self.current_node = if cond_value {
            self.tree.get_true(self.current_node, true)?
        } else {
            self.tree.get_false(self.current_node, true)?
        };
        self.block_counter = 0;
        Ok(())
    }

    /// Record returning `name` as the result of this example.
    ///
    /// # Errors
    /// `Error::InvariantMismatch` if this instruction does not match the one already recorded.
    pub fn ret(&mut self, name: &str) -> Result<(), Error> {
        let ty = self.types.get(name).cloned().ok_or_else(|| Error::unknown_name(name))?;
        self.constraints.push((ty, Type::var(ABSTRACT_TYPE_OUTPUT)));
        self.add_instruction(Instruction::Ret { name: name.to_string() })?;
        self.new_branch = false;
        Ok(())
    }

    /// Reset the cursor to the tree's root ahead of demonstrating another example. Temporaries are
    /// cleared — their values are only known within the example that produced them.
    pub fn prepare(&mut self) {
        self.current_node = Tree::root();
        self.block_counter = 0;
        self.temps.clear();
        self.prev_next_id_temps = self.next_id_temps;
        self.next_id_temps = 0;
    }

    /// Paths to every branch outcome across the whole tree that has not yet been demonstrated.
    #[must_use]
    pub fn remaining_examples(&self) -> Vec<Path> {
        self.tree.remaining_examples(Tree::root())
    }

    /// Unify the accumulated constraints, solve for the function's final signature, and build the
    /// synthesized [`CustomFunction`] from the recorded tree and constants.
    ///
    /// # Errors
    /// `Error::NoSolution` or `Error::UnsupportedType` if unification fails or the solved signature
    /// falls outside the supported type fragment.
    pub fn generate_function(&self, unique_id: u64) -> Result<CustomFunction, Error> {
        let mut input_types: Vec<Type> = self.inputs.values().map(|name| self.types[name].clone()).collect();
        input_types.push(Type::var(ABSTRACT_TYPE_OUTPUT));
        let signature_shape = Type::combine_into_app(input_types)?;

        let mut constraints = self.constraints.clone();
        constraints.push((Type::var(ABSTRACT_TYPE_SIG), signature_shape));

        let unified = unify(constraints)?;
        let signature = unified
            .into_iter()
            .find_map(|(lhs, rhs)| if lhs == Type::var(ABSTRACT_TYPE_SIG) { Some(rhs) } else { None })
            .ok_or_else(|| Error::runtime("unification produced no signature for w_sig"))?;

        Ok(CustomFunction::new(signature, self.tree.clone(), self.constants.clone(), unique_id))
    }

    #[must_use]
    pub fn is_valid_temp(&self, name: &str) -> bool {
        self.temps.contains_key(name)
    }

    #[must_use]
    pub fn is_valid_name(&self, name: &str) -> bool {
        self.is_valid_temp(name)
    }

    fn expected_instruction(&self) -> Option<Instruction> {
        self.tree.get_instruction(self.current_node, self.block_counter).ok().cloned()
    }

    /// Reconcile the next temporary's numbering against the previous example: if we are
    /// continuing along an already-recorded path (an instruction is still expected), new temps
    /// must reuse the old numbering so the instruction we produce matches the one already there.
    /// Once we run off the recorded path, numbering must diverge from the previous example's
    /// temps, or constraints from two different examples would collide under the same name.
    fn switch_next_id_temps(&mut self) {
        if !self.new_branch && self.expected_instruction().is_none() {
            self.next_id_temps = self.prev_next_id_temps;
            self.new_branch = true;
        }
    }

    fn add_instruction(&mut self, instr: Instruction) -> Result<(), Error> {
        match self.expected_instruction() {
            Some(expected) if expected == instr => Ok(()),
            Some(expected) => {
                Err(Error::InvariantMismatch { expected: format!("{expected:?}"), found: format!("{instr:?}") })
            }
            None => {
                self.tree.append_instruction(self.current_node, instr);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Function, FunctionId};

    #[test]
    fn add_constant_deduplicates_equal_scalar_values() {
        let mut demo = Demonstration::new();
        let a = demo.add_constant(Value::Int(5));
        let b = demo.add_constant(Value::Int(5));
        assert_eq!(a, b);
        assert_eq!(a, "const0");

        let c = demo.add_constant(Value::Int(6));
        assert_ne!(a, c);
    }

    #[test]
    fn add_constant_short_circuits_function_values() {
        let mut demo = Demonstration::new();
        let handle = FunctionId { name: "+".to_string(), signature: Type::arrow(Type::Num, Type::arrow(Type::Num, Type::Num)), unique_id: 0 };
        let name = demo.add_constant(Value::Function(handle));
        assert_eq!(name, "+");
        assert!(demo.types.contains_key("+"));
        assert!(!demo.constants.contains_key("+"));
    }

    #[test]
    fn add_input_reuses_the_name_for_a_repeated_selection() {
        let mut demo = Demonstration::new();
        let a = demo.add_input("reg0");
        let b = demo.add_input("reg0");
        assert_eq!(a, b);
        assert_eq!(a, "in0");

        let c = demo.add_input("reg1");
        assert_eq!(c, "in1");
    }

    #[test]
    fn add_input_widens_previously_recorded_recursive_calls() {
        let mut demo = Demonstration::new();
        let in0 = demo.add_input("reg0");
        let fname = demo.add_constant(Value::Function(FunctionId {
            name: "self".to_string(),
            signature: Type::arrow(Type::Num, Type::Num),
            unique_id: 0,
        }));
        demo.add_recursive_application(vec![fname, in0], None).unwrap();

        let in1 = demo.add_input("reg1");
        let expr = demo.get_temp_computation("temp0").unwrap();
        assert!(expr.contains(&in1));
    }

    #[test]
    fn double_example_produces_the_expected_arrow_signature() {
        // double(x) = x + x
        let mut demo = Demonstration::new();
        let in0 = demo.add_input("reg0");
        let plus = demo.add_constant(Value::Function(FunctionId {
            name: "+".to_string(),
            signature: Type::arrow(Type::Num, Type::arrow(Type::Num, Type::Num)),
            unique_id: 0,
        }));
        let temp0 = demo.add_function_application(vec![plus, in0.clone(), in0], Some(Value::Int(40))).unwrap();
        demo.ret(&temp0).unwrap();

        assert!(demo.remaining_examples().is_empty());
        let f = demo.generate_function(1).unwrap();
        assert_eq!(f.signature(), &Type::arrow(Type::Num, Type::Num));
    }

    #[test]
    fn replaying_a_mismatched_instruction_is_an_invariant_error() {
        let mut demo = Demonstration::new();
        let in0 = demo.add_input("reg0");
        demo.ret(&in0).unwrap();

        demo.prepare();
        let in0_again = demo.add_input("reg0");
        let plus = demo.add_constant(Value::Function(FunctionId {
            name: "+".to_string(),
            signature: Type::arrow(Type::Num, Type::arrow(Type::Num, Type::Num)),
            unique_id: 0,
        }));
        let result = demo.add_function_application(vec![plus, in0_again.clone(), in0_again], Some(Value::Int(2)));
        assert!(matches!(result, Err(Error::InvariantMismatch { .. })));
    }
}

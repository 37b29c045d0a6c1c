//! The interpreter for a synthesized custom function (§4.5): walks a [`Tree`] of recorded
//! instructions against a call-local context, dispatching to built-ins, other custom functions, or
//! `self` for recursive calls.

use ahash::RandomState;
use indexmap::IndexMap;

use crate::error::Error;
use crate::function::{Function, FunctionId};
use crate::functions::Functions;
use crate::tree::{Instruction, NodeId, Tree};
use crate::types::Type;
use crate::value::Value;

/// The pseudo-function name referring to the demonstration currently under synthesis, as resolved
/// inside the branch tree's instruction expressions (spec.md glossary: "Self").
const SELF_CALL: &str = "self";

/// A function synthesized by a demonstration: its signature, the branch tree recording every
/// demonstrated path, and a snapshot of the constants captured while it was being built.
#[derive(Debug, Clone)]
pub struct CustomFunction {
    signature: Type,
    tree: Tree,
    constants: IndexMap<String, Value, RandomState>,
    unique_id: u64,
}

impl CustomFunction {
    #[must_use]
    pub fn new(signature: Type, tree: Tree, constants: IndexMap<String, Value, RandomState>, unique_id: u64) -> Self {
        Self { signature, tree, constants, unique_id }
    }

    /// Resolve an argument or callee name: a name bound in the call-local `context` (an input, a
    /// temporary, or a captured constant) wins; a name with no context binding is instead a direct
    /// registry name (a built-in operator, or another custom function's `f{n}` name) reached via
    /// the `add_constant` function short-circuit documented in DESIGN.md, and is turned into a
    /// fresh `Value::Function` handle on the fly.
    fn resolve_name(
        name: &str,
        context: &IndexMap<String, Option<Value>, RandomState>,
        functions: &Functions,
    ) -> Result<Option<Value>, Error> {
        if let Some(bound) = context.get(name) {
            return Ok(bound.clone());
        }
        let f = functions.get(name)?;
        Ok(Some(Value::Function(FunctionId { name: name.to_string(), signature: f.signature().clone(), unique_id: f.unique_id() })))
    }

    fn eval_apply(
        &self,
        expr: &[String],
        context: &IndexMap<String, Option<Value>, RandomState>,
        functions: &Functions,
        depth: usize,
    ) -> Result<Option<Value>, Error> {
        let fn_name = &expr[0];
        let arg_names = &expr[1..];
        let args: Vec<Option<Value>> =
            arg_names.iter().map(|n| Self::resolve_name(n, context, functions)).collect::<Result<_, _>>()?;

        if fn_name == SELF_CALL {
            if depth >= functions.limits().max_recursion_depth {
                return Err(Error::runtime("recursion depth exceeded"));
            }
            return match self.input_context(&args) {
                Err(Error::NoneAsFunArg) => Ok(None),
                Err(e) => Err(e),
                Ok(validated) => match self.compute(&validated, functions, depth + 1) {
                    Ok(v) => Ok(v),
                    Err(Error::IndexOutOfRange { .. }) => Ok(None),
                    Err(e) => Err(e),
                },
            };
        }

        let target_name = match Self::resolve_name(fn_name, context, functions)? {
            Some(Value::Function(handle)) => handle.name,
            _ => fn_name.clone(),
        };
        functions.call(&target_name, args, depth + 1)
    }

    #[cfg(test)]
    fn constants(&self) -> &IndexMap<String, Value, RandomState> {
        &self.constants
    }
}

impl Function for CustomFunction {
    fn signature(&self) -> &Type {
        &self.signature
    }

    fn unique_id(&self) -> u64 {
        self.unique_id
    }

    fn compute(&self, args: &[Value], functions: &Functions, depth: usize) -> Result<Option<Value>, Error> {
        let mut context: IndexMap<String, Option<Value>, RandomState> = IndexMap::default();
        for (i, v) in args.iter().enumerate() {
            context.insert(format!("in{i}"), Some(v.clone()));
        }
        for (name, v) in &self.constants {
            context.insert(name.clone(), Some(v.clone()));
        }

        let mut node = Tree::root();
        let mut pos = 0usize;
        loop {
            let instr = self.tree.get_instruction(node, pos)?.clone();
            match instr {
                Instruction::Apply { temp, expr } => {
                    let result = self.eval_apply(&expr, &context, functions, depth)?;
                    context.insert(temp, result);
                    pos += 1;
                }
                Instruction::Branch { cond } => {
                    let Some(Value::Bool(value)) = context.get(&cond).cloned().flatten() else {
                        return Err(Error::runtime(format!("branch condition {cond} is not a known bool")));
                    };
                    node = self.next_node(node, value)?;
                    pos = 0;
                }
                Instruction::Ret { name } => {
                    return Ok(context.get(&name).cloned().flatten());
                }
            }
        }
    }
}

impl CustomFunction {
    fn next_node(&self, node: NodeId, take_true: bool) -> Result<NodeId, Error> {
        self.tree.existing_child(node, take_true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn functions() -> Functions {
        use crate::builtins::{BuiltinFunction, BuiltinOp};
        let mut builtins = IndexMap::default();
        builtins.insert("+".to_string(), BuiltinFunction::new(BuiltinOp::Add, 0));
        builtins.insert("not".to_string(), BuiltinFunction::new(BuiltinOp::Not, 1));
        Functions::with_builtins(builtins)
    }

    /// `double(x) = x + x`, mirroring demonstration scenario 1.
    fn double_function() -> CustomFunction {
        let mut tree = Tree::new();
        tree.append_instruction(
            Tree::root(),
            Instruction::Apply { temp: "temp0".into(), expr: vec!["+".into(), "in0".into(), "in0".into()] },
        );
        tree.append_instruction(Tree::root(), Instruction::Ret { name: "temp0".into() });
        CustomFunction::new(Type::arrow(Type::Num, Type::Num), tree, IndexMap::default(), 2)
    }

    #[test]
    fn double_computes_the_expected_value() {
        let f = double_function();
        let result = f.compute(&[Value::Int(20)], &functions(), 0).unwrap();
        assert_eq!(result, Some(Value::Int(40)));
    }

    #[test]
    fn missing_branch_child_surfaces_as_index_out_of_range_for_non_self_callers() {
        let mut tree = Tree::new();
        tree.append_instruction(Tree::root(), Instruction::Branch { cond: "in0".into() });
        tree.get_true(Tree::root(), true).unwrap();
        // "false" child intentionally left unexplored.
        let f = CustomFunction::new(Type::arrow(Type::Bool, Type::Num), tree, IndexMap::default(), 3);
        let result = f.compute(&[Value::Bool(false)], &functions(), 0);
        assert!(matches!(result, Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn incomplete_self_recursion_yields_unknown_not_an_error() {
        // isEmpty-style base case missing: the function immediately recurses into "self" on the
        // same input without ever reaching a ret, modeling synthesis mid-flight.
        let mut tree = Tree::new();
        tree.append_instruction(
            Tree::root(),
            Instruction::Apply { temp: "temp0".into(), expr: vec![SELF_CALL.into(), "in0".into()] },
        );
        tree.append_instruction(Tree::root(), Instruction::Ret { name: "temp0".into() });
        let f = CustomFunction::new(Type::arrow(Type::Num, Type::Num), tree, IndexMap::default(), 4);
        let result = f.compute(&[Value::Int(1)], &functions(), 0).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn recursion_depth_limit_is_enforced() {
        let mut tree = Tree::new();
        tree.append_instruction(
            Tree::root(),
            Instruction::Apply { temp: "temp0".into(), expr: vec![SELF_CALL.into(), "in0".into()] },
        );
        tree.append_instruction(Tree::root(), Instruction::Ret { name: "temp0".into() });
        let f = CustomFunction::new(Type::arrow(Type::Num, Type::Num), tree, IndexMap::default(), 5);
        let limits = crate::config::EngineLimits { max_recursion_depth: 2, max_branch_depth: 128 };
        let functions = functions().with_limits(limits);
        let result = f.compute(&[Value::Int(1)], &functions, 2);
        assert!(matches!(result, Err(Error::RuntimeError { .. })));
    }

    #[test]
    fn branches_on_input_select_the_demonstrated_child() {
        let mut tree = Tree::new();
        tree.append_instruction(Tree::root(), Instruction::Branch { cond: "in0".into() });
        let true_child = tree.get_true(Tree::root(), true).unwrap();
        let false_child = tree.get_false(Tree::root(), true).unwrap();
        tree.append_instruction(
            true_child,
            Instruction::Apply { temp: "temp0".into(), expr: vec!["not".into(), "in0".into()] },
        );
        tree.append_instruction(true_child, Instruction::Ret { name: "temp0".into() });
        tree.append_instruction(
            false_child,
            Instruction::Apply { temp: "temp0".into(), expr: vec!["not".into(), "in0".into()] },
        );
        tree.append_instruction(false_child, Instruction::Ret { name: "temp0".into() });

        let f = CustomFunction::new(Type::arrow(Type::Bool, Type::Bool), tree, IndexMap::default(), 6);
        assert_eq!(f.compute(&[Value::Bool(true)], &functions(), 0).unwrap(), Some(Value::Bool(false)));
        assert_eq!(f.compute(&[Value::Bool(false)], &functions(), 0).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn constants_are_visible_inside_the_call_context() {
        let mut tree = Tree::new();
        tree.append_instruction(
            Tree::root(),
            Instruction::Apply { temp: "temp0".into(), expr: vec!["+".into(), "in0".into(), "const0".into()] },
        );
        tree.append_instruction(Tree::root(), Instruction::Ret { name: "temp0".into() });
        let mut constants = IndexMap::default();
        constants.insert("const0".to_string(), Value::Int(1));
        let f = CustomFunction::new(Type::arrow(Type::Num, Type::Num), tree, constants, 7);
        assert_eq!(f.constants().len(), 1);
        assert_eq!(f.compute(&[Value::Int(41)], &functions(), 0).unwrap(), Some(Value::Int(42)));
    }
}

//! Named storage for both built-in and custom functions, plus the shared call entry point used
//! whenever one function invokes another by name (builtins calling a higher-order argument,
//! custom functions calling a sibling or themselves).

use ahash::RandomState;
use indexmap::IndexMap;

use crate::builtins::BuiltinFunction;
use crate::config::EngineLimits;
use crate::custom_function::CustomFunction;
use crate::error::Error;
use crate::function::Function;
use crate::types::Type;
use crate::value::Value;

/// Either kind of function a [`Functions`] registry can hold. An enum rather than `Box<dyn
/// Function>` so the whole registry — and anything that embeds it — stays plainly `Clone`,
/// matching the teacher's preference for enum dispatch over trait objects where the variant set
/// is closed.
#[derive(Debug, Clone)]
pub enum AnyFunction {
    Builtin(BuiltinFunction),
    Custom(CustomFunction),
}

impl Function for AnyFunction {
    fn signature(&self) -> &Type {
        match self {
            Self::Builtin(f) => f.signature(),
            Self::Custom(f) => f.signature(),
        }
    }

    fn unique_id(&self) -> u64 {
        match self {
            Self::Builtin(f) => f.unique_id(),
            Self::Custom(f) => f.unique_id(),
        }
    }

    fn compute(&self, args: &[Value], functions: &Functions, depth: usize) -> Result<Option<Value>, Error> {
        match self {
            Self::Builtin(f) => f.compute(args, functions, depth),
            Self::Custom(f) => f.compute(args, functions, depth),
        }
    }
}

/// Names and keeps track of all functions, both built-in and custom.
#[derive(Debug, Clone)]
pub struct Functions {
    builtins: IndexMap<String, BuiltinFunction, RandomState>,
    customs: IndexMap<String, CustomFunction, RandomState>,
    next_id_custom: usize,
    limits: EngineLimits,
}

impl Default for Functions {
    fn default() -> Self {
        Self::with_builtins(IndexMap::default())
    }
}

impl Functions {
    #[must_use]
    pub fn with_builtins(builtins: IndexMap<String, BuiltinFunction, RandomState>) -> Self {
        Self { builtins, customs: IndexMap::default(), next_id_custom: 0, limits: EngineLimits::default() }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    #[must_use]
    pub fn get_custom_names(&self) -> Vec<String> {
        self.customs.keys().cloned().collect()
    }

    #[must_use]
    pub fn get_builtins(&self) -> IndexMap<String, BuiltinFunction, RandomState> {
        self.builtins.clone()
    }

    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        self.builtins.contains_key(name) || self.customs.contains_key(name)
    }

    /// # Errors
    /// `Error::UnknownName` if `name` is registered under neither built-ins nor customs.
    pub fn get(&self, name: &str) -> Result<AnyFunction, Error> {
        if let Some(f) = self.builtins.get(name) {
            return Ok(AnyFunction::Builtin(f.clone()));
        }
        if let Some(f) = self.customs.get(name) {
            return Ok(AnyFunction::Custom(f.clone()));
        }
        Err(Error::unknown_name(name))
    }

    /// Stores `f` and returns the name it was registered under (`f{n}`).
    pub fn add_function(&mut self, f: CustomFunction) -> String {
        let name = format!("f{}", self.next_id_custom);
        self.customs.insert(name.clone(), f);
        self.next_id_custom += 1;
        name
    }

    /// # Errors
    /// `Error::UnknownName` if `name` is not a registered custom function.
    pub fn delete_function(&mut self, name: &str) -> Result<(), Error> {
        self.customs.shift_remove(name).map(|_| ()).ok_or_else(|| Error::unknown_name(name))
    }

    /// Look up `name` and invoke it with `args` (the unknown sentinel is `None`). `NoneAsFunArg`
    /// is converted to the unknown sentinel here — per spec.md §7, that conversion applies
    /// regardless of which function is being called, not only self-recursive calls.
    ///
    /// # Errors
    /// `Error::UnknownName` if `name` is not registered. Any other `Error` the callee's own call
    /// contract or `compute` raises (including `IndexOutOfRange`, which is *not* converted here —
    /// only a custom function's own self-calls get that treatment, see `custom_function.rs`).
    pub fn call(&self, name: &str, args: Vec<Option<Value>>, depth: usize) -> Result<Option<Value>, Error> {
        let f = self.get(name)?;
        match f.input_context(&args) {
            Err(Error::NoneAsFunArg) => Ok(None),
            Err(e) => Err(e),
            Ok(validated) => f.compute(&validated, self, depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::BuiltinOp;

    #[test]
    fn add_function_assigns_sequential_names() {
        let mut functions = Functions::default();
        let f = CustomFunction::new(Type::arrow(Type::Num, Type::Num), crate::tree::Tree::new(), IndexMap::default(), 1);
        assert_eq!(functions.add_function(f.clone()), "f0");
        assert_eq!(functions.add_function(f), "f1");
    }

    #[test]
    fn call_converts_none_as_fun_arg_to_unknown() {
        let mut builtins = IndexMap::default();
        builtins.insert("+".to_string(), BuiltinFunction::new(BuiltinOp::Add, 0));
        let functions = Functions::with_builtins(builtins);
        let result = functions.call("+", vec![Some(Value::Int(1)), None], 0).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn call_unknown_name_errors() {
        let functions = Functions::default();
        assert!(matches!(functions.call("nope", vec![], 0), Err(Error::UnknownName { .. })));
    }
}

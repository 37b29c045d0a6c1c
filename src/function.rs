//! The call contract shared by built-in and custom functions.

use std::fmt;

use crate::error::Error;
use crate::functions::Functions;
use crate::types::Type;
use crate::value::{Value, infer_argument_signature};

/// A lightweight handle to a function, stored inside [`Value::Function`]. The actual callable
/// lives in the [`Functions`] registry under `name`; this handle only carries enough to type-check
/// and compare function values without cloning the whole implementation (a custom function's
/// branch tree, in particular, is not something `Value` should have to drag around).
#[derive(Debug, Clone)]
pub struct FunctionId {
    /// The name this function is stored under in a `Functions` registry (a builtin operator name
    /// or a synthesized `f{n}`).
    pub name: String,
    pub signature: Type,
    pub unique_id: u64,
}

impl PartialEq for FunctionId {
    /// Function values compare by unique id, not by name or signature — two handles referring to
    /// the same synthesized function via different names (if ever re-exported) would still compare
    /// equal, matching how constants holding a `Function` value are deduplicated in a demonstration.
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}

/// Shared entity implemented by both built-in primitives and synthesized custom functions.
pub trait Function: fmt::Debug {
    fn signature(&self) -> &Type;
    fn unique_id(&self) -> u64;

    /// The call contract of §4.5: reject the unknown sentinel, short-circuit a nullary signature,
    /// otherwise type-check the arguments against the signature's input prefix.
    ///
    /// # Errors
    /// `Error::NoneAsFunArg` if `args` contains the unknown sentinel.
    /// `Error::TypeMismatch` if the arguments do not unify with the function's input signature.
    fn input_context(&self, args: &[Option<Value>]) -> Result<Vec<Value>, Error> {
        if args.iter().any(Option::is_none) {
            return Err(Error::NoneAsFunArg);
        }
        #[allow(clippy::unwrap_used)]
        let values: Vec<Value> = args.iter().map(|a| a.clone().unwrap()).collect();

        if !matches!(self.signature(), Type::App(_, _)) {
            // A non-arrow signature encodes a nullary constant: there is nothing to unify against.
            return Ok(Vec::new());
        }

        let argument_signature = infer_argument_signature(&values)?;
        let expected = self.signature().drop_last_type_app()?;
        crate::unify::unify(vec![(argument_signature.clone(), expected.clone())])
            .map_err(|_| Error::TypeMismatch { expected, found: argument_signature })?;
        Ok(values)
    }

    /// Evaluate the function over already-validated positional arguments. `functions` resolves
    /// callees reached from inside a custom function's body (built-ins, other custom functions,
    /// and `self`); `depth` tracks recursion so a self-recursive function with no demonstrated base
    /// case cannot overflow the stack (see `EngineLimits::max_recursion_depth`).
    ///
    /// Returns the unknown sentinel (`Ok(None)`), not an error, when the computation legitimately
    /// cannot produce a value yet (an incomplete recursive self-call during synthesis).
    fn compute(&self, args: &[Value], functions: &Functions, depth: usize) -> Result<Option<Value>, Error>;
}

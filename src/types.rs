//! The type-term algebra: `Var | Num | Bool | List | App`, plus free variables, substitution, and
//! alpha-conversion over it. `App(a, b)` encodes the function arrow `a -> b`; n-ary signatures are
//! right-nested (`a -> b -> c == App(a, App(b, c))`).

use std::collections::HashSet;
use std::fmt;

/// A type term. Structurally immutable — every operation below returns a new term rather than
/// mutating one in place, matching the algebra's use as an immutable value compared by structural
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Var(String),
    Num,
    Bool,
    List(Box<Type>),
    App(Box<Type>, Box<Type>),
}

impl Type {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn list(element: Type) -> Self {
        Self::List(Box::new(element))
    }

    pub fn arrow(from: Type, to: Type) -> Self {
        Self::App(Box::new(from), Box::new(to))
    }

    /// Right-fold a non-empty chain of terms into an arrow type: `[a, b, c] -> a -> b -> c`.
    ///
    /// # Errors
    /// Fails if `terms` is empty — an arrow chain needs at least one term.
    pub fn combine_into_app(mut terms: Vec<Type>) -> Result<Type, crate::error::Error> {
        let last = terms.pop().ok_or_else(|| crate::error::Error::runtime("combine_into_app: empty term list"))?;
        Ok(terms.into_iter().rev().fold(last, |acc, t| Type::arrow(t, acc)))
    }

    /// Given `a1 -> ... -> an -> r`, return `a1 -> ... -> an`.
    ///
    /// # Errors
    /// Fails on an atom (`Var`, `Num`, `Bool`, or `List`) — there is no "last type" to drop.
    pub fn drop_last_type_app(&self) -> Result<Type, crate::error::Error> {
        match self {
            Self::App(a, b) => match b.drop_last_type_app() {
                Ok(rest) => Ok(Type::arrow((**a).clone(), rest)),
                Err(_) => Ok((**a).clone()),
            },
            _ => Err(crate::error::Error::runtime(format!("drop_last_type_app is undefined on the atom {self}"))),
        }
    }

    /// The number of leading `App`s in this signature — a function's arity. A non-arrow signature
    /// has arity 0 (it encodes a nullary constant).
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Self::App(_, b) => 1 + b.arity(),
            _ => 0,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "{name}"),
            Self::Num => write!(f, "Num"),
            Self::Bool => write!(f, "Bool"),
            Self::List(a) => write!(f, "[{a}]"),
            Self::App(a, b) => write!(f, "({a} -> {b})"),
        }
    }
}

/// An ordered pair of type terms representing a unification constraint.
pub type Equation = (Type, Type);

/// The set of free (type) variable names occurring in `t`.
#[must_use]
pub fn free_variables(t: &Type) -> HashSet<String> {
    match t {
        Type::Var(name) => HashSet::from([name.clone()]),
        Type::Num | Type::Bool => HashSet::new(),
        Type::List(a) => free_variables(a),
        Type::App(a, b) => {
            let mut vars = free_variables(a);
            vars.extend(free_variables(b));
            vars
        }
    }
}

/// The set of free variable names occurring anywhere in `equations`.
#[must_use]
pub fn free_variables_equations(equations: &[Equation]) -> HashSet<String> {
    let mut vars = HashSet::new();
    for (lhs, rhs) in equations {
        vars.extend(free_variables(lhs));
        vars.extend(free_variables(rhs));
    }
    vars
}

/// Replace every occurrence of `Var(x)` in `t` with `replacement`.
#[must_use]
pub fn substitute_term(x: &str, replacement: &Type, t: &Type) -> Type {
    match t {
        Type::Var(name) => {
            if name == x {
                replacement.clone()
            } else {
                t.clone()
            }
        }
        Type::Num | Type::Bool => t.clone(),
        Type::List(a) => Type::list(substitute_term(x, replacement, a)),
        Type::App(a, b) => Type::arrow(substitute_term(x, replacement, a), substitute_term(x, replacement, b)),
    }
}

#[must_use]
pub fn substitute_equation(x: &str, replacement: &Type, eq: &Equation) -> Equation {
    (substitute_term(x, replacement, &eq.0), substitute_term(x, replacement, &eq.1))
}

#[must_use]
pub fn substitute_list(x: &str, replacement: &Type, equations: &[Equation]) -> Vec<Equation> {
    equations.iter().map(|eq| substitute_equation(x, replacement, eq)).collect()
}

/// Rename every free variable of `x` to a fresh `{prefix}{offset + i}`, returning the renamed term
/// and the offset one past the last variable consumed (so callers can chain further conversions
/// without colliding names). Iteration order over free variables is unspecified; callers must not
/// depend on which original name maps to which fresh index. `offset` is a `usize`, so the
/// negative-offset precondition this is ported from can never be violated here.
#[must_use]
pub fn alpha_conversion(mut x: Type, prefix: &str, mut offset: usize) -> (Type, usize) {
    let work_set = free_variables(&x);
    for free_variable in work_set {
        let replacement = Type::var(format!("{prefix}{offset}"));
        x = substitute_term(&free_variable, &replacement, &x);
        offset += 1;
    }
    (x, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_variables_of_atoms() {
        assert_eq!(free_variables(&Type::Num), HashSet::new());
        assert_eq!(free_variables(&Type::Bool), HashSet::new());
        assert_eq!(free_variables(&Type::var("a")), HashSet::from(["a".to_string()]));
    }

    #[test]
    fn free_variables_of_compound_terms() {
        let t = Type::arrow(Type::var("a"), Type::list(Type::var("a")));
        assert_eq!(free_variables(&t), HashSet::from(["a".to_string()]));

        let t = Type::arrow(Type::var("a"), Type::var("b"));
        assert_eq!(free_variables(&t), HashSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn substitute_replaces_only_matching_variable() {
        let t = Type::arrow(Type::var("a"), Type::var("b"));
        let substituted = substitute_term("a", &Type::Num, &t);
        assert_eq!(substituted, Type::arrow(Type::Num, Type::var("b")));
    }

    #[test]
    fn alpha_conversion_renames_every_free_variable_once() {
        let t = Type::arrow(Type::Num, Type::arrow(Type::var("a"), Type::var("a")));
        let (renamed, next_offset) = alpha_conversion(t, "new", 0);
        assert_eq!(next_offset, 1);
        assert_eq!(renamed, Type::arrow(Type::Num, Type::arrow(Type::var("new0"), Type::var("new0"))));
    }

    #[test]
    fn alpha_conversion_chains_offset_across_distinct_variables() {
        let t = Type::arrow(Type::Bool, Type::arrow(Type::var("a"), Type::var("b")));
        let (_, next_offset) = alpha_conversion(t, "new", 3);
        assert_eq!(next_offset, 5);
    }

    #[test]
    fn combine_into_app_right_folds() {
        let combined = Type::combine_into_app(vec![Type::Num, Type::Bool, Type::Num]).unwrap();
        assert_eq!(combined, Type::arrow(Type::Num, Type::arrow(Type::Bool, Type::Num)));
    }

    #[test]
    fn combine_into_app_rejects_empty_input() {
        assert!(Type::combine_into_app(vec![]).is_err());
    }

    #[test]
    fn drop_last_type_app_removes_the_return_type() {
        let sig = Type::arrow(Type::Num, Type::arrow(Type::Bool, Type::Num));
        assert_eq!(sig.drop_last_type_app().unwrap(), Type::arrow(Type::Num, Type::Bool));
        assert!(Type::Num.drop_last_type_app().is_err());
    }

    #[test]
    fn arity_counts_leading_arrows() {
        assert_eq!(Type::Num.arity(), 0);
        assert_eq!(Type::arrow(Type::Num, Type::Num).arity(), 1);
        assert_eq!(Type::arrow(Type::Num, Type::arrow(Type::Bool, Type::Num)).arity(), 2);
    }
}

//! First-order unification over [`Type`] with an occurs check and a post-unification support
//! filter. Mirrors the rule set laid out by the teacher's type algebra: delete, decompose,
//! conflict, swap, eliminate, and check (occurs).

use crate::error::Error;
use crate::types::{Equation, Type, free_variables, free_variables_equations, substitute_list};

/// Unify a list of equations, returning the solved list: every remaining equation has a `Var` on
/// the left that does not occur on its own right-hand side, and no two left-hand variables repeat.
///
/// # Errors
/// `Error::NoSolution` if the constraints conflict or fail the occurs check.
/// `Error::UnsupportedType` if the solved set contains a type outside the supported fragment
/// (a list of lists, or a list of functions).
pub fn unify(equations: Vec<Equation>) -> Result<Vec<Equation>, Error> {
    if equations.is_empty() {
        return Ok(Vec::new());
    }

    for idx in 0..equations.len() {
        if let Some(result) = apply_rule(&equations, idx)? {
            return unify(result);
        }
    }

    check_list(&equations)?;
    Ok(equations)
}

/// Try to apply a unification rule to the equation at `idx`. Returns `Ok(Some(new_equations))` if
/// a rule fired, `Ok(None)` if no rule applies to this equation (left as-is).
fn apply_rule(equations: &[Equation], idx: usize) -> Result<Option<Vec<Equation>>, Error> {
    let mut rest: Vec<Equation> = equations.to_vec();
    let (lhs, rhs) = rest.remove(idx);

    if lhs == rhs {
        // delete
        return Ok(Some(rest));
    }

    if !matches!(lhs, Type::Var(_)) && !matches!(rhs, Type::Var(_)) {
        // decompose / conflict
        let mut decomposed = decompose(&lhs, &rhs)?;
        rest.append(&mut decomposed);
        return Ok(Some(rest));
    }

    if !matches!(lhs, Type::Var(_)) && matches!(rhs, Type::Var(_)) {
        // swap
        rest.push((rhs, lhs));
        return Ok(Some(rest));
    }

    if let Type::Var(name) = &lhs {
        let rhs_free = free_variables(&rhs);
        if !rhs_free.contains(name) {
            // eliminate, but only if this variable actually occurs elsewhere — otherwise it is
            // already solved and left untouched (it will fall through to the "no rule applies"
            // return at the bottom, and stay in the solved set as-is).
            if free_variables_equations(&rest).contains(name) {
                let mut substituted = substitute_list(name, &rhs, &rest);
                substituted.push((lhs.clone(), rhs));
                return Ok(Some(substituted));
            }
        } else if !matches!(rhs, Type::Var(_)) {
            // check (occurs)
            return Err(Error::NoSolution { left: lhs, right: rhs });
        }
    }

    Ok(None)
}

/// Decompose `f(a) = f(b)` into `[a = b, ...]` for matching heads, or fail with `NoSolution`.
fn decompose(lhs: &Type, rhs: &Type) -> Result<Vec<Equation>, Error> {
    match (lhs, rhs) {
        (Type::Num, Type::Num) | (Type::Bool, Type::Bool) => Ok(Vec::new()),
        (Type::List(a), Type::List(b)) => Ok(vec![((**a).clone(), (**b).clone())]),
        (Type::App(a, b), Type::App(c, d)) => Ok(vec![((**a).clone(), (**c).clone()), ((**b).clone(), (**d).clone())]),
        _ => Err(Error::NoSolution { left: lhs.clone(), right: rhs.clone() }),
    }
}

/// Check that `term` is within the supported fragment: a `List` may only contain `Num`, `Bool`,
/// or a `Var`; lists of lists and lists of functions are rejected.
fn check_type(term: &Type) -> Result<(), Error> {
    match term {
        Type::Var(_) | Type::Num | Type::Bool => Ok(()),
        Type::List(a) => match a.as_ref() {
            Type::Num | Type::Bool | Type::Var(_) => Ok(()),
            _ => Err(Error::UnsupportedType { ty: term.clone() }),
        },
        Type::App(a, b) => {
            check_type(a)?;
            check_type(b)
        }
    }
}

fn check_list(equations: &[Equation]) -> Result<(), Error> {
    for (lhs, rhs) in equations {
        check_type(lhs)?;
        check_type(rhs)?;
    }
    Ok(())
}

//! Runtime values and the helpers that map them onto [`Type`] terms for unification.

use crate::error::Error;
use crate::types::{Type, alpha_conversion};

/// Prefix for the fresh type variables `infer_argument_signature` allocates per argument.
pub const ARGUMENT_TYPE_PREFIX: &str = "z";
/// Prefix for the fresh type variables a function's own signature is alpha-converted under.
pub const FUNCTION_TYPE_PREFIX: &str = "y";

/// The primitive element type lists are restricted to — functions are first-class values but are
/// never stored inside a list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// A runtime value. The "unknown" sentinel of the demonstration engine is represented as
/// `Option<Value>` at call sites, never as a variant here — a value that claims to be a `Value`
/// really is one.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Primitive>),
    Function(crate::function::FunctionId),
}

impl Value {
    #[must_use]
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Self::Int(v) => Some(Primitive::Int(*v)),
            Self::Float(v) => Some(Primitive::Float(*v)),
            Self::Bool(v) => Some(Primitive::Bool(*v)),
            Self::List(_) | Self::Function(_) => None,
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::Int(v) => Self::Int(v),
            Primitive::Float(v) => Self::Float(v),
            Primitive::Bool(v) => Self::Bool(v),
        }
    }
}

/// Map a runtime value to the type term used during unification.
///
/// An empty list always yields a fresh `List(Var("a"))` — callers that combine several inferred
/// types (e.g. [`infer_argument_signature`]) must alpha-convert independently so two different
/// empty-list arguments are not accidentally forced to the same element type.
///
/// A non-empty list is typed by its *first* element only — homogeneity is not checked here. This
/// mirrors the split deliberately: the system enforces list homogeneity only at list create/update
/// time (`lists.rs`), not while inferring a type from an already-existing value. See DESIGN.md.
#[must_use]
pub fn infer_value_type(value: &Value) -> Type {
    match value {
        Value::Bool(_) => Type::Bool,
        Value::Int(_) | Value::Float(_) => Type::Num,
        Value::List(elements) => match elements.first() {
            None => Type::list(Type::var("a")),
            Some(first) => Type::list(infer_value_type(&Value::from(*first))),
        },
        Value::Function(id) => id.signature.clone(),
    }
}

/// The set of element types that may legally be added to a list shaped like `value`. Empty if
/// `value` is not a list.
#[must_use]
pub fn supported_element_types(value: &Value) -> Vec<Type> {
    match infer_value_type(value) {
        Type::List(inner) => match *inner {
            Type::Var(_) => vec![Type::Num, Type::Bool],
            Type::Num => vec![Type::Num],
            Type::Bool => vec![Type::Bool],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Given a non-empty list of argument values, infer each one's type independently, alpha-convert
/// each under a shared running offset (so two arguments never collide, and one argument's fresh
/// variables are never forced equal to another's), then right-fold into an arrow chain.
///
/// Combination must happen *after* independent alpha-conversion of each argument — combining first
/// would force, for instance, two empty-list arguments to share one element-type variable, which is
/// a stronger constraint than the values actually demonstrate.
///
/// # Errors
/// `Error::RuntimeError` if `args` is empty.
pub fn infer_argument_signature(args: &[Value]) -> Result<Type, Error> {
    if args.is_empty() {
        return Err(Error::runtime("infer_argument_signature: empty argument list"));
    }
    let mut offset = 0;
    let mut arg_types = Vec::with_capacity(args.len());
    for arg in args {
        let (converted, next_offset) = alpha_conversion(infer_value_type(arg), ARGUMENT_TYPE_PREFIX, offset);
        arg_types.push(converted);
        offset = next_offset;
    }
    Type::combine_into_app(arg_types)
}

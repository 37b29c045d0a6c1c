//! The fixed catalogue of built-in functions (§4.4) and their compute semantics.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::Error;
use crate::function::Function;
use crate::functions::Functions;
use crate::types::Type;
use crate::value::{Primitive, Value};

/// Every built-in operator the system supports, named exactly as it appears verbatim inside an
/// instruction expression (`get_computation`'s naming convention, spec.md §6). Deriving
/// `Display`/`EnumString`/`IntoStaticStr` keeps the on-the-wire name and the Rust identifier
/// mechanically in sync, the same role the reference crate's `ExcType` enum plays for exception
/// kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter)]
pub enum BuiltinOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "//")]
    FloorDiv,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "len")]
    Len,
    #[strum(serialize = "head")]
    Head,
    #[strum(serialize = "last")]
    Last,
    #[strum(serialize = "tail")]
    Tail,
    #[strum(serialize = "init")]
    Init,
    #[strum(serialize = "concat")]
    Concat,
    #[strum(serialize = "map")]
    Map,
    #[strum(serialize = "filter")]
    Filter,
    #[strum(serialize = "cons")]
    Cons,
}

impl BuiltinOp {
    /// This operator's declared type signature, with fresh `y`-prefixed variables per call site —
    /// callers alpha-convert on use the same way a demonstration's `add_constant` does for any
    /// other constant value.
    #[must_use]
    pub fn signature(self) -> Type {
        let y0 = Type::var("y0");
        let y1 = Type::var("y1");
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::FloorDiv | Self::Mod => {
                Type::arrow(Type::Num, Type::arrow(Type::Num, Type::Num))
            }
            Self::Eq | Self::Ne | Self::Gt | Self::Lt | Self::Ge | Self::Le => {
                Type::arrow(Type::Num, Type::arrow(Type::Num, Type::Bool))
            }
            Self::And | Self::Or => Type::arrow(Type::Bool, Type::arrow(Type::Bool, Type::Bool)),
            Self::Not => Type::arrow(Type::Bool, Type::Bool),
            Self::Len => Type::arrow(Type::list(y0), Type::Num),
            Self::Head | Self::Last => Type::arrow(Type::list(y0.clone()), y0),
            Self::Tail | Self::Init => Type::arrow(Type::list(y0.clone()), Type::list(y0)),
            Self::Concat => {
                Type::arrow(Type::list(y0.clone()), Type::arrow(Type::list(y0.clone()), Type::list(y0)))
            }
            Self::Map => Type::arrow(
                Type::arrow(y0.clone(), y1.clone()),
                Type::arrow(Type::list(y0), Type::list(y1)),
            ),
            // Corrected vs. the reference's ambiguous signature: the output element type is the
            // *same* variable as the input element type, tying filter's result list to its input
            // list instead of leaving it unconstrained. See DESIGN.md.
            Self::Filter => Type::arrow(
                Type::arrow(y0.clone(), Type::Bool),
                Type::arrow(Type::list(y0.clone()), Type::list(y0)),
            ),
            Self::Cons => Type::arrow(y0.clone(), Type::arrow(Type::list(y0.clone()), Type::list(y0))),
        }
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => unreachable!("arithmetic builtin called with a non-numeric argument past type checking"),
    }
}

fn both_int(a: &Value, b: &Value) -> bool {
    matches!((a, b), (Value::Int(_), Value::Int(_)))
}

fn int_of(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        _ => unreachable!("int_of called on a non-int past the both_int guard"),
    }
}

/// Python `//`: floors the quotient toward negative infinity, rather than truncating toward zero.
fn floor_div_i64(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) { q - 1 } else { q }
}

/// Python `%`: the remainder takes the divisor's sign.
fn floor_mod_i64(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
}

/// Python `%` on floats: same sign convention as [`floor_mod_i64`].
fn floor_mod_f64(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
}

fn list_of(v: &Value) -> Result<&Vec<Primitive>, Error> {
    match v {
        Value::List(elems) => Ok(elems),
        _ => Err(Error::runtime("expected a list argument")),
    }
}

/// Built-in primitive function: operator identity plus an alpha-converted signature captured at
/// construction and a unique id assigned by the owning [`Functions`] registry.
#[derive(Debug, Clone)]
pub struct BuiltinFunction {
    op: BuiltinOp,
    signature: Type,
    unique_id: u64,
}

impl BuiltinFunction {
    #[must_use]
    pub fn new(op: BuiltinOp, unique_id: u64) -> Self {
        Self { signature: op.signature(), op, unique_id }
    }

    #[must_use]
    pub fn op(&self) -> BuiltinOp {
        self.op
    }
}

impl Function for BuiltinFunction {
    fn signature(&self) -> &Type {
        &self.signature
    }

    fn unique_id(&self) -> u64 {
        self.unique_id
    }

    fn compute(&self, args: &[Value], functions: &Functions, depth: usize) -> Result<Option<Value>, Error> {
        match self.op {
            BuiltinOp::Add => Ok(Some(if both_int(&args[0], &args[1]) {
                Value::Int(int_of(&args[0]) + int_of(&args[1]))
            } else {
                Value::Float(as_f64(&args[0]) + as_f64(&args[1]))
            })),
            BuiltinOp::Sub => Ok(Some(if both_int(&args[0], &args[1]) {
                Value::Int(int_of(&args[0]) - int_of(&args[1]))
            } else {
                Value::Float(as_f64(&args[0]) - as_f64(&args[1]))
            })),
            BuiltinOp::Mul => Ok(Some(if both_int(&args[0], &args[1]) {
                Value::Int(int_of(&args[0]) * int_of(&args[1]))
            } else {
                Value::Float(as_f64(&args[0]) * as_f64(&args[1]))
            })),
            BuiltinOp::Div => {
                let divisor = as_f64(&args[1]);
                if divisor == 0.0 {
                    return Err(Error::runtime("divide by zero"));
                }
                Ok(Some(Value::Float(as_f64(&args[0]) / divisor)))
            }
            BuiltinOp::FloorDiv => {
                if both_int(&args[0], &args[1]) {
                    let divisor = int_of(&args[1]);
                    if divisor == 0 {
                        return Err(Error::runtime("divide by zero"));
                    }
                    Ok(Some(Value::Int(floor_div_i64(int_of(&args[0]), divisor))))
                } else {
                    let divisor = as_f64(&args[1]);
                    if divisor == 0.0 {
                        return Err(Error::runtime("divide by zero"));
                    }
                    Ok(Some(Value::Float((as_f64(&args[0]) / divisor).floor())))
                }
            }
            BuiltinOp::Mod => {
                if both_int(&args[0], &args[1]) {
                    let divisor = int_of(&args[1]);
                    if divisor == 0 {
                        return Err(Error::runtime("divide by zero"));
                    }
                    Ok(Some(Value::Int(floor_mod_i64(int_of(&args[0]), divisor))))
                } else {
                    let divisor = as_f64(&args[1]);
                    if divisor == 0.0 {
                        return Err(Error::runtime("divide by zero"));
                    }
                    Ok(Some(Value::Float(floor_mod_f64(as_f64(&args[0]), divisor))))
                }
            }
            BuiltinOp::Eq => Ok(Some(Value::Bool(as_f64(&args[0]) == as_f64(&args[1])))),
            BuiltinOp::Ne => Ok(Some(Value::Bool(as_f64(&args[0]) != as_f64(&args[1])))),
            BuiltinOp::Gt => Ok(Some(Value::Bool(as_f64(&args[0]) > as_f64(&args[1])))),
            BuiltinOp::Lt => Ok(Some(Value::Bool(as_f64(&args[0]) < as_f64(&args[1])))),
            BuiltinOp::Ge => Ok(Some(Value::Bool(as_f64(&args[0]) >= as_f64(&args[1])))),
            BuiltinOp::Le => Ok(Some(Value::Bool(as_f64(&args[0]) <= as_f64(&args[1])))),
            BuiltinOp::And => {
                let Value::Bool(a) = args[0] else { unreachable!() };
                let Value::Bool(b) = args[1] else { unreachable!() };
                Ok(Some(Value::Bool(a && b)))
            }
            BuiltinOp::Or => {
                let Value::Bool(a) = args[0] else { unreachable!() };
                let Value::Bool(b) = args[1] else { unreachable!() };
                Ok(Some(Value::Bool(a || b)))
            }
            BuiltinOp::Not => {
                let Value::Bool(a) = args[0] else { unreachable!() };
                Ok(Some(Value::Bool(!a)))
            }
            BuiltinOp::Len => Ok(Some(Value::Int(list_of(&args[0])?.len() as i64))),
            BuiltinOp::Head => {
                let list = list_of(&args[0])?;
                let first = list.first().ok_or_else(|| Error::runtime("head of an empty list"))?;
                Ok(Some(Value::from(*first)))
            }
            BuiltinOp::Last => {
                let list = list_of(&args[0])?;
                let last = list.last().ok_or_else(|| Error::runtime("last of an empty list"))?;
                Ok(Some(Value::from(*last)))
            }
            BuiltinOp::Tail => {
                let list = list_of(&args[0])?;
                if list.is_empty() {
                    return Err(Error::runtime("tail of an empty list"));
                }
                Ok(Some(Value::List(list[1..].to_vec())))
            }
            BuiltinOp::Init => {
                let list = list_of(&args[0])?;
                if list.is_empty() {
                    return Err(Error::runtime("init of an empty list"));
                }
                Ok(Some(Value::List(list[..list.len() - 1].to_vec())))
            }
            BuiltinOp::Concat => {
                let mut left = list_of(&args[0])?.clone();
                let right = list_of(&args[1])?;
                left.extend_from_slice(right);
                Ok(Some(Value::List(left)))
            }
            BuiltinOp::Cons => {
                let head = args[0].as_primitive().ok_or_else(|| Error::runtime("cons expects a primitive head"))?;
                let mut tail = list_of(&args[1])?.clone();
                tail.insert(0, head);
                Ok(Some(Value::List(tail)))
            }
            BuiltinOp::Map => {
                let Value::Function(handle) = &args[0] else { unreachable!() };
                let list = list_of(&args[1])?;
                let mut result = Vec::with_capacity(list.len());
                for elem in list {
                    let mapped = functions
                        .call(&handle.name, vec![Some(Value::from(*elem))], depth + 1)?
                        .ok_or_else(|| Error::runtime("map: function argument produced no value"))?;
                    let primitive = mapped.as_primitive().ok_or_else(|| Error::runtime("map: function argument returned a non-primitive"))?;
                    result.push(primitive);
                }
                Ok(Some(Value::List(result)))
            }
            BuiltinOp::Filter => {
                let Value::Function(handle) = &args[0] else { unreachable!() };
                let list = list_of(&args[1])?;
                let mut result = Vec::with_capacity(list.len());
                for elem in list {
                    let keep = functions
                        .call(&handle.name, vec![Some(Value::from(*elem))], depth + 1)?
                        .ok_or_else(|| Error::runtime("filter: predicate produced no value"))?;
                    match keep {
                        Value::Bool(true) => result.push(*elem),
                        Value::Bool(false) => {}
                        _ => return Err(Error::runtime("filter: predicate did not return a bool")),
                    }
                }
                Ok(Some(Value::List(result)))
            }
        }
    }
}

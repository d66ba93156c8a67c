//! Expression evaluation
//!
//! Argument text of calls and value-taking commands is parsed into an `Expr`
//! and evaluated here against the current scope. `^` reads the mem register,
//! which empties it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::builtins::{call_builtin, Builtin};
use super::errors::ExecError;
use super::namespace::Namespaces;
use super::scope::{Mem, Scope};
use super::types::{BinaryOp, Expr, UnaryOp, Value};
use crate::interpreter::parser::parse_expression;

/// Largest string `str * int` may build, in bytes
const MAX_REPEAT_LEN: usize = 1 << 28;

/* ===================== Environment ===================== */

/// Read-only view of the names an expression can see
pub struct Env<'a> {
    pub scope: &'a Scope,
    pub namespaces: &'a Namespaces,
}

impl<'a> Env<'a> {
    /// Resolve `$name`: exact name first, then qualified by each used namespace
    pub fn lookup(&self, name: &str) -> Result<&'a Value, ExecError> {
        let scope = self.scope;
        self.namespaces
            .variable_candidates(name)
            .iter()
            .find_map(|candidate| scope.get(candidate))
            .ok_or_else(|| ExecError::UndefinedVariable(name.to_string()))
    }

    /// Name a `$name` reference would resolve to, if it resolves at all
    pub fn resolve_name(&self, name: &str) -> Option<String> {
        self.namespaces
            .variable_candidates(name)
            .into_iter()
            .find(|candidate| self.scope.contains(candidate))
    }
}

/* ===================== Evaluation ===================== */

/// Parse and evaluate argument text
pub fn eval_source(source: &str, env: &Env, mem: &mut Mem) -> Result<Value, ExecError> {
    let expr = parse_expression(source)?;
    eval_expr(&expr, env, mem)
}

/// Evaluate an expression to a value
pub fn eval_expr(expr: &Expr, env: &Env, mem: &mut Mem) -> Result<Value, ExecError> {
    match expr {
        Expr::Lit { v } => Ok(v.clone()),

        Expr::Var { name } => env.lookup(name).cloned(),

        Expr::Mem => Ok(mem.take().unwrap_or(Value::Null)),

        Expr::Array { items } => items
            .iter()
            .map(|item| eval_expr(item, env, mem))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),

        Expr::Map { entries } => {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                let key = match eval_expr(key, env, mem)? {
                    Value::Str(s) => s,
                    Value::Int(n) => n.to_string(),
                    other => {
                        return Err(ExecError::Type(format!(
                            "map keys must be str or int, not {}",
                            other.type_name()
                        )))
                    }
                };
                map.insert(key, eval_expr(value, env, mem)?);
            }
            Ok(Value::Map(map))
        }

        Expr::Call { name, args } => {
            let builtin = Builtin::lookup(name)
                .ok_or_else(|| ExecError::Runtime(format!("unknown function \"{}\"", name)))?;
            let values = args
                .iter()
                .map(|arg| eval_expr(arg, env, mem))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(builtin, &values)
        }

        Expr::Index { target, index } => {
            let target = eval_expr(target, env, mem)?;
            let index = eval_expr(index, env, mem)?;
            index_value(&target, &index)
        }

        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, env, mem)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Int(n) => n
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| ExecError::Runtime("integer overflow".to_string())),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(ExecError::Type(format!(
                        "bad operand type for unary -: '{}'",
                        other.type_name()
                    ))),
                },
            }
        }

        Expr::Binary { op, lhs, rhs } => match op {
            // Short-circuit
            BinaryOp::Or => {
                let left = eval_expr(lhs, env, mem)?;
                if left.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(eval_expr(rhs, env, mem)?.is_truthy()))
            }
            BinaryOp::And => {
                let left = eval_expr(lhs, env, mem)?;
                if !left.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(eval_expr(rhs, env, mem)?.is_truthy()))
            }
            _ => {
                let left = eval_expr(lhs, env, mem)?;
                let right = eval_expr(rhs, env, mem)?;
                binary(*op, left, right)
            }
        },
    }
}

/* ===================== Operators ===================== */

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, ExecError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(op, &left, &right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => arithmetic(op, left, right, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => match (left, right) {
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => repeat(&s, n),
            (left, right) => arithmetic(op, left, right, i64::checked_mul, |a, b| a * b),
        },
        BinaryOp::Div => {
            let (a, b) = both_floats(op, &left, &right)?;
            if b == 0.0 {
                return Err(ExecError::DivisionByZero);
            }
            Ok(Value::Float(a / b))
        }
        BinaryOp::Rem => match (&left, &right) {
            (Value::Int(_), Value::Int(0)) => Err(ExecError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => {
                // sign follows the divisor
                let r = a % b;
                let r = if r != 0 && (r < 0) != (*b < 0) { r + b } else { r };
                Ok(Value::Int(r))
            }
            _ => {
                let (a, b) = both_floats(op, &left, &right)?;
                if b == 0.0 {
                    return Err(ExecError::DivisionByZero);
                }
                let r = a % b;
                let r = if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r };
                Ok(Value::Float(r))
            }
        },
        BinaryOp::Or | BinaryOp::And => unreachable!("logical operators short-circuit"),
    }
}

fn add(left: Value, right: Value) -> Result<Value, ExecError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Ok(Value::Array(a))
        }
        (Value::Map(mut a), Value::Map(b)) => {
            a.extend(b);
            Ok(Value::Map(a))
        }
        (left, right) => arithmetic(BinaryOp::Add, left, right, i64::checked_add, |a, b| a + b),
    }
}

/// Numeric operator: int op int stays int (overflow is an error), anything
/// mixed with a float becomes float
/// `str * int`; a negative count gives `''`
fn repeat(s: &str, count: i64) -> Result<Value, ExecError> {
    let too_large = || ExecError::Runtime("repeated string too large".to_string());
    let count = usize::try_from(count.max(0)).map_err(|_| too_large())?;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::Str(s.repeat(count))),
        _ => Err(too_large()),
    }
}

fn arithmetic(
    op: BinaryOp,
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, ExecError> {
    if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
        return int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| ExecError::Runtime("integer overflow".to_string()));
    }
    let (a, b) = both_floats(op, &left, &right)?;
    Ok(Value::Float(float_op(a, b)))
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn both_floats(op: BinaryOp, left: &Value, right: &Value) -> Result<(f64, f64), ExecError> {
    match (as_float(left), as_float(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(op, left, right)),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            as_float(left) == as_float(right)
        }
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Ordering, ExecError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => {
            let (a, b) = both_floats(op, left, right)?;
            a.partial_cmp(&b).ok_or_else(|| unsupported(op, left, right))
        }
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> ExecError {
    ExecError::Type(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

/* ===================== Indexing ===================== */

fn index_value(target: &Value, index: &Value) -> Result<Value, ExecError> {
    match (target, index) {
        (Value::Array(items), Value::Int(i)) => {
            let pos = normalize_index(*i, items.len())?;
            Ok(items[pos].clone())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let pos = normalize_index(*i, chars.len())?;
            Ok(Value::Str(chars[pos].to_string()))
        }
        (Value::Map(entries), Value::Str(key)) => entries
            .get(key)
            .cloned()
            .ok_or_else(|| ExecError::KeyNotFound(key.clone())),
        (Value::Map(entries), Value::Int(n)) => entries
            .get(&n.to_string())
            .cloned()
            .ok_or_else(|| ExecError::KeyNotFound(n.to_string())),
        _ => Err(ExecError::Type(format!(
            "{} cannot be indexed by {}",
            target.type_name(),
            index.type_name()
        ))),
    }
}

/// Negative indexes count from the end
fn normalize_index(index: i64, len: usize) -> Result<usize, ExecError> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved as usize >= len {
        return Err(ExecError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

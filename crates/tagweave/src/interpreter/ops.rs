/*
 * ops.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Operators on runtime values: arithmetic, comparison, membership,
//! iteration and subscripting.

use std::cmp::Ordering;

use super::EvalError;
use crate::fragment::ast::{BinaryOp, CompareOp, UnaryOp};
use crate::value::Value;

/// Longest string or list a repetition may build.
const MAX_REPEAT_LEN: usize = 1 << 28;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

/// An integer operand (`bool` counts as an integer).
pub(crate) fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn unsupported(op: BinaryOp, l: &Value, r: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        l.type_name(),
        r.type_name()
    ))
}

pub(crate) fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    let symbol = match op {
        UnaryOp::Neg => "-",
        UnaryOp::Pos => "+",
    };
    match (op, as_num(&value)) {
        (UnaryOp::Neg, Some(Num::Int(i))) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOp::Neg, Some(Num::Float(f))) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Num::Float(f))) => Ok(Value::Float(f)),
        (_, None) => Err(EvalError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            value.type_name()
        ))),
    }
}

fn overflow() -> EvalError {
    EvalError::new("OverflowError", "integer overflow")
}

pub(crate) fn binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, EvalError> {
    match (op, &l, &r) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(s), n) | (BinaryOp::Mul, n, Value::Str(s))
            if as_int(n).is_some() =>
        {
            let count = repeat_count(as_int(n).unwrap_or(0), s.len())?;
            Ok(Value::Str(s.repeat(count)))
        }
        (BinaryOp::Mul, Value::List(items), n) | (BinaryOp::Mul, n, Value::List(items))
            if as_int(n).is_some() =>
        {
            let count = repeat_count(as_int(n).unwrap_or(0), items.len())?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(out))
        }
        _ => numeric(op, &l, &r),
    }
}

fn repeat_count(n: i64, len: usize) -> Result<usize, EvalError> {
    let count = usize::try_from(n.max(0)).map_err(|_| overflow())?;
    if len.saturating_mul(count) > MAX_REPEAT_LEN {
        return Err(EvalError::new("MemoryError", "repeated sequence is too long"));
    }
    Ok(count)
}

fn numeric(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (as_num(l), as_num(r)) else {
        return Err(unsupported(op, l, r));
    };
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => int_op(op, x, y),
        _ => float_op(op, a.as_f64(), b.as_f64()),
    }
}

fn int_op(op: BinaryOp, x: i64, y: i64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => x.checked_add(y).ok_or_else(overflow)?,
        BinaryOp::Sub => x.checked_sub(y).ok_or_else(overflow)?,
        BinaryOp::Mul => x.checked_mul(y).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if y == 0 {
                return Err(EvalError::zero_division("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(EvalError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            let q = x.checked_div(y).ok_or_else(overflow)?;
            if x % y != 0 && ((x < 0) != (y < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(EvalError::zero_division("integer modulo by zero"));
            }
            let r = x.checked_rem(y).unwrap_or(0);
            if r != 0 && ((r < 0) != (y < 0)) {
                r + y
            } else {
                r
            }
        }
    };
    Ok(Value::Int(value))
}

fn float_op(op: BinaryOp, x: f64, y: f64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(EvalError::zero_division("float division by zero"));
            }
            x / y
        }
        BinaryOp::FloorDiv => {
            if y == 0.0 {
                return Err(EvalError::zero_division("float floor division by zero"));
            }
            (x / y).floor()
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                return Err(EvalError::zero_division("float modulo"));
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
    };
    Ok(Value::Float(value))
}

/// Python `==`: numbers compare by value across int, float and bool.
pub(crate) fn py_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| py_eq(p, q))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| py_eq(v, other)))
        }
        _ => match (as_num(a), as_num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => x == y,
            (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
            _ => false,
        },
    }
}

/// Ordering for `<`-style comparisons. `None` means unordered (NaN).
pub(crate) fn compare(a: &Value, b: &Value, symbol: &str) -> Result<Option<Ordering>, EvalError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::List(x), Value::List(y)) => {
            for (p, q) in x.iter().zip(y) {
                if !py_eq(p, q) {
                    return compare(p, q, symbol);
                }
            }
            Ok(Some(x.len().cmp(&y.len())))
        }
        _ => match (as_num(a), as_num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => Ok(Some(x.cmp(&y))),
            (Some(x), Some(y)) => Ok(x.as_f64().partial_cmp(&y.as_f64())),
            _ => Err(EvalError::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                symbol,
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

/// `is` only distinguishes the singletons `None`, `True` and `False`.
pub(crate) fn is_same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => false,
    }
}

pub(crate) fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(s) => match item {
            Value::Str(needle) => Ok(s.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.iter().any(|v| py_eq(v, item))),
        Value::Dict(map) => Ok(matches!(item, Value::Str(k) if map.contains_key(k))),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

pub(crate) fn compare_op(op: CompareOp, a: &Value, b: &Value) -> Result<bool, EvalError> {
    let symbol = op.symbol();
    Ok(match op {
        CompareOp::Eq => py_eq(a, b),
        CompareOp::NotEq => !py_eq(a, b),
        CompareOp::Lt => compare(a, b, symbol)? == Some(Ordering::Less),
        CompareOp::LtE => matches!(
            compare(a, b, symbol)?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Gt => compare(a, b, symbol)? == Some(Ordering::Greater),
        CompareOp::GtE => matches!(
            compare(a, b, symbol)?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::In => contains(b, a)?,
        CompareOp::NotIn => !contains(b, a)?,
        CompareOp::Is => is_same(a, b),
        CompareOp::IsNot => !is_same(a, b),
    })
}

/// The items a `for` loop visits: list items, dict keys or characters.
pub(crate) fn iterate(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Dict(map) => Ok(map.keys().map(|k| Value::Str(k.clone())).collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(EvalError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

/// Resolve a possibly negative index against a length.
fn normalize(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

fn key_error(key: &Value) -> EvalError {
    EvalError::new("KeyError", key.repr())
}

pub(crate) fn index(value: &Value, index: &Value) -> Result<Value, EvalError> {
    match value {
        Value::List(items) => {
            let i = as_int(index).ok_or_else(|| {
                EvalError::type_error(format!(
                    "list indices must be integers or slices, not {}",
                    index.type_name()
                ))
            })?;
            normalize(i, items.len())
                .and_then(|i| items.get(i).cloned())
                .ok_or_else(|| EvalError::new("IndexError", "list index out of range"))
        }
        Value::Str(s) => {
            let i = as_int(index).ok_or_else(|| {
                EvalError::type_error(format!(
                    "string indices must be integers, not '{}'",
                    index.type_name()
                ))
            })?;
            let chars: Vec<char> = s.chars().collect();
            normalize(i, chars.len())
                .map(|i| Value::Str(chars[i].to_string()))
                .ok_or_else(|| EvalError::new("IndexError", "string index out of range"))
        }
        Value::Dict(map) => match index {
            Value::Str(key) => map.get(key).cloned().ok_or_else(|| key_error(index)),
            other => Err(key_error(other)),
        },
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn slice_bound(bound: Option<&Value>) -> Result<Option<i64>, EvalError> {
    match bound {
        None | Some(Value::None) => Ok(None),
        Some(v) => as_int(v).map(Some).ok_or_else(|| {
            EvalError::type_error("slice indices must be integers or None")
        }),
    }
}

fn slice_range(start: Option<i64>, stop: Option<i64>, len: usize) -> (usize, usize) {
    let n = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |i: i64| -> usize {
        let i = if i < 0 { (i + n).max(0) } else { i.min(n) };
        usize::try_from(i).unwrap_or(0)
    };
    let lo = start.map_or(0, clamp);
    let hi = stop.map_or(len, clamp);
    (lo, hi.max(lo))
}

pub(crate) fn slice(
    value: &Value,
    start: Option<&Value>,
    stop: Option<&Value>,
) -> Result<Value, EvalError> {
    let (start, stop) = (slice_bound(start)?, slice_bound(stop)?);
    match value {
        Value::List(items) => {
            let (lo, hi) = slice_range(start, stop, items.len());
            Ok(Value::List(items[lo..hi].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (lo, hi) = slice_range(start, stop, chars.len());
            Ok(Value::Str(chars[lo..hi].iter().collect()))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Mutable access to `value[key]`, for nested assignment.
pub(crate) fn item_mut<'v>(value: &'v mut Value, key: &Value) -> Result<&'v mut Value, EvalError> {
    match value {
        Value::List(items) => {
            let i = as_int(key).ok_or_else(|| {
                EvalError::type_error(format!(
                    "list indices must be integers or slices, not {}",
                    key.type_name()
                ))
            })?;
            let len = items.len();
            normalize(i, len)
                .and_then(move |i| items.get_mut(i))
                .ok_or_else(|| EvalError::new("IndexError", "list index out of range"))
        }
        Value::Dict(map) => match key {
            Value::Str(k) => map.get_mut(k).ok_or_else(|| key_error(key)),
            other => Err(key_error(other)),
        },
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `value[key] = item`.
pub(crate) fn set_item(value: &mut Value, key: &Value, item: Value) -> Result<(), EvalError> {
    match value {
        Value::List(items) => {
            let i = as_int(key).ok_or_else(|| {
                EvalError::type_error(format!(
                    "list indices must be integers or slices, not {}",
                    key.type_name()
                ))
            })?;
            let slot = normalize(i, items.len())
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| EvalError::new("IndexError", "list assignment index out of range"))?;
            *slot = item;
            Ok(())
        }
        Value::Dict(map) => match key {
            Value::Str(k) => {
                map.insert(k.clone(), item);
                Ok(())
            }
            other => Err(EvalError::type_error(format!(
                "dict keys must be strings, not '{}'",
                other.type_name()
            ))),
        },
        other => Err(EvalError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

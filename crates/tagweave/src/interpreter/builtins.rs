/*
 * builtins.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Builtin functions and the methods of `str`, `list` and `dict`.

use std::cmp::Ordering;

use indexmap::IndexMap;

use super::ops::{self, as_int};
use super::{EvalError, OutputCapture};
use crate::fragment::ast::BinaryOp;
use crate::value::Value;

/// Names callable without a context binding.
const BUILTINS: &[&str] = &[
    "abs", "bool", "dict", "enumerate", "float", "int", "len", "list", "max", "min", "print",
    "range", "repr", "round", "sorted", "str", "sum",
];

/// Largest list `range()` may produce.
const MAX_RANGE_LEN: i64 = 10_000_000;

pub(super) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Positional and keyword arguments of one call.
struct Args {
    function: String,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl Args {
    fn new(function: &str, positional: Vec<Value>, keywords: Vec<(String, Value)>) -> Self {
        Args {
            function: function.to_string(),
            positional,
            keywords,
        }
    }

    fn arity(&self, min: usize, max: usize) -> Result<(), EvalError> {
        let given = self.positional.len();
        if (min..=max).contains(&given) {
            return Ok(());
        }
        let expected = if min == max {
            format!(
                "exactly {} argument{}",
                min,
                if min == 1 { "" } else { "s" }
            )
        } else if max == usize::MAX {
            format!("at least {} argument{}", min, if min == 1 { "" } else { "s" })
        } else {
            format!("from {} to {} arguments", min, max)
        };
        Err(EvalError::type_error(format!(
            "{}() takes {} ({} given)",
            self.function, expected, given
        )))
    }

    fn keyword(&mut self, name: &str) -> Option<Value> {
        let position = self.keywords.iter().position(|(k, _)| k == name)?;
        Some(self.keywords.remove(position).1)
    }

    /// Positional argument `index`, else keyword `name`.
    fn take(&mut self, index: usize, name: &str) -> Option<Value> {
        match self.positional.get(index) {
            Some(value) => Some(value.clone()),
            None => self.keyword(name),
        }
    }

    /// Reject leftover keyword arguments.
    fn finish(&self) -> Result<(), EvalError> {
        match self.keywords.first() {
            Some((name, _)) => Err(EvalError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                self.function, name
            ))),
            None => Ok(()),
        }
    }

    fn first(&self) -> Value {
        self.positional.first().cloned().unwrap_or_default()
    }
}

fn expect_int(value: &Value) -> Result<i64, EvalError> {
    as_int(value).ok_or_else(|| {
        EvalError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn optional_str(function: &str, name: &str, value: Option<Value>) -> Result<Option<String>, EvalError> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(Value::Str(s)) => Ok(Some(s)),
        Some(other) => Err(EvalError::type_error(format!(
            "{}() {} must be None or a string, not {}",
            function,
            name,
            other.type_name()
        ))),
    }
}

/// Call builtin `name`. Only `print` writes output.
pub(super) fn call(
    name: &str,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
    output: &mut OutputCapture,
) -> Result<Value, EvalError> {
    let mut args = Args::new(name, positional, keywords);
    match name {
        "print" => {
            let sep = optional_str(name, "sep", args.keyword("sep"))?;
            let end = optional_str(name, "end", args.keyword("end"))?;
            args.finish()?;
            let parts: Vec<String> = args.positional.iter().map(Value::to_str).collect();
            output.write(&parts.join(sep.as_deref().unwrap_or(" ")));
            output.write(end.as_deref().unwrap_or("\n"));
            Ok(Value::None)
        }
        "len" => {
            args.arity(1, 1)?;
            args.finish()?;
            let length = match &args.positional[0] {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Dict(map) => map.len(),
                other => {
                    return Err(EvalError::type_error(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    )));
                }
            };
            Ok(Value::Int(i64::try_from(length).unwrap_or(i64::MAX)))
        }
        "range" => {
            args.arity(1, 3)?;
            args.finish()?;
            let bounds = args
                .positional
                .iter()
                .map(expect_int)
                .collect::<Result<Vec<_>, _>>()?;
            let (start, stop, step) = match bounds.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step, ..] => (*start, *stop, *step),
                [] => (0, 0, 1),
            };
            range(start, stop, step)
        }
        "str" => {
            args.arity(0, 1)?;
            args.finish()?;
            Ok(Value::Str(
                args.positional.first().map(Value::to_str).unwrap_or_default(),
            ))
        }
        "repr" => {
            args.arity(1, 1)?;
            args.finish()?;
            Ok(Value::Str(args.positional[0].repr()))
        }
        "int" => {
            args.arity(0, 1)?;
            args.finish()?;
            to_int(args.positional.first().unwrap_or(&Value::Int(0)))
        }
        "float" => {
            args.arity(0, 1)?;
            args.finish()?;
            to_float(args.positional.first().unwrap_or(&Value::Float(0.0)))
        }
        "bool" => {
            args.arity(0, 1)?;
            args.finish()?;
            Ok(Value::Bool(args.first().is_truthy()))
        }
        "abs" => {
            args.arity(1, 1)?;
            args.finish()?;
            match &args.positional[0] {
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                Value::Int(i) => i.checked_abs().map(Value::Int).ok_or_else(|| {
                    EvalError::new("OverflowError", "integer overflow")
                }),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(EvalError::type_error(format!(
                    "bad operand type for abs(): '{}'",
                    other.type_name()
                ))),
            }
        }
        "min" | "max" => {
            args.arity(1, usize::MAX)?;
            args.finish()?;
            let items = if args.positional.len() == 1 {
                ops::iterate(&args.positional[0])?
            } else {
                args.positional.clone()
            };
            extreme(name, items)
        }
        "sum" => {
            args.arity(1, 2)?;
            let start = args.take(1, "start").unwrap_or(Value::Int(0));
            args.finish()?;
            if matches!(start, Value::Str(_)) {
                return Err(EvalError::type_error(
                    "sum() can't sum strings [use ''.join(seq) instead]",
                ));
            }
            ops::iterate(&args.positional[0])?
                .into_iter()
                .try_fold(start, |total, item| ops::binary(BinaryOp::Add, total, item))
        }
        "sorted" => {
            args.arity(1, 1)?;
            let reverse = args.keyword("reverse").is_some_and(|v| v.is_truthy());
            args.finish()?;
            let mut items = ops::iterate(&args.positional[0])?;
            sort_values(&mut items)?;
            if reverse {
                items.reverse();
            }
            Ok(Value::List(items))
        }
        "enumerate" => {
            args.arity(1, 2)?;
            let start = match args.take(1, "start") {
                Some(value) => expect_int(&value)?,
                None => 0,
            };
            args.finish()?;
            let items = ops::iterate(&args.positional[0])?;
            Ok(Value::List(
                (start..)
                    .zip(items)
                    .map(|(i, item)| Value::List(vec![Value::Int(i), item]))
                    .collect(),
            ))
        }
        "list" => {
            args.arity(0, 1)?;
            args.finish()?;
            match args.positional.first() {
                Some(value) => Ok(Value::List(ops::iterate(value)?)),
                None => Ok(Value::List(Vec::new())),
            }
        }
        "dict" => {
            args.arity(0, 1)?;
            let mut map = match args.positional.first() {
                None | Some(Value::None) => IndexMap::new(),
                Some(value) => to_dict(value)?,
            };
            map.extend(args.keywords.drain(..));
            Ok(Value::Dict(map))
        }
        "round" => {
            args.arity(1, 2)?;
            let digits = args.take(1, "ndigits").unwrap_or_default();
            args.finish()?;
            round(&args.positional[0], &digits)
        }
        _ => Err(EvalError::name_error(name)),
    }
}

fn range(start: i64, stop: i64, step: i64) -> Result<Value, EvalError> {
    if step == 0 {
        return Err(EvalError::value_error("range() arg 3 must not be zero"));
    }
    let span = if step > 0 {
        stop.saturating_sub(start)
    } else {
        start.saturating_sub(stop)
    };
    let count = if span <= 0 {
        0
    } else {
        (span - 1) / step.saturating_abs() + 1
    };
    if count > MAX_RANGE_LEN {
        return Err(EvalError::new("MemoryError", "range is too large"));
    }
    Ok(Value::List(
        (0..count).map(|i| Value::Int(start + i * step)).collect(),
    ))
}

fn to_int(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_nan() => Err(EvalError::value_error(
            "cannot convert float NaN to integer",
        )),
        Value::Float(f) if f.is_infinite() => Err(EvalError::new(
            "OverflowError",
            "cannot convert float infinity to integer",
        )),
        Value::Float(f) if f.abs() >= 9.223_372_036_854_776e18 => {
            Err(EvalError::new("OverflowError", "integer overflow"))
        }
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| {
                EvalError::value_error(format!(
                    "invalid literal for int() with base 10: {}",
                    value.repr()
                ))
            }),
        other => Err(EvalError::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            EvalError::value_error(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        }),
        other => Err(EvalError::type_error(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_dict(value: &Value) -> Result<IndexMap<String, Value>, EvalError> {
    if let Value::Dict(map) = value {
        return Ok(map.clone());
    }
    let mut map = IndexMap::new();
    for (position, pair) in ops::iterate(value)?.iter().enumerate() {
        let items = ops::iterate(pair).map_err(|_| {
            EvalError::type_error(format!(
                "cannot convert dictionary update sequence element #{} to a sequence",
                position
            ))
        })?;
        let [key, item] = <[Value; 2]>::try_from(items).map_err(|items| {
            EvalError::value_error(format!(
                "dictionary update sequence element #{} has length {}; 2 is required",
                position,
                items.len()
            ))
        })?;
        let Value::Str(key) = key else {
            return Err(EvalError::type_error(format!(
                "dict keys must be strings, not '{}'",
                key.type_name()
            )));
        };
        map.insert(key, item);
    }
    Ok(map)
}

fn round(value: &Value, digits: &Value) -> Result<Value, EvalError> {
    let digits = match digits {
        Value::None => None,
        other => Some(expect_int(other)?),
    };
    match (value, digits) {
        (Value::Int(_) | Value::Bool(_), _) => to_int(value),
        (Value::Float(f), None) => to_int(&Value::Float(f.round_ties_even())),
        (Value::Float(f), Some(n)) => {
            let scale = 10f64.powi(i32::try_from(n.clamp(-300, 300)).unwrap_or(0));
            Ok(Value::Float((f * scale).round_ties_even() / scale))
        }
        (other, _) => Err(EvalError::type_error(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

fn extreme(function: &str, items: Vec<Value>) -> Result<Value, EvalError> {
    let wanted = if function == "min" {
        Ordering::Less
    } else {
        Ordering::Greater
    };
    let mut items = items.into_iter();
    let Some(mut best) = items.next() else {
        return Err(EvalError::value_error(format!(
            "{}() arg is an empty sequence",
            function
        )));
    };
    let symbol = if function == "min" { "<" } else { ">" };
    for item in items {
        if ops::compare(&item, &best, symbol)? == Some(wanted) {
            best = item;
        }
    }
    Ok(best)
}

/// Stable sort by Python ordering; the first incomparable pair is an error.
fn sort_values(items: &mut [Value]) -> Result<(), EvalError> {
    let mut failure = None;
    items.sort_by(|a, b| match ops::compare(a, b, "<") {
        Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn expect_str<'v>(method: &str, value: &'v Value) -> Result<&'v str, EvalError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::type_error(format!(
            "{}() argument must be str, not {}",
            method,
            other.type_name()
        ))),
    }
}

/// Call `receiver.method(...)`. List methods that mutate act on `receiver`
/// directly.
pub(super) fn call_method(
    receiver: &mut Value,
    method: &str,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    if !keywords.is_empty() {
        return Err(EvalError::type_error(format!(
            "{}() takes no keyword arguments",
            method
        )));
    }
    let args = Args::new(method, positional, keywords);
    let type_name = receiver.type_name();
    let result = match receiver {
        Value::Str(s) => str_method(s, method, &args),
        Value::List(items) => list_method(items, method, &args),
        Value::Dict(map) => dict_method(map, method, &args),
        _ => Err(None),
    };
    result.map_err(|e| {
        e.unwrap_or_else(|| {
            EvalError::new(
                "AttributeError",
                format!("'{}' object has no attribute '{}'", type_name, method),
            )
        })
    })
}

/// `Err(None)` means the method does not exist.
type MethodResult = Result<Value, Option<EvalError>>;

fn str_method(s: &str, method: &str, args: &Args) -> MethodResult {
    let strip_chars = |args: &Args| -> Result<Option<String>, EvalError> {
        args.arity(0, 1)?;
        optional_str(method, "chars", args.positional.first().cloned())
    };
    let value = match method {
        "upper" => {
            args.arity(0, 0)?;
            Value::Str(s.to_uppercase())
        }
        "lower" => {
            args.arity(0, 0)?;
            Value::Str(s.to_lowercase())
        }
        "title" => {
            args.arity(0, 0)?;
            Value::Str(title_case(s))
        }
        "strip" | "lstrip" | "rstrip" => {
            let chars = strip_chars(args)?;
            let matches = |c: char| match &chars {
                Some(set) => set.contains(c),
                None => c.is_whitespace(),
            };
            let stripped = match method {
                "strip" => s.trim_matches(matches),
                "lstrip" => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            };
            Value::Str(stripped.to_string())
        }
        "replace" => {
            args.arity(2, 2)?;
            let old = expect_str(method, &args.positional[0])?;
            let new = expect_str(method, &args.positional[1])?;
            Value::Str(s.replace(old, new))
        }
        "split" => {
            args.arity(0, 1)?;
            let parts: Vec<Value> = match optional_str(method, "sep", args.positional.first().cloned())? {
                None => s.split_whitespace().map(Value::from).collect(),
                Some(sep) if sep.is_empty() => {
                    return Err(Some(EvalError::value_error("empty separator")));
                }
                Some(sep) => s.split(sep.as_str()).map(Value::from).collect(),
            };
            Value::List(parts)
        }
        "join" => {
            args.arity(1, 1)?;
            let mut parts = Vec::new();
            for (position, item) in ops::iterate(&args.positional[0])?.into_iter().enumerate() {
                match item {
                    Value::Str(part) => parts.push(part),
                    other => {
                        return Err(Some(EvalError::type_error(format!(
                            "sequence item {}: expected str instance, {} found",
                            position,
                            other.type_name()
                        ))));
                    }
                }
            }
            Value::Str(parts.join(s))
        }
        "startswith" | "endswith" => {
            args.arity(1, 1)?;
            let affix = expect_str(method, &args.positional[0])?;
            Value::Bool(if method == "startswith" {
                s.starts_with(affix)
            } else {
                s.ends_with(affix)
            })
        }
        _ => return Err(None),
    };
    Ok(value)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn list_method(items: &mut Vec<Value>, method: &str, args: &Args) -> MethodResult {
    let value = match method {
        "append" => {
            args.arity(1, 1)?;
            items.push(args.positional[0].clone());
            Value::None
        }
        "extend" => {
            args.arity(1, 1)?;
            items.extend(ops::iterate(&args.positional[0])?);
            Value::None
        }
        "pop" => {
            args.arity(0, 1)?;
            if items.is_empty() {
                return Err(Some(EvalError::new("IndexError", "pop from empty list")));
            }
            let index = match args.positional.first() {
                Some(value) => expect_int(value)?,
                None => -1,
            };
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let index = if index < 0 { index + len } else { index };
            let index = usize::try_from(index)
                .ok()
                .filter(|i| *i < items.len())
                .ok_or_else(|| EvalError::new("IndexError", "pop index out of range"))?;
            items.remove(index)
        }
        "index" => {
            args.arity(1, 1)?;
            let needle = &args.positional[0];
            let position = items
                .iter()
                .position(|item| ops::py_eq(item, needle))
                .ok_or_else(|| {
                    EvalError::value_error(format!("{} is not in list", needle.repr()))
                })?;
            Value::Int(i64::try_from(position).unwrap_or(i64::MAX))
        }
        "count" => {
            args.arity(1, 1)?;
            let needle = &args.positional[0];
            let count = items.iter().filter(|item| ops::py_eq(item, needle)).count();
            Value::Int(i64::try_from(count).unwrap_or(i64::MAX))
        }
        _ => return Err(None),
    };
    Ok(value)
}

fn dict_method(map: &mut IndexMap<String, Value>, method: &str, args: &Args) -> MethodResult {
    let value = match method {
        "items" => {
            args.arity(0, 0)?;
            Value::List(
                map.iter()
                    .map(|(k, v)| Value::List(vec![Value::Str(k.clone()), v.clone()]))
                    .collect(),
            )
        }
        "keys" => {
            args.arity(0, 0)?;
            Value::List(map.keys().map(|k| Value::Str(k.clone())).collect())
        }
        "values" => {
            args.arity(0, 0)?;
            Value::List(map.values().cloned().collect())
        }
        "get" => {
            args.arity(1, 2)?;
            let fallback = args.positional.get(1).cloned().unwrap_or_default();
            match &args.positional[0] {
                Value::Str(key) => map.get(key).cloned().unwrap_or(fallback),
                _ => fallback,
            }
        }
        _ => return Err(None),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call_builtin(name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let mut output = OutputCapture::default();
        call(name, args, Vec::new(), &mut output)
    }

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn test_print_joins_with_separator() {
        let mut output = OutputCapture::default();
        call(
            "print",
            vec![s("a"), Value::Int(1), Value::None],
            vec![("sep".to_string(), s(","))],
            &mut output,
        )
        .unwrap();
        assert_eq!(output.as_str(), "a,1,None\n");
    }

    #[test]
    fn test_print_rejects_unknown_keyword() {
        let mut output = OutputCapture::default();
        let err = call(
            "print",
            vec![],
            vec![("file".to_string(), Value::None)],
            &mut output,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "TypeError: print() got an unexpected keyword argument 'file'"
        );
    }

    #[test]
    fn test_range() {
        assert_eq!(
            call_builtin("range", vec![Value::Int(3)]).unwrap(),
            Value::from(vec![0i64, 1, 2])
        );
        assert_eq!(
            call_builtin("range", vec![Value::Int(5), Value::Int(0), Value::Int(-2)]).unwrap(),
            Value::from(vec![5i64, 3, 1])
        );
        assert_eq!(
            call_builtin("range", vec![Value::Int(2), Value::Int(1)]).unwrap(),
            Value::List(vec![])
        );
        assert_eq!(
            call_builtin("range", vec![Value::Int(0), Value::Int(1), Value::Int(0)])
                .unwrap_err()
                .message,
            "ValueError: range() arg 3 must not be zero"
        );
    }

    #[test]
    fn test_arity_messages() {
        assert_eq!(
            call_builtin("len", vec![]).unwrap_err().message,
            "TypeError: len() takes exactly 1 argument (0 given)"
        );
        assert_eq!(
            call_builtin("range", vec![]).unwrap_err().message,
            "TypeError: range() takes from 1 to 3 arguments (0 given)"
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call_builtin("int", vec![s(" 42 ")]).unwrap(), Value::Int(42));
        assert_eq!(call_builtin("int", vec![Value::Float(-2.7)]).unwrap(), Value::Int(-2));
        assert_eq!(
            call_builtin("int", vec![s("x")]).unwrap_err().message,
            "ValueError: invalid literal for int() with base 10: 'x'"
        );
        assert_eq!(call_builtin("float", vec![s("1.5")]).unwrap(), Value::Float(1.5));
        assert_eq!(call_builtin("str", vec![Value::Float(2.0)]).unwrap(), s("2.0"));
        assert_eq!(call_builtin("repr", vec![s("a")]).unwrap(), s("'a'"));
        assert_eq!(call_builtin("bool", vec![s("")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_aggregates() {
        let list = Value::from(vec![3i64, 1, 2]);
        assert_eq!(call_builtin("min", vec![list.clone()]).unwrap(), Value::Int(1));
        assert_eq!(
            call_builtin("max", vec![Value::Int(1), Value::Float(2.5)]).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(call_builtin("sum", vec![list.clone()]).unwrap(), Value::Int(6));
        assert_eq!(
            call_builtin("sorted", vec![list]).unwrap(),
            Value::from(vec![1i64, 2, 3])
        );
        assert_eq!(
            call_builtin("min", vec![Value::List(vec![])]).unwrap_err().message,
            "ValueError: min() arg is an empty sequence"
        );
    }

    #[test]
    fn test_sorted_reverse_and_mixed_types() {
        let mut output = OutputCapture::default();
        let sorted = call(
            "sorted",
            vec![Value::from(vec!["b", "a", "c"])],
            vec![("reverse".to_string(), Value::Bool(true))],
            &mut output,
        )
        .unwrap();
        assert_eq!(sorted, Value::from(vec!["c", "b", "a"]));
        assert!(call_builtin("sorted", vec![Value::from(vec![Value::Int(1), s("a")])]).is_err());
    }

    #[test]
    fn test_enumerate_and_dict() {
        assert_eq!(
            call_builtin("enumerate", vec![Value::from(vec!["a"]), Value::Int(1)]).unwrap(),
            Value::List(vec![Value::List(vec![Value::Int(1), s("a")])])
        );
        let mut output = OutputCapture::default();
        let dict = call(
            "dict",
            vec![Value::List(vec![Value::from(vec![s("k"), Value::Int(1)])])],
            vec![("extra".to_string(), Value::Bool(true))],
            &mut output,
        )
        .unwrap();
        assert_eq!(dict.repr(), "{'k': 1, 'extra': True}");
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(call_builtin("round", vec![Value::Float(2.5)]).unwrap(), Value::Int(2));
        assert_eq!(call_builtin("round", vec![Value::Float(3.5)]).unwrap(), Value::Int(4));
        assert_eq!(
            call_builtin("round", vec![Value::Float(1.25), Value::Int(1)]).unwrap(),
            Value::Float(1.2)
        );
    }

    #[test]
    fn test_float_to_int_overflow() {
        assert_eq!(
            call_builtin("round", vec![Value::Float(1e300)]).unwrap_err().message,
            "OverflowError: integer overflow"
        );
        assert_eq!(
            call_builtin("int", vec![Value::Float(-1e19)]).unwrap_err().message,
            "OverflowError: integer overflow"
        );
        assert_eq!(
            call_builtin("int", vec![Value::Float(f64::INFINITY)]).unwrap_err().message,
            "OverflowError: cannot convert float infinity to integer"
        );
    }

    #[test]
    fn test_string_methods() {
        let mut text = s("  Hello World  ");
        let strip = call_method(&mut text, "strip", vec![], vec![]).unwrap();
        assert_eq!(strip, s("Hello World"));
        let mut text = s("a-b-c");
        assert_eq!(
            call_method(&mut text, "split", vec![s("-")], vec![]).unwrap(),
            Value::from(vec!["a", "b", "c"])
        );
        let mut sep = s(", ");
        assert_eq!(
            call_method(&mut sep, "join", vec![Value::from(vec!["x", "y"])], vec![]).unwrap(),
            s("x, y")
        );
        let mut name = s("hello wORLD");
        assert_eq!(
            call_method(&mut name, "title", vec![], vec![]).unwrap(),
            s("Hello World")
        );
        assert_eq!(
            call_method(&mut name, "nope", vec![], vec![]).unwrap_err().message,
            "AttributeError: 'str' object has no attribute 'nope'"
        );
    }

    #[test]
    fn test_list_methods_mutate_receiver() {
        let mut list = Value::from(vec![1i64, 2]);
        call_method(&mut list, "append", vec![Value::Int(3)], vec![]).unwrap();
        assert_eq!(list, Value::from(vec![1i64, 2, 3]));
        assert_eq!(
            call_method(&mut list, "pop", vec![Value::Int(0)], vec![]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            call_method(&mut list, "index", vec![Value::Int(3)], vec![]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            call_method(&mut list, "index", vec![Value::Int(9)], vec![])
                .unwrap_err()
                .message,
            "ValueError: 9 is not in list"
        );
    }

    #[test]
    fn test_dict_methods() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Int(1));
        let mut dict = Value::Dict(map);
        assert_eq!(
            call_method(&mut dict, "get", vec![s("b"), Value::Int(0)], vec![]).unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            call_method(&mut dict, "keys", vec![], vec![]).unwrap(),
            Value::from(vec!["a"])
        );
        assert_eq!(
            call_method(&mut Value::Int(1), "get", vec![], vec![])
                .unwrap_err()
                .message,
            "AttributeError: 'int' object has no attribute 'get'"
        );
    }
}

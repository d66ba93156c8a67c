//! Length, membership and array/string conversion helpers

use super::{expect_args, type_error};
use crate::interpreter::executor::errors::ExecError;
use crate::interpreter::executor::types::Value;

pub fn len(args: &[Value]) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>("len", args)?;
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => return Err(type_error("len", other)),
    };
    Ok(Value::Int(n as i64))
}

pub fn keys(args: &[Value]) -> Result<Value, ExecError> {
    let [value] = expect_args::<1>("keys", args)?;
    match value {
        Value::Map(entries) => Ok(Value::Array(
            entries.keys().cloned().map(Value::Str).collect(),
        )),
        other => Err(type_error("keys", other)),
    }
}

/// `contains(haystack, needle)`: substring, array element or map key
pub fn contains(args: &[Value]) -> Result<Value, ExecError> {
    let [haystack, needle] = expect_args::<2>("contains", args)?;
    let found = match (haystack, needle) {
        (Value::Str(s), Value::Str(sub)) => s.contains(sub.as_str()),
        (Value::Array(items), needle) => items.contains(needle),
        (Value::Map(entries), Value::Str(key)) => entries.contains_key(key),
        (other, _) => return Err(type_error("contains", other)),
    };
    Ok(Value::Bool(found))
}

/// `split(text, separator)`
pub fn split(args: &[Value]) -> Result<Value, ExecError> {
    let [text, separator] = expect_args::<2>("split", args)?;
    match (text, separator) {
        (Value::Str(s), Value::Str(sep)) if !sep.is_empty() => Ok(Value::Array(
            s.split(sep.as_str()).map(Value::from).collect(),
        )),
        (Value::Str(_), Value::Str(_)) => Err(ExecError::Type("split() separator is empty".to_string())),
        (Value::Str(_), other) | (other, _) => Err(type_error("split", other)),
    }
}

/// `join(items, separator)`
pub fn join(args: &[Value]) -> Result<Value, ExecError> {
    let [items, separator] = expect_args::<2>("join", args)?;
    match (items, separator) {
        (Value::Array(items), Value::Str(sep)) => {
            let parts: Vec<String> = items.iter().map(Value::to_string).collect();
            Ok(Value::Str(parts.join(sep)))
        }
        (Value::Array(_), other) | (other, _) => Err(type_error("join", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn test_len_counts_chars() {
        assert_eq!(len(&[Value::from("سلام")]).unwrap(), Value::Int(4));
        assert!(len(&[Value::Int(3)]).is_err());
    }

    #[test]
    fn test_contains_variants() {
        let map = Value::Map(btreemap! { "k".to_string() => Value::Null });
        assert_eq!(contains(&[map, Value::from("k")]).unwrap(), Value::Bool(true));
        let arr = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(contains(&[arr, Value::Int(3)]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_split_and_join() {
        let parts = split(&[Value::from("a,b,c"), Value::from(",")]).unwrap();
        assert_eq!(
            parts,
            Value::Array(vec![Value::from("a"), Value::from("b"), Value::from("c")])
        );
        assert_eq!(join(&[parts, Value::from("-")]).unwrap(), Value::from("a-b-c"));
    }
}

//! Built-in functions callable from expressions
//!
//! `len($items)`, `str(^)`, `upper($name)`, ... These are plain functions over
//! values; user-defined `func`s are operations and cannot be called here.

pub mod collections;
pub mod convert;
pub mod strings;

use super::errors::ExecError;
use super::types::Value;

/* ===================== Builtin Identifiers ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Len,
    Str,
    Int,
    Float,
    Bool,
    Typeof,
    Upper,
    Lower,
    Trim,
    Split,
    Join,
    Keys,
    Contains,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        let builtin = match name {
            "len" => Builtin::Len,
            "str" => Builtin::Str,
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "bool" => Builtin::Bool,
            "typeof" => Builtin::Typeof,
            "upper" => Builtin::Upper,
            "lower" => Builtin::Lower,
            "trim" => Builtin::Trim,
            "split" => Builtin::Split,
            "join" => Builtin::Join,
            "keys" => Builtin::Keys,
            "contains" => Builtin::Contains,
            _ => return None,
        };
        Some(builtin)
    }
}

/* ===================== Dispatcher ===================== */

pub fn call_builtin(func: Builtin, args: &[Value]) -> Result<Value, ExecError> {
    match func {
        Builtin::Len => collections::len(args),
        Builtin::Keys => collections::keys(args),
        Builtin::Contains => collections::contains(args),
        Builtin::Split => collections::split(args),
        Builtin::Join => collections::join(args),
        Builtin::Str => convert::to_str(args),
        Builtin::Int => convert::to_int(args),
        Builtin::Float => convert::to_float(args),
        Builtin::Bool => convert::to_bool(args),
        Builtin::Typeof => convert::type_of(args),
        Builtin::Upper => strings::upper(args),
        Builtin::Lower => strings::lower(args),
        Builtin::Trim => strings::trim(args),
    }
}

/// Check the argument count and hand back the arguments as a fixed array
pub(crate) fn expect_args<'a, const N: usize>(
    name: &str,
    args: &'a [Value],
) -> Result<&'a [Value; N], ExecError> {
    args.try_into().map_err(|_| {
        ExecError::Type(format!(
            "{}() takes {} argument(s), {} given",
            name,
            N,
            args.len()
        ))
    })
}

pub(crate) fn type_error(name: &str, value: &Value) -> ExecError {
    ExecError::Type(format!(
        "{}() does not accept a value of type {}",
        name,
        value.type_name()
    ))
}

//! Parsed operation type

use serde::{Deserialize, Serialize};

/// One parsed instruction.
///
/// Everything but `index` is fixed by the parser. `index` is assigned when the
/// operation is first dispatched (main stream) or when its function body is
/// linked, and records the operation's position inside its code unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Command name (`out`, `goto`, `my_func`, `ns.func`, ...)
    pub command: String,
    /// Whitespace-separated argument tokens (quoted strings kept whole)
    pub args: Vec<String>,
    /// Raw argument text after the command
    pub args_str: String,
    /// Operation source text, used in diagnostics
    pub source: String,
    /// 1-based source line
    pub line: usize,
    /// Position in the owning code unit, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Operation {
    /// Build an operation by hand (tests and synthetic operations)
    pub fn new(command: &str, args_str: &str) -> Self {
        let args_str = args_str.trim().to_string();
        let source = if args_str.is_empty() {
            command.to_string()
        } else {
            format!("{} {}", command, args_str)
        };
        Operation {
            command: command.to_string(),
            args: args_str.split_whitespace().map(str::to_string).collect(),
            args_str,
            source,
            line: 0,
            index: None,
        }
    }

    /// First argument token, if any
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Raw argument text following the first token
    ///
    /// `arraypush $list 1 + 2` -> `1 + 2`
    pub fn rest_args(&self) -> &str {
        let Some(first) = self.args.first() else {
            return "";
        };
        self.args_str
            .strip_prefix(first.as_str())
            .map(str::trim)
            .unwrap_or("")
    }

    /// Index for diagnostics (0 when the operation never ran)
    pub fn position(&self) -> usize {
        self.index.unwrap_or(0)
    }
}

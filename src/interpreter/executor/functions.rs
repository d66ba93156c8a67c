//! Function table and definition capture
//!
//! Definitions are metadata: `func name` starts capturing the following
//! operations instead of running them, `endfunc` turns the captured list into
//! an immutable linked body shared by every invocation.

use std::collections::HashMap;
use std::rc::Rc;

use super::namespace::Namespaces;
use super::stream::OperationStream;
use super::types::{Body, Operation};
use crate::interpreter::parser::ParseError;

/// Name of the built-in empty function used to load a value into mem
pub const MEM_FUNCTION: &str = "mem";

/// A function being captured between `func` and `endfunc`
#[derive(Debug, Clone)]
pub struct PendingFunction {
    /// Fully-qualified name
    pub name: String,
    pub body: Vec<Operation>,
}

#[derive(Debug)]
pub struct FunctionTable {
    functions: HashMap<String, Rc<Body>>,
}

impl Default for FunctionTable {
    fn default() -> Self {
        let mem = Rc::new(Body {
            name: MEM_FUNCTION.to_string(),
            stream: OperationStream::new(Vec::new()),
        });
        let mut functions = HashMap::new();
        functions.insert(MEM_FUNCTION.to_string(), mem);
        FunctionTable { functions }
    }
}

impl FunctionTable {
    /// Link a captured definition and register it (redefinition replaces)
    pub fn define(&mut self, pending: PendingFunction) -> Result<Rc<Body>, ParseError> {
        let body = Rc::new(Body {
            name: pending.name.clone(),
            stream: OperationStream::linked_body(pending.body)?,
        });
        self.functions.insert(pending.name, Rc::clone(&body));
        Ok(body)
    }

    pub fn get(&self, name: &str) -> Option<Rc<Body>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Resolve a call: current namespace, used namespaces, then global.
    /// First match wins.
    pub fn resolve(&self, name: &str, namespaces: &Namespaces) -> Option<Rc<Body>> {
        namespaces
            .call_candidates(name)
            .iter()
            .find_map(|candidate| self.get(candidate))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::parser::parse;

    fn pending(name: &str, source: &str) -> PendingFunction {
        PendingFunction {
            name: name.to_string(),
            body: parse(source).unwrap(),
        }
    }

    #[test]
    fn test_mem_is_predefined_and_empty() {
        let table = FunctionTable::default();
        let mem = table.get(MEM_FUNCTION).expect("mem should exist");
        assert!(mem.stream.is_empty());
    }

    #[test]
    fn test_resolution_prefers_current_namespace() {
        let mut table = FunctionTable::default();
        table.define(pending("m.f", "out 'm'")).unwrap();
        table.define(pending("a.f", "out 'a'")).unwrap();
        table.define(pending("f", "out 'global'")).unwrap();

        let mut ns = Namespaces::default();
        ns.open("m");
        ns.use_namespace("a");
        ns.use_namespace("b");
        assert_eq!(table.resolve("f", &ns).unwrap().name, "m.f");

        ns.close();
        assert_eq!(table.resolve("f", &ns).unwrap().name, "a.f");

        let plain = Namespaces::default();
        assert_eq!(table.resolve("f", &plain).unwrap().name, "f");
        assert!(table.resolve("g", &plain).is_none());
    }

    #[test]
    fn test_body_labels_are_local() {
        let mut table = FunctionTable::default();
        let body = table.define(pending("loop", "pass; section again; out 1")).unwrap();
        assert_eq!(body.stream.section("again").unwrap(), 2);
    }
}

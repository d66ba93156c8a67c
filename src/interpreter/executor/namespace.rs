//! Namespace resolver
//!
//! The open namespace qualifies function definitions. Used namespaces are a
//! fallback for unqualified names, searched in the order they were declared.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespaces {
    current: Option<String>,
    used: Vec<String>,
}

impl Namespaces {
    pub fn open(&mut self, name: &str) {
        self.current = Some(name.to_string());
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Register a namespace for unqualified lookup (duplicates ignored)
    pub fn use_namespace(&mut self, name: &str) {
        if !self.used.iter().any(|n| n == name) {
            self.used.push(name.to_string());
        }
    }

    pub fn used(&self) -> &[String] {
        &self.used
    }

    /// Name under which a definition made now is registered
    pub fn qualify(&self, name: &str) -> String {
        match &self.current {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Candidate names for an unqualified call, in priority order:
    /// current namespace, used namespaces, then the bare name
    pub fn call_candidates(&self, name: &str) -> Vec<String> {
        let mut candidates = Vec::with_capacity(self.used.len() + 2);
        if let Some(ns) = &self.current {
            candidates.push(format!("{}.{}", ns, name));
        }
        candidates.extend(self.used.iter().map(|ns| format!("{}.{}", ns, name)));
        candidates.push(name.to_string());
        candidates
    }

    /// Candidate names for a variable reference: the exact name, then the
    /// name qualified by each used namespace
    pub fn variable_candidates(&self, name: &str) -> Vec<String> {
        let mut candidates = Vec::with_capacity(self.used.len() + 1);
        candidates.push(name.to_string());
        candidates.extend(self.used.iter().map(|ns| format!("{}.{}", ns, name)));
        candidates
    }
}

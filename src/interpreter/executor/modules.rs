//! Module resolution for `include`
//!
//! `@name` targets are standard library modules: a configured stdlib
//! directory wins over the copies embedded in the binary. Anything else is a
//! file path, tried as given and then under each include path.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::errors::ExecError;
use crate::config::Config;

const STDLIB_PREFIX: char = '@';
const MODULE_EXTENSION: &str = "pashm";

const EMBEDDED_STDLIB: &str = include_str!("../../../stdlib/stdlib.pashm");

/// Standard library modules shipped inside the binary
fn embedded(name: &str) -> Option<&'static str> {
    match name {
        "stdlib" => Some(EMBEDDED_STDLIB),
        _ => None,
    }
}

/// A resolved module ready to be parsed
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Identity used to make inclusion idempotent
    pub id: String,
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleLoader {
    stdlib_path: Option<PathBuf>,
    include_paths: Vec<PathBuf>,
    included: HashSet<String>,
}

impl ModuleLoader {
    pub fn new(config: &Config) -> Self {
        ModuleLoader {
            stdlib_path: config.stdlib_path.clone(),
            include_paths: config.include_paths.clone(),
            included: HashSet::new(),
        }
    }

    /// Locate and read the module named by an `include` target
    pub fn resolve(&self, target: &str) -> Result<Module, ExecError> {
        match target.strip_prefix(STDLIB_PREFIX) {
            Some(name) => self.resolve_stdlib(name),
            None => self.resolve_file(target),
        }
    }

    /// Record a module as included. Returns false if it already was.
    pub fn mark_included(&mut self, id: &str) -> bool {
        self.included.insert(id.to_string())
    }

    pub fn is_included(&self, id: &str) -> bool {
        self.included.contains(id)
    }

    fn resolve_stdlib(&self, name: &str) -> Result<Module, ExecError> {
        let id = format!("{}{}", STDLIB_PREFIX, name);

        if let Some(dir) = &self.stdlib_path {
            let path = dir.join(name).with_extension(MODULE_EXTENSION);
            if path.is_file() {
                debug!(module = %id, path = %path.display(), "loading stdlib module from disk");
                let source = fs::read_to_string(&path)?;
                return Ok(Module { id, source });
            }
        }

        embedded(name)
            .map(|source| Module {
                id: id.clone(),
                source: source.to_string(),
            })
            .ok_or(ExecError::ModuleNotFound(id))
    }

    fn resolve_file(&self, target: &str) -> Result<Module, ExecError> {
        let path = self
            .candidates(Path::new(target))
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| ExecError::ModuleNotFound(target.to_string()))?;

        let canonical = fs::canonicalize(&path)?;
        let source = fs::read_to_string(&canonical)?;
        Ok(Module {
            id: canonical.display().to_string(),
            source,
        })
    }

    fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![path.to_path_buf()];
        if path.is_relative() {
            candidates.extend(self.include_paths.iter().map(|dir| dir.join(path)));
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_stdlib_resolves() {
        let loader = ModuleLoader::default();
        let module = loader.resolve("@stdlib").unwrap();
        assert_eq!(module.id, "@stdlib");
        assert!(module.source.contains("func println"));
    }

    #[test]
    fn test_unknown_stdlib_module() {
        let loader = ModuleLoader::default();
        let err = loader.resolve("@nope").unwrap_err();
        assert!(matches!(err, ExecError::ModuleNotFound(ref id) if id == "@nope"));
    }

    #[test]
    fn test_stdlib_path_overrides_embedded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stdlib.pashm"), "func custom; endfunc").unwrap();

        let config = Config {
            stdlib_path: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let module = ModuleLoader::new(&config).resolve("@stdlib").unwrap();
        assert_eq!(module.source, "func custom; endfunc");
    }

    #[test]
    fn test_file_found_through_include_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("lib.pashm"), "out 'lib'").unwrap();

        let config = Config {
            include_paths: vec![dir.path().to_path_buf()],
            ..Config::default()
        };
        let loader = ModuleLoader::new(&config);
        let module = loader.resolve("lib.pashm").unwrap();
        assert_eq!(module.source, "out 'lib'");
        assert!(module.id.ends_with("lib.pashm"));
    }

    #[test]
    fn test_mark_included_is_idempotent() {
        let mut loader = ModuleLoader::default();
        assert!(loader.mark_included("@stdlib"));
        assert!(!loader.mark_included("@stdlib"));
        assert!(loader.is_included("@stdlib"));
    }
}

use crate::source::Span;
use std::collections::HashMap;
use thiserror::Error;

// --- Environment Error ---
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("undefined variable: '{0}'")]
    UndefinedVariable(String, Span), // Variable name, span where lookup happened
}

// --- Environment Definition ---

/// Variable bindings of one session.
///
/// The caller owns it and lends it to each evaluation, so assignments made
/// by one line stay visible to the following ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    bindings: HashMap<String, i64>,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
        }
    }

    /// Binds `name` to `value`, replacing any previous value.
    pub fn assign(&mut self, name: impl Into<String>, value: i64) {
        self.bindings.insert(name.into(), value);
    }

    /// Looks up a variable's value.
    /// `lookup_span` is the location where the variable was referenced, used for error reporting.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<i64, EnvError> {
        self.bindings
            .get(name)
            .copied()
            .ok_or_else(|| EnvError::UndefinedVariable(name.to_string(), lookup_span))
    }

    /// All bound names, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

use std::fmt;

/// One problem found while validating a catalog.
///
/// `location` is a path-like pointer into the authored document such as
/// `nodes[q1].choices[0].next` or `/sections/0/steps`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Violation {
    pub location: String,
    pub message: String,
}

impl Violation {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// A catalog failed to load. Carries every violation found, not just the first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaError {
    pub catalog: Option<String>,
    pub violations: Vec<Violation>,
}

impl SchemaError {
    pub(crate) fn new(catalog: Option<String>, violations: Vec<Violation>) -> Self {
        Self {
            catalog,
            violations,
        }
    }

    pub(crate) fn single(
        catalog: Option<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(catalog, vec![Violation::new(location, message)])
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True when any violation mentions `needle` in its location or message.
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.location.contains(needle) || v.message.contains(needle))
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.catalog {
            Some(key) => write!(
                f,
                "catalog '{key}' has {} violation(s)",
                self.violations.len()
            )?,
            None => write!(f, "catalog has {} violation(s)", self.violations.len())?,
        }
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

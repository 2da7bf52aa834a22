//! Paths that label where a change happened inside a value tree
//!
//! A path is a sequence of steps from the root: mapping fields and
//! sequence indices. The textual form uses `$` for the root, `.field`
//! for fields and `[i]` for indices, e.g. `$.containers[0].image`.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step of a [`Path`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Field(String),
    Index(usize),
}

/// A `$`-rooted location inside a value tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    /// The root path `$`
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend with a mapping field
    pub fn field(&self, name: &str) -> Path {
        let mut steps = self.steps.clone();
        steps.push(Step::Field(name.to_string()));
        Path { steps }
    }

    /// Extend with a sequence index
    pub fn index(&self, idx: usize) -> Path {
        let mut steps = self.steps.clone();
        steps.push(Step::Index(idx));
        Path { steps }
    }

    /// Number of steps from the root
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The path without its last step; `None` for the root
    pub fn parent(&self) -> Option<Path> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Path {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// The field name of the last step, if it is a field
    pub fn last_field(&self) -> Option<&str> {
        match self.steps.last() {
            Some(Step::Field(name)) => Some(name),
            _ => None,
        }
    }

    /// Whether `base` is a (non-strict) prefix of this path
    pub fn starts_with(&self, base: &Path) -> bool {
        self.steps.len() >= base.steps.len() && self.steps[..base.steps.len()] == base.steps
    }

    /// The steps below `base`; `None` when `base` is not a prefix
    pub fn strip_prefix(&self, base: &Path) -> Option<&[Step]> {
        self.steps.strip_prefix(base.steps.as_slice())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.steps {
            match step {
                Step::Field(name) => write!(f, ".{name}")?,
                Step::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

//! Type descriptor domain models.

use serde::{Deserialize, Serialize};

/// Whether the wrapped data type is passed and compared by value or by
/// reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Referability {
    Value,
    Reference,
    /// Not yet determined, or the stored text was not recognised.
    Unknown,
}

impl Referability {
    /// Parse from the canonical text. Anything unrecognised is `Unknown`.
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            "Value" => Self::Value,
            "Reference" => Self::Reference,
            _ => Self::Unknown,
        }
    }

    /// Canonical text, as written into metadata blocks and `@Referable@`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::Reference => "Reference",
            Self::Unknown => "Unknown",
        }
    }

    /// True for `Value` and `Reference`.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Referability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logical identity of one variable-type family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub target_type: String,
    pub referability: Referability,
    pub menu_order: i32,
    pub builtin: bool,
}

impl TypeDescriptor {
    /// Create a custom descriptor with menu order 0.
    pub fn new(name: impl Into<String>, target_type: impl Into<String>, referability: Referability) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            referability,
            menu_order: 0,
            builtin: false,
        }
    }

    pub fn with_menu_order(mut self, menu_order: i32) -> Self {
        self.menu_order = menu_order;
        self
    }

    pub fn with_builtin(mut self, builtin: bool) -> Self {
        self.builtin = builtin;
        self
    }
}

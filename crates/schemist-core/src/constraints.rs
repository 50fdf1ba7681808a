use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One column of an index, with its ordering options (e.g. `DESC`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct KeyPart {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

impl KeyPart {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into().to_lowercase(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Column name and options as a single comparable string.
    pub fn render(&self) -> String {
        match &self.options {
            Some(options) if !options.is_empty() => format!("{} {}", self.column, options),
            _ => self.column.clone(),
        }
    }
}

/// Index definition, including the primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Key {
    pub name: String,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
    /// Access method (e.g. `btree`); dialect default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub parts: Vec<KeyPart>,
    /// Owning table, filled in when the key is attached to a table.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub table: String,
}

impl Key {
    fn build(name: &str, unique: bool, primary: bool, columns: &[&str]) -> Self {
        Self {
            name: name.to_lowercase(),
            unique,
            primary,
            method: None,
            parts: columns.iter().map(|column| KeyPart::new(*column)).collect(),
            table: String::new(),
        }
    }

    /// Non-unique index over `columns`.
    pub fn index(name: &str, columns: &[&str]) -> Self {
        Self::build(name, false, false, columns)
    }

    pub fn unique(name: &str, columns: &[&str]) -> Self {
        Self::build(name, true, false, columns)
    }

    pub fn primary(name: &str, columns: &[&str]) -> Self {
        Self::build(name, true, true, columns)
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_parts(mut self, parts: Vec<KeyPart>) -> Self {
        self.parts = parts;
        self
    }

    /// Naming convention for backends whose catalog has no primary flag:
    /// `primary`, or any name ending in `pkey`.
    pub fn infer_primary(name: &str) -> bool {
        let name = name.to_lowercase();
        name == "primary" || name.ends_with("pkey")
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.column.as_str())
    }

    /// Column list as rendered for comparison, e.g. `age, created_at DESC`.
    pub fn render_parts(&self) -> String {
        self.parts
            .iter()
            .map(KeyPart::render)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether both keys cover the same columns with the same options.
    pub fn same_parts(&self, other: &Key) -> bool {
        self.render_parts()
            .eq_ignore_ascii_case(&other.render_parts())
    }
}

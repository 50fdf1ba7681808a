use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameter bound to a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A rendered SQL statement plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub sql: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn bind(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Statement text terminated for scripts, one statement per line.
    pub fn to_statement(&self) -> String {
        let sql = self.sql.trim_end();
        if sql.ends_with(';') {
            sql.to_string()
        } else {
            format!("{sql};")
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl From<&str> for Fragment {
    fn from(value: &str) -> Self {
        Fragment::new(value)
    }
}

impl From<String> for Fragment {
    fn from(value: String) -> Self {
        Fragment::new(value)
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Value type a column stores on the application side.
///
/// Dialects map it to a storage type when no explicit `data_type` is set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    String,
    Bytes,
    Date,
    Timestamp,
    Json,
    Uuid,
}

/// Actions attached to a column that only exists to drive its own removal.
///
/// An empty value, or an empty `rename_to`, means the column is dropped. A
/// non-empty `rename_to` means the column is the old name of the target
/// column called `rename_to`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct DeprecatedActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,
}

/// Storage-level description of a column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ColumnDefinition {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Explicit storage type, set by introspection or to override the dialect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    /// Default expression, already rendered as a backend literal (e.g. `'0'`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal: Option<u32>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<DeprecatedActions>,
}

impl ColumnDefinition {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            data_type: None,
            nullable: false,
            default: None,
            length: None,
            decimal: None,
            auto_increment: false,
            deprecated: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Numeric precision and scale.
    pub fn precision(mut self, length: u32, decimal: u32) -> Self {
        self.length = Some(length);
        self.decimal = Some(decimal);
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Mark the column for removal.
    pub fn drop_deprecated(mut self) -> Self {
        self.deprecated = Some(DeprecatedActions::default());
        self
    }

    /// Mark the column as the old name of `target`.
    pub fn rename_to(mut self, target: impl Into<String>) -> Self {
        self.deprecated = Some(DeprecatedActions {
            rename_to: Some(target.into().to_lowercase()),
        });
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }

    /// Destination name when the column is a deprecated rename source.
    pub fn rename_target(&self) -> Option<&str> {
        self.deprecated
            .as_ref()
            .and_then(|actions| actions.rename_to.as_deref())
            .filter(|to| !to.is_empty())
    }
}

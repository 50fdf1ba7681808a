/// Options that control how introspection behaves.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Namespace holding the managed tables.
    pub schema: String,
    /// Restrict introspection to these tables.
    pub tables: Option<Vec<String>>,
    pub include_indexes: bool,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            tables: None,
            include_indexes: true,
        }
    }
}

impl IntrospectOptions {
    pub fn includes_table(&self, name: &str) -> bool {
        match &self.tables {
            Some(list) => list.iter().any(|item| item.eq_ignore_ascii_case(name)),
            None => true,
        }
    }
}

//! Query text plus bound parameters, and the identifier allow-list.
//!
//! Values reach Athena through `ExecutionParameters` and fill `?`
//! placeholders, so they can never change the statement's structure.
//! Identifiers (table names) cannot be bound and must pass
//! [`validate_identifier`] before they are interpolated.

use std::sync::LazyLock;

use regex::Regex;

/// Unqualified or `schema.table` identifier, each part at most 128 chars.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}(\.[A-Za-z_][A-Za-z0-9_]{0,127})?$")
        .expect("identifier pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
    #[error("invalid identifier '{0}': only letters, digits and underscores are allowed")]
    InvalidIdentifier(String),
}

/// Check that `name` is safe to place in an identifier position.
pub fn validate_identifier(name: &str) -> Result<&str, SqlError> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(SqlError::InvalidIdentifier(name.to_string()))
    }
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl SqlValue {
    /// Render as the literal Athena expects in `ExecutionParameters`.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Bool(v) => v.to_string(),
            SqlValue::Str(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Str(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Str(v)
    }
}

/// SQL text and its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    sql: String,
    parameters: Vec<SqlValue>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), parameters: Vec::new() }
    }

    /// Bind the next `?` placeholder.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.parameters.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn execution_parameters(&self) -> Vec<String> {
        self.parameters.iter().map(SqlValue::to_literal).collect()
    }
}

impl From<&str> for Query {
    fn from(sql: &str) -> Self {
        Query::new(sql)
    }
}

impl From<String> for Query {
    fn from(sql: String) -> Self {
        Query::new(sql)
    }
}

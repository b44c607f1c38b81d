use crate::types::errors::ValueError;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MAX_IDENTIFIER_LENGTH: usize = 63;
const DEFAULT_SCHEMA: &str = "public";

/// A `[schema.]table` reference that is safe to splice into SQL text.
///
/// Table names are configuration rather than bind parameters, so they are
/// restricted to plain lowercase-able identifiers instead of being quoted.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TableName {
    schema: String,
    table: String
}

impl TableName {
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn validate_part(value: &str, part: &str) -> Result<(), ValueError> {
        if part.is_empty() {
            return Err(ValueError::identifier(value, "contains an empty name part"));
        }

        if part.len() > MAX_IDENTIFIER_LENGTH {
            return Err(ValueError::identifier(value, "has a name part longer than 63 characters"));
        }

        let mut characters = part.chars();

        if !characters.next().is_some_and(|first| first.is_ascii_alphabetic() || first == '_') {
            return Err(ValueError::identifier(value, "must start with a letter or underscore"));
        }

        if !characters.all(|character| character.is_ascii_alphanumeric() || character == '_') {
            return Err(ValueError::identifier(value, "may only contain letters, digits and underscores"));
        }

        Ok(())
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            table: "transactions".to_string()
        }
    }
}

impl Display for TableName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.schema, self.table)
    }
}

impl FromStr for TableName {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (schema, table) = match value.split_once('.') {
            Some((schema, table)) => (schema, table),
            None => (DEFAULT_SCHEMA, value)
        };

        Self::validate_part(value, schema)?;
        Self::validate_part(value, table)?;

        Ok(Self {
            schema: schema.to_ascii_lowercase(),
            table: table.to_ascii_lowercase()
        })
    }
}

/// Name of a managed database instance. The workspace rejects underscores.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct InstanceName(String);

impl InstanceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InstanceName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for InstanceName {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() || value.len() > MAX_IDENTIFIER_LENGTH {
            return Err(ValueError::identifier(value, "must be between 1 and 63 characters"));
        }

        if value.contains('_') {
            return Err(ValueError::identifier(value, "must not contain underscores"));
        }

        if !value.chars().all(|character| character.is_ascii_alphanumeric() || character == '-') {
            return Err(ValueError::identifier(value, "may only contain letters, digits and hyphens"));
        }

        if value.starts_with('-') || value.ends_with('-') {
            return Err(ValueError::identifier(value, "must not start or end with a hyphen"));
        }

        Ok(Self(value.to_string()))
    }
}

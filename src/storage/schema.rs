use serde::Serialize;

use crate::types::TableName;

/// A column as declared by the transactions schema.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ColumnDefinition {
    pub name: &'static str,
    pub sql_type: &'static str,
    /// The type name `information_schema.columns` reports for `sql_type`.
    pub catalog_type: &'static str,
    pub constraint: Option<&'static str>
}

impl ColumnDefinition {
    const fn new(name: &'static str, sql_type: &'static str, catalog_type: &'static str, constraint: Option<&'static str>) -> Self {
        Self { name, sql_type, catalog_type, constraint }
    }
}

pub const TRANSACTION_COLUMNS: [ColumnDefinition; 10] = [
    ColumnDefinition::new("transaction_id", "UUID", "uuid", Some("PRIMARY KEY")),
    ColumnDefinition::new("timestamp", "TIMESTAMP", "timestamp without time zone", Some("NOT NULL")),
    ColumnDefinition::new("customer_name", "VARCHAR(255)", "character varying", None),
    ColumnDefinition::new("email", "VARCHAR(255)", "character varying", None),
    ColumnDefinition::new("product", "VARCHAR(255)", "character varying", None),
    ColumnDefinition::new("quantity", "INT", "integer", None),
    ColumnDefinition::new("price_per_unit", "DECIMAL(10, 2)", "numeric", None),
    ColumnDefinition::new("payment_method", "VARCHAR(255)", "character varying", None),
    ColumnDefinition::new("city", "VARCHAR(255)", "character varying", None),
    ColumnDefinition::new("country", "VARCHAR(255)", "character varying", None)
];

/// A column as reported back by the backend's catalog.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String
}

/// Differences between the catalog's view of a table and `TRANSACTION_COLUMNS`.
///
/// Extra columns are tolerated; a missing column or a different type is not.
pub fn schema_mismatches(columns: &[ColumnInfo]) -> Vec<String> {
    TRANSACTION_COLUMNS.iter()
        .filter_map(|expected| match columns.iter().find(|column| column.name == expected.name) {
            None => Some(format!("{} is missing", expected.name)),
            Some(column) if !column.data_type.eq_ignore_ascii_case(expected.catalog_type) => Some(format!(
                "{} is {} instead of {}",
                expected.name, column.data_type, expected.catalog_type
            )),
            Some(_) => None
        })
        .collect()
}

/// SQL text for the transactions table under a configurable name.
#[derive(Debug, Clone)]
pub struct TableSchema {
    table: TableName
}

impl TableSchema {
    pub fn new(table: TableName) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn column_list(&self) -> String {
        TRANSACTION_COLUMNS.iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn create_table_sql(&self) -> String {
        let columns = TRANSACTION_COLUMNS.iter()
            .map(|column| match column.constraint {
                Some(constraint) => format!("    {} {} {}", column.name, column.sql_type, constraint),
                None => format!("    {} {}", column.name, column.sql_type)
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", self.table, columns)
    }

    pub fn create_index_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {}_timestamp_idx ON {} (timestamp, transaction_id)",
            self.table.table(),
            self.table
        )
    }

    /// Prefix for a multi-row insert; values are appended by the query builder.
    pub fn insert_prefix(&self) -> String {
        format!("INSERT INTO {} ({}) ", self.table, self.column_list())
    }

    pub fn select_recent_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY timestamp DESC, transaction_id DESC LIMIT $1",
            self.column_list(),
            self.table
        )
    }

    pub fn select_since_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE (timestamp, transaction_id) > ($1, $2) ORDER BY timestamp ASC, transaction_id ASC LIMIT $3",
            self.column_list(),
            self.table
        )
    }

    pub fn select_by_ids_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE transaction_id = ANY($1) ORDER BY timestamp ASC, transaction_id ASC",
            self.column_list(),
            self.table
        )
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table)
    }

    pub fn describe_columns_sql(&self) -> &'static str {
        "SELECT column_name::text, data_type::text FROM information_schema.columns WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position"
    }
}
